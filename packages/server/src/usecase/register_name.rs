//! UseCase: 表示名登録処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RegisterNameUseCase::execute() メソッド
//! - 表示名の上書きとプレゼンス配信
//!
//! ### なぜこのテストが必要か
//! - 空や空白だけの名前は "Anonymous" に置き換えられなければならない
//! - 切断と競合した登録は何も起こさず、配信もしない
//!
//! ### どのような状況を想定しているか
//! - 正常系：名前の登録と変更
//! - エッジケース：空文字・空白のみ・名前なし
//! - 異常系：未登録の接続 ID

use std::sync::Arc;

use crate::domain::{ConnectionId, ConnectionRegistry, DisplayName, PresenceSnapshot};

use super::{error::RegisterNameError, publish_presence::PresenceBroadcaster};

/// 表示名登録のユースケース
pub struct RegisterNameUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    broadcaster: Arc<PresenceBroadcaster>,
}

impl RegisterNameUseCase {
    /// 新しい RegisterNameUseCase を作成
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        broadcaster: Arc<PresenceBroadcaster>,
    ) -> Self {
        Self {
            registry,
            broadcaster,
        }
    }

    /// 表示名登録を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 名前を設定する接続
    /// * `name` - クライアントが送ってきた名前（無い場合は既定の名前）
    ///
    /// # Returns
    ///
    /// * `Ok(PresenceSnapshot)` - 変更後のスナップショット（配信済み）
    /// * `Err(RegisterNameError)` - 接続が登録されていない（何もしない）
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        name: Option<&str>,
    ) -> Result<PresenceSnapshot, RegisterNameError> {
        let display_name = DisplayName::from_optional(name);

        let snapshot = self
            .registry
            .set_name(connection_id, display_name)
            .await
            .map_err(|_| RegisterNameError::UnknownConnection(connection_id.to_string()))?;

        self.broadcaster.flush().await;

        Ok(snapshot)
    }
}
