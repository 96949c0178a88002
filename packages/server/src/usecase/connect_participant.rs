//! UseCase: 参加者接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::execute() メソッド
//! - 接続の登録とプレゼンス配信
//!
//! ### なぜこのテストが必要か
//! - 新しい接続は既定の表示名で Registry に登録され、全員に通知される必要がある
//! - 二重登録は Transport 層の不変条件違反で、無視されなければならない
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規接続の登録と配信
//! - 異常系：同じ接続 ID での二重登録（配信しない）

use std::sync::Arc;

use crate::{
    common::time::get_jst_timestamp,
    domain::{ConnectionId, ConnectionRegistry, PresenceSnapshot, Timestamp},
};

use super::{error::ConnectError, publish_presence::PresenceBroadcaster};

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    /// Registry（データアクセス層の抽象化）
    registry: Arc<dyn ConnectionRegistry>,
    /// プレゼンス配信
    broadcaster: Arc<PresenceBroadcaster>,
}

impl ConnectParticipantUseCase {
    /// 新しい ConnectParticipantUseCase を作成
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        broadcaster: Arc<PresenceBroadcaster>,
    ) -> Self {
        Self {
            registry,
            broadcaster,
        }
    }

    /// 参加者接続を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - Transport 層が払い出した接続 ID（Domain Model）
    ///
    /// # Returns
    ///
    /// * `Ok(PresenceSnapshot)` - 登録直後のスナップショット（配信済み）
    /// * `Err(ConnectError)` - 二重登録。Registry と配信には何も起きない
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
    ) -> Result<PresenceSnapshot, ConnectError> {
        let connected_at = Timestamp::new(get_jst_timestamp());

        // 1. Registry に登録（既定の表示名）
        let snapshot = self
            .registry
            .open(connection_id.clone(), connected_at)
            .await
            .map_err(|_| ConnectError::DuplicateConnection(connection_id.into_string()))?;

        // 2. コミット済みのスナップショットを全員へ配信
        self.broadcaster.flush().await;

        Ok(snapshot)
    }
}
