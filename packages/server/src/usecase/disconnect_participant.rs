//! UseCase: 参加者切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - 接続の削除とプレゼンス配信
//!
//! ### なぜこのテストが必要か
//! - 切断した接続はスナップショットから消え、残りの全員に通知される必要がある
//! - 切断は冪等で、2 回目の切断で余分な配信が起きてはならない
//!
//! ### どのような状況を想定しているか
//! - 正常系：接続の切断と配信
//! - エッジケース：最後の接続の切断（空のスナップショットを配信）
//! - 異常系：既に切断済みの接続の切断（何もしない）

use std::sync::Arc;

use crate::domain::{ConnectionId, ConnectionRegistry, PresenceSnapshot};

use super::{error::DisconnectError, publish_presence::PresenceBroadcaster};

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    /// Registry（データアクセス層の抽象化）
    registry: Arc<dyn ConnectionRegistry>,
    /// プレゼンス配信
    broadcaster: Arc<PresenceBroadcaster>,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        broadcaster: Arc<PresenceBroadcaster>,
    ) -> Self {
        Self {
            registry,
            broadcaster,
        }
    }

    /// 参加者切断を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 切断する接続の ID（Domain Model）
    ///
    /// # Returns
    ///
    /// * `Ok(PresenceSnapshot)` - 削除後のスナップショット（配信済み）
    /// * `Err(DisconnectError)` - 既に切断済み（何もしない）
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<PresenceSnapshot, DisconnectError> {
        let snapshot = self
            .registry
            .close(connection_id)
            .await
            .ok_or_else(|| DisconnectError::NotConnected(connection_id.to_string()))?;

        self.broadcaster.flush().await;

        Ok(snapshot)
    }

    /// 残りの参加者数を取得
    #[cfg(test)]
    pub async fn count_remaining_participants(&self) -> usize {
        self.registry.snapshot().await.len()
    }
}
