//! UseCase: プレゼンス要求処理
//!
//! 要求した接続にだけ、現在のスナップショットを返信する。

use std::sync::Arc;

use crate::domain::{ConnectionId, ConnectionRegistry, PresenceSnapshot};

use super::publish_presence::PresenceBroadcaster;

/// プレゼンス要求のユースケース
pub struct RequestPresenceUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    broadcaster: Arc<PresenceBroadcaster>,
}

impl RequestPresenceUseCase {
    /// 新しい RequestPresenceUseCase を作成
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        broadcaster: Arc<PresenceBroadcaster>,
    ) -> Self {
        Self {
            registry,
            broadcaster,
        }
    }

    /// 現在のスナップショットを要求元に返信
    pub async fn execute(&self, requester: &ConnectionId) -> PresenceSnapshot {
        let snapshot = self.registry.snapshot().await;
        self.broadcaster.reply(requester, snapshot.clone()).await;
        snapshot
    }
}
