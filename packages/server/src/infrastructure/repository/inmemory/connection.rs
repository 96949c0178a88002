//! InMemory Connection Registry 実装
//!
//! ドメイン層が定義する ConnectionRegistry trait の具体的な実装。
//! `ConnectionTable` を 1 つの Mutex で保護し、全ての操作を直列化します。
//! スナップショットのコピーも同じロックの内側で行うため、途中状態は外から見えません。
//! 確定したスナップショットはロックを持ったまま Outbox に積むので、
//! 呼び出し元が途中でキャンセルされても配信が欠けることはありません。

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    common::time::timestamp_to_jst_rfc3339,
    domain::{
        Connection, ConnectionId, ConnectionRegistry, ConnectionTable, DisplayName,
        PresenceOutbox, PresenceSnapshot, RegistryError, Timestamp,
    },
};

/// インメモリ Connection Registry 実装
pub struct InMemoryConnectionRegistry {
    /// 接続テーブル（唯一の共有可変状態）
    table: Mutex<ConnectionTable>,
    /// 確定したスナップショットの送り先
    outbox: PresenceOutbox,
}

impl InMemoryConnectionRegistry {
    /// 新しい空の InMemoryConnectionRegistry を作成
    pub fn new(outbox: PresenceOutbox) -> Self {
        Self {
            table: Mutex::new(ConnectionTable::new()),
            outbox,
        }
    }

    /// 接続数を取得
    #[cfg(test)]
    pub async fn count(&self) -> usize {
        self.table.lock().await.len()
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn open(
        &self,
        id: ConnectionId,
        connected_at: Timestamp,
    ) -> Result<PresenceSnapshot, RegistryError> {
        let mut table = self.table.lock().await;
        let snapshot = table.open(Connection::new(id, connected_at))?;
        self.outbox.push(snapshot.clone());
        Ok(snapshot)
    }

    async fn set_name(
        &self,
        id: &ConnectionId,
        name: DisplayName,
    ) -> Result<PresenceSnapshot, RegistryError> {
        let mut table = self.table.lock().await;
        let snapshot = table.set_name(id, name)?;
        self.outbox.push(snapshot.clone());
        Ok(snapshot)
    }

    async fn close(&self, id: &ConnectionId) -> Option<PresenceSnapshot> {
        let mut table = self.table.lock().await;
        let connected_at = table.get(id)?.connected_at;
        let snapshot = table.close(id)?;
        self.outbox.push(snapshot.clone());
        tracing::debug!(
            "Closed '{}' (opened at {})",
            id,
            timestamp_to_jst_rfc3339(connected_at.value()).unwrap_or_default()
        );
        Some(snapshot)
    }

    async fn snapshot(&self) -> PresenceSnapshot {
        let table = self.table.lock().await;
        table.snapshot()
    }

    async fn exists(&self, id: &ConnectionId) -> bool {
        let table = self.table.lock().await;
        table.contains(id)
    }

    async fn lookup(&self, id: &ConnectionId) -> Option<DisplayName> {
        let table = self.table.lock().await;
        table.get(id).map(|c| c.display_name.clone())
    }
}
