//! WebSocket Transport Adapter
//!
//! ドメイン層が定義する Transport trait の WebSocket 実装。
//! 各接続の送信チャンネル（mpsc）を保持し、イベントを JSON に変換して投入します。
//! 送信は投入した時点で完了扱い（fire-and-forget）で、実際のソケット書き込みは
//! 接続ごとの送信タスクが行います。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc::UnboundedSender};

use crate::{
    domain::{ConnectionId, OutboundEvent, Timestamp, Transport},
    infrastructure::dto::websocket::{
        ChatMessageDto, ConnectedMessage, MessageType, PresenceUpdateMessage,
    },
};

/// Client connection information
#[derive(Debug, Clone)]
pub struct ClientInfo {
    /// Message sender channel
    pub sender: UnboundedSender<String>,
    /// Timestamp when the socket was attached
    pub connected_at: Timestamp,
}

/// WebSocket による Transport 実装
#[derive(Default)]
pub struct WebSocketTransport {
    /// 接続中のクライアントの送信チャンネル
    connected_clients: Mutex<HashMap<ConnectionId, ClientInfo>>,
}

impl WebSocketTransport {
    /// 新しい WebSocketTransport を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 接続の送信チャンネルを登録
    ///
    /// 同じ ID が既に登録されている場合は何もせず `false` を返す。
    pub async fn attach(
        &self,
        id: ConnectionId,
        sender: UnboundedSender<String>,
        connected_at: Timestamp,
    ) -> bool {
        let mut clients = self.connected_clients.lock().await;
        if clients.contains_key(&id) {
            return false;
        }
        clients.insert(
            id,
            ClientInfo {
                sender,
                connected_at,
            },
        );
        true
    }

    /// 接続の送信チャンネルを削除
    pub async fn detach(&self, id: &ConnectionId) -> Option<ClientInfo> {
        let mut clients = self.connected_clients.lock().await;
        clients.remove(id)
    }

    /// 接続中のクライアント数を取得
    pub async fn count_connected_clients(&self) -> usize {
        self.connected_clients.lock().await.len()
    }
}

/// Serialize an outbound event to its wire form.
pub fn encode_event(event: &OutboundEvent) -> Result<String, serde_json::Error> {
    match event {
        OutboundEvent::Connected(id) => serde_json::to_string(&ConnectedMessage {
            r#type: MessageType::Connected,
            connection_id: id.as_str().to_string(),
        }),
        OutboundEvent::PresenceUpdate(snapshot) => {
            serde_json::to_string(&PresenceUpdateMessage::from(snapshot))
        }
        OutboundEvent::ChatMessage(delivery) => {
            serde_json::to_string(&ChatMessageDto::from(delivery))
        }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send_to_one(&self, id: &ConnectionId, event: OutboundEvent) {
        let json = match encode_event(&event) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to encode outbound event for '{}': {}", id, e);
                return;
            }
        };

        let clients = self.connected_clients.lock().await;
        match clients.get(id) {
            Some(client_info) => {
                if client_info.sender.send(json).is_err() {
                    tracing::warn!("Failed to send message to client '{}'", id);
                }
            }
            None => {
                tracing::debug!("Discarding event for unknown client '{}'", id);
            }
        }
    }

    async fn send_to_all(&self, event: OutboundEvent) {
        let json = match encode_event(&event) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to encode broadcast event: {}", e);
                return;
            }
        };

        let clients = self.connected_clients.lock().await;
        for (id, client_info) in clients.iter().filter(|(id, _)| event.is_addressed_to(id)) {
            if client_info.sender.send(json.clone()).is_err() {
                tracing::warn!("Failed to send message to client '{}'", id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatMessage, DisplayName, MessageBody, PresenceSnapshot};
    use tokio::sync::mpsc;

    fn id(value: &str) -> ConnectionId {
        ConnectionId::new(value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_attach_rejects_duplicate() {
        // テスト項目: 同じ ID の送信チャンネルは二重登録されない
        // given (前提条件):
        let transport = WebSocketTransport::new();
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();

        // when (操作):
        let first = transport.attach(id("a1"), tx1, Timestamp::new(1)).await;
        let second = transport.attach(id("a1"), tx2, Timestamp::new(2)).await;

        // then (期待する結果):
        assert!(first);
        assert!(!second);
        assert_eq!(transport.count_connected_clients().await, 1);
    }

    #[tokio::test]
    async fn test_send_to_one_reaches_only_that_client() {
        // テスト項目: send_to_one は指定した接続にだけ届く
        // given (前提条件):
        let transport = WebSocketTransport::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        transport.attach(id("a1"), tx_a, Timestamp::new(1)).await;
        transport.attach(id("b1"), tx_b, Timestamp::new(1)).await;

        // when (操作):
        transport
            .send_to_one(&id("b1"), OutboundEvent::Connected(id("b1")))
            .await;

        // then (期待する結果):
        let json: serde_json::Value = serde_json::from_str(&rx_b.try_recv().unwrap()).unwrap();
        assert_eq!(json["type"], "connected");
        assert_eq!(json["connection_id"], "b1");
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_send_to_all_reaches_every_client_once() {
        // テスト項目: send_to_all は全ての接続に 1 回ずつ届く
        // given (前提条件):
        let transport = WebSocketTransport::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        transport.attach(id("a1"), tx_a, Timestamp::new(1)).await;
        transport.attach(id("b1"), tx_b, Timestamp::new(1)).await;
        let delivery = ChatMessage::new(
            MessageBody::Text("hello all".to_string()),
            id("a1"),
            DisplayName::new("Alice"),
            None,
            Timestamp::new(10),
        )
        .into_delivery();

        // when (操作):
        transport
            .send_to_all(OutboundEvent::ChatMessage(delivery))
            .await;

        // then (期待する結果):
        for rx in [&mut rx_a, &mut rx_b] {
            let json: serde_json::Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
            assert_eq!(json["text"], "hello all");
            assert_eq!(json["private"], false);
            assert!(rx.try_recv().is_err());
        }
    }

    #[tokio::test]
    async fn test_send_to_all_skips_clients_not_yet_open() {
        // テスト項目: 送信チャンネルは登録済みでも、Registry に登録される前の接続には
        //            公開メッセージもプレゼンス更新も届かない
        // given (前提条件): b1 はソケットを接続したが、まだ Registry に登録されていない
        let transport = WebSocketTransport::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        transport.attach(id("a1"), tx_a, Timestamp::new(1)).await;
        transport.attach(id("b1"), tx_b, Timestamp::new(1)).await;
        let delivery = ChatMessage::new(
            MessageBody::Text("early".to_string()),
            id("a1"),
            DisplayName::new("Alice"),
            None,
            Timestamp::new(10),
        )
        .into_delivery_for([id("a1")].into_iter().collect());
        let snapshot = PresenceSnapshot {
            revision: 1,
            participants: [(id("a1"), DisplayName::new("Alice"))].into_iter().collect(),
        };

        // when (操作):
        transport
            .send_to_all(OutboundEvent::ChatMessage(delivery))
            .await;
        transport
            .send_to_all(OutboundEvent::PresenceUpdate(snapshot))
            .await;

        // then (期待する結果):
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_send_after_detach_is_discarded() {
        // テスト項目: 切り離した接続への送信は黙って破棄される
        // given (前提条件):
        let transport = WebSocketTransport::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        transport.attach(id("a1"), tx, Timestamp::new(1)).await;

        // when (操作):
        let detached = transport.detach(&id("a1")).await;
        transport
            .send_to_one(
                &id("a1"),
                OutboundEvent::PresenceUpdate(PresenceSnapshot::default()),
            )
            .await;

        // then (期待する結果):
        assert!(detached.is_some());
        assert!(rx.try_recv().is_err());
    }
}
