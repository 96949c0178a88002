//! Shared fixtures for integration tests.
//!
//! `TestServer` runs the router in-process on an ephemeral port, and
//! `WsClient` wraps a tokio-tungstenite connection with JSON helpers.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use kehai_server::ui::{serve, state::AppState};
use serde_json::Value;
use tokio::{
    net::{TcpListener, TcpStream},
    sync::oneshot,
};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local addr");
        let (tx, rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let shutdown = async {
                let _ = rx.await;
            };
            if let Err(e) = serve(listener, Arc::new(AppState::new()), shutdown).await {
                eprintln!("test server error: {e}");
            }
        });

        Self {
            addr,
            shutdown: Some(tx),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Open a WebSocket session and consume its `connected` event.
    pub async fn connect(&self) -> WsClient {
        let (stream, _) = connect_async(self.ws_url())
            .await
            .expect("Failed to connect WebSocket");
        let mut client = WsClient {
            stream,
            connection_id: String::new(),
        };
        let connected = client.recv_json().await;
        assert_eq!(connected["type"], "connected");
        client.connection_id = connected["connection_id"]
            .as_str()
            .expect("connection_id should be a string")
            .to_string();
        client
    }

    pub async fn presence(&self) -> Value {
        reqwest::get(format!("{}/api/presence", self.base_url()))
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    pub connection_id: String,
}

impl WsClient {
    pub async fn send_json(&mut self, value: Value) {
        self.stream
            .send(Message::Text(value.to_string().into()))
            .await
            .expect("Failed to send frame");
    }

    pub async fn send_raw(&mut self, text: &str) {
        self.stream
            .send(Message::Text(text.to_string().into()))
            .await
            .expect("Failed to send frame");
    }

    /// Next JSON text frame, failing the test after a timeout.
    pub async fn recv_json(&mut self) -> Value {
        loop {
            let msg = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .expect("Timed out waiting for a frame")
                .expect("Stream closed")
                .expect("WebSocket error");
            if let Message::Text(text) = msg {
                return serde_json::from_str(text.as_str()).expect("Frame is not JSON");
            }
        }
    }

    /// Skip frames until one of the given type arrives.
    pub async fn recv_type(&mut self, ty: &str) -> Value {
        loop {
            let value = self.recv_json().await;
            if value["type"] == ty {
                return value;
            }
        }
    }

    /// Skip frames until a presence update satisfying `predicate` arrives.
    pub async fn recv_presence_where(&mut self, predicate: impl Fn(&Value) -> bool) -> Value {
        loop {
            let value = self.recv_type("presence-update").await;
            if predicate(&value) {
                return value;
            }
        }
    }

    /// Skip frames until the presence update lists exactly `count` participants.
    pub async fn recv_presence_count(&mut self, count: usize) -> Value {
        self.recv_presence_where(|v| {
            v["participants"].as_object().map(|p| p.len()) == Some(count)
        })
        .await
    }

    pub async fn register(&mut self, name: &str) {
        self.send_json(serde_json::json!({"type": "register", "name": name}))
            .await;
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}
