//! UseCase: メッセージ配送処理（Message Router）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RouteMessageUseCase::execute() メソッド
//! - 種別の検証、送信者情報の付与、配送範囲（公開 / 厳格な個別）の決定
//!
//! ### なぜこのテストが必要か
//! - 個別メッセージが宛先と送信者以外に漏れないことを保証する
//! - 送信者には必ず自分のコピー（エコー）が届くことを保証する
//! - 不正な種別のメッセージは誰にも配送されないことを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：公開メッセージ、個別メッセージ、ファイル参照
//! - エッジケース：存在しない宛先、自分宛て、空白の宛先
//! - 異常系：不正な種別、参照のないファイルメッセージ

use std::sync::Arc;

use crate::{
    common::clock::MessageClock,
    domain::{
        ChatMessage, ConnectionId, ConnectionRegistry, FileReference, MessageBody, MessageKind,
        OutboundEvent, RoutingError, Timestamp, Transport,
    },
};

/// クライアントから届いたままのチャットメッセージ
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawChatMessage {
    pub kind: String,
    pub text: Option<String>,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub target_id: Option<String>,
}

impl RawChatMessage {
    /// 種別を検証し、本文を確定する
    ///
    /// テキストが無いテキストメッセージは空文字として扱う。
    /// ファイル参照の無いファイルメッセージは種別と本文が一致しないので拒否する。
    fn resolve_body(&mut self) -> Result<MessageBody, RoutingError> {
        match MessageKind::try_from(self.kind.as_str())? {
            MessageKind::Text => Ok(MessageBody::Text(self.text.take().unwrap_or_default())),
            MessageKind::File => {
                let url = self.file_url.take().unwrap_or_default();
                FileReference::new(url, self.file_name.take())
                    .map(MessageBody::FileReference)
                    .map_err(|_| RoutingError::InvalidMessageKind(self.kind.clone()))
            }
        }
    }

    /// 宛先の指定（空白のみは指定なし）
    fn target(&self) -> Option<&str> {
        self.target_id
            .as_deref()
            .map(str::trim)
            .filter(|target| !target.is_empty())
    }
}

/// 配送結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// 全接続へ配送
    Public { timestamp: Timestamp },
    /// 宛先と送信者にだけ配送
    Private {
        timestamp: Timestamp,
        /// 実際に send_to_one した接続（宛先が居なければ送信者のみ）
        recipients: Vec<ConnectionId>,
    },
}

/// メッセージ配送のユースケース
pub struct RouteMessageUseCase {
    /// Registry（データアクセス層の抽象化）
    registry: Arc<dyn ConnectionRegistry>,
    /// Transport（配送の抽象化）
    transport: Arc<dyn Transport>,
    /// 受信時刻の採番
    clock: Arc<MessageClock>,
}

impl RouteMessageUseCase {
    /// 新しい RouteMessageUseCase を作成
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        transport: Arc<dyn Transport>,
        clock: Arc<MessageClock>,
    ) -> Self {
        Self {
            registry,
            transport,
            clock,
        }
    }

    /// メッセージ配送を実行
    ///
    /// # Arguments
    ///
    /// * `sender_id` - 送信元の接続 ID（クライアントの自己申告ではなく Transport 層の ID）
    /// * `raw` - クライアントから届いたメッセージ
    ///
    /// # Returns
    ///
    /// * `Ok(RouteOutcome)` - 配送範囲と配送先
    /// * `Err(RoutingError::InvalidMessageKind)` - 拒否（誰にも配送しない）
    pub async fn execute(
        &self,
        sender_id: &ConnectionId,
        mut raw: RawChatMessage,
    ) -> Result<RouteOutcome, RoutingError> {
        // 1. 検証
        let body = raw.resolve_body()?;

        // 2. 送信者情報と時刻の付与
        let timestamp = self.clock.now();
        let sender_name = self.registry.lookup(sender_id).await.unwrap_or_default();

        // 3. 配送範囲の決定
        let Some(target) = raw.target() else {
            // 配送時点で接続中の相手だけに届ける
            let audience = self.registry.snapshot().await.participants.into_keys().collect();
            let delivery =
                ChatMessage::new(body, sender_id.clone(), sender_name, None, timestamp)
                    .into_delivery_for(audience);
            self.transport
                .send_to_all(OutboundEvent::ChatMessage(delivery))
                .await;
            return Ok(RouteOutcome::Public { timestamp });
        };

        // 宛先は空白を除いているので必ず ID として成立する
        let target_id = ConnectionId::try_from(target)
            .map_err(|_| RoutingError::MissingPrivateTarget(target.to_string()))?;
        let delivery = ChatMessage::new(
            body,
            sender_id.clone(),
            sender_name,
            Some(target_id.clone()),
            timestamp,
        )
        .into_delivery();

        let mut recipients = Vec::with_capacity(2);
        if &target_id == sender_id {
            // 自分宛ては 1 通だけ
        } else if self.registry.exists(&target_id).await {
            self.transport
                .send_to_one(&target_id, OutboundEvent::ChatMessage(delivery.clone()))
                .await;
            recipients.push(target_id);
        } else {
            tracing::debug!(
                "{}; delivering sender echo only",
                RoutingError::MissingPrivateTarget(target_id.into_string())
            );
        }

        // 4. 送信者へのエコー（宛先の有無に関わらず必ず）
        self.transport
            .send_to_one(sender_id, OutboundEvent::ChatMessage(delivery))
            .await;
        recipients.push(sender_id.clone());

        Ok(RouteOutcome::Private {
            timestamp,
            recipients,
        })
    }
}
