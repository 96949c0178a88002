//! UseCase: プレゼンス配信（Presence Broadcaster）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - PresenceBroadcaster::flush() / reply() メソッド
//! - Registry が確定したスナップショットがリビジョン順に 1 回ずつ全員へ配信されること
//!
//! ### なぜこのテストが必要か
//! - Registry の変更と配信は別々のタスクから呼ばれ、呼び出し元は途中で abort され得る
//! - 変更を確定したタスクが配信前に abort されても、そのリビジョンが失われたり
//!   後続の配信が止まったりしてはならない
//! - クライアントは最後に受け取ったスナップショットを正とするので、順序の逆転は表示の不整合になる
//!
//! ### どのような状況を想定しているか
//! - 正常系：確定順に積まれたスナップショットをそのまま配信
//! - エッジケース：逆順に積まれた場合もリビジョン順に配信、配信前に abort されたタスクの分は次の flush で配信
//! - 異常系：既に配信済みのリビジョンは破棄

use std::{collections::BTreeMap, sync::Arc};

use tokio::sync::Mutex;

use crate::domain::{ConnectionId, OutboundEvent, PresenceInbox, PresenceSnapshot, Transport};

/// 配信待ちの状態
#[derive(Debug)]
struct PublishState {
    /// Registry が確定したスナップショットの受信口
    inbox: PresenceInbox,
    /// 受信済みで未配信のスナップショット
    pending: BTreeMap<u64, PresenceSnapshot>,
    /// 最後に配信したリビジョン
    last_published: u64,
}

/// プレゼンスのスナップショットを全接続へ配信する
///
/// Registry はスナップショットをロックの内側で Outbox に積む。Broadcaster は
/// `flush` のたびにそれを受け取り、リビジョン順に配信する。欠番を待つことはない。
pub struct PresenceBroadcaster {
    transport: Arc<dyn Transport>,
    state: Mutex<PublishState>,
}

impl PresenceBroadcaster {
    /// 新しい PresenceBroadcaster を作成
    pub fn new(transport: Arc<dyn Transport>, inbox: PresenceInbox) -> Self {
        Self {
            transport,
            state: Mutex::new(PublishState {
                inbox,
                pending: BTreeMap::new(),
                last_published: 0,
            }),
        }
    }

    /// 確定済みで未配信のスナップショットを全て配信
    ///
    /// 途中でキャンセルされても、配信し終えていないスナップショットは残り、
    /// 次の `flush` で配信される。
    pub async fn flush(&self) {
        let mut guard = self.state.lock().await;
        let PublishState {
            inbox,
            pending,
            last_published,
        } = &mut *guard;

        while let Ok(snapshot) = inbox.try_recv() {
            pending.insert(snapshot.revision, snapshot);
        }

        while let Some((&revision, snapshot)) = pending.first_key_value() {
            if revision <= *last_published {
                tracing::warn!(
                    "Discarding stale presence snapshot (revision {}, last published {})",
                    revision,
                    last_published
                );
                pending.remove(&revision);
                continue;
            }

            let snapshot = snapshot.clone();
            tracing::debug!(
                "Publishing presence revision {} ({} online)",
                revision,
                snapshot.len()
            );
            self.transport
                .send_to_all(OutboundEvent::PresenceUpdate(snapshot))
                .await;
            pending.remove(&revision);
            *last_published = revision;
        }
    }

    /// スナップショットを 1 接続だけに返信
    pub async fn reply(&self, requester: &ConnectionId, snapshot: PresenceSnapshot) {
        self.transport
            .send_to_one(requester, OutboundEvent::PresenceUpdate(snapshot))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ConnectionRegistry, DisplayName, MockTransport, PresenceOutbox},
        infrastructure::repository::InMemoryConnectionRegistry,
        usecase::{ConnectParticipantUseCase, RegisterNameUseCase},
    };
    use mockall::Sequence;

    fn id(value: &str) -> ConnectionId {
        ConnectionId::new(value.to_string()).unwrap()
    }

    fn snapshot(revision: u64, ids: &[&str]) -> PresenceSnapshot {
        PresenceSnapshot {
            revision,
            participants: ids
                .iter()
                .map(|value| (id(value), DisplayName::default()))
                .collect(),
        }
    }

    fn expect_revision(transport: &mut MockTransport, seq: &mut Sequence, revision: u64) {
        transport
            .expect_send_to_all()
            .withf(move |event| {
                matches!(event, OutboundEvent::PresenceUpdate(s) if s.revision == revision)
            })
            .times(1)
            .in_sequence(seq)
            .return_const(());
    }

    #[tokio::test]
    async fn test_flush_in_commit_order() {
        // テスト項目: 確定順に積まれたスナップショットはそのまま全員へ配信される
        // given (前提条件):
        let mut transport = MockTransport::new();
        let mut seq = Sequence::new();
        expect_revision(&mut transport, &mut seq, 1);
        expect_revision(&mut transport, &mut seq, 2);
        let (outbox, inbox) = PresenceOutbox::channel();
        let broadcaster = PresenceBroadcaster::new(Arc::new(transport), inbox);

        // when (操作):
        outbox.push(snapshot(1, &["a1"]));
        broadcaster.flush().await;
        outbox.push(snapshot(2, &["a1", "b1"]));
        broadcaster.flush().await;

        // then (期待する結果): MockTransport の期待値（回数と順序）で検証
    }

    #[tokio::test]
    async fn test_flush_out_of_order_is_sent_in_revision_order() {
        // テスト項目: 逆順に積まれたスナップショットもリビジョン順に配信される
        // given (前提条件):
        let mut transport = MockTransport::new();
        let mut seq = Sequence::new();
        expect_revision(&mut transport, &mut seq, 1);
        expect_revision(&mut transport, &mut seq, 2);
        expect_revision(&mut transport, &mut seq, 3);
        let (outbox, inbox) = PresenceOutbox::channel();
        let broadcaster = PresenceBroadcaster::new(Arc::new(transport), inbox);

        // when (操作): 3, 1, 2 の順で積まれる
        outbox.push(snapshot(3, &["a1", "b1", "c1"]));
        outbox.push(snapshot(1, &["a1"]));
        outbox.push(snapshot(2, &["a1", "b1"]));
        broadcaster.flush().await;

        // then (期待する結果): 1, 2, 3 の順で配信される（MockTransport の Sequence で検証）
    }

    #[tokio::test]
    async fn test_flush_stale_revision_is_discarded() {
        // テスト項目: 配信済みのリビジョンが再度届いても二重配信しない
        // given (前提条件):
        let mut transport = MockTransport::new();
        transport.expect_send_to_all().times(1).return_const(());
        let (outbox, inbox) = PresenceOutbox::channel();
        let broadcaster = PresenceBroadcaster::new(Arc::new(transport), inbox);
        outbox.push(snapshot(1, &["a1"]));
        broadcaster.flush().await;

        // when (操作):
        outbox.push(snapshot(1, &["a1"]));
        broadcaster.flush().await;

        // then (期待する結果): send_to_all は 1 回だけ
    }

    #[tokio::test]
    async fn test_flush_with_nothing_committed_sends_nothing() {
        // テスト項目: 積まれたものが無ければ何も配信しない
        // given (前提条件):
        let mut transport = MockTransport::new();
        transport.expect_send_to_all().times(0);
        let (_outbox, inbox) = PresenceOutbox::channel();
        let broadcaster = PresenceBroadcaster::new(Arc::new(transport), inbox);

        // when (操作):
        broadcaster.flush().await;

        // then (期待する結果): MockTransport の期待値で検証
    }

    #[tokio::test]
    async fn test_commit_aborted_before_publish_is_still_broadcast() {
        // テスト項目: 名前の変更を確定したタスクが配信前に abort されても、
        //            そのリビジョンは次の配信で順番通りに届き、以降の配信も止まらない
        // given (前提条件):
        let mut transport = MockTransport::new();
        let mut seq = Sequence::new();
        expect_revision(&mut transport, &mut seq, 1);
        transport
            .expect_send_to_all()
            .withf(|event| {
                matches!(event, OutboundEvent::PresenceUpdate(s)
                    if s.revision == 2
                        && s.display_name(&id("a1")).is_some_and(|n| n.as_str() == "Alice"))
            })
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        expect_revision(&mut transport, &mut seq, 3);

        let (outbox, inbox) = PresenceOutbox::channel();
        let registry = Arc::new(InMemoryConnectionRegistry::new(outbox));
        let broadcaster = Arc::new(PresenceBroadcaster::new(Arc::new(transport), inbox));
        let connect = ConnectParticipantUseCase::new(registry.clone(), broadcaster.clone());
        connect.execute(id("a1")).await.unwrap();

        // 別の配信が進行中の状態を作る
        let in_flight = broadcaster.state.lock().await;

        // when (操作): 名前の変更が確定した直後、配信を待っている間に abort される
        let register = RegisterNameUseCase::new(registry.clone(), broadcaster.clone());
        let task = tokio::spawn(async move { register.execute(&id("a1"), Some("Alice")).await });
        while registry.snapshot().await.revision < 2 {
            tokio::task::yield_now().await;
        }
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());
        drop(in_flight);

        connect.execute(id("b1")).await.unwrap();

        // then (期待する結果): 1, 2, 3 が順に 1 回ずつ配信され、保留は残らない
        let state = broadcaster.state.lock().await;
        assert_eq!(state.last_published, 3);
        assert!(state.pending.is_empty());
    }

    #[tokio::test]
    async fn test_reply_goes_to_requester_only() {
        // テスト項目: reply は要求した接続にだけ送られる
        // given (前提条件):
        let mut transport = MockTransport::new();
        transport.expect_send_to_all().times(0);
        transport
            .expect_send_to_one()
            .withf(|id, event| {
                id.as_str() == "b1"
                    && matches!(event, OutboundEvent::PresenceUpdate(s) if s.len() == 2)
            })
            .times(1)
            .return_const(());
        let (_outbox, inbox) = PresenceOutbox::channel();
        let broadcaster = PresenceBroadcaster::new(Arc::new(transport), inbox);

        // when (操作):
        broadcaster
            .reply(&id("b1"), snapshot(2, &["a1", "b1"]))
            .await;

        // then (期待する結果): MockTransport の期待値で検証
    }
}
