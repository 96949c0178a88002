//! Committed presence snapshots on their way to the broadcaster.
//!
//! The registry pushes every committed snapshot while it still holds its
//! lock, so the channel order is the commit order. A snapshot that is in the
//! outbox is never lost, even if the caller that committed it is cancelled
//! before anything is broadcast.

use tokio::sync::mpsc;

use super::PresenceSnapshot;

/// Read side of the outbox, drained by the broadcaster.
pub type PresenceInbox = mpsc::UnboundedReceiver<PresenceSnapshot>;

/// Write side of the outbox, owned by the registry.
#[derive(Debug, Clone)]
pub struct PresenceOutbox {
    sender: mpsc::UnboundedSender<PresenceSnapshot>,
}

impl PresenceOutbox {
    pub fn channel() -> (Self, PresenceInbox) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Queue a committed snapshot. Never blocks.
    pub fn push(&self, snapshot: PresenceSnapshot) {
        let revision = snapshot.revision;
        if self.sender.send(snapshot).is_err() {
            tracing::warn!(
                "Presence inbox is closed; revision {} will not be broadcast",
                revision
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_commit_order() {
        // テスト項目: 積んだ順にスナップショットを取り出せる
        // given (前提条件):
        let (outbox, mut inbox) = PresenceOutbox::channel();

        // when (操作):
        for revision in 1..=3 {
            outbox.push(PresenceSnapshot {
                revision,
                ..Default::default()
            });
        }

        // then (期待する結果):
        let revisions: Vec<u64> = std::iter::from_fn(|| inbox.try_recv().ok())
            .map(|s| s.revision)
            .collect();
        assert_eq!(revisions, vec![1, 2, 3]);
    }

    #[test]
    fn test_push_after_inbox_dropped_does_not_panic() {
        // テスト項目: 受信側が無くなっても push は失敗を記録するだけ
        // given (前提条件):
        let (outbox, inbox) = PresenceOutbox::channel();
        drop(inbox);

        // when (操作) / then (期待する結果):
        outbox.push(PresenceSnapshot::default());
    }
}
