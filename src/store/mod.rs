// store/mod.rs — Concurrent TTL-expiring session/mailbox store.
//
// Two physically separate maps so a session ID can never collide with a
// synthesized mailbox key: `sessions` holds each session's participant list,
// `mailboxes` holds the per-(session, participant) buffered message queue.
// Every entry carries its own deadline, refreshed on write only — reads do
// not slide expiration.

pub mod sweep;

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::relay::model::Message;

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A live (non-expired) entry already occupies the key. `set_session` is
    /// create-only — it never overwrites an in-flight session.
    #[error("entry already exists")]
    AlreadyExists,
    #[error("entry not found")]
    NotFound,
}

// ─── Keys & entries ──────────────────────────────────────────────────────────

/// Composite key for a participant's mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MailboxKey {
    session_id: String,
    participant_id: String,
}

impl MailboxKey {
    fn new(session_id: &str, participant_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            participant_id: participant_id.to_string(),
        }
    }
}

/// A stored value plus its absolute expiration deadline.
struct Entry<T> {
    value: T,
    /// Expires when `Instant::now() >= deadline`. Set on insert, refreshed on
    /// every write to the entry, never on read.
    deadline: Instant,
}

impl<T> Entry<T> {
    fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            deadline: Instant::now() + ttl,
        }
    }

    fn expired(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

// ─── MailboxStore ────────────────────────────────────────────────────────────

/// In-memory store for sessions and per-participant mailboxes.
///
/// All operations take the namespace lock for the duration of the lookup, so
/// the deadline comparison is atomic with the access — an entry that expired
/// a microsecond ago is indistinguishable from one that was deleted, and a
/// sweep can never turn a committed write into a spurious not-found.
pub struct MailboxStore {
    ttl: Duration,
    sessions: RwLock<HashMap<String, Entry<Vec<String>>>>,
    mailboxes: RwLock<HashMap<MailboxKey, Entry<Vec<Message>>>>,
}

impl MailboxStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
            mailboxes: RwLock::new(HashMap::new()),
        }
    }

    // ── Sessions ─────────────────────────────────────────────────────────────

    /// Create a session with its participant list. Fails with `AlreadyExists`
    /// if a live entry for `session_id` is present; an expired leftover is
    /// replaced as if it had already been swept.
    pub async fn set_session(
        &self,
        session_id: &str,
        participants: Vec<String>,
    ) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        if let Some(entry) = sessions.get(session_id) {
            if !entry.expired() {
                return Err(StoreError::AlreadyExists);
            }
        }
        sessions.insert(session_id.to_string(), Entry::new(participants, self.ttl));
        Ok(())
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Vec<String>, StoreError> {
        let sessions = self.sessions.read().await;
        match sessions.get(session_id) {
            Some(entry) if !entry.expired() => Ok(entry.value.clone()),
            _ => Err(StoreError::NotFound),
        }
    }

    /// Idempotent — deleting an absent session is not an error.
    pub async fn delete_session(&self, session_id: &str) {
        self.sessions.write().await.remove(session_id);
    }

    // ── Mailboxes ────────────────────────────────────────────────────────────

    /// Return the buffered sequence for a recipient, in arrival order,
    /// leaving the mailbox in place.
    pub async fn get_mailbox(
        &self,
        session_id: &str,
        participant_id: &str,
    ) -> Result<Vec<Message>, StoreError> {
        let mailboxes = self.mailboxes.read().await;
        match mailboxes.get(&MailboxKey::new(session_id, participant_id)) {
            Some(entry) if !entry.expired() => Ok(entry.value.clone()),
            _ => Err(StoreError::NotFound),
        }
    }

    /// Remove and return the buffered sequence in one atomic step. This is
    /// what delete-on-read builds on: no append can land between the read
    /// and the delete, so the caller sees a consistent snapshot. `None`
    /// means there was no live mailbox to drain.
    pub async fn take_mailbox(
        &self,
        session_id: &str,
        participant_id: &str,
    ) -> Option<Vec<Message>> {
        let mut mailboxes = self.mailboxes.write().await;
        match mailboxes.remove(&MailboxKey::new(session_id, participant_id)) {
            Some(entry) if !entry.expired() => Some(entry.value),
            _ => None,
        }
    }

    /// Append a message to a recipient's mailbox, creating it if absent.
    /// Refreshes the entry's TTL (write-relative expiration). Never fails —
    /// there is no per-mailbox size cap.
    pub async fn append_message(&self, session_id: &str, participant_id: &str, message: Message) {
        let mut mailboxes = self.mailboxes.write().await;
        let key = MailboxKey::new(session_id, participant_id);
        match mailboxes.get_mut(&key) {
            Some(entry) if !entry.expired() => {
                entry.value.push(message);
                entry.deadline = Instant::now() + self.ttl;
            }
            _ => {
                mailboxes.insert(key, Entry::new(vec![message], self.ttl));
            }
        }
    }

    /// Idempotent — deleting an absent mailbox is not an error.
    pub async fn delete_mailbox(&self, session_id: &str, participant_id: &str) {
        self.mailboxes
            .write()
            .await
            .remove(&MailboxKey::new(session_id, participant_id));
    }

    // ── Maintenance ──────────────────────────────────────────────────────────

    /// Purge every expired entry in both namespaces. Returns the number of
    /// entries removed. Runs under the same locks as foreground operations.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut purged = 0;
        {
            let mut sessions = self.sessions.write().await;
            let before = sessions.len();
            sessions.retain(|_, entry| entry.deadline > now);
            purged += before - sessions.len();
        }
        {
            let mut mailboxes = self.mailboxes.write().await;
            let before = mailboxes.len();
            mailboxes.retain(|_, entry| entry.deadline > now);
            purged += before - mailboxes.len();
        }
        purged
    }

    /// Live session count (expired-but-unswept entries excluded).
    pub async fn session_count(&self) -> usize {
        self.sessions
            .read()
            .await
            .values()
            .filter(|e| !e.expired())
            .count()
    }

    /// Live mailbox count (expired-but-unswept entries excluded).
    pub async fn mailbox_count(&self) -> usize {
        self.mailboxes
            .read()
            .await
            .values()
            .filter(|e| !e.expired())
            .count()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(600);

    fn msg(from: &str, body: &str) -> Message {
        Message {
            session_id: String::new(),
            from: from.to_string(),
            to: Some(vec![]),
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn session_roundtrip_preserves_order() {
        let store = MailboxStore::new(TTL);
        let participants = vec!["carol".to_string(), "alice".to_string(), "bob".to_string()];
        store.set_session("s1", participants.clone()).await.unwrap();
        assert_eq!(store.get_session("s1").await.unwrap(), participants);
    }

    #[tokio::test]
    async fn set_session_is_create_only() {
        let store = MailboxStore::new(TTL);
        store
            .set_session("s1", vec!["alice".to_string()])
            .await
            .unwrap();
        let err = store
            .set_session("s1", vec!["mallory".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::AlreadyExists);
        // First writer's membership is untouched.
        assert_eq!(store.get_session("s1").await.unwrap(), vec!["alice"]);
    }

    #[tokio::test]
    async fn delete_session_is_idempotent() {
        let store = MailboxStore::new(TTL);
        store.delete_session("never-created").await;
        store
            .set_session("s1", vec!["alice".to_string()])
            .await
            .unwrap();
        store.delete_session("s1").await;
        store.delete_session("s1").await;
        assert_eq!(store.get_session("s1").await, Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn append_creates_mailbox_and_keeps_fifo_order() {
        let store = MailboxStore::new(TTL);
        assert_eq!(
            store.get_mailbox("s1", "bob").await,
            Err(StoreError::NotFound)
        );
        store.append_message("s1", "bob", msg("alice", "m1")).await;
        store.append_message("s1", "bob", msg("carol", "m2")).await;
        store.append_message("s1", "bob", msg("alice", "m3")).await;
        let bodies: Vec<String> = store
            .get_mailbox("s1", "bob")
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.body)
            .collect();
        assert_eq!(bodies, vec!["m1", "m2", "m3"]);
    }

    #[tokio::test]
    async fn take_mailbox_drains_atomically() {
        let store = MailboxStore::new(TTL);
        store.append_message("s1", "bob", msg("alice", "m1")).await;
        let taken = store.take_mailbox("s1", "bob").await.unwrap();
        assert_eq!(taken.len(), 1);
        assert_eq!(store.take_mailbox("s1", "bob").await, None);
    }

    #[tokio::test]
    async fn delete_mailbox_is_idempotent() {
        let store = MailboxStore::new(TTL);
        store.delete_mailbox("s1", "bob").await;
        store.append_message("s1", "bob", msg("alice", "m1")).await;
        store.delete_mailbox("s1", "bob").await;
        store.delete_mailbox("s1", "bob").await;
        assert_eq!(
            store.get_mailbox("s1", "bob").await,
            Err(StoreError::NotFound)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_are_absent_even_before_a_sweep() {
        let store = MailboxStore::new(TTL);
        store
            .set_session("s1", vec!["alice".to_string()])
            .await
            .unwrap();
        store.append_message("s1", "alice", msg("bob", "m1")).await;

        tokio::time::advance(TTL + Duration::from_secs(1)).await;

        assert_eq!(store.get_session("s1").await, Err(StoreError::NotFound));
        assert_eq!(
            store.get_mailbox("s1", "alice").await,
            Err(StoreError::NotFound)
        );
        assert_eq!(store.take_mailbox("s1", "alice").await, None);
        assert_eq!(store.session_count().await, 0);
        assert_eq!(store.mailbox_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_session_slot_can_be_reused() {
        let store = MailboxStore::new(TTL);
        store
            .set_session("s1", vec!["alice".to_string()])
            .await
            .unwrap();
        tokio::time::advance(TTL + Duration::from_secs(1)).await;
        // The dead entry must not block a fresh create.
        store
            .set_session("s1", vec!["bob".to_string()])
            .await
            .unwrap();
        assert_eq!(store.get_session("s1").await.unwrap(), vec!["bob"]);
    }

    #[tokio::test(start_paused = true)]
    async fn writes_refresh_the_ttl_but_reads_do_not() {
        let store = MailboxStore::new(TTL);
        store.append_message("s1", "bob", msg("alice", "m1")).await;

        // Just before expiry, another write lands and refreshes the deadline.
        tokio::time::advance(TTL - Duration::from_secs(1)).await;
        store.append_message("s1", "bob", msg("alice", "m2")).await;

        // A read inside the refreshed window must not extend it further.
        tokio::time::advance(TTL - Duration::from_secs(1)).await;
        assert_eq!(store.get_mailbox("s1", "bob").await.unwrap().len(), 2);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(
            store.get_mailbox("s1", "bob").await,
            Err(StoreError::NotFound)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_purges_only_expired_entries() {
        let store = MailboxStore::new(TTL);
        store
            .set_session("old", vec!["alice".to_string()])
            .await
            .unwrap();
        store.append_message("old", "alice", msg("bob", "m1")).await;

        tokio::time::advance(TTL + Duration::from_secs(1)).await;
        store
            .set_session("fresh", vec!["carol".to_string()])
            .await
            .unwrap();

        assert_eq!(store.sweep().await, 2);
        assert_eq!(store.sweep().await, 0);
        assert!(store.get_session("fresh").await.is_ok());
    }

    #[tokio::test]
    async fn concurrent_appends_lose_no_messages() {
        let store = std::sync::Arc::new(MailboxStore::new(TTL));
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = std::sync::Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .append_message("s1", "bob", msg("alice", &format!("m{i}")))
                    .await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.get_mailbox("s1", "bob").await.unwrap().len(), 32);
    }
}
