// relay/mod.rs — Session lifecycle and message-routing rules on top of
// MailboxStore. The transport layer translates these outcomes to status
// codes; no routing decision lives outside this module.

pub mod model;

use std::sync::Arc;

use tracing::{debug, info};

use crate::store::{MailboxStore, StoreError};
use self::model::Message;

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Blank identifier or malformed/missing request field. The caller can
    /// recover by correcting the request; the relay never retries.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// A live session with this ID already exists.
    #[error("session already exists")]
    Conflict,
    /// The session (or required entry) is absent. Distinct from a mailbox
    /// that is simply empty, which is a normal empty result.
    #[error("session not found")]
    NotFound,
    /// Store-level failure during a multi-step operation. No partial-success
    /// signaling; retry policy is the caller's concern.
    #[error("store failure: {0}")]
    Internal(String),
}

// ─── Relay ───────────────────────────────────────────────────────────────────

/// The four-operation relay protocol.
pub struct Relay {
    store: Arc<MailboxStore>,
}

impl Relay {
    pub fn new(store: Arc<MailboxStore>) -> Self {
        Self { store }
    }

    /// Create a session with a fixed membership list.
    ///
    /// The list is stored verbatim — no dedup, no shape validation — because
    /// fan-out semantics depend on exactly what the creator supplied.
    pub async fn start_session(
        &self,
        session_id: &str,
        participants: Vec<String>,
    ) -> Result<(), RelayError> {
        require_id(session_id, "blank session ID")?;
        match self.store.set_session(session_id, participants).await {
            Ok(()) => {
                info!(session_id, "session started");
                Ok(())
            }
            Err(StoreError::AlreadyExists) => Err(RelayError::Conflict),
            // A create-only insert has no other failure mode.
            Err(e @ StoreError::NotFound) => Err(RelayError::Internal(e.to_string())),
        }
    }

    /// Tear down a session: delete every member's mailbox, then the session
    /// entry itself. The session is only removed once all mailbox deletions
    /// have gone through, so a failure never leaves an orphaned membership
    /// pointing at live mailboxes.
    pub async fn end_session(&self, session_id: &str) -> Result<(), RelayError> {
        require_id(session_id, "blank session ID")?;
        let participants = self
            .store
            .get_session(session_id)
            .await
            .map_err(|_| RelayError::NotFound)?;
        for participant_id in &participants {
            self.store.delete_mailbox(session_id, participant_id).await;
        }
        self.store.delete_session(session_id).await;
        info!(session_id, participants = participants.len(), "session ended");
        Ok(())
    }

    /// Drain a participant's mailbox: the full buffered sequence is returned
    /// and the mailbox is deleted in one atomic step (at-most-once delivery).
    /// An absent mailbox on a live session is a normal empty result.
    pub async fn get_messages(
        &self,
        session_id: &str,
        participant_id: &str,
    ) -> Result<Vec<Message>, RelayError> {
        require_id(session_id, "blank session ID")?;
        require_id(participant_id, "blank participant ID")?;
        self.store
            .get_session(session_id)
            .await
            .map_err(|_| RelayError::NotFound)?;
        match self.store.take_mailbox(session_id, participant_id).await {
            Some(messages) => {
                debug!(
                    session_id,
                    participant_id,
                    count = messages.len(),
                    "mailbox drained"
                );
                Ok(messages)
            }
            // No mailbox means nothing is waiting yet, not an error.
            None => Ok(Vec::new()),
        }
    }

    /// Fan a message out to every addressed recipient that is a current
    /// session member. Non-member recipients are silently dropped — a
    /// deliberate filter, not a validation failure — so the call succeeds
    /// even when the filtered recipient set ends up empty.
    pub async fn post_message(
        &self,
        session_id: &str,
        message: Message,
    ) -> Result<(), RelayError> {
        require_id(session_id, "blank session ID")?;
        let Some(recipients) = message.to.clone() else {
            return Err(RelayError::InvalidInput("missing recipient list"));
        };
        let participants = self
            .store
            .get_session(session_id)
            .await
            .map_err(|_| RelayError::NotFound)?;
        for participant_id in &recipients {
            if !participants.iter().any(|p| p == participant_id) {
                debug!(session_id, participant_id, "recipient not in session, dropped");
                continue;
            }
            self.store
                .append_message(session_id, participant_id, message.clone())
                .await;
        }
        Ok(())
    }
}

fn require_id(id: &str, what: &'static str) -> Result<(), RelayError> {
    if id.trim().is_empty() {
        return Err(RelayError::InvalidInput(what));
    }
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
