// store/sweep.rs — Background expiration sweep.
//
// Lazy expiry at access time already hides dead entries from readers; the
// sweep exists to reclaim their memory for sessions nobody touches again.
// It takes the same namespace locks as foreground operations, so a sweep
// and an in-flight read/append on the same key are mutually exclusive.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use super::MailboxStore;

/// Spawn the periodic sweep on a dedicated Tokio background task.
///
/// Call once at startup; the task runs for the life of the process.
pub fn spawn(store: Arc<MailboxStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; skip it so the initial sweep
        // happens one full interval after startup.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let purged = store.sweep().await;
            if purged > 0 {
                debug!(purged, "expiration sweep reclaimed entries");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::model::Message;

    #[tokio::test(start_paused = true)]
    async fn sweep_task_reclaims_abandoned_entries() {
        let ttl = Duration::from_secs(600);
        let store = Arc::new(MailboxStore::new(ttl));
        let _task = spawn(Arc::clone(&store), Duration::from_secs(300));
        // The sweep task must be polled once so its interval timer is
        // registered at t=0, before the paused clock jumps.
        tokio::task::yield_now().await;

        store
            .append_message(
                "s1",
                "bob",
                Message {
                    session_id: String::new(),
                    from: "alice".to_string(),
                    to: Some(vec!["bob".to_string()]),
                    body: "m1".to_string(),
                },
            )
            .await;

        // Two sweep intervals past the TTL — the entry is physically gone,
        // not just hidden by the lazy expiry check.
        tokio::time::advance(ttl + Duration::from_secs(301)).await;
        tokio::task::yield_now().await;

        assert_eq!(store.mailboxes.read().await.len(), 0);
    }
}
