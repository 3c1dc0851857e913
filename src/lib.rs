pub mod config;
pub mod relay;
pub mod rest;
pub mod store;

use std::sync::Arc;

use config::RelayConfig;
use relay::Relay;
use store::MailboxStore;

/// Shared application state passed to every request handler and background task.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<RelayConfig>,
    pub store: Arc<MailboxStore>,
    pub relay: Arc<Relay>,
    pub started_at: std::time::Instant,
}
