use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use director::{
    config::RelayConfig,
    relay::Relay,
    rest,
    store::{sweep, MailboxStore},
    AppContext,
};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "director",
    about = "Transient in-memory message relay for threshold-signature sessions",
    version
)]
struct Args {
    /// Path to a TOML config file (all fields optional)
    #[arg(long, env = "DIRECTOR_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// Bind address for the HTTP server (default: 127.0.0.1; use 0.0.0.0 for LAN access)
    #[arg(long, env = "DIRECTOR_BIND")]
    bind_address: Option<String>,

    /// HTTP listen port
    #[arg(long, env = "DIRECTOR_PORT")]
    port: Option<u16>,

    /// Maximum request body size in bytes
    #[arg(long, env = "DIRECTOR_MAX_BODY_BYTES")]
    max_body_bytes: Option<usize>,

    /// Entry time-to-live in seconds, relative to last write
    #[arg(long, env = "DIRECTOR_TTL_SECS")]
    ttl_secs: Option<u64>,

    /// Expiration sweep interval in seconds
    #[arg(long, env = "DIRECTOR_SWEEP_INTERVAL_SECS")]
    sweep_interval_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "DIRECTOR_LOG")]
    log: Option<String>,

    /// Log format: compact or json
    #[arg(long, env = "DIRECTOR_LOG_FORMAT", default_value = "compact")]
    log_format: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = args.log.clone().unwrap_or_else(|| "info".to_string());
    setup_logging(&log_level, &args.log_format);

    let mut config = RelayConfig::load(args.config.as_deref())?;
    config.apply_overrides(
        args.bind_address,
        args.port,
        args.max_body_bytes,
        args.ttl_secs,
        args.sweep_interval_secs,
    );
    config.validate()?;

    let store = Arc::new(MailboxStore::new(config.ttl()));
    sweep::spawn(Arc::clone(&store), config.sweep_interval());
    let relay = Arc::new(Relay::new(Arc::clone(&store)));

    info!(
        ttl_secs = config.ttl_secs,
        sweep_interval_secs = config.sweep_interval().as_secs(),
        "director starting"
    );

    let ctx = Arc::new(AppContext {
        config: Arc::new(config),
        store,
        relay,
        started_at: std::time::Instant::now(),
    });

    rest::serve(ctx).await
}

fn setup_logging(log_level: &str, log_format: &str) {
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(log_level)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(log_level)
            .compact()
            .init();
    }
}
