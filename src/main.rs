//! tabwatchd: reports browser tab-group session changes to a local
//! tracking daemon.
//!
//! Runs as the browser's native-messaging companion. A thin shim inside
//! the browser forwards window-focus events and answers tab, group, and
//! identity lookups over stdin/stdout; this process resolves each focus
//! event to a session value (the focused window's first tab-group
//! title) and POSTs every real transition to the daemon, exactly once,
//! best-effort.

mod host;
mod notifier;
mod reporter;
mod resolver;
mod session;
#[cfg(test)]
mod testutil;
mod tracker;

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::host::stdio::StdioHost;
use crate::reporter::http::{DEFAULT_ENDPOINT, HttpReporter};
use crate::tracker::{SessionTracker, TrackerConfig};

#[derive(Debug, Parser)]
#[command(
    name = "tabwatchd",
    about = "Reports browser tab-group session changes to a local tracking daemon"
)]
struct Cli {
    /// Base URL of the tracking daemon.
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Upper bound on each host lookup, in seconds. A lookup running
    /// past this counts as failed and the window reports as "unnamed".
    #[arg(long, default_value_t = 10)]
    lookup_timeout_secs: u64,

    /// Log filter in tracing env-filter syntax. RUST_LOG takes
    /// precedence when set.
    #[arg(long, default_value = "info")]
    log_filter: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // stdout carries the native-messaging protocol; logs must go to
    // stderr or the shim would try to parse them as frames.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let reporter = HttpReporter::new(&cli.endpoint);
    let (host, focus) = StdioHost::attach(tokio::io::stdin(), tokio::io::stdout());
    let tracker = SessionTracker::new(
        host,
        reporter,
        TrackerConfig {
            lookup_timeout: Duration::from_secs(cli.lookup_timeout_secs),
        },
    );

    tracing::info!(endpoint = %cli.endpoint, "tabwatchd started");
    tracker.run(focus).await;
    tracing::info!("host connection closed, exiting");
}
