//! Window focus tracking: focus events in, tagged resolutions out.
//!
//! Each focus-change event opens a new resolution generation. Chains
//! run as spawned tasks and may finish out of order; nothing is ever
//! cancelled, a superseded chain simply computes a result that the
//! notifier then refuses.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::host::{FocusEvents, HostBrowser};
use crate::notifier::ChangeNotifier;
use crate::reporter::Reporter;
use crate::resolver;

/// Default bound on each host lookup step.
const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Tracker tuning knobs.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Upper bound on each individual host lookup. A lookup running
    /// past this is treated as failed and the resolution degrades to
    /// the unnamed session.
    pub lookup_timeout: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }
}

/// Drives session resolution from the host's focus-change events.
///
/// Owns the generation counter: incremented before each resolution
/// starts, so at any moment exactly one generation is current and every
/// older in-flight chain is already doomed to be discarded on arrival.
pub struct SessionTracker<H, R> {
    host: Arc<H>,
    notifier: Arc<ChangeNotifier<H, R>>,
    generation: Arc<AtomicU64>,
    lookup_timeout: Duration,
}

impl<H, R> SessionTracker<H, R>
where
    H: HostBrowser + 'static,
    R: Reporter + 'static,
{
    pub fn new(host: Arc<H>, reporter: R, config: TrackerConfig) -> Self {
        let generation = Arc::new(AtomicU64::new(0));
        let notifier = Arc::new(ChangeNotifier::new(
            Arc::clone(&host),
            reporter,
            Arc::clone(&generation),
            config.lookup_timeout,
        ));
        Self {
            host,
            notifier,
            generation,
            lookup_timeout: config.lookup_timeout,
        }
    }

    /// Start a resolution chain for a focus-change event.
    ///
    /// Increments the generation counter first, then spawns the chain
    /// tagged with the new value. Returns immediately; the result, if
    /// still current on arrival, reaches the daemon through the
    /// notifier.
    pub fn on_focus_changed(&self, window_id: i64) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(window_id, generation, "focus changed");

        let host = Arc::clone(&self.host);
        let notifier = Arc::clone(&self.notifier);
        let lookup_timeout = self.lookup_timeout;
        tokio::spawn(async move {
            let session = resolver::resolve(host.as_ref(), window_id, lookup_timeout).await;
            notifier.consider(session, generation).await;
        });
    }

    /// Establish the startup baseline.
    ///
    /// The browser is assumed to still be focused right after the shim
    /// connects, so one resolution pass against the currently focused
    /// window reports the initial session.
    pub async fn prime(&self) {
        match self.host.focused_window().await {
            Ok(window_id) => self.on_focus_changed(window_id),
            Err(e) => {
                tracing::warn!(error = %e, "focused window query failed, skipping startup baseline");
            }
        }
    }

    /// Run for the process lifetime: prime, then consume focus events
    /// until the host connection closes.
    pub async fn run(&self, mut focus: FocusEvents) {
        self.prime().await;
        while let Some(window_id) = focus.events.recv().await {
            self.on_focus_changed(window_id);
        }
        tracing::info!("focus event stream closed, tracker stopping");
    }
}
