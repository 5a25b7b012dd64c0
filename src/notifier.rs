//! Change notification: turning resolved sessions into remote calls.
//!
//! The notifier is the single gatekeeper between resolution chains and
//! the daemon. It discards stale results, suppresses non-transitions,
//! and fires exactly one remote call per real change of the effectively
//! active session.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;

use crate::host::HostBrowser;
use crate::reporter::Reporter;
use crate::resolver;
use crate::session::Session;

/// Holds the last-notified session and decides which resolution results
/// may reach the daemon.
///
/// Shares the generation counter with the tracker that owns it: the
/// tracker increments it when a focus event starts a resolution, the
/// notifier reads it to recognize superseded results.
pub struct ChangeNotifier<H, R> {
    host: Arc<H>,
    reporter: R,
    generation: Arc<AtomicU64>,
    /// Bound on the identity lookup. The notify path runs under the
    /// last-notified lock, so an unbounded lookup here would not just
    /// delay one notification, it would wedge every later one.
    lookup_timeout: Duration,
    /// Last value reported to the daemon. `None` until the first
    /// accepted resolution, a sentinel distinct from every real session
    /// value (including the no-window session), so the first resolution
    /// always notifies.
    last_notified: Mutex<Option<Session>>,
}

impl<H, R> ChangeNotifier<H, R>
where
    H: HostBrowser,
    R: Reporter,
{
    pub fn new(
        host: Arc<H>,
        reporter: R,
        generation: Arc<AtomicU64>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            host,
            reporter,
            generation,
            lookup_timeout,
            last_notified: Mutex::new(None),
        }
    }

    /// Consider one resolution result for notification.
    ///
    /// The staleness check, the comparison against the last-notified
    /// value, and the remote call all happen under one lock. A chain
    /// that passed the staleness check can therefore not be overtaken
    /// by a newer chain and then clobber its value afterwards, and
    /// remote calls leave in transition order.
    pub async fn consider(&self, session: Session, generation: u64) {
        let mut last_notified = self.last_notified.lock().await;

        let current = self.generation.load(Ordering::SeqCst);
        if generation < current {
            tracing::debug!(generation, current, session = %session, "discarding stale resolution");
            return;
        }
        if last_notified.as_ref() == Some(&session) {
            tracing::debug!(session = %session, "session unchanged, nothing to report");
            return;
        }

        // Optimistic update, before the call's outcome is known: a
        // transient delivery failure counts as reported, so flapping
        // connectivity cannot trigger a re-notification storm.
        *last_notified = Some(session.clone());

        let user = match resolver::bounded(self.host.current_user(), self.lookup_timeout).await {
            Ok(user) => user,
            Err(e) => {
                tracing::debug!(error = %e, "user identity lookup failed, reporting empty user");
                String::new()
            }
        };

        tracing::info!(session = %session, user, generation, "session changed");
        if let Err(e) = self.reporter.notify(&session, &user).await {
            tracing::warn!(error = %e, session = %session, "session change report failed");
        }
    }
}
