//! Remote reporting seam: delivery of session changes to the daemon.
//!
//! Reporting is best-effort by contract. A failed call is logged by the
//! caller and the value still counts as reported; there is no retry, no
//! durable queue, and no rollback.

pub mod http;

use std::sync::Arc;

use async_trait::async_trait;

use crate::session::Session;

/// Remote reporting error.
#[derive(Debug, thiserror::Error)]
pub enum ReporterError {
    /// The request never completed (connect failure, timeout, ...).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The daemon answered with a non-success status.
    #[error("daemon answered {0}")]
    Status(reqwest::StatusCode),
}

/// Delivers one session-change notification to the tracking daemon.
#[async_trait]
pub trait Reporter: Send + Sync {
    /// Report that `session` became the active session for `user`.
    async fn notify(&self, session: &Session, user: &str) -> Result<(), ReporterError>;
}

#[async_trait]
impl<R> Reporter for Arc<R>
where
    R: Reporter + ?Sized,
{
    async fn notify(&self, session: &Session, user: &str) -> Result<(), ReporterError> {
        (**self).notify(session, user).await
    }
}
