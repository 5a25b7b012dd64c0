//! JSON-over-HTTP reporter.
//!
//! `POST {endpoint}/session_changed` with body
//! `{"session_name": string|null, "user": string}`. The daemon's
//! acknowledgement body is ignored; any 2xx status counts as delivered.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::{Reporter, ReporterError};
use crate::session::Session;

/// Default daemon endpoint, the tracking daemon's well-known port.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:3142";

/// Bound on one notification request, connect to response.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Reporter backed by `reqwest` against the daemon's HTTP surface.
pub struct HttpReporter {
    client: reqwest::Client,
    url: String,
}

impl HttpReporter {
    /// Build a reporter for the daemon at `endpoint` (base URL without
    /// the `/session_changed` path).
    ///
    /// Panics if the HTTP client cannot be constructed. That can only
    /// happen at startup, and a client without the configured request
    /// bound would be worse than no client.
    pub fn new(endpoint: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build http client");
        Self {
            client,
            url: format!("{}/session_changed", endpoint.trim_end_matches('/')),
        }
    }
}

/// Wire body of a notification.
#[derive(Serialize)]
struct SessionChanged<'a> {
    session_name: Option<&'a str>,
    user: &'a str,
}

#[async_trait]
impl Reporter for HttpReporter {
    async fn notify(&self, session: &Session, user: &str) -> Result<(), ReporterError> {
        let body = SessionChanged {
            session_name: session.wire_name(),
            user,
        };
        let response = self.client.post(&self.url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(ReporterError::Status(response.status()));
        }
        Ok(())
    }
}
