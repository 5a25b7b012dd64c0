//! Host environment interface: the browser as seen by the core.
//!
//! The core never talks to browser APIs directly. Everything it needs
//! (the focused window, a window's tabs, a group's title, the profile
//! user) comes through the [`HostBrowser`] trait, and focus-change
//! events arrive on the channel handed out at attach time. The shipped
//! implementation is [`stdio::StdioHost`], which reaches a thin shim
//! inside the browser over the native-messaging stdio protocol.

pub mod protocol;
pub mod stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::session::TAB_GROUP_NONE;

/// A tab as reported by the host browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    /// Browser-assigned tab identifier.
    pub id: i64,
    /// Identifier of the tab group this tab belongs to, or
    /// [`TAB_GROUP_NONE`] for an ungrouped tab.
    #[serde(default = "ungrouped")]
    pub group_id: i64,
}

/// Serde default for tabs the shim reports without a group field.
fn ungrouped() -> i64 {
    TAB_GROUP_NONE
}

/// Host lookup error.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The lookup ran past its time bound.
    #[error("host lookup timed out")]
    TimedOut,
    /// The shim went away (stream closed) before answering.
    #[error("host connection closed")]
    Closed,
    /// The shim answered with an error, e.g. the window or group
    /// vanished between the focus event and the lookup.
    #[error("host rejected request: {0}")]
    Rejected(String),
    /// The shim's reply did not have the expected shape.
    #[error("malformed host reply: {0}")]
    Protocol(String),
    /// Transport-level I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Asynchronous lookups against the host browser.
///
/// Every method may suspend for an unbounded duration; callers that
/// need a bound impose their own timeout. Implementations answer from
/// the browser's state at call time, which may have moved on since the
/// focus event that triggered the call.
#[async_trait]
pub trait HostBrowser: Send + Sync {
    /// Identifier of the currently focused window, or
    /// [`crate::session::WINDOW_NONE`] if no window is focused.
    async fn focused_window(&self) -> Result<i64, HostError>;

    /// The window's tabs, in tab-strip order.
    async fn window_tabs(&self, window_id: i64) -> Result<Vec<Tab>, HostError>;

    /// Display title of a tab group.
    async fn group_title(&self, group_id: i64) -> Result<String, HostError>;

    /// Email-like identifier of the browser profile's user. May be
    /// empty when the profile is not signed in.
    async fn current_user(&self) -> Result<String, HostError>;
}

/// Result of attaching to the host's focus-change event stream.
pub struct FocusEvents {
    /// Focused window identifiers, in the order the host delivered
    /// them. The channel closes when the host connection does.
    pub events: UnboundedReceiver<i64>,
}
