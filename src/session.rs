//! Session value domain: what a focused browser window resolves to.
//!
//! A session is the title of the first tab group in the focused window,
//! the literal string `"unnamed"` when the window has tabs but none of
//! them is grouped, or null when no window is focused at all.

use std::fmt;

/// Window identifier meaning "no browser window is focused".
///
/// Matches the host browser's reserved value (`chrome.windows.WINDOW_ID_NONE`).
pub const WINDOW_NONE: i64 = -1;

/// Group identifier meaning "this tab belongs to no group".
///
/// Matches the host browser's reserved value (`chrome.tabGroups.TAB_GROUP_ID_NONE`).
pub const TAB_GROUP_NONE: i64 = -1;

/// Fallback session value for a focused window without any grouped tab.
pub const UNNAMED: &str = "unnamed";

/// The resolved session value for a window.
///
/// `Session` is derived, never stored: every value is the outcome of one
/// resolution pass against the host browser's current state.
#[derive(Debug, Clone)]
pub enum Session {
    /// The window's first grouped tab belongs to a group with this title.
    Named(String),
    /// The window has tabs, but none of them is grouped. Also the
    /// fallback when a window or group vanishes mid-resolution: the
    /// window still has a focus state that must be reported with some
    /// value.
    Unnamed,
    /// No browser window is focused.
    None,
}

impl Session {
    /// The value as it appears on the wire: a string, or `None` for the
    /// JSON `null` of the no-window state.
    pub fn wire_name(&self) -> Option<&str> {
        match self {
            Self::Named(title) => Some(title),
            Self::Unnamed => Some(UNNAMED),
            Self::None => None,
        }
    }
}

/// Equality is over the wire value. The daemon only ever sees the wire
/// representation, so a group literally titled `"unnamed"` must compare
/// equal to [`Session::Unnamed`] or it would be re-notified as a
/// transition the daemon cannot observe.
impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        self.wire_name() == other.wire_name()
    }
}

impl Eq for Session {}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.wire_name() {
            Some(name) => f.write_str(name),
            None => f.write_str("(no window)"),
        }
    }
}
