//! Session resolution: from a window identifier to a session value.
//!
//! Resolution is a pure function of the host browser's current state.
//! It knows nothing about generations or staleness; the caller tags the
//! result with the generation it was started under and the notifier
//! decides whether the result may still take effect.

use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;

use crate::host::{HostBrowser, HostError};
use crate::session::{Session, TAB_GROUP_NONE, WINDOW_NONE};

/// Resolve the session value for `window_id`.
///
/// The algorithm:
/// 1. [`WINDOW_NONE`] resolves immediately to [`Session::None`], with
///    no host lookups at all.
/// 2. Fetch the window's tabs and take the first one whose group id is
///    not [`TAB_GROUP_NONE`]. Ungrouped tabs before or after it in tab
///    order do not matter.
/// 3. That group's title is the session name. A window with no grouped
///    tab resolves to [`Session::Unnamed`].
///
/// Any lookup failure, including a lookup running past
/// `lookup_timeout`, degrades to [`Session::Unnamed`]: the window still
/// has a focus state that must be reported with some value, and the
/// browser may legitimately mutate windows and groups mid-resolution.
pub async fn resolve<H>(host: &H, window_id: i64, lookup_timeout: Duration) -> Session
where
    H: HostBrowser + ?Sized,
{
    if window_id == WINDOW_NONE {
        return Session::None;
    }

    let tabs = match bounded(host.window_tabs(window_id), lookup_timeout).await {
        Ok(tabs) => tabs,
        Err(e) => {
            tracing::debug!(window_id, error = %e, "tab enumeration failed, reporting unnamed");
            return Session::Unnamed;
        }
    };

    let Some(group_id) = tabs
        .iter()
        .map(|tab| tab.group_id)
        .find(|&group_id| group_id != TAB_GROUP_NONE)
    else {
        return Session::Unnamed;
    };

    match bounded(host.group_title(group_id), lookup_timeout).await {
        Ok(title) => Session::Named(title),
        Err(e) => {
            tracing::debug!(group_id, error = %e, "group title lookup failed, reporting unnamed");
            Session::Unnamed
        }
    }
}

/// Impose the per-step time bound on one host lookup. Shared with the
/// notifier, whose identity lookup is a lookup step like any other.
pub(crate) async fn bounded<T>(
    lookup: impl Future<Output = Result<T, HostError>>,
    limit: Duration,
) -> Result<T, HostError> {
    match timeout(limit, lookup).await {
        Ok(outcome) => outcome,
        Err(_) => Err(HostError::TimedOut),
    }
}
