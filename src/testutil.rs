//! Test doubles shared across the module test suites.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::host::{HostBrowser, HostError, Tab};
use crate::reporter::{Reporter, ReporterError};
use crate::session::{Session, WINDOW_NONE};

/// Scripted host environment.
///
/// Windows map to tab lists and groups to titles; lookups against
/// anything not scripted fail the way a vanished window or group would.
/// A window can be gated so that its tab lookup suspends until released
/// with [`MockHost::release_window`], which lets tests force resolution
/// chains to complete out of order.
pub struct MockHost {
    focused: StdMutex<i64>,
    windows: StdMutex<HashMap<i64, Vec<Tab>>>,
    groups: StdMutex<HashMap<i64, String>>,
    user: StdMutex<String>,
    gates: StdMutex<HashMap<i64, Arc<Semaphore>>>,
    user_gate: StdMutex<Option<Arc<Semaphore>>>,
    fail_focus: AtomicBool,
    fail_user: AtomicBool,
    /// Number of `window_tabs` calls observed.
    pub tab_lookups: AtomicUsize,
    /// Number of `group_title` calls observed.
    pub title_lookups: AtomicUsize,
}

impl Default for MockHost {
    fn default() -> Self {
        Self {
            focused: StdMutex::new(WINDOW_NONE),
            windows: StdMutex::new(HashMap::new()),
            groups: StdMutex::new(HashMap::new()),
            user: StdMutex::new(String::new()),
            gates: StdMutex::new(HashMap::new()),
            user_gate: StdMutex::new(None),
            fail_focus: AtomicBool::new(false),
            fail_user: AtomicBool::new(false),
            tab_lookups: AtomicUsize::new(0),
            title_lookups: AtomicUsize::new(0),
        }
    }
}

impl MockHost {
    pub fn tab(id: i64, group_id: i64) -> Tab {
        Tab { id, group_id }
    }

    pub fn set_focused(&self, window_id: i64) {
        *self.focused.lock().unwrap() = window_id;
    }

    pub fn put_window(&self, window_id: i64, tabs: Vec<Tab>) {
        self.windows.lock().unwrap().insert(window_id, tabs);
    }

    pub fn put_group(&self, group_id: i64, title: &str) {
        self.groups.lock().unwrap().insert(group_id, title.to_string());
    }

    pub fn set_user(&self, user: &str) {
        *self.user.lock().unwrap() = user.to_string();
    }

    pub fn fail_focus_lookup(&self, fail: bool) {
        self.fail_focus.store(fail, Ordering::SeqCst);
    }

    pub fn fail_user_lookup(&self, fail: bool) {
        self.fail_user.store(fail, Ordering::SeqCst);
    }

    /// Make identity lookups suspend forever.
    pub fn stall_user_lookup(&self) {
        *self.user_gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    /// Make tab lookups for `window_id` suspend until released.
    pub fn gate_window(&self, window_id: i64) {
        self.gates
            .lock()
            .unwrap()
            .insert(window_id, Arc::new(Semaphore::new(0)));
    }

    /// Let one gated tab lookup for `window_id` proceed.
    pub fn release_window(&self, window_id: i64) {
        if let Some(gate) = self.gates.lock().unwrap().get(&window_id) {
            gate.add_permits(1);
        }
    }

    fn gate_for(&self, window_id: i64) -> Option<Arc<Semaphore>> {
        self.gates.lock().unwrap().get(&window_id).cloned()
    }
}

#[async_trait]
impl HostBrowser for MockHost {
    async fn focused_window(&self) -> Result<i64, HostError> {
        if self.fail_focus.load(Ordering::SeqCst) {
            return Err(HostError::Closed);
        }
        Ok(*self.focused.lock().unwrap())
    }

    async fn window_tabs(&self, window_id: i64) -> Result<Vec<Tab>, HostError> {
        self.tab_lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = self.gate_for(window_id) {
            gate.acquire().await.expect("gate closed").forget();
        }
        self.windows
            .lock()
            .unwrap()
            .get(&window_id)
            .cloned()
            .ok_or_else(|| HostError::Rejected(format!("no window with id {window_id}")))
    }

    async fn group_title(&self, group_id: i64) -> Result<String, HostError> {
        self.title_lookups.fetch_add(1, Ordering::SeqCst);
        self.groups
            .lock()
            .unwrap()
            .get(&group_id)
            .cloned()
            .ok_or_else(|| HostError::Rejected(format!("no group with id {group_id}")))
    }

    async fn current_user(&self) -> Result<String, HostError> {
        if self.fail_user.load(Ordering::SeqCst) {
            return Err(HostError::Rejected("identity unavailable".into()));
        }
        let gate = self.user_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.expect("gate closed").forget();
        }
        Ok(self.user.lock().unwrap().clone())
    }
}

/// Reporter that records every call and can be told to fail.
///
/// Calls are recorded even when failing: the remote call was made, it
/// just did not succeed.
#[derive(Default)]
pub struct RecordingReporter {
    calls: StdMutex<Vec<(Option<String>, String)>>,
    failing: AtomicBool,
}

impl RecordingReporter {
    /// Recorded `(session_name, user)` wire values, in call order.
    pub fn calls(&self) -> Vec<(Option<String>, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Reporter for RecordingReporter {
    async fn notify(&self, session: &Session, user: &str) -> Result<(), ReporterError> {
        self.calls
            .lock()
            .unwrap()
            .push((session.wire_name().map(String::from), user.to_string()));
        if self.failing.load(Ordering::SeqCst) {
            return Err(ReporterError::Status(
                reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            ));
        }
        Ok(())
    }
}

/// Wait until the reporter has seen at least `expected` calls.
pub async fn wait_for_calls(reporter: &RecordingReporter, expected: usize) {
    wait_until("reporter calls", || reporter.calls().len() >= expected).await;
}

/// Poll `condition` until it holds, panicking after a bounded wait.
pub async fn wait_until(description: &str, mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if condition() {
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("timed out waiting for {description}");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
