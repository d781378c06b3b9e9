//! Process-wide default timeout and per-request timeout arguments.
//!
//! The default is global mutable state shared by every client in the
//! process. Code that changes it should go through [`DefaultTimeoutGuard`],
//! which restores the previous value when dropped.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use serde::Serialize;

static DEFAULT_TIMEOUT: RwLock<Option<Duration>> = RwLock::new(None);

/// Current process-wide default, `None` meaning no timeout.
pub fn default_timeout() -> Option<Duration> {
    *DEFAULT_TIMEOUT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Replaces the process-wide default and returns the previous value.
pub fn set_default_timeout(timeout: Option<Duration>) -> Option<Duration> {
    let mut slot = DEFAULT_TIMEOUT
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut *slot, timeout)
}

/// Scoped override of the process-wide default.
///
/// The prior value is captured on creation and written back on drop, so it
/// is restored on early returns, `?` propagation and unwinding alike.
#[derive(Debug)]
#[must_use = "the previous default is restored as soon as the guard is dropped"]
pub struct DefaultTimeoutGuard {
    previous: Option<Duration>,
}

impl DefaultTimeoutGuard {
    pub fn set(timeout: Option<Duration>) -> Self {
        let previous = set_default_timeout(timeout);
        #[cfg(feature = "tracing")]
        tracing::debug!(?timeout, ?previous, "default timeout overridden");
        Self { previous }
    }

    /// Value that will be restored on drop.
    pub fn previous(&self) -> Option<Duration> {
        self.previous
    }
}

impl Drop for DefaultTimeoutGuard {
    fn drop(&mut self) {
        set_default_timeout(self.previous);
        #[cfg(feature = "tracing")]
        tracing::debug!(restored = ?self.previous, "default timeout restored");
    }
}

/// Request-level timeout argument.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutArg {
    /// Not specified by the caller.
    #[default]
    Inherit,
    /// Explicitly asks for the process default.
    UseDefault,
    /// Explicit per-request value.
    Fixed(Duration),
}

impl TimeoutArg {
    /// Resolves the effective timeout against a process default.
    pub fn resolve(self, process_default: Option<Duration>) -> Option<Duration> {
        match self {
            TimeoutArg::Fixed(timeout) => Some(timeout),
            TimeoutArg::Inherit | TimeoutArg::UseDefault => process_default,
        }
    }

    /// Resolves against the current process-wide default.
    pub fn effective(self) -> Option<Duration> {
        self.resolve(default_timeout())
    }
}

impl From<Duration> for TimeoutArg {
    fn from(timeout: Duration) -> Self {
        TimeoutArg::Fixed(timeout)
    }
}
