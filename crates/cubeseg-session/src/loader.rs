//! Bounded wait for the host's background loader
//!
//! Every viewport move makes the host fetch newly visible data in the
//! background. Block reads and writes must not run before that fetch
//! completes, so the session polls [`Navigator::is_loader_finished`] with a
//! bounded budget and a cancellation flag instead of spinning forever.

use crate::error::{SessionError, SessionResult};
use crate::host::Navigator;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::trace;

/// How long to wait for the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Polls after the first one before giving up
    pub max_polls: u32,
    /// Pause between polls; zero only yields the thread
    pub backoff: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            max_polls: 30_000,
            backoff: Duration::from_millis(1),
        }
    }
}

impl WaitPolicy {
    /// Create a policy
    pub fn new(max_polls: u32, backoff: Duration) -> Self {
        Self { max_polls, backoff }
    }

    /// Set the poll budget
    pub fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = max_polls;
        self
    }

    /// Set the pause between polls
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }
}

/// Shared flag that aborts pending loader waits
///
/// Clones share the flag, so a token handed to another thread can cancel a
/// wait running on the session's thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of current and future waits
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Re-arm the token after a cancellation was handled
    pub fn clear(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Poll until the loader reports completion
///
/// Returns the number of polls that found the loader still busy.
///
/// # Errors
///
/// `SessionError::Cancelled` once `cancel` is set, `SessionError::Stall`
/// when the loader is still busy after `policy.max_polls` further polls.
pub fn wait_for_loader<N: Navigator + ?Sized>(
    nav: &N,
    policy: &WaitPolicy,
    cancel: &CancelToken,
) -> SessionResult<u32> {
    let mut polls = 0u32;
    loop {
        if cancel.is_cancelled() {
            return Err(SessionError::Cancelled);
        }
        if nav.is_loader_finished() {
            if polls > 0 {
                trace!(polls, "loader finished");
            }
            return Ok(polls);
        }
        if polls >= policy.max_polls {
            return Err(SessionError::Stall { polls });
        }
        polls += 1;
        if policy.backoff.is_zero() {
            thread::yield_now();
        } else {
            thread::sleep(policy.backoff);
        }
    }
}
