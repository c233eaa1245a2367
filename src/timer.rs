//! Cancellation timer for discover operations.
//!
//! One timer is armed per discover operation; on expiry it asks the backend
//! to stop the search. When the search finishes first, the adapter cancels
//! the timer. Cancellation is idempotent and best-effort: a cancel racing
//! the expiry may lose, in which case the stop request fires anyway and is
//! absorbed by the backend reporting the standard abort code.

use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

struct TimerState {
    cancelled: Mutex<bool>,
    cv: Condvar,
}

/// Cloneable handle for one armed cancellation timer.
///
/// The timer thread is detached; it exits as soon as the timeout elapses or
/// the timer is cancelled, whichever comes first.
#[derive(Clone)]
pub struct CancellationTimer {
    state: Arc<TimerState>,
}

impl CancellationTimer {
    /// Arms a timer that runs `on_expiry` after `timeout` unless cancelled.
    pub fn arm<F>(timeout: Duration, on_expiry: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let state = Arc::new(TimerState {
            cancelled: Mutex::new(false),
            cv: Condvar::new(),
        });

        let thread_state = Arc::clone(&state);
        thread::spawn(move || {
            let guard = thread_state.cancelled.lock().unwrap();
            let (guard, _timeout_result) = thread_state
                .cv
                .wait_timeout_while(guard, timeout, |cancelled| !*cancelled)
                .unwrap();
            let expired = !*guard;
            drop(guard);
            if expired {
                on_expiry();
            }
        });

        Self { state }
    }

    /// Cancels the timer. Idempotent; errors do not exist on this path.
    pub fn cancel(&self) {
        let mut cancelled = self.state.cancelled.lock().unwrap();
        *cancelled = true;
        self.state.cv.notify_all();
    }

    /// Whether the timer has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        *self.state.cancelled.lock().unwrap()
    }
}
