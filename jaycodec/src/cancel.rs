// SPDX-License-Identifier: Apache-2.0

//! A shared, close-once cancellation signal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::error::Error;

struct Inner {
    closed: AtomicBool,
    cause: Mutex<Option<Error>>,
    /// Dropped on cancel, which disconnects every `done` receiver.
    trigger: Mutex<Option<Sender<()>>>,
    done: Receiver<()>,
}

/// Cancellation handle shared by a stream and its workers.
///
/// Cancelling is idempotent: the first call closes the signal and records
/// its cause, later calls are no-ops. Clones observe the same signal.
///
/// # Example
/// ```
/// use jaycodec::{Cancellation, Error};
///
/// let cancel = Cancellation::new();
/// let done = cancel.done();
/// assert!(cancel.cancel(Some(Error::custom("first"))));
/// assert!(!cancel.cancel(Some(Error::custom("second"))));
/// assert!(done.recv().is_err());
/// assert_eq!(cancel.err().unwrap().to_string(), "first");
/// ```
#[derive(Clone)]
pub struct Cancellation {
    inner: Arc<Inner>,
}

impl Cancellation {
    pub fn new() -> Self {
        let (trigger, done) = bounded(0);
        Self {
            inner: Arc::new(Inner {
                closed: AtomicBool::new(false),
                cause: Mutex::new(None),
                trigger: Mutex::new(Some(trigger)),
                done,
            }),
        }
    }

    /// Close the signal. `cause` is `None` for a clean stop. Returns `true`
    /// only for the call that actually closed it.
    pub fn cancel(&self, cause: Option<Error>) -> bool {
        let mut trigger = self
            .inner
            .trigger
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if trigger.is_none() {
            return false;
        }
        *self
            .inner
            .cause
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = cause;
        self.inner.closed.store(true, Ordering::Release);
        trigger.take();
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// A receiver that never yields a message and disconnects once the
    /// signal is closed. Suitable for `crossbeam_channel::select!`.
    pub fn done(&self) -> Receiver<()> {
        self.inner.done.clone()
    }

    /// The error that closed the signal, if any.
    pub fn err(&self) -> Option<Error> {
        self.inner
            .cause
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cancellation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cancellation")
            .field("cancelled", &self.is_cancelled())
            .field("cause", &self.err())
            .finish()
    }
}
