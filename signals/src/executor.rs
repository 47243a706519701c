use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::lock;

/// A unit of work handed to an [`Executor`]
pub type Work = Box<dyn FnOnce() + Send + 'static>;

/// Decides where a connection's listener runs.
///
/// `submit` must run `work` at most once, either before returning or later on some
/// other context. An executor may drop work it cannot run (eg. because it is shutting down).
pub trait Executor: Send + Sync {
    fn submit(&self, work: Work);
}

/// Runs work on the calling thread before `submit` returns.
#[derive(Debug, Clone, Copy, Default)]
pub struct Inline;

impl Executor for Inline {
    fn submit(&self, work: Work) { work() }
}

/// A deferred FIFO of work, drained explicitly by its owner.
///
/// Useful for event loops which want to run listeners at a well defined point
/// of their iteration rather than on the emitting thread.
#[derive(Clone, Default)]
pub struct Queue(Arc<Mutex<VecDeque<Work>>>);

impl Queue {
    pub fn new() -> Self { Self::default() }

    /// Runs every queued item on the calling thread, including work queued while draining.
    /// Returns the number of items run.
    pub fn run_pending(&self) -> usize {
        let mut count = 0;
        // pop one at a time so that work submitted by a running item does not deadlock
        while let Some(work) = self.pop() {
            work();
            count += 1;
        }
        count
    }

    /// Runs a single queued item, returning false if the queue was empty
    pub fn run_one(&self) -> bool {
        match self.pop() {
            Some(work) => {
                work();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize { lock(&self.0).len() }

    pub fn is_empty(&self) -> bool { lock(&self.0).is_empty() }

    fn pop(&self) -> Option<Work> { lock(&self.0).pop_front() }
}

impl Executor for Queue {
    fn submit(&self, work: Work) { lock(&self.0).push_back(work); }
}

impl fmt::Debug for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.debug_struct("Queue").field("pending", &self.len()).finish() }
}

impl Executor for std::sync::mpsc::Sender<Work> {
    fn submit(&self, work: Work) {
        if self.send(work).is_err() {
            tracing::debug!("executor channel closed, dropping work");
        }
    }
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn submit(&self, work: Work) { (**self).submit(work) }
}

impl<E: Executor + ?Sized> Executor for &'static E {
    fn submit(&self, work: Work) { (**self).submit(work) }
}

/// Runs work on the runtime's blocking pool, since a listener may block on its connection lock
#[cfg(feature = "tokio")]
impl Executor for tokio::runtime::Handle {
    fn submit(&self, work: Work) {
        // the JoinHandle is detached; panics in the listener surface on the blocking thread
        let _ = self.spawn_blocking(work);
    }
}

#[cfg(feature = "tokio")]
impl Executor for tokio::sync::mpsc::UnboundedSender<Work> {
    fn submit(&self, work: Work) {
        if self.send(work).is_err() {
            tracing::debug!("executor channel closed, dropping work");
        }
    }
}
