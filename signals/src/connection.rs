use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::executor::Executor;
use crate::listener::Listener;
use crate::lock;

/// A unique identifier for a connection, allocated from a process-wide counter
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ConnectionId(usize);

impl ConnectionId {
    fn next() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl From<ConnectionId> for usize {
    fn from(id: ConnectionId) -> Self { id.0 }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// A per-thread token, never zero. Used to recognize calls made from inside a listener
/// on the thread that is currently running it.
pub(crate) fn thread_token() -> usize {
    static NEXT: AtomicUsize = AtomicUsize::new(1);
    thread_local! {
        static TOKEN: usize = NEXT.fetch_add(1, Ordering::Relaxed);
    }
    TOKEN.with(|token| *token)
}

/// Clears a thread marker when dropped, including while unwinding out of a listener
pub(crate) struct Running<'a>(&'a AtomicUsize);

impl<'a> Running<'a> {
    pub(crate) fn enter(marker: &'a AtomicUsize) -> Self {
        marker.store(thread_token(), Ordering::Release);
        Self(marker)
    }
}

impl Drop for Running<'_> {
    fn drop(&mut self) { self.0.store(0, Ordering::Release); }
}

/// Where a connection's listener is invoked
pub(crate) enum Dispatch {
    /// On the emitting thread, while the emit is in progress
    Inline,
    Executor(Arc<dyn Executor>),
}

/// The state shared between a `Slot` (which owns it) and the registries it is connected to
/// (which only hold it weakly, unless the connection is permanent).
pub(crate) struct Connection<T> {
    id: ConnectionId,
    dispatch: Dispatch,
    listener: Mutex<Option<Listener<T>>>,
    // set by reset before it takes the lock, so an invocation already queued behind it never runs
    revoked: AtomicBool,
    // token of the thread currently inside the listener, or zero
    running_on: AtomicUsize,
}

impl<T: Send + 'static> Connection<T> {
    pub(crate) fn new(dispatch: Dispatch, listener: Listener<T>) -> Arc<Self> {
        Arc::new(Self {
            id: ConnectionId::next(),
            dispatch,
            listener: Mutex::new(Some(listener)),
            revoked: AtomicBool::new(false),
            running_on: AtomicUsize::new(0),
        })
    }

    /// Hands the value to the listener via this connection's dispatch policy.
    ///
    /// Executor dispatch captures only a weak reference, so the executor never keeps the
    /// connection alive. If the connection is gone by the time the work runs, nothing happens.
    pub(crate) fn post(self: &Arc<Self>, value: T) {
        match &self.dispatch {
            Dispatch::Inline => self.execute(value),
            Dispatch::Executor(executor) => {
                let weak = Arc::downgrade(self);
                executor.submit(Box::new(move || {
                    if let Some(connection) = weak.upgrade() {
                        connection.execute(value);
                    } else {
                        tracing::trace!("connection dropped before dispatched work ran");
                    }
                }));
            }
        }
    }

    /// Invokes the listener under the connection lock, unless the connection has been reset
    pub(crate) fn execute(&self, value: T) {
        // eg. a listener attached to two signals, emitting on the second from inside the first
        if self.running_on.load(Ordering::Acquire) == thread_token() {
            tracing::warn!("connection {} invoked from inside its own listener, dropping the value", self.id);
            return;
        }
        let mut listener = lock(&self.listener);
        if !self.revoked.load(Ordering::Acquire) {
            if let Some(callback) = listener.as_mut() {
                let _running = Running::enter(&self.running_on);
                callback(value);
            }
        }
        // the listener may have reset its own connection while it ran
        let released = if self.revoked.load(Ordering::Acquire) { listener.take() } else { None };
        drop(listener);
        // dropped after unlocking, since the listener may own the slot of this very connection
        drop(released);
    }
}

impl<T> Connection<T> {
    pub(crate) fn id(&self) -> ConnectionId { self.id }

    pub(crate) fn is_revoked(&self) -> bool { self.revoked.load(Ordering::Acquire) }

    /// Permanently clears the listener.
    ///
    /// Blocks until an invocation in progress on another thread has returned. When called
    /// from inside this connection's own listener, it returns immediately and the listener
    /// is released as soon as that invocation finishes.
    pub(crate) fn reset(&self) {
        self.revoked.store(true, Ordering::Release);
        if self.running_on.load(Ordering::Acquire) == thread_token() {
            tracing::debug!("connection {} reset from inside its own listener", self.id);
            return;
        }
        let listener = lock(&self.listener).take();
        // drop outside the lock; the listener's captures may own other slots
        drop(listener);
    }
}

/// Type-erased view of a connection, held by a `Slot`
pub(crate) trait Revoke: Send + Sync {
    fn reset(&self);
    fn id(&self) -> ConnectionId;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Send + 'static> Revoke for Connection<T> {
    fn reset(&self) { Connection::reset(self) }

    fn id(&self) -> ConnectionId { self.id }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> { self }
}

impl<T> fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dispatch = match self.dispatch {
            Dispatch::Inline => "inline",
            Dispatch::Executor(_) => "executor",
        };
        f.debug_struct("Connection").field("id", &self.id).field("dispatch", &dispatch).field("revoked", &self.is_revoked()).finish()
    }
}
