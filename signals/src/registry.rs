use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, TryLockError, Weak};

use crate::connection::{Connection, Running, thread_token};
use crate::error::Error;
use crate::lock;

/// A unique identifier for a signal's registry.
/// Emitters and signals which share a registry report the same id.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SignalId(usize);

impl From<SignalId> for usize {
    fn from(id: SignalId) -> Self { id.0 }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

pub(crate) enum Entry<T> {
    /// Owned by a slot; the registry never extends its lifetime
    Tracked(Weak<Connection<T>>),
    /// Owned by the registry itself
    Permanent(Arc<Connection<T>>),
}

impl<T> Entry<T> {
    fn upgrade(&self) -> Option<Arc<Connection<T>>> {
        match self {
            Entry::Tracked(weak) => weak.upgrade(),
            Entry::Permanent(connection) => Some(connection.clone()),
        }
    }

    fn is_live(&self) -> bool {
        match self {
            Entry::Tracked(weak) => weak.strong_count() > 0,
            Entry::Permanent(_) => true,
        }
    }
}

/// The connection registry shared by an emitter and its signals.
///
/// New connections land in `pending`, which has its own lock so that connecting never waits
/// on (or holds up) an emission. Each emit splices `pending` onto `active` while holding the
/// emit lock, then walks `active` in registration order.
pub(crate) struct Registry<T> {
    pending: Mutex<Vec<Entry<T>>>,
    active: Mutex<Vec<Entry<T>>>,
    // token of the thread holding the emit lock, or zero
    emitting_on: AtomicUsize,
}

impl<T> Default for Registry<T> {
    fn default() -> Self { Self { pending: Mutex::new(Vec::new()), active: Mutex::new(Vec::new()), emitting_on: AtomicUsize::new(0) } }
}

impl<T> Registry<T> {
    pub(crate) fn new() -> Arc<Self> { Arc::new(Self::default()) }

    pub(crate) fn id(self: &Arc<Self>) -> SignalId { SignalId(Arc::as_ptr(self) as usize) }

    pub(crate) fn connect(&self, entry: Entry<T>) { lock(&self.pending).push(entry); }

    /// True if the calling thread is already inside an emission on this registry
    fn is_emitting_here(&self) -> bool { self.emitting_on.load(Ordering::Acquire) == thread_token() }

    /// Number of live connections, pending and active
    pub(crate) fn connection_count(&self) -> usize {
        let pending = lock(&self.pending).iter().filter(|entry| entry.is_live()).count();
        if self.is_emitting_here() {
            tracing::warn!("connection_count called from inside a listener; active connections are not counted");
            return pending;
        }
        let active = lock(&self.active).iter().filter(|entry| entry.is_live()).count();
        pending + active
    }

    /// Merges pending connections and collects the live ones, pruning the dead in passing
    fn live_connections(&self, active: &mut Vec<Entry<T>>) -> Vec<Arc<Connection<T>>> {
        active.append(&mut lock(&self.pending));

        let mut live = Vec::with_capacity(active.len());
        let before = active.len();
        active.retain(|entry| match entry.upgrade() {
            Some(connection) => {
                live.push(connection);
                true
            }
            None => false,
        });
        if active.len() < before {
            tracing::trace!("pruned {} dead connections", before - active.len());
        }
        live
    }
}

impl<T: Send + 'static> Registry<T> {
    /// Emits to every live connection, blocking while another thread is emitting.
    /// An emit from inside a listener running inline on this registry is dropped.
    pub(crate) fn emit(&self, value: T)
    where T: Clone {
        if self.is_emitting_here() {
            tracing::warn!("reentrant emit from inside a listener was dropped");
            return;
        }
        let mut active = lock(&self.active);
        self.dispatch(&mut active, value);
    }

    /// Like `emit`, but fails instead of blocking or dropping the value silently
    pub(crate) fn try_emit(&self, value: T) -> Result<(), Error>
    where T: Clone {
        if self.is_emitting_here() {
            return Err(Error::Reentrant);
        }
        let mut active = match self.active.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return Err(Error::Busy),
        };
        self.dispatch(&mut active, value);
        Ok(())
    }

    /// Moves a value which cannot be cloned into the sole live connection
    pub(crate) fn emit_owned(&self, value: T) -> Result<(), Error> {
        if self.is_emitting_here() {
            return Err(Error::Reentrant);
        }
        let mut active = lock(&self.active);
        let _emitting = Running::enter(&self.emitting_on);
        let live = self.live_connections(&mut active);
        match live.as_slice() {
            [] => Ok(()),
            [connection] => {
                connection.post(value);
                Ok(())
            }
            many => Err(Error::SharedPayload { connections: many.len() }),
        }
    }

    fn dispatch(&self, active: &mut Vec<Entry<T>>, value: T)
    where T: Clone {
        let _emitting = Running::enter(&self.emitting_on);
        let live = self.live_connections(active);

        // clone the value for each connection except the last one, which takes it by move
        if let Some((last, rest)) = live.split_last() {
            for connection in rest {
                connection.post(value.clone());
            }
            last.post(value);
        }
    }
}

impl<T> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").field("pending", &lock(&self.pending).len()).finish_non_exhaustive()
    }
}
