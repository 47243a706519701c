use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::registry::{Registry, SignalId};
use crate::signal::Signal;

/// The sending side of a signal.
///
/// Clones of an emitter, and every [`Signal`] created from them, share one registry of
/// connections. Use [`rebind`](crate::rebind) to move a sender/receiver pair onto a fresh registry.
pub struct Emitter<T> {
    pub(crate) registry: Arc<Registry<T>>,
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self { Self { registry: self.registry.clone() } }
}

impl<T> Default for Emitter<T> {
    fn default() -> Self { Self { registry: Registry::new() } }
}

impl<T> Emitter<T> {
    pub fn new() -> Self { Self::default() }

    pub fn id(&self) -> SignalId { self.registry.id() }

    /// Number of live connections across every signal sharing this emitter's registry
    pub fn connection_count(&self) -> usize { self.registry.connection_count() }
}

impl<T: Send + 'static> Emitter<T> {
    /// Creates a signal which receives the values sent through this emitter
    pub fn signal(&self) -> Signal<T> { Signal::new(self.registry.clone()) }

    /// Sends a value to every live connection, in the order they were connected.
    ///
    /// Connections made while this call is in progress are only reached by the next emit.
    /// Inline listeners run before this returns; emits on the same signal from other threads
    /// wait for them. An emit from inside an inline listener of this same signal is dropped.
    pub fn emit(&self, value: T)
    where T: Clone {
        self.registry.emit(value)
    }

    /// Sends a value without blocking. Fails with [`Error::Busy`] if another thread is emitting,
    /// or [`Error::Reentrant`] when called from an inline listener of this signal.
    pub fn try_emit(&self, value: T) -> Result<(), Error>
    where T: Clone {
        self.registry.try_emit(value)
    }

    /// Sends a value that cannot be cloned. It is moved into the sole live connection;
    /// with several live connections nothing is delivered and [`Error::SharedPayload`] is returned.
    pub fn emit_owned(&self, value: T) -> Result<(), Error> { self.registry.emit_owned(value) }
}

impl<T> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter").field("id", &self.id()).field("registry", &self.registry).finish()
    }
}

/// Moves an emitter and a signal onto a new, empty registry that they share.
///
/// Every connection previously made through either of them is orphaned: it is never reached
/// by emits on the rebound pair. Other clones of the old emitter keep emitting to the old
/// connections only.
pub fn rebind<T>(emitter: &mut Emitter<T>, signal: &mut Signal<T>) {
    let registry = Registry::new();
    tracing::debug!("rebinding emitter {} to signal {}", emitter.id(), registry.id());
    emitter.registry = registry.clone();
    signal.registry = Some(registry);
}
