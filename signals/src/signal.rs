use std::fmt;
use std::sync::Arc;

use crate::connection::{Connection, Dispatch};
use crate::error::Error;
use crate::executor::Executor;
use crate::listener::IntoListener;
use crate::registry::{Entry, Registry, SignalId};
use crate::slot::Slot;

/// The receiving side of a signal. Listeners connect here; values are sent through the
/// [`Emitter`](crate::Emitter) the signal was created from.
///
/// A default-constructed signal is inactive: it accepts connections but never invokes them.
pub struct Signal<T> {
    pub(crate) registry: Option<Arc<Registry<T>>>,
}

impl<T> Default for Signal<T> {
    fn default() -> Self { Self { registry: None } }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self { Self { registry: self.registry.clone() } }
}

impl<T: Send + 'static> Signal<T> {
    pub(crate) fn new(registry: Arc<Registry<T>>) -> Self { Self { registry: Some(registry) } }

    /// Connects a listener which runs on the emitting thread.
    /// The listener stays connected for as long as the returned slot is alive.
    pub fn connect<L>(&self, listener: L) -> Slot
    where L: IntoListener<T> {
        self.connect_dispatch(Dispatch::Inline, listener)
    }

    /// Connects a listener which is submitted to `executor` for every emitted value.
    /// Work still queued on the executor when the slot is dropped does nothing.
    pub fn connect_with<E, L>(&self, executor: E, listener: L) -> Slot
    where
        E: Executor + 'static,
        L: IntoListener<T>,
    {
        self.connect_dispatch(Dispatch::Executor(Arc::new(executor)), listener)
    }

    /// Connects a listener owned by the signal itself, which stays connected until the
    /// emitter and signals sharing it are dropped or rebound.
    pub fn connect_permanent<L>(&self, listener: L)
    where L: IntoListener<T> {
        match &self.registry {
            Some(registry) => registry.connect(Entry::Permanent(Connection::new(Dispatch::Inline, listener.into_listener()))),
            None => tracing::debug!("permanent listener connected to an inactive signal"),
        }
    }

    /// Connects an existing slot to this signal too, so that its listener receives the
    /// values of every signal it is attached to.
    pub fn attach(&self, slot: &Slot) -> Result<(), Error> {
        let connection = slot.connection::<T>()?;
        if let Some(registry) = &self.registry {
            registry.connect(Entry::Tracked(Arc::downgrade(&connection)));
        }
        Ok(())
    }

    fn connect_dispatch<L>(&self, dispatch: Dispatch, listener: L) -> Slot
    where L: IntoListener<T> {
        let Some(registry) = &self.registry else {
            tracing::debug!("listener connected to an inactive signal");
            return Slot::empty();
        };
        let connection = Connection::new(dispatch, listener.into_listener());
        registry.connect(Entry::Tracked(Arc::downgrade(&connection)));
        tracing::trace!("connected {:?} to signal {}", connection, registry.id());
        Slot::new(connection)
    }
}

impl<T> Signal<T> {
    /// False for a default-constructed signal, which has no emitter
    pub fn is_active(&self) -> bool { self.registry.is_some() }

    pub fn id(&self) -> Option<SignalId> { self.registry.as_ref().map(|registry| registry.id()) }

    /// Number of live connections. Dead connections are only noticed on the next emit,
    /// but are not counted here.
    pub fn connection_count(&self) -> usize { self.registry.as_ref().map_or(0, |registry| registry.connection_count()) }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.debug_struct("Signal").field("id", &self.id()).finish() }
}

#[cfg(test)]
mod tests {
    use crate::Emitter;
    use crate::executor::Queue;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_inactive_signal_returns_empty_slots() {
        let signal = super::Signal::<i32>::default();
        assert!(!signal.is_active());
        assert_eq!(signal.id(), None);
        let slot = signal.connect(|_: i32| {});
        assert!(!slot.is_connected());
        signal.connect_permanent(|_: i32| {});
        assert_eq!(signal.connection_count(), 0);
    }

    #[test]
    fn test_attach_receives_both_signals() {
        let first = Emitter::<i32>::new();
        let second = Emitter::<i32>::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let l = log.clone();
        let slot = first.signal().connect(move |value: i32| l.lock().unwrap().push(value));
        second.signal().attach(&slot).unwrap();

        first.emit(1);
        second.emit(2);
        assert_eq!(*log.lock().unwrap(), vec![1, 2]);

        drop(slot);
        first.emit(3);
        second.emit(4);
        assert_eq!(*log.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_attached_listener_is_not_reentered() {
        let first = Emitter::<u8>::new();
        let second = Emitter::<u8>::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let slot = {
            let (second, calls) = (second.clone(), calls.clone());
            first.signal().connect(move |value: u8| {
                calls.fetch_add(1, Ordering::SeqCst);
                if value == 0 {
                    // reaches this same listener on the same thread, which is dropped
                    second.emit(1);
                }
            })
        };
        second.signal().attach(&slot).unwrap();

        first.emit(0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        second.emit(1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_attach_rejects_mismatched_slot() {
        let numbers = Emitter::<i32>::new();
        let words = Emitter::<String>::new();
        let slot = numbers.signal().connect(|_: i32| {});
        assert!(matches!(words.signal().attach(&slot), Err(crate::Error::ParameterMismatch { .. })));
        assert_eq!(words.signal().attach(&crate::Slot::empty()), Err(crate::Error::EmptySlot));
    }

    #[test]
    fn test_connect_with_queue_defers() {
        let emitter = Emitter::new();
        let queue = Queue::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        let _slot = emitter.signal().connect_with(queue.clone(), move |n: usize| {
            c.fetch_add(n, Ordering::SeqCst);
        });

        emitter.emit(2);
        emitter.emit(3);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(queue.run_pending(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }
}
