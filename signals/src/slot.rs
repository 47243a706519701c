use std::fmt;
use std::sync::Arc;

use crate::connection::{Connection, ConnectionId, Revoke};
use crate::error::Error;

/// Owns a connection to one or more signals.
///
/// Dropping the slot disconnects it. If the listener is running on another thread at that
/// moment, the drop blocks until it returns; once the drop has completed the listener is
/// never invoked again. Slots can be moved but not cloned, and slots of signals with different
/// parameter types can be stored together.
#[must_use = "the connection is torn down as soon as the slot is dropped"]
#[derive(Default)]
pub struct Slot {
    connection: Option<Arc<dyn Revoke>>,
}

impl Slot {
    /// A slot which owns no connection
    pub fn empty() -> Self { Self::default() }

    pub(crate) fn new<T: Send + 'static>(connection: Arc<Connection<T>>) -> Self { Self { connection: Some(connection) } }

    pub fn is_connected(&self) -> bool { self.connection.is_some() }

    pub fn id(&self) -> Option<ConnectionId> { self.connection.as_ref().map(|connection| connection.id()) }

    /// Tears down the connection now, leaving this slot empty.
    /// Blocks until a concurrent invocation of the listener has returned.
    pub fn disconnect(&mut self) {
        if let Some(connection) = self.connection.take() {
            tracing::trace!("disconnecting slot {}", connection.id());
            connection.reset();
        }
    }

    /// The typed connection owned by this slot, for attaching it to another signal
    pub(crate) fn connection<T: Send + 'static>(&self) -> Result<Arc<Connection<T>>, Error> {
        let connection = self.connection.clone().ok_or(Error::EmptySlot)?;
        connection.into_any().downcast::<Connection<T>>().map_err(|_| Error::ParameterMismatch { expected: std::any::type_name::<T>() })
    }
}

impl Drop for Slot {
    fn drop(&mut self) { self.disconnect() }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.debug_struct("Slot").field("id", &self.id()).finish() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Dispatch;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_slot() -> (Arc<AtomicUsize>, Arc<Connection<()>>, Slot) {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        let connection = Connection::new(
            Dispatch::Inline,
            Box::new(move |_: ()| {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let slot = Slot::new(connection.clone());
        (counter, connection, slot)
    }

    #[test]
    fn test_drop_resets_connection() {
        let (counter, connection, slot) = counting_slot();
        connection.execute(());
        drop(slot);
        connection.execute(());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(connection.is_revoked());
    }

    #[test]
    fn test_move_transfers_ownership() {
        let (counter, connection, mut slot) = counting_slot();
        let id = slot.id();
        let moved = std::mem::take(&mut slot);
        assert!(!slot.is_connected());
        assert_eq!(moved.id(), id);

        // dropping the emptied source must not disconnect
        drop(slot);
        connection.execute(());
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        drop(moved);
        connection.execute(());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_assignment_over_connected_slot_disconnects_it() {
        let (first_counter, first, mut slot) = counting_slot();
        let (second_counter, second, replacement) = counting_slot();
        slot = replacement;

        first.execute(());
        second.execute(());
        assert_eq!(first_counter.load(Ordering::SeqCst), 0);
        assert_eq!(second_counter.load(Ordering::SeqCst), 1);
        drop(slot);
    }

    #[test]
    fn test_typed_connection_checks_parameter_type() {
        let (_counter, connection, slot) = counting_slot();
        assert_eq!(slot.connection::<()>().map(|c| c.id()), Ok(connection.id()));
        assert!(matches!(slot.connection::<i32>(), Err(Error::ParameterMismatch { .. })));
        assert_eq!(Slot::empty().connection::<()>().map(|c| c.id()), Err(Error::EmptySlot));
    }
}
