use thiserror::Error;

/// Errors returned by the fallible emit and connect operations.
///
/// The infallible paths (`Emitter::emit`, `Signal::connect`, dropping a `Slot`) never
/// surface errors: dead connections are pruned silently and listener panics unwind
/// into whoever invoked the listener.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("another emission is in progress on this signal")]
    Busy,
    #[error("cannot emit from a listener running inline on the same signal")]
    Reentrant,
    #[error("payload cannot be moved into {connections} connections")]
    SharedPayload { connections: usize },
    #[error("slot is not connected")]
    EmptySlot,
    #[error("slot parameter type does not match signal parameter type {expected}")]
    ParameterMismatch { expected: &'static str },
}
