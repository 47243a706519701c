/*!
Thread-safe signals and slots for ankurah

# Design requirements:
- Senders and receivers are different types: an [`Emitter`] sends, a [`Signal`] connects
- A [`Slot`] owns its connection; dropping it disconnects, and no listener call can start after the drop returns
- If the listener is running on another thread when its slot is dropped, the drop waits for it
- Signals never keep connections alive - they only hold them weakly
- Connecting never waits on an emit in progress, even from inside a listener
- Listeners run inline on the emitting thread, or are handed to an [`Executor`]

# Basic usage

```rust
use ankurah_slots::*;

let emitter = Emitter::new();
let signal = emitter.signal();
let slot = signal.connect(|value: i32| println!("Received: {}", value));
emitter.emit(42);
// Received: 42

drop(slot);
emitter.emit(43); // nobody is listening anymore
```

# Executor usage

```rust
use ankurah_slots::*;
use std::sync::{Arc, Mutex};

let emitter = Emitter::new();
let queue = Queue::new();
let seen = Arc::new(Mutex::new(Vec::new()));

let _slot = {
    let seen = seen.clone();
    emitter.signal().connect_with(queue.clone(), move |value: &'static str| seen.lock().unwrap().push(value))
};
emitter.emit("hello");
assert!(seen.lock().unwrap().is_empty()); // deferred until the queue is drained

queue.run_pending();
assert_eq!(*seen.lock().unwrap(), ["hello"]);
```
*/

mod connection;
mod emitter;
mod error;
mod executor;
mod listener;
mod registry;
mod signal;
mod slot;

pub use connection::ConnectionId;
pub use emitter::*;
pub use error::*;
pub use executor::*;
pub use listener::*;
pub use registry::SignalId;
pub use signal::*;
pub use slot::*;

use std::sync::{Mutex, MutexGuard, PoisonError};

// A listener panicking while holding one of our locks leaves the protected state consistent,
// so poisoning is not propagated to other emitters and slots
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> { mutex.lock().unwrap_or_else(PoisonError::into_inner) }
