/// The boxed form of a listener, as stored by a connection.
///
/// Listeners are `FnMut` because a connection never runs its listener concurrently with itself.
pub type Listener<T> = Box<dyn FnMut(T) + Send + 'static>;

/// Trait for types that can be connected to a signal as a listener
pub trait IntoListener<T> {
    fn into_listener(self) -> Listener<T>;
}

impl<F, T> IntoListener<T> for F
where F: FnMut(T) + Send + 'static
{
    fn into_listener(self) -> Listener<T> { Box::new(self) }
}

// Channel senders forward every emitted value; a closed channel is ignored
impl<T: Send + 'static> IntoListener<T> for std::sync::mpsc::Sender<T> {
    fn into_listener(self) -> Listener<T> {
        Box::new(move |value| {
            let _ = self.send(value);
        })
    }
}

#[cfg(feature = "tokio")]
impl<T: Send + 'static> IntoListener<T> for tokio::sync::mpsc::UnboundedSender<T> {
    fn into_listener(self) -> Listener<T> {
        Box::new(move |value| {
            let _ = self.send(value);
        })
    }
}
