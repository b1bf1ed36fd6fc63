use std::future::Future;
use std::pin::Pin;

/// A pinned, boxed future that is required to be Send and 'static.
pub type BoxFutureStatic<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Boxes a value into an already-resolved [`BoxFutureStatic`].
pub fn ready<T: Send + 'static>(value: T) -> BoxFutureStatic<T> {
	Box::pin(std::future::ready(value))
}
