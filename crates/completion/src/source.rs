//! The source contract and the handle the engine tracks sources by.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use quill_primitives::{BoxFutureStatic, ready};

use crate::context::CompletionContext;
use crate::item::CompletionResult;

/// What a source query resolves to: a result, no result, or a failure.
pub type SourceOutput = anyhow::Result<Option<CompletionResult>>;

/// Provides completion options for a position in a document.
///
/// Synchronous sources return an already-resolved future (see
/// [`quill_primitives::ready`]). Asynchronous sources should watch
/// [`CompletionContext::cancelled`] and stop early when the query is aborted;
/// an answer that arrives after an abort is dropped either way.
pub trait CompletionSource: Send + Sync {
	/// Queries the source.
	fn complete(&self, cx: &CompletionContext) -> BoxFutureStatic<SourceOutput>;
}

/// A named, shareable completion source.
///
/// Two handles are equal when they wrap the same source instance; cloning a
/// handle keeps its identity.
#[derive(Clone)]
pub struct Source {
	name: Arc<str>,
	inner: Arc<dyn CompletionSource>,
}

impl Source {
	/// Wraps a source implementation.
	pub fn new(name: impl Into<Arc<str>>, source: impl CompletionSource + 'static) -> Self {
		Self {
			name: name.into(),
			inner: Arc::new(source),
		}
	}

	/// Creates a source from a synchronous function.
	pub fn from_fn<F>(name: impl Into<Arc<str>>, f: F) -> Self
	where
		F: Fn(&CompletionContext) -> SourceOutput + Send + Sync + 'static,
	{
		Self::new(name, SyncFn(f))
	}

	/// Creates a source from an async function taking an owned context.
	pub fn from_async<F, Fut>(name: impl Into<Arc<str>>, f: F) -> Self
	where
		F: Fn(CompletionContext) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = SourceOutput> + Send + 'static,
	{
		Self::new(name, AsyncFn(f))
	}

	/// Name used in logs.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Queries the source.
	pub fn complete(&self, cx: &CompletionContext) -> BoxFutureStatic<SourceOutput> {
		self.inner.complete(cx)
	}
}

impl PartialEq for Source {
	fn eq(&self, other: &Self) -> bool {
		std::ptr::addr_eq(Arc::as_ptr(&self.inner), Arc::as_ptr(&other.inner))
	}
}

impl Eq for Source {}

impl fmt::Debug for Source {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Source").field(&self.name).finish()
	}
}

struct SyncFn<F>(F);

impl<F> CompletionSource for SyncFn<F>
where
	F: Fn(&CompletionContext) -> SourceOutput + Send + Sync,
{
	fn complete(&self, cx: &CompletionContext) -> BoxFutureStatic<SourceOutput> {
		ready((self.0)(cx))
	}
}

struct AsyncFn<F>(F);

impl<F, Fut> CompletionSource for AsyncFn<F>
where
	F: Fn(CompletionContext) -> Fut + Send + Sync,
	Fut: Future<Output = SourceOutput> + Send + 'static,
{
	fn complete(&self, cx: &CompletionContext) -> BoxFutureStatic<SourceOutput> {
		Box::pin((self.0)(cx.clone()))
	}
}
