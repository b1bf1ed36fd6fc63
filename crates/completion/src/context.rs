//! The context a source is queried with.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use quill_primitives::{CharIdx, EditorState};
use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::CompletionError;

/// Lines are searched at most this far back by [`CompletionContext::match_before`].
const MATCH_BEFORE_WINDOW: usize = 250;

type AbortListener = Box<dyn FnOnce() + Send>;

/// Snapshot, position and cancellation handle for one source query.
///
/// Cheap to clone; clones share the abort state, so a source can move a
/// clone into its future.
#[derive(Clone)]
pub struct CompletionContext {
	inner: Arc<ContextInner>,
}

struct ContextInner {
	state: EditorState,
	pos: CharIdx,
	explicit: bool,
	token: CancellationToken,
	/// `None` once the query was aborted.
	listeners: Mutex<Option<Vec<AbortListener>>>,
	abort_on_doc_change: AtomicBool,
}

/// Text matched by [`CompletionContext::match_before`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchBefore {
	pub from: CharIdx,
	pub to: CharIdx,
	pub text: String,
}

impl CompletionContext {
	/// Creates a context for a query at `pos` in `state`.
	pub fn new(state: EditorState, pos: CharIdx, explicit: bool) -> Self {
		Self {
			inner: Arc::new(ContextInner {
				state,
				pos,
				explicit,
				token: CancellationToken::new(),
				listeners: Mutex::new(Some(Vec::new())),
				abort_on_doc_change: AtomicBool::new(false),
			}),
		}
	}

	/// The snapshot the query runs against.
	pub fn state(&self) -> &EditorState {
		&self.inner.state
	}

	/// The position completion happens at.
	pub fn pos(&self) -> CharIdx {
		self.inner.pos
	}

	/// Whether the user explicitly asked for completion.
	///
	/// Sources should be more eager for explicit queries, e.g. returning
	/// options even when nothing has been typed yet.
	pub fn explicit(&self) -> bool {
		self.inner.explicit
	}

	/// Returns the text before the cursor on the current line that matches
	/// `pattern` up to the cursor, if any.
	///
	/// Only the last 250 characters of the line are considered.
	pub fn match_before(&self, pattern: &Regex) -> Result<Option<MatchBefore>, CompletionError> {
		let anchored = Regex::new(&format!("(?:{})$", pattern.as_str()))?;
		let (line_start, line) = self.state().line_before(self.pos());
		let line_len = line.chars().count();
		let skip = line_len.saturating_sub(MATCH_BEFORE_WINDOW);
		let byte_skip = line.char_indices().nth(skip).map_or(line.len(), |(i, _)| i);
		let window = &line[byte_skip..];

		Ok(anchored.find(window).map(|m| MatchBefore {
			from: line_start + skip + window[..m.start()].chars().count(),
			to: self.pos(),
			text: m.as_str().to_owned(),
		}))
	}

	/// Returns true once the query was aborted.
	pub fn is_aborted(&self) -> bool {
		self.inner.token.is_cancelled()
	}

	/// Resolves when the query is aborted.
	pub async fn cancelled(&self) {
		self.inner.token.cancelled().await;
	}

	/// The query's cancellation token.
	pub fn token(&self) -> &CancellationToken {
		&self.inner.token
	}

	/// Registers a listener called exactly once when the query is aborted.
	///
	/// A listener registered after the abort is called immediately.
	pub fn on_abort(&self, listener: impl FnOnce() + Send + 'static) {
		let mut guard = self.inner.listeners.lock();
		match guard.as_mut() {
			Some(listeners) => listeners.push(Box::new(listener)),
			None => {
				drop(guard);
				run_listener(Box::new(listener));
			}
		}
	}

	/// Asks for the query to be aborted on any document change, not only
	/// on changes that reset completion.
	pub fn abort_on_doc_change(&self) {
		self.inner.abort_on_doc_change.store(true, Ordering::Release);
	}

	pub(crate) fn aborts_on_doc_change(&self) -> bool {
		self.inner.abort_on_doc_change.load(Ordering::Acquire)
	}

	/// Cancels the token and runs the abort listeners.
	pub(crate) fn abort(&self) {
		self.inner.token.cancel();
		let listeners = self.inner.listeners.lock().take();
		for listener in listeners.into_iter().flatten() {
			run_listener(listener);
		}
	}
}

fn run_listener(listener: AbortListener) {
	if catch_unwind(AssertUnwindSafe(listener)).is_err() {
		warn!("completion.abort_listener.panic");
	}
}

impl fmt::Debug for CompletionContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CompletionContext")
			.field("pos", &self.inner.pos)
			.field("explicit", &self.inner.explicit)
			.field("aborted", &self.is_aborted())
			.finish_non_exhaustive()
	}
}
