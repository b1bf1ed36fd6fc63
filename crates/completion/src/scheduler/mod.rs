//! Query scheduler: runs pending sources and folds their answers back in.
//!
//! The scheduler never touches [`CompletionState`] directly. The host feeds it
//! every applied update through [`Scheduler::observe`] and periodically calls
//! [`Scheduler::poll`], which returns the [`Effect`]s to dispatch. Answers are
//! folded as if they had existed since their query started: the updates
//! observed while a query ran are replayed over the answer before it is
//! installed.
//!
//! # Deadlines
//!
//! | Deadline | Armed by | Fires |
//! |----------|----------|-------|
//! | update debounce | `observe`, when a pending source has no running query | starts queries |
//! | accept sync window | first finished query while others run | folds finished queries |
//! | composition restart | `composition_end` after a composition typed and moved | `Start { explicit: false }` |
//!
//! All deadlines are [`tokio::time::Instant`]s checked against the `now`
//! passed to `poll`, so hosts and tests control time.

use std::sync::Arc;
use std::task::{Context, Poll};

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use quill_primitives::{BoxFutureStatic, EditorState, StateUpdate};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::active::{ActiveSource, UpdateType};
use crate::config::COMPOSITION_RESTART_DELAY;
use crate::context::CompletionContext;
use crate::effect::Effect;
use crate::item::CompletionResult;
use crate::setup::CompletionSetup;
use crate::source::SourceOutput;
use crate::state::CompletionState;


type QueryId = u64;

/// How a query future ended.
enum Resolution {
	/// The query was aborted before the source answered.
	Aborted,
	Done(SourceOutput),
}

/// What handling a resolution led to.
enum Resolved {
	/// The query was aborted or is unknown.
	Ignored,
	/// Other queries are still running.
	Waiting,
	AllDone,
	/// The source failed; the session closes.
	Failed,
}

#[derive(Debug)]
enum Outcome {
	Running,
	/// The source answered with no result.
	Empty,
	Ready(Arc<CompletionResult>),
}

/// A query in flight.
#[derive(Debug)]
struct RunningQuery {
	id: QueryId,
	/// The source's state when the query started.
	active: ActiveSource,
	context: CompletionContext,
	started: Instant,
	/// Updates observed since the query started, replayed over its answer.
	updates: Vec<StateUpdate>,
	outcome: Outcome,
}

impl RunningQuery {
	fn is_done(&self) -> bool {
		!matches!(self.outcome, Outcome::Running)
	}
}

/// Input method composition progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Composition {
	#[default]
	Idle,
	Started,
	/// Composition typed text.
	Changed,
	/// Composition typed text and then moved the selection.
	ChangedAndMoved,
}

/// Drives pending sources to resolution.
pub struct Scheduler {
	running: Vec<RunningQuery>,
	queries: FuturesUnordered<BoxFutureStatic<(QueryId, Resolution)>>,
	/// Resolutions drained from `queries` but not yet handled.
	ready: Vec<(QueryId, Resolution)>,
	next_id: QueryId,
	debounce_update: Option<Instant>,
	debounce_accept: Option<Instant>,
	/// An explicit start was observed since queries were last started.
	pending_start: bool,
	composition: Composition,
	composition_restart: Option<Instant>,
}

impl Default for Scheduler {
	fn default() -> Self {
		Self {
			running: Vec::new(),
			queries: FuturesUnordered::new(),
			ready: Vec::new(),
			next_id: 0,
			debounce_update: None,
			debounce_accept: None,
			pending_start: false,
			composition: Composition::Idle,
			composition_restart: None,
		}
	}
}

impl Scheduler {
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of queries in flight.
	pub fn running_count(&self) -> usize {
		self.running.len()
	}

	/// Returns true if nothing is running or scheduled.
	pub fn is_idle(&self) -> bool {
		self.running.is_empty()
			&& self.ready.is_empty()
			&& self.debounce_update.is_none()
			&& self.debounce_accept.is_none()
			&& self.composition_restart.is_none()
	}

	pub fn composition(&self) -> Composition {
		self.composition
	}

	/// The earliest armed deadline.
	pub fn next_deadline(&self) -> Option<Instant> {
		[self.debounce_update, self.debounce_accept, self.composition_restart]
			.into_iter()
			.flatten()
			.min()
	}

	/// Observes one applied update.
	///
	/// `prev` and `next` are the completion states before and after it.
	pub fn observe(&mut self, update: &StateUpdate, prev: &CompletionState, next: &CompletionState, setup: &CompletionSetup, now: Instant) {
		if !update.selection_set() && !update.doc_changed() && prev == next {
			return;
		}

		let ty = UpdateType::of(update, setup);
		let resets = ty.contains(UpdateType::RESET) || ((update.selection_set() || update.doc_changed()) && !ty.is_simple());
		let config = &setup.config;
		let mut kept = Vec::with_capacity(self.running.len());
		for mut query in self.running.drain(..) {
			let stale = query.updates.len() + 1 > config.max_backlog && now.saturating_duration_since(query.started) > config.min_abort_age();
			if resets || (query.context.aborts_on_doc_change() && update.doc_changed()) || stale {
				debug!(source = query.active.source().name(), query = query.id, resets, stale, "completion.query.abort");
				query.context.abort();
			} else {
				query.updates.push(update.clone());
				kept.push(query);
			}
		}
		self.running = kept;

		if update.transaction().effects::<Effect>().any(|e| matches!(e, Effect::Start { .. })) {
			self.pending_start = true;
		}
		let delay = if self.pending_start {
			config.explicit_delay()
		} else {
			config.activate_on_typing_delay()
		};
		let needs_query = next.active().iter().any(|a| a.is_pending() && !self.is_running(a));
		self.debounce_update = needs_query.then(|| now + delay);

		if self.composition != Composition::Idle {
			if update.is_typing() {
				self.composition = Composition::Changed;
			} else if self.composition == Composition::Changed && update.selection_set() {
				self.composition = Composition::ChangedAndMoved;
			}
		}
	}

	pub fn composition_start(&mut self) {
		self.composition = Composition::Started;
	}

	/// Ends a composition; one that typed and moved restarts completion
	/// shortly after.
	pub fn composition_end(&mut self, now: Instant) {
		if self.composition == Composition::ChangedAndMoved {
			self.composition_restart = Some(now + COMPOSITION_RESTART_DELAY);
		}
		self.composition = Composition::Idle;
	}

	/// Aborts every running query and disarms all deadlines.
	pub fn abort_all(&mut self) {
		for query in self.running.drain(..) {
			debug!(source = query.active.source().name(), query = query.id, "completion.query.abort");
			query.context.abort();
		}
		self.ready.clear();
		self.debounce_update = None;
		self.debounce_accept = None;
		self.pending_start = false;
		self.composition_restart = None;
	}

	/// Advances the scheduler to `now`.
	///
	/// Starts due queries, collects finished ones and returns the effects to
	/// dispatch, in order, as one transaction.
	pub fn poll(&mut self, now: Instant, state: &EditorState, completion: &CompletionState, setup: &CompletionSetup) -> Vec<Effect> {
		let mut effects = Vec::new();

		if self.debounce_update.is_some_and(|t| t <= now) {
			self.start_update(now, state, completion, setup);
		}

		let mut cx = Context::from_waker(futures::task::noop_waker_ref());
		while let Poll::Ready(Some(resolution)) = self.queries.poll_next_unpin(&mut cx) {
			self.ready.push(resolution);
		}

		let mut accept_now = false;
		let ready = std::mem::take(&mut self.ready);
		let mut pending = ready.into_iter();
		for (id, resolution) in pending.by_ref() {
			match self.resolve(id, resolution, now, setup) {
				Resolved::Ignored | Resolved::Waiting => {}
				Resolved::AllDone => accept_now = true,
				Resolved::Failed => {
					effects.push(Effect::Close);
					break;
				}
			}
		}
		// Handle the rest after the close lands.
		self.ready.extend(pending);
		if !effects.is_empty() {
			return effects;
		}

		if accept_now || self.debounce_accept.is_some_and(|t| t <= now) {
			effects.extend(self.accept(now, state, completion, setup));
		}

		if self.composition_restart.is_some_and(|t| t <= now) {
			self.composition_restart = None;
			effects.push(Effect::Start { explicit: false });
		}
		effects
	}

	/// Waits until the next deadline or until a live query resolves.
	///
	/// Aborted queries resolve at once and are skipped. Returns immediately
	/// when nothing is running or armed.
	pub async fn wait(&mut self) {
		if !self.ready.is_empty() {
			return;
		}
		let deadline = self.next_deadline();
		loop {
			tokio::select! {
				Some((id, resolution)) = self.queries.next() => {
					if matches!(resolution, Resolution::Aborted) || !self.running.iter().any(|q| q.id == id) {
						continue;
					}
					self.ready.push((id, resolution));
					return;
				}
				() = sleep_until(deadline), if deadline.is_some() => return,
				else => return,
			}
		}
	}

	fn is_running(&self, active: &ActiveSource) -> bool {
		self.running.iter().any(|q| q.active.source() == active.source())
	}

	fn start_update(&mut self, now: Instant, state: &EditorState, completion: &CompletionState, setup: &CompletionSetup) {
		self.debounce_update = None;
		self.pending_start = false;
		for active in completion.active() {
			if active.is_pending() && !self.is_running(active) {
				self.start_query(active.clone(), now, state);
			}
		}
		if !self.running.is_empty() && completion.open().is_some_and(|o| o.disabled()) {
			self.debounce_accept = Some(now + setup.config.update_sync_time());
		}
	}

	fn start_query(&mut self, active: ActiveSource, now: Instant, state: &EditorState) {
		let id = self.next_id;
		self.next_id += 1;

		let pos = state.cursor();
		let context = CompletionContext::new(state.clone(), pos, active.explicit_pos().is_some());
		let token = context.token().clone();
		let future = active.source().complete(&context);
		self.queries.push(Box::pin(async move {
			tokio::select! {
				biased;
				() = token.cancelled() => (id, Resolution::Aborted),
				output = future => (id, Resolution::Done(output)),
			}
		}));

		trace!(source = active.source().name(), query = id, pos, explicit = context.explicit(), "completion.query.start");
		self.running.push(RunningQuery {
			id,
			active,
			context,
			started: now,
			updates: Vec::new(),
			outcome: Outcome::Running,
		});
	}

	fn resolve(&mut self, id: QueryId, resolution: Resolution, now: Instant, setup: &CompletionSetup) -> Resolved {
		let Some(index) = self.running.iter().position(|q| q.id == id) else {
			return Resolved::Ignored;
		};
		let query = &mut self.running[index];
		if query.context.is_aborted() {
			return Resolved::Ignored;
		}

		match resolution {
			Resolution::Aborted => return Resolved::Ignored,
			Resolution::Done(Err(error)) => {
				warn!(source = query.active.source().name(), query = id, error = %error, "completion.query.error");
				self.running.remove(index);
				return Resolved::Failed;
			}
			Resolution::Done(Ok(result)) => {
				query.outcome = match result {
					Some(result) => Outcome::Ready(Arc::new(result)),
					None => Outcome::Empty,
				};
			}
		}

		if self.running.iter().all(RunningQuery::is_done) {
			return Resolved::AllDone;
		}
		if self.debounce_accept.is_none() {
			self.debounce_accept = Some(now + setup.config.update_sync_time());
		}
		Resolved::Waiting
	}

	/// Folds every finished query into a `SetActive` effect.
	fn accept(&mut self, now: Instant, state: &EditorState, completion: &CompletionState, setup: &CompletionSetup) -> Option<Effect> {
		self.debounce_accept = None;

		let (done, running): (Vec<_>, Vec<_>) = std::mem::take(&mut self.running).into_iter().partition(RunningQuery::is_done);
		self.running = running;

		let mut updated = Vec::new();
		for mut query in done {
			let source = query.active.source().clone();
			let pos = query.context.pos();
			if let Outcome::Ready(result) = &query.outcome
				&& result.from() > result.to().unwrap_or(pos)
			{
				warn!(source = source.name(), query = query.id, from = result.from(), pos, "completion.query.invalid_span");
				query.outcome = Outcome::Empty;
			}
			if let Outcome::Ready(result) = &query.outcome {
				let to = result.to().unwrap_or(pos);
				let initial = ActiveSource::with_result(source.clone(), result.clone(), result.from(), to, query.active.explicit_pos());
				let replayed = query.updates.iter().fold(initial, |a, u| a.update(u, setup));
				if replayed.has_result() {
					trace!(source = source.name(), query = query.id, backlog = query.updates.len(), "completion.accept");
					updated.push(replayed);
					continue;
				}
			}

			let Some(current) = completion.find(&source).filter(|a| a.is_pending()) else {
				continue;
			};
			match query.outcome {
				Outcome::Ready(_) => {
					debug!(source = source.name(), query = query.id, "completion.query.restart");
					self.start_query(current.clone(), now, state);
				}
				_ => {
					let replayed = query.updates.iter().fold(ActiveSource::inactive(source), |a, u| a.update(u, setup));
					if !replayed.is_pending() {
						updated.push(replayed);
					}
				}
			}
		}

		let disabled = completion.open().is_some_and(|o| o.disabled());
		(!updated.is_empty() || disabled).then_some(Effect::SetActive(updated))
	}
}

async fn sleep_until(deadline: Option<Instant>) {
	match deadline {
		Some(deadline) => tokio::time::sleep_until(deadline).await,
		None => std::future::pending().await,
	}
}
