//! Per-source state machine.
//!
//! Every source is in one of three states:
//!
//! - **Inactive**: not queried, holds nothing.
//! - **Pending**: waiting to be queried (or for a running query to land).
//! - **Result**: holds a result positioned over a span of the document.
//!
//! [`ActiveSource::update`] advances a state through one applied transaction.
//! It never reads a clock, so replaying the same transactions from the same
//! state always yields the same state. The scheduler depends on that when it
//! replays a query's backlog over a late result.

use std::sync::Arc;

use bitflags::bitflags;
use quill_primitives::{Bias, ChangeSet, CharIdx, StateUpdate, UserEvent};

use crate::context::CompletionContext;
use crate::effect::{Effect, PickedCompletion};
use crate::item::CompletionResult;
use crate::setup::CompletionSetup;
use crate::source::Source;

#[cfg(test)]
mod tests;

bitflags! {
	/// How a transaction affects completion.
	#[derive(Debug, Clone, Copy, PartialEq, Eq)]
	pub struct UpdateType: u8 {
		/// Text typed at the cursor.
		const TYPING = 1;
		/// Backward deletion at the cursor.
		const BACKSPACING = 2;
		/// Typing or backspacing; results can be revalidated in place.
		const SIMPLE_INTERACTION = Self::TYPING.bits() | Self::BACKSPACING.bits();
		/// Inactive sources become pending.
		const ACTIVATE = 4;
		/// Every source becomes inactive.
		const RESET = 8;
		/// Sources whose span the change touches become inactive.
		const RESET_IF_TOUCHING = 16;
	}
}

impl UpdateType {
	/// Classifies an applied transaction.
	pub fn of(update: &StateUpdate, setup: &CompletionSetup) -> Self {
		if update.is_user_event(UserEvent::Complete)
			&& let Some(picked) = update.transaction().annotation::<PickedCompletion>()
			&& setup.activates_on_completion(picked.completion())
		{
			return Self::ACTIVATE | Self::RESET;
		}

		let typing = update.is_typing();
		if typing && setup.config.activate_on_typing {
			Self::ACTIVATE | Self::TYPING
		} else if typing {
			Self::TYPING
		} else if update.is_user_event(UserEvent::DeleteBackward) {
			Self::BACKSPACING
		} else if update.selection_set() {
			Self::RESET
		} else if update.doc_changed() {
			Self::RESET_IF_TOUCHING
		} else {
			Self::empty()
		}
	}

	/// Returns true for typing or backspacing.
	pub fn is_simple(self) -> bool {
		self.intersects(Self::SIMPLE_INTERACTION)
	}
}

/// State of one source.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceState {
	/// Not queried.
	Inactive,
	/// Waiting for a query. `explicit_pos` is where the user explicitly asked
	/// for completion, mapped through later changes.
	Pending { explicit_pos: Option<CharIdx> },
	/// Holding a result.
	Result(ActiveResult),
}

/// A result positioned in the current document.
#[derive(Debug, Clone)]
pub struct ActiveResult {
	result: Arc<CompletionResult>,
	from: CharIdx,
	to: CharIdx,
	explicit_pos: Option<CharIdx>,
}

impl ActiveResult {
	/// The result as the source returned it (or as its hooks adapted it).
	pub fn result(&self) -> &Arc<CompletionResult> {
		&self.result
	}

	/// Start of the span, in the current document.
	pub fn from(&self) -> CharIdx {
		self.from
	}

	/// End of the span, in the current document.
	pub fn to(&self) -> CharIdx {
		self.to
	}

	pub fn explicit_pos(&self) -> Option<CharIdx> {
		self.explicit_pos
	}
}

/// Results compare by identity, spans by value.
impl PartialEq for ActiveResult {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.result, &other.result) && self.from == other.from && self.to == other.to && self.explicit_pos == other.explicit_pos
	}
}

/// A source and its state.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSource {
	source: Source,
	state: SourceState,
}

impl ActiveSource {
	pub fn inactive(source: Source) -> Self {
		Self {
			source,
			state: SourceState::Inactive,
		}
	}

	pub fn pending(source: Source, explicit_pos: Option<CharIdx>) -> Self {
		Self {
			source,
			state: SourceState::Pending { explicit_pos },
		}
	}

	pub fn with_result(source: Source, result: Arc<CompletionResult>, from: CharIdx, to: CharIdx, explicit_pos: Option<CharIdx>) -> Self {
		Self {
			source,
			state: SourceState::Result(ActiveResult {
				result,
				from,
				to,
				explicit_pos,
			}),
		}
	}

	pub fn source(&self) -> &Source {
		&self.source
	}

	pub fn state(&self) -> &SourceState {
		&self.state
	}

	pub fn is_inactive(&self) -> bool {
		matches!(self.state, SourceState::Inactive)
	}

	pub fn is_pending(&self) -> bool {
		matches!(self.state, SourceState::Pending { .. })
	}

	pub fn has_result(&self) -> bool {
		matches!(self.state, SourceState::Result(_))
	}

	pub fn result(&self) -> Option<&ActiveResult> {
		match &self.state {
			SourceState::Result(r) => Some(r),
			_ => None,
		}
	}

	/// Where completion was explicitly requested, if it was.
	pub fn explicit_pos(&self) -> Option<CharIdx> {
		match &self.state {
			SourceState::Inactive => None,
			SourceState::Pending { explicit_pos } => *explicit_pos,
			SourceState::Result(r) => r.explicit_pos,
		}
	}

	/// Advances this source through one applied transaction.
	pub fn update(&self, update: &StateUpdate, setup: &CompletionSetup) -> Self {
		let ty = UpdateType::of(update, setup);
		let mut value = self.clone();

		let reset = ty.contains(UpdateType::RESET) && !self.keeps_span(update);
		if reset || (ty.contains(UpdateType::RESET_IF_TOUCHING) && self.touches(update)) {
			value = Self::inactive(self.source.clone());
		}
		if ty.contains(UpdateType::ACTIVATE) && value.is_inactive() {
			value = Self::pending(self.source.clone(), None);
		}
		value = value.update_for(update, ty);

		for effect in update.transaction().effects::<Effect>() {
			match effect {
				Effect::Start { explicit } => {
					let explicit_pos = explicit.then(|| update.state().cursor());
					value = Self::pending(self.source.clone(), explicit_pos);
				}
				Effect::Close => value = Self::inactive(self.source.clone()),
				Effect::SetActive(list) => {
					if let Some(active) = list.iter().find(|a| a.source == self.source) {
						value = active.clone();
					}
				}
				Effect::SetSelected(_) => {}
			}
		}
		value
	}

	/// A cursor move that stays inside a result's span keeps the result.
	fn keeps_span(&self, update: &StateUpdate) -> bool {
		let cursor = update.state().cursor();
		!update.doc_changed() && self.result().is_some_and(|r| r.from <= cursor && cursor <= r.to)
	}

	/// Returns true if the transaction's changes touch this source's span,
	/// or the cursor for sources without a result.
	fn touches(&self, update: &StateUpdate) -> bool {
		match &self.state {
			SourceState::Result(r) => update.changes().touches_range(r.from, r.to),
			_ => {
				let cursor = update.state().cursor();
				update.changes().touches_range(cursor, cursor)
			}
		}
	}

	fn update_for(self, update: &StateUpdate, ty: UpdateType) -> Self {
		if ty.is_simple()
			&& let SourceState::Result(r) = &self.state
		{
			return r.revalidate(&self.source, update, ty);
		}
		self.map(update.changes())
	}

	/// Maps positions through `changes` without revalidating.
	pub fn map(self, changes: &ChangeSet) -> Self {
		if changes.is_empty() {
			return self;
		}
		match self.state {
			SourceState::Inactive | SourceState::Pending { explicit_pos: None } => self,
			SourceState::Pending { explicit_pos: Some(pos) } => Self::pending(self.source, Some(changes.map_pos(pos, Bias::Left))),
			SourceState::Result(r) => {
				if changes.deletes_range(r.from, r.to) {
					return Self::inactive(self.source);
				}
				let result = match r.result.map_fn() {
					Some(map) => map(&r.result, changes),
					None => Some(r.result.clone()),
				};
				let Some(result) = result else {
					return Self::inactive(self.source);
				};
				Self::with_result(
					self.source,
					result,
					changes.map_pos(r.from, Bias::Left),
					changes.map_pos(r.to, Bias::Right),
					r.explicit_pos.map(|p| changes.map_pos(p, Bias::Left)),
				)
			}
		}
	}
}

impl ActiveResult {
	/// Revalidates the result after typing or backspacing.
	fn revalidate(&self, source: &Source, update: &StateUpdate, ty: UpdateType) -> ActiveSource {
		let changes = update.changes();
		let mut result = Some(self.result.clone());
		if let Some(map) = self.result.map_fn()
			&& !changes.is_empty()
		{
			result = map(&self.result, changes);
		}

		let from = changes.map_pos(self.from, Bias::Left);
		let to = changes.map_pos(self.to, Bias::Right);
		let pos = update.state().cursor();
		let before_start = match self.explicit_pos {
			None => pos <= from,
			Some(_) => pos < self.from,
		};
		let backspaced_past = ty.contains(UpdateType::BACKSPACING) && update.start().cursor() == self.from;

		let result = match result {
			Some(result) if !before_start && pos <= to && !backspaced_past => result,
			_ => {
				return if ty.contains(UpdateType::ACTIVATE) {
					ActiveSource::pending(source.clone(), None)
				} else {
					ActiveSource::inactive(source.clone())
				};
			}
		};

		let explicit_pos = self.explicit_pos.map(|p| changes.map_pos(p, Bias::Left));
		if let Some(rule) = result.valid_for()
			&& rule.check(update.state(), from, to)
		{
			return ActiveSource::with_result(source.clone(), result, from, to, explicit_pos);
		}

		if let Some(adapt) = result.update_fn() {
			let cx = CompletionContext::new(update.state().clone(), pos, false);
			if let Some(updated) = adapt(&result, from, to, &cx)
				&& updated.from() <= updated.to().unwrap_or(pos)
			{
				let (from, to) = (updated.from(), updated.to().unwrap_or(pos));
				return ActiveSource::with_result(source.clone(), updated, from, to, explicit_pos);
			}
		}

		ActiveSource::pending(source.clone(), explicit_pos)
	}
}
