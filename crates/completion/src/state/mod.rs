//! The aggregate completion state of one editor.
//!
//! [`CompletionState`] is a pure value: [`CompletionState::update`] derives
//! the next state from the previous one and an applied transaction, and
//! returns an equal state when the transaction is irrelevant to completion.

use std::sync::Arc;

use quill_primitives::StateUpdate;
use tokio::time::Instant;

use crate::active::ActiveSource;
use crate::effect::Effect;
use crate::item::Completion;
use crate::setup::CompletionSetup;
use crate::source::Source;

mod dialog;
#[cfg(test)]
mod tests;

pub use dialog::CompletionDialog;

/// Coarse status of a completion state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStatus {
	/// At least one source is waiting for a query.
	Pending,
	/// No source is pending and at least one holds a result.
	Active,
}

/// Per-source states plus the open dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionState {
	active: Vec<ActiveSource>,
	id: Arc<str>,
	open: Option<CompletionDialog>,
}

impl CompletionState {
	/// Creates a state with every configured source inactive.
	pub fn new(setup: &CompletionSetup) -> Self {
		Self {
			active: setup.active_sources().iter().cloned().map(ActiveSource::inactive).collect(),
			id: uuid::Uuid::new_v4().to_string().into(),
			open: None,
		}
	}

	/// One entry per source in effect.
	pub fn active(&self) -> &[ActiveSource] {
		&self.active
	}

	/// Identifies this completion session across states; used to tie a
	/// rendered dialog to its options.
	pub fn id(&self) -> &str {
		&self.id
	}

	/// The dialog, if open.
	pub fn open(&self) -> Option<&CompletionDialog> {
		self.open.as_ref()
	}

	/// The state of `source`, if it is in effect.
	pub fn find(&self, source: &Source) -> Option<&ActiveSource> {
		self.active.iter().find(|a| a.source() == source)
	}

	pub fn status(&self) -> Option<CompletionStatus> {
		if self.active.iter().any(ActiveSource::is_pending) {
			Some(CompletionStatus::Pending)
		} else if self.active.iter().any(|a| !a.is_inactive()) {
			Some(CompletionStatus::Active)
		} else {
			None
		}
	}

	/// The selected option of an enabled dialog.
	pub fn selected_completion(&self) -> Option<&Arc<Completion>> {
		let open = self.open.as_ref().filter(|o| !o.disabled())?;
		open.selected_option().map(|o| &o.completion)
	}

	/// Index of the selected option of an enabled dialog.
	pub fn selected_index(&self) -> Option<usize> {
		self.open.as_ref().filter(|o| !o.disabled())?.selected()
	}

	/// The options currently shown, best first.
	pub fn current_completions(&self) -> Vec<Arc<Completion>> {
		self.open
			.as_ref()
			.map(|o| o.options().iter().map(|r| r.completion.clone()).collect())
			.unwrap_or_default()
	}

	/// Derives the state after `update`.
	///
	/// `now` stamps a newly opened dialog; nothing else reads it.
	pub fn update(&self, update: &StateUpdate, setup: &CompletionSetup, now: Instant) -> Self {
		let any_live = self.active.iter().any(|a| !a.is_inactive());
		let active: Vec<ActiveSource> = setup
			.active_sources()
			.iter()
			.map(|source| {
				let current = match self.find(source) {
					Some(a) => a.clone(),
					None if any_live => ActiveSource::pending(source.clone(), None),
					None => ActiveSource::inactive(source.clone()),
				};
				current.update(update, setup)
			})
			.collect();
		let mut active = if active == self.active { self.active.clone() } else { active };

		let did_set_active = update.transaction().effects::<Effect>().any(|e| matches!(e, Effect::SetActive(_)));
		let mut open = self.open.clone();
		if let Some(dialog) = &open
			&& update.doc_changed()
		{
			open = Some(dialog.map(update.changes()));
		}

		let touched = active
			.iter()
			.filter_map(ActiveSource::result)
			.any(|r| update.doc_changed() && update.changes().touches_range(r.from(), r.to()));
		if update.selection_set() || touched || !same_results(&active, &self.active) || did_set_active {
			open = CompletionDialog::build(&active, update.state(), open.as_ref(), setup, did_set_active, now);
		} else if open.as_ref().is_some_and(CompletionDialog::disabled) && !active.iter().any(ActiveSource::is_pending) {
			open = None;
		}

		// Results no dialog shows are useless; drop them so the next
		// activation queries again.
		if open.is_none() && !active.iter().any(ActiveSource::is_pending) && active.iter().any(ActiveSource::has_result) {
			active = active
				.into_iter()
				.map(|a| if a.has_result() { ActiveSource::inactive(a.source().clone()) } else { a })
				.collect();
		}

		for effect in update.transaction().effects::<Effect>() {
			if let Effect::SetSelected(index) = effect {
				open = open.map(|o| o.set_selected(*index));
			}
		}

		Self {
			active,
			id: self.id.clone(),
			open,
		}
	}
}

/// Compares the results held by two source lists, by identity, ignoring
/// sources without a result.
fn same_results(a: &[ActiveSource], b: &[ActiveSource]) -> bool {
	let results = |list: &[ActiveSource]| -> Vec<_> { list.iter().filter_map(ActiveSource::result).map(|r| r.result().clone()).collect() };
	let (a, b) = (results(a), results(b));
	a.len() == b.len() && a.iter().zip(&b).all(|(x, y)| Arc::ptr_eq(x, y))
}
