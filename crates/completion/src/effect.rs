//! Values completion attaches to transactions.

use std::sync::Arc;

use crate::active::ActiveSource;
use crate::item::Completion;

/// Control requests handled by [`CompletionState::update`](crate::CompletionState::update).
///
/// Attach with [`Transaction::with_effect`](quill_primitives::Transaction::with_effect).
#[derive(Debug, Clone)]
pub enum Effect {
	/// Move every source to pending; `explicit` records a user request at the cursor.
	Start { explicit: bool },
	/// Move every source to inactive.
	Close,
	/// Install finished queries. Each entry replaces the state of its source.
	SetActive(Vec<ActiveSource>),
	/// Select the option at this index, clamped to the option count.
	SetSelected(usize),
}

/// Annotation on every transaction produced by applying a completion.
#[derive(Debug, Clone)]
pub struct PickedCompletion(pub Arc<Completion>);

impl PickedCompletion {
	pub fn completion(&self) -> &Arc<Completion> {
		&self.0
	}
}
