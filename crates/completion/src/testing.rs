//! Transaction builders shared by unit tests.

use std::sync::Arc;

use quill_primitives::{Change, CharIdx, EditorState, Selection, StateUpdate, Transaction, UserEvent};

use crate::effect::Effect;
use crate::item::{Completion, CompletionResult, ValidFor};
use crate::source::Source;

/// A source that never has anything to offer.
pub(crate) fn empty_source(name: &str) -> Source {
	Source::from_fn(name.to_owned(), |_| Ok(None))
}

pub(crate) fn options(labels: &[&str]) -> Vec<Completion> {
	labels.iter().map(|l| Completion::new(*l)).collect()
}

/// A word-continuing result over `from..` with the given labels.
pub(crate) fn word_result(from: CharIdx, labels: &[&str]) -> Arc<CompletionResult> {
	Arc::new(
		CompletionResult::builder(from, options(labels))
			.valid_for(ValidFor::pattern(r"\w*").unwrap())
			.build()
			.unwrap(),
	)
}

pub(crate) fn type_text(state: &EditorState, text: &str) -> StateUpdate {
	let tx = Transaction::insert(state.doc().slice(..), state.selection(), text.into()).with_user_event(UserEvent::Type);
	StateUpdate::new(state.clone(), tx)
}

pub(crate) fn backspace(state: &EditorState) -> StateUpdate {
	let cursor = state.cursor();
	let tx = Transaction::change(state.doc().slice(..), [Change::delete(cursor - 1, cursor)]).with_user_event(UserEvent::DeleteBackward);
	StateUpdate::new(state.clone(), tx)
}

pub(crate) fn move_cursor(state: &EditorState, pos: CharIdx) -> StateUpdate {
	let tx = Transaction::empty(state.len_chars())
		.with_selection(Selection::point(pos))
		.with_user_event(UserEvent::Select);
	StateUpdate::new(state.clone(), tx)
}

/// A change without a user event, such as a remote edit or a formatter.
pub(crate) fn edit(state: &EditorState, changes: Vec<Change>) -> StateUpdate {
	let tx = Transaction::change(state.doc().slice(..), changes);
	StateUpdate::new(state.clone(), tx)
}

pub(crate) fn effects(state: &EditorState, effects: Vec<Effect>) -> StateUpdate {
	let tx = Transaction::empty(state.len_chars()).with_effects(effects);
	StateUpdate::new(state.clone(), tx)
}
