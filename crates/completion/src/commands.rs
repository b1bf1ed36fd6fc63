//! Completion commands and the default keymap.
//!
//! Commands inspect the current states and return the transaction to
//! dispatch, or `None` when they do not apply (so the host can fall through
//! to other bindings).

use std::sync::Arc;

use quill_primitives::{Change, CharIdx, EditorState, Range, Selection, Transaction, UserEvent};
use tokio::time::Instant;

use crate::config::CompletionConfig;
use crate::effect::{Effect, PickedCompletion};
use crate::item::{Apply, Completion};
use crate::rank::RankedOption;
use crate::state::{CompletionDialog, CompletionState};

/// How far a selection move goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
	/// One option; wraps around at either end.
	Option,
	/// A page of the given number of visible rows; stops at either end.
	Page(usize),
}

/// Commands bound by the default keymap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionCommand {
	Start,
	Close,
	/// Move the selection by one option.
	Next,
	Previous,
	/// Move the selection by a page.
	PageDown,
	PageUp,
	Accept,
}

/// Key bindings installed when `default_keymap` is enabled.
pub fn default_keymap(config: &CompletionConfig) -> Vec<(&'static str, CompletionCommand)> {
	if !config.default_keymap {
		return Vec::new();
	}
	vec![
		("Ctrl-Space", CompletionCommand::Start),
		("Escape", CompletionCommand::Close),
		("ArrowDown", CompletionCommand::Next),
		("ArrowUp", CompletionCommand::Previous),
		("PageDown", CompletionCommand::PageDown),
		("PageUp", CompletionCommand::PageUp),
		("Enter", CompletionCommand::Accept),
	]
}

/// Explicitly starts completion at the cursor.
pub fn start_completion(state: &EditorState) -> Transaction {
	Transaction::empty(state.len_chars()).with_effect(Effect::Start { explicit: true })
}

/// Closes completion. Returns `None` if no source is active.
pub fn close_completion(state: &EditorState, completion: &CompletionState) -> Option<Transaction> {
	completion.status()?;
	Some(Transaction::empty(state.len_chars()).with_effect(Effect::Close))
}

/// The open dialog, if it accepts interaction at `now`.
fn interactive_dialog<'a>(completion: &'a CompletionState, config: &CompletionConfig, now: Instant) -> Option<&'a CompletionDialog> {
	completion
		.open()
		.filter(|o| !o.disabled() && now.saturating_duration_since(o.timestamp()) >= config.interaction_delay())
}

/// Moves the selection forward or backward.
pub fn move_completion_selection(
	state: &EditorState,
	completion: &CompletionState,
	config: &CompletionConfig,
	now: Instant,
	forward: bool,
	step: Step,
) -> Option<Transaction> {
	let open = interactive_dialog(completion, config, now)?;
	let len = open.options().len();
	let by = match step {
		Step::Option => 1,
		Step::Page(rows) => rows.saturating_sub(1).max(2),
	};

	let selected = match (open.selected(), forward) {
		(None, true) => 0,
		(None, false) => len - 1,
		(Some(i), true) if i + by < len => i + by,
		(Some(i), false) if i >= by => i - by,
		(Some(_), true) => match step {
			Step::Option => 0,
			Step::Page(_) => len - 1,
		},
		(Some(_), false) => match step {
			Step::Option => len - 1,
			Step::Page(_) => 0,
		},
	};
	Some(Transaction::empty(state.len_chars()).with_effect(Effect::SetSelected(selected)))
}

/// Applies the selected option.
pub fn accept_completion(state: &EditorState, completion: &CompletionState, config: &CompletionConfig, now: Instant) -> Option<Transaction> {
	let option = interactive_dialog(completion, config, now)?.selected_option()?;
	apply_completion(state, completion, option)
}

/// Applies the selected option if `typed` is one of its commit characters.
///
/// The typed character is not part of the returned transaction; the host
/// inserts it afterwards.
pub fn commit_completion(state: &EditorState, completion: &CompletionState, typed: &str) -> Option<Transaction> {
	let mut chars = typed.chars();
	let (Some(c), None) = (chars.next(), chars.next()) else {
		return None;
	};
	let open = completion.open().filter(|o| !o.disabled())?;
	let option = open.selected_option()?;
	let result = completion.find(&option.source)?.result()?;
	let commit = option.completion.commit_characters.as_ref().or_else(|| result.result().commit_characters());
	if !commit.is_some_and(|chars| chars.contains(&c)) {
		return None;
	}
	apply_completion(state, completion, option)
}

/// Builds the transaction that applies `option` over its source's span.
///
/// Returns `None` if the source no longer holds a result.
pub fn apply_completion(state: &EditorState, completion: &CompletionState, option: &RankedOption) -> Option<Transaction> {
	let result = completion.find(&option.source)?.result()?;
	let picked = PickedCompletion(option.completion.clone());
	let tx = match &option.completion.apply {
		Some(Apply::Custom(apply)) => {
			let tx = apply(state, &option.completion, result.from(), result.to());
			if tx.user_event().is_some() { tx } else { tx.with_user_event(UserEvent::Complete) }
		}
		Some(Apply::Text(text)) => insert_completion_text(state, text, result.from(), result.to()),
		None => insert_completion_text(state, &option.completion.label, result.from(), result.to()),
	};
	Some(tx.annotate(picked))
}

/// Replaces `from..to` with `text` at the main cursor and at the same offsets
/// around every other cursor whose surrounding text matches.
pub fn insert_completion_text(state: &EditorState, text: &str, from: CharIdx, to: CharIdx) -> Transaction {
	let main = state.selection().primary();
	let replaced = state.slice_to_string(from, to);
	let text_len = text.chars().count() as isize;
	let from_off = from as isize - main.from() as isize;
	let to_off = to as isize - main.from() as isize;
	let len = state.len_chars() as isize;

	let mut changes = Vec::new();
	let mut ranges = Vec::new();
	let mut primary = None;
	let mut delta = 0isize;
	let mut last_end = 0isize;
	for (i, range) in state.selection().iter().enumerate() {
		let is_main = i == state.selection().primary_index();
		let start = range.from() as isize + from_off;
		let end = if to == main.from() { range.to() as isize } else { range.from() as isize + to_off };
		let usable = start >= last_end
			&& end <= len
			&& start <= end
			&& (is_main || from == to || state.slice_to_string(start as usize, end as usize) == replaced);
		if is_main {
			primary = Some(ranges.len());
		}
		if !usable {
			ranges.push(Range::new(shift(range.anchor, delta), shift(range.head, delta)));
			continue;
		}

		changes.push(Change::replace(start as usize, end as usize, text));
		let cursor = shift(start as usize, delta + text_len);
		delta += text_len - (end - start);
		last_end = end;
		ranges.push(Range::point(cursor));
	}

	let primary = ranges.remove(primary.unwrap_or(0));
	Transaction::change(state.doc().slice(..), changes)
		.with_selection(Selection::new(primary, ranges))
		.with_user_event(UserEvent::Complete)
}

fn shift(pos: CharIdx, delta: isize) -> CharIdx {
	pos.saturating_add_signed(delta)
}

/// The completion the transaction applied, if any.
pub fn picked_completion(tx: &Transaction) -> Option<&Arc<Completion>> {
	tx.annotation::<PickedCompletion>().map(PickedCompletion::completion)
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use super::*;
	use crate::active::ActiveSource;
	use crate::item::CompletionResult;
	use crate::setup::CompletionSetup;
	use crate::source::Source;
	use crate::testing::{effects, empty_source, word_result};

	struct Open {
		editor: EditorState,
		state: CompletionState,
		config: CompletionConfig,
		now: Instant,
	}

	fn open(text: &str, cursor: usize, from: usize, labels: &[&str]) -> Open {
		open_with(EditorState::with_cursor(text, cursor), from, word_result(from, labels), empty_source("words"))
	}

	fn open_with(editor: EditorState, from: usize, result: Arc<CompletionResult>, source: Source) -> Open {
		let setup = CompletionSetup::default().with_source(source.clone());
		let opened_at = Instant::now();
		let active = ActiveSource::with_result(source, result, from, editor.cursor(), None);
		let update = effects(&editor, vec![Effect::SetActive(vec![active])]);
		let state = CompletionState::new(&setup).update(&update, &setup, opened_at);
		Open {
			editor,
			state,
			config: setup.config,
			now: opened_at + Duration::from_secs(1),
		}
	}

	fn selected(tx: Option<Transaction>) -> Option<usize> {
		tx?.effects::<Effect>().find_map(|e| match e {
			Effect::SetSelected(i) => Some(*i),
			_ => None,
		})
	}

	#[test]
	fn test_move_wraps_by_option_and_clamps_by_page() {
		let o = open("", 0, 0, &["a", "b", "c", "d"]);
		let mv = |forward, step| selected(move_completion_selection(&o.editor, &o.state, &o.config, o.now, forward, step));

		assert_eq!(mv(true, Step::Option), Some(1));
		assert_eq!(mv(false, Step::Option), Some(3));
		assert_eq!(mv(false, Step::Page(5)), Some(0));
		assert_eq!(mv(true, Step::Page(5)), Some(3));
		assert_eq!(mv(true, Step::Page(0)), Some(2));
	}

	#[test]
	fn test_commands_wait_for_interaction_delay() {
		let o = open("ap", 2, 0, &["apple"]);
		let early = o.now - Duration::from_millis(990);
		assert!(move_completion_selection(&o.editor, &o.state, &o.config, early, true, Step::Option).is_none());
		assert!(accept_completion(&o.editor, &o.state, &o.config, early).is_none());
		assert!(accept_completion(&o.editor, &o.state, &o.config, o.now).is_some());
	}

	#[test]
	fn test_accept_replaces_span_with_label() {
		let o = open("let ap", 6, 4, &["apple"]);
		let tx = accept_completion(&o.editor, &o.state, &o.config, o.now).unwrap();
		let applied = o.editor.apply(&tx);

		assert_eq!(applied.doc().to_string(), "let apple");
		assert_eq!(applied.cursor(), 9);
		assert_eq!(tx.user_event(), Some(UserEvent::Complete));
		assert_eq!(picked_completion(&tx).unwrap().label, "apple");
	}

	#[test]
	fn test_accept_requires_selection() {
		let mut o = open("ap", 2, 0, &["apple"]);
		let config = CompletionConfig {
			select_on_open: false,
			..CompletionConfig::default()
		};
		let setup = CompletionSetup::new(config.clone()).with_source(o.state.active()[0].source().clone());
		let update = effects(&o.editor, vec![Effect::SetActive(vec![o.state.active()[0].clone()])]);
		o.state = CompletionState::new(&setup).update(&update, &setup, o.now - Duration::from_secs(1));
		assert_eq!(o.state.open().unwrap().selected(), None);
		assert!(accept_completion(&o.editor, &o.state, &config, o.now).is_none());
	}

	#[test]
	fn test_custom_apply_is_annotated() {
		let apply = Apply::custom(|state, _, from, to| Transaction::change(state.doc().slice(..), [Change::replace(from, to, "fn() {}")]));
		let result = Arc::new(CompletionResult::builder(0, vec![Completion::new("fn").with_apply(apply)]).build().unwrap());
		let o = open_with(EditorState::with_cursor("f", 1), 0, result, empty_source("snippets"));
		let tx = accept_completion(&o.editor, &o.state, &o.config, o.now).unwrap();

		assert_eq!(o.editor.apply(&tx).doc().to_string(), "fn() {}");
		assert_eq!(tx.user_event(), Some(UserEvent::Complete));
		assert_eq!(picked_completion(&tx).unwrap().label, "fn");
	}

	#[test]
	fn test_commit_characters() {
		let result = Arc::new(
			CompletionResult::builder(0, vec![Completion::new("foo"), Completion::new("fop").with_commit_characters(['('])])
				.commit_characters(['.'])
				.build()
				.unwrap(),
		);
		let o = open_with(EditorState::with_cursor("fo", 2), 0, result, empty_source("words"));
		assert_eq!(o.state.selected_completion().unwrap().label, "foo");

		let tx = commit_completion(&o.editor, &o.state, ".").unwrap();
		assert_eq!(o.editor.apply(&tx).doc().to_string(), "foo");
		assert!(commit_completion(&o.editor, &o.state, "(").is_none());
		assert!(commit_completion(&o.editor, &o.state, "..").is_none());
	}

	#[test]
	fn test_option_commit_characters_replace_result_ones() {
		let result = Arc::new(
			CompletionResult::builder(0, vec![Completion::new("fop").with_commit_characters(['('])])
				.commit_characters(['.'])
				.build()
				.unwrap(),
		);
		let o = open_with(EditorState::with_cursor("fo", 2), 0, result, empty_source("words"));

		assert!(commit_completion(&o.editor, &o.state, ".").is_none());
		let tx = commit_completion(&o.editor, &o.state, "(").unwrap();
		assert_eq!(o.editor.apply(&tx).doc().to_string(), "fop");
	}

	#[test]
	fn test_insert_at_every_matching_cursor() {
		let selection = Selection::new(Range::point(5), [Range::point(2), Range::point(8)]);
		let state = EditorState::new("ab ab xb", selection);
		let tx = insert_completion_text(&state, "abc", 3, 5);
		let applied = state.apply(&tx);

		assert_eq!(applied.doc().to_string(), "abc abc xb");
		assert_eq!(applied.cursor(), 7);
		assert_eq!(applied.selection().len(), 3);
	}

	#[test]
	fn test_close_requires_active_source() {
		let o = open("ap", 2, 0, &["apple"]);
		assert!(close_completion(&o.editor, &o.state).is_some());

		let idle = CompletionState::new(&CompletionSetup::default());
		assert!(close_completion(&o.editor, &idle).is_none());
	}

	#[test]
	fn test_default_keymap_toggle() {
		let config = CompletionConfig::default();
		assert!(default_keymap(&config).contains(&("Enter", CompletionCommand::Accept)));
		let off = CompletionConfig {
			default_keymap: false,
			..config
		};
		assert!(default_keymap(&off).is_empty());
	}
}
