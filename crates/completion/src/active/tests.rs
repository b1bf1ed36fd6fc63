use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use proptest::prelude::*;
use quill_primitives::{Change, ChangeSet, EditorState, Transaction, UserEvent};

use super::{ActiveSource, SourceState, UpdateType};
use crate::config::CompletionConfig;
use crate::effect::{Effect, PickedCompletion};
use crate::item::{Completion, CompletionResult};
use crate::setup::CompletionSetup;
use crate::testing::{backspace, edit, effects, empty_source, move_cursor, options, type_text, word_result};

fn setup() -> CompletionSetup {
	CompletionSetup::default()
}

fn passive_setup() -> CompletionSetup {
	CompletionSetup::new(CompletionConfig {
		activate_on_typing: false,
		..CompletionConfig::default()
	})
}

fn span(active: &ActiveSource) -> Option<(usize, usize)> {
	active.result().map(|r| (r.from(), r.to()))
}

#[test]
fn test_valid_for_extends_span_without_requery() {
	let state = EditorState::with_cursor("hello", 5);
	let result = word_result(5, &["xylophone"]);
	let active = ActiveSource::with_result(empty_source("words"), result.clone(), 5, 5, None);

	let next = active.update(&type_text(&state, "x"), &setup());
	assert_eq!(span(&next), Some((5, 6)));
	assert!(Arc::ptr_eq(next.result().unwrap().result(), &result));
}

#[test]
fn test_deleting_span_deactivates() {
	let state = EditorState::with_cursor("abc hello world", 8);
	let active = ActiveSource::with_result(empty_source("words"), word_result(3, &["x"]), 3, 8, None);

	let next = active.update(&edit(&state, vec![Change::delete(2, 9)]), &setup());
	assert!(next.is_inactive());

	let cs = ChangeSet::from_changes(state.len_chars(), [Change::delete(2, 9)]);
	assert!(active.clone().map(&cs).is_inactive());
}

#[test]
fn test_backspacing_a_selection_over_span_deactivates() {
	let state = EditorState::new("abc hello world", quill_primitives::Selection::single(2, 9));
	let tx = Transaction::delete(state.doc().slice(..), state.selection()).with_user_event(UserEvent::DeleteBackward);
	let update = quill_primitives::StateUpdate::new(state, tx);
	let active = ActiveSource::with_result(empty_source("words"), word_result(3, &["x"]), 3, 8, None);
	assert!(active.update(&update, &setup()).is_inactive());
}

#[test]
fn test_cursor_move_inside_span_keeps_result() {
	let state = EditorState::with_cursor("foo ap", 6);
	let active = ActiveSource::with_result(empty_source("words"), word_result(4, &["apple"]), 4, 6, None);

	assert_eq!(active.update(&move_cursor(&state, 5), &setup()), active);
	assert!(active.update(&move_cursor(&state, 2), &setup()).is_inactive());
}

#[test]
fn test_cursor_move_resets_pending() {
	let state = EditorState::with_cursor("foo ap", 6);
	let active = ActiveSource::pending(empty_source("words"), None);
	assert!(active.update(&move_cursor(&state, 5), &setup()).is_inactive());
}

#[test]
fn test_invalid_continuation_goes_pending() {
	let state = EditorState::with_cursor("foo ap", 6);
	let active = ActiveSource::with_result(empty_source("words"), word_result(4, &["apple"]), 4, 6, None);

	let next = active.update(&type_text(&state, "."), &setup());
	assert_eq!(next.state(), &SourceState::Pending { explicit_pos: None });
}

#[test]
fn test_update_hook_adapts_result() {
	let state = EditorState::with_cursor("foo ap", 6);
	let result = Arc::new(
		CompletionResult::builder(4, options(&["apple"]))
			.update(|current, from, _to, _cx| Some(Arc::new(current.to_builder().from(from).build().ok()?)))
			.build()
			.unwrap(),
	);
	let active = ActiveSource::with_result(empty_source("words"), result.clone(), 4, 6, None);

	let next = active.update(&type_text(&state, "p"), &setup());
	assert_eq!(span(&next), Some((4, 7)));
	assert!(!Arc::ptr_eq(next.result().unwrap().result(), &result));
}

#[test]
fn test_update_hook_context_is_not_explicit() {
	let state = EditorState::with_cursor("foo ap", 6);
	let explicit = Arc::new(AtomicBool::new(true));
	let seen = explicit.clone();
	let result = Arc::new(
		CompletionResult::builder(4, options(&["apple"]))
			.update(move |current, _from, _to, cx| {
				seen.store(cx.explicit(), Ordering::SeqCst);
				Some(current.clone())
			})
			.build()
			.unwrap(),
	);
	let active = ActiveSource::with_result(empty_source("words"), result, 4, 6, Some(6));

	let next = active.update(&type_text(&state, "p"), &setup());
	assert!(next.has_result());
	assert_eq!(next.explicit_pos(), Some(6));
	assert!(!explicit.load(Ordering::SeqCst));
}

#[test]
fn test_update_hook_span_past_cursor_requeries() {
	let state = EditorState::with_cursor("foo ap", 6);
	let result = Arc::new(
		CompletionResult::builder(4, options(&["apple"]))
			.update(|current, _from, _to, cx| Some(Arc::new(current.to_builder().from(cx.pos() + 1).build().ok()?)))
			.build()
			.unwrap(),
	);
	let active = ActiveSource::with_result(empty_source("words"), result, 4, 6, None);

	assert!(active.update(&type_text(&state, "p"), &setup()).is_pending());
}

#[test]
fn test_map_hook_can_drop_result() {
	let state = EditorState::with_cursor("foo ap", 6);
	let result = Arc::new(
		CompletionResult::builder(4, options(&["apple"]))
			.map(|_, _| None)
			.build()
			.unwrap(),
	);
	let active = ActiveSource::with_result(empty_source("words"), result, 4, 6, None);

	let typed = type_text(&state, "p");
	assert_eq!(active.update(&typed, &setup()).state(), &SourceState::Pending { explicit_pos: None });
	assert!(active.update(&typed, &passive_setup()).is_inactive());

	let far = edit(&state, vec![Change::insert(0, "x")]);
	assert!(active.update(&far, &setup()).is_inactive());
}

#[test]
fn test_typing_activates_only_when_configured() {
	let state = EditorState::with_cursor("fo", 2);
	let active = ActiveSource::inactive(empty_source("words"));

	assert!(active.update(&type_text(&state, "o"), &setup()).is_pending());
	assert!(active.update(&type_text(&state, "o"), &passive_setup()).is_inactive());
}

#[test]
fn test_backspacing_to_span_start_deactivates() {
	let state = EditorState::with_cursor("foo ap", 6);
	let active = ActiveSource::with_result(empty_source("words"), word_result(4, &["apple"]), 4, 6, None);

	let first = backspace(&state);
	let active = active.update(&first, &setup());
	assert_eq!(span(&active), Some((4, 5)));

	let second = backspace(first.state());
	assert!(active.update(&second, &setup()).is_inactive());
}

#[test]
fn test_explicit_result_survives_empty_span() {
	let state = EditorState::with_cursor("foo ", 4);
	let active = ActiveSource::with_result(empty_source("words"), word_result(4, &["apple"]), 4, 4, Some(4));

	let typed = type_text(&state, "a");
	let active = active.update(&typed, &setup());
	assert_eq!(span(&active), Some((4, 5)));

	let erased = backspace(typed.state());
	let active = active.update(&erased, &setup());
	assert_eq!(span(&active), Some((4, 4)));

	let past = backspace(erased.state());
	assert!(active.update(&past, &setup()).is_inactive());
}

#[test]
fn test_unrelated_edit_only_remaps() {
	let state = EditorState::with_cursor("foo ap", 6);
	let result = word_result(4, &["apple"]);
	let active = ActiveSource::with_result(empty_source("words"), result.clone(), 4, 6, None);

	let next = active.update(&edit(&state, vec![Change::insert(0, "xx")]), &setup());
	assert_eq!(span(&next), Some((6, 8)));
	assert!(Arc::ptr_eq(next.result().unwrap().result(), &result));
}

#[test]
fn test_pending_maps_explicit_pos() {
	let state = EditorState::with_cursor("foo ap", 6);
	let active = ActiveSource::pending(empty_source("words"), Some(6));
	let next = active.update(&type_text(&state, "p"), &setup());
	assert_eq!(next.explicit_pos(), Some(6));

	let next = active.update(&edit(&state, vec![Change::insert(0, "xx")]), &setup());
	assert_eq!(next.explicit_pos(), Some(8));
}

#[test]
fn test_effects_apply_in_order() {
	let state = EditorState::with_cursor("foo", 3);
	let source = empty_source("words");
	let other = empty_source("other");
	let active = ActiveSource::inactive(source.clone());

	let started = active.update(&effects(&state, vec![Effect::Start { explicit: true }]), &setup());
	assert_eq!(started.state(), &SourceState::Pending { explicit_pos: Some(3) });

	let closed = started.update(&effects(&state, vec![Effect::Close]), &setup());
	assert!(closed.is_inactive());

	let installed = ActiveSource::with_result(source.clone(), word_result(0, &["food"]), 0, 3, None);
	let foreign = ActiveSource::pending(other, None);
	let set = active.update(
		&effects(&state, vec![Effect::Start { explicit: false }, Effect::SetActive(vec![foreign, installed.clone()])]),
		&setup(),
	);
	assert_eq!(set, installed);
}

#[test]
fn test_update_type_classification() {
	let state = EditorState::with_cursor("ab", 2);
	let setup = setup();

	assert_eq!(UpdateType::of(&type_text(&state, "c"), &setup), UpdateType::ACTIVATE | UpdateType::TYPING);
	assert_eq!(UpdateType::of(&type_text(&state, "c"), &passive_setup()), UpdateType::TYPING);
	assert_eq!(UpdateType::of(&backspace(&state), &setup), UpdateType::BACKSPACING);
	assert_eq!(UpdateType::of(&move_cursor(&state, 0), &setup), UpdateType::RESET);
	assert_eq!(UpdateType::of(&edit(&state, vec![Change::insert(0, "x")]), &setup), UpdateType::RESET_IF_TOUCHING);
	assert_eq!(UpdateType::of(&effects(&state, vec![]), &setup), UpdateType::empty());
	assert!(UpdateType::BACKSPACING.is_simple());
	assert!(!UpdateType::RESET.is_simple());
}

#[test]
fn test_picked_completion_can_reactivate() {
	let state = EditorState::with_cursor("ab", 2);
	let picked = Arc::new(Completion::new("abc"));
	let tx = Transaction::insert(state.doc().slice(..), state.selection(), "c".into())
		.with_user_event(UserEvent::Complete)
		.annotate(PickedCompletion(picked));
	let update = quill_primitives::StateUpdate::new(state, tx);

	assert_eq!(UpdateType::of(&update, &setup()), UpdateType::RESET_IF_TOUCHING);
	let eager = setup().with_activate_on_completion(|c| c.label == "abc");
	assert_eq!(UpdateType::of(&update, &eager), UpdateType::ACTIVATE | UpdateType::RESET);
}

#[derive(Debug, Clone)]
enum Op {
	Type(char),
	Backspace,
	Move(usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
	prop_oneof![
		4 => prop::sample::select(vec!['a', 'p', 'l', ' ', '.']).prop_map(Op::Type),
		2 => Just(Op::Backspace),
		1 => (0usize..32).prop_map(Op::Move),
	]
}

fn apply(state: &EditorState, op: &Op) -> quill_primitives::StateUpdate {
	match op {
		Op::Type(c) => type_text(state, &c.to_string()),
		Op::Backspace if state.cursor() > 0 => backspace(state),
		Op::Backspace => move_cursor(state, 0),
		Op::Move(pos) => move_cursor(state, pos % (state.len_chars() + 1)),
	}
}

proptest! {
	/// Result spans stay ordered and inside the document, and replaying the
	/// same edits yields the same state.
	#[test]
	fn prop_spans_stay_in_document(ops in prop::collection::vec(arb_op(), 0..24)) {
		let mut state = EditorState::with_cursor("let ap", 6);
		let setup = setup();
		let initial = ActiveSource::with_result(empty_source("words"), word_result(4, &["apple"]), 4, 6, None);
		let mut active = initial.clone();
		let mut updates = Vec::new();

		for op in &ops {
			let update = apply(&state, op);
			active = active.update(&update, &setup);
			if let Some(r) = active.result() {
				prop_assert!(r.from() <= r.to());
				prop_assert!(r.to() <= update.state().len_chars());
			}
			state = update.state().clone();
			updates.push(update);
		}

		let replayed = updates.iter().fold(initial, |a, u| a.update(u, &setup));
		prop_assert_eq!(replayed, active);
	}
}
