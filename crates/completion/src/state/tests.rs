use std::time::Duration;

use quill_primitives::{Change, EditorState};
use tokio::time::Instant;

use super::{CompletionState, CompletionStatus};
use crate::active::ActiveSource;
use crate::config::CompletionConfig;
use crate::effect::Effect;
use crate::setup::CompletionSetup;
use crate::source::Source;
use crate::testing::{backspace, edit, effects, empty_source, move_cursor, type_text, word_result};

struct Fixture {
	source: Source,
	setup: CompletionSetup,
	editor: EditorState,
	state: CompletionState,
	now: Instant,
}

impl Fixture {
	fn new(text: &str, cursor: usize) -> Self {
		Self::with_config(text, cursor, CompletionConfig::default())
	}

	fn with_config(text: &str, cursor: usize, config: CompletionConfig) -> Self {
		let source = empty_source("words");
		let setup = CompletionSetup::new(config).with_source(source.clone());
		let state = CompletionState::new(&setup);
		Self {
			source,
			setup,
			editor: EditorState::with_cursor(text, cursor),
			state,
			now: Instant::now(),
		}
	}

	/// Installs a word result over `from..cursor`.
	fn install(&mut self, from: usize, labels: &[&str]) {
		let cursor = self.editor.cursor();
		let active = ActiveSource::with_result(self.source.clone(), word_result(from, labels), from, cursor, None);
		self.apply(effects(&self.editor, vec![Effect::SetActive(vec![active])]));
	}

	fn apply(&mut self, update: quill_primitives::StateUpdate) {
		self.state = self.state.update(&update, &self.setup, self.now);
		self.editor = update.state().clone();
	}

	fn labels(&self) -> Vec<String> {
		self.state.current_completions().iter().map(|c| c.label.clone()).collect()
	}
}

#[test]
fn test_new_state_is_idle() {
	let fx = Fixture::new("", 0);
	assert_eq!(fx.state.active().len(), 1);
	assert!(fx.state.active()[0].is_inactive());
	assert_eq!(fx.state.status(), None);
	assert!(fx.state.open().is_none());
	assert_ne!(fx.state.id(), CompletionState::new(&fx.setup).id());
}

#[test]
fn test_typing_marks_sources_pending() {
	let mut fx = Fixture::new("a", 1);
	fx.apply(type_text(&fx.editor, "p"));
	assert_eq!(fx.state.status(), Some(CompletionStatus::Pending));
	assert!(fx.state.open().is_none());
}

#[test]
fn test_set_active_opens_dialog() {
	let mut fx = Fixture::new("ap", 2);
	fx.install(0, &["banana", "apricot", "apple"]);

	let open = fx.state.open().unwrap();
	assert_eq!(fx.labels(), ["apple", "apricot"]);
	assert_eq!(open.selected(), Some(0));
	assert_eq!(open.anchor(), 0);
	assert_eq!(open.timestamp(), fx.now);
	assert!(!open.disabled());
	assert_eq!(fx.state.status(), Some(CompletionStatus::Active));
	assert_eq!(fx.state.selected_completion().unwrap().label, "apple");
}

#[test]
fn test_select_on_open_disabled_leaves_nothing_selected() {
	let mut fx = Fixture::with_config("ap", 2, CompletionConfig {
		select_on_open: false,
		..CompletionConfig::default()
	});
	fx.install(0, &["apple"]);
	assert_eq!(fx.state.open().unwrap().selected(), None);
	assert!(fx.state.selected_completion().is_none());
}

#[test]
fn test_typing_refines_options_and_keeps_timestamp() {
	let mut fx = Fixture::new("ap", 2);
	fx.install(0, &["apple", "apricot"]);
	let opened_at = fx.now;

	fx.now += Duration::from_millis(50);
	fx.apply(type_text(&fx.editor, "r"));
	assert_eq!(fx.labels(), ["apricot"]);
	assert_eq!(fx.state.open().unwrap().timestamp(), opened_at);
	assert_eq!(fx.state.status(), Some(CompletionStatus::Active));
}

#[test]
fn test_dialog_disabled_while_requerying() {
	let mut fx = Fixture::new("ap", 2);
	fx.install(0, &["apple", "apricot"]);

	fx.apply(type_text(&fx.editor, "."));
	let open = fx.state.open().unwrap();
	assert!(open.disabled());
	assert_eq!(fx.labels(), ["apple", "apricot"]);
	assert_eq!(fx.state.status(), Some(CompletionStatus::Pending));
	assert!(fx.state.selected_completion().is_none());

	fx.apply(effects(&fx.editor, vec![Effect::Close]));
	assert!(fx.state.open().is_none());
	assert_eq!(fx.state.status(), None);
}

#[test]
fn test_set_selected_clamps() {
	let mut fx = Fixture::new("ap", 2);
	fx.install(0, &["apple", "apricot"]);

	fx.apply(effects(&fx.editor, vec![Effect::SetSelected(1)]));
	assert_eq!(fx.state.selected_index(), Some(1));
	fx.apply(effects(&fx.editor, vec![Effect::SetSelected(10)]));
	assert_eq!(fx.state.selected_index(), Some(1));
}

#[test]
fn test_selection_follows_option_across_rebuild() {
	let mut fx = Fixture::new("az", 2);
	fx.install(0, &["azz", "abb", "azb"]);
	assert_eq!(fx.labels(), ["azb", "azz"]);

	fx.apply(effects(&fx.editor, vec![Effect::SetSelected(1)]));
	fx.apply(backspace(&fx.editor));
	assert_eq!(fx.labels(), ["abb", "azb", "azz"]);
	assert_eq!(fx.state.selected_completion().unwrap().label, "azz");
}

#[test]
fn test_result_without_matches_is_dropped() {
	let mut fx = Fixture::new("zz", 2);
	fx.install(0, &["apple"]);
	assert!(fx.state.open().is_none());
	assert!(fx.state.active()[0].is_inactive());
	assert_eq!(fx.state.status(), None);
}

#[test]
fn test_irrelevant_transaction_keeps_state() {
	let mut fx = Fixture::new("ap", 2);
	fx.install(0, &["apple"]);
	let before = fx.state.clone();

	fx.now += Duration::from_secs(1);
	fx.apply(effects(&fx.editor, vec![]));
	assert_eq!(fx.state, before);
}

#[test]
fn test_fresh_source_joins_live_session() {
	let mut fx = Fixture::new("ap", 2);
	let late = empty_source("late");
	let setup = fx.setup.clone().with_source(late.clone());

	let idle = fx.state.update(&effects(&fx.editor, vec![]), &setup, fx.now);
	assert!(idle.find(&late).unwrap().is_inactive());

	fx.apply(effects(&fx.editor, vec![Effect::Start { explicit: false }]));
	let live = fx.state.update(&effects(&fx.editor, vec![]), &setup, fx.now);
	assert!(live.find(&late).unwrap().is_pending());
}

#[test]
fn test_moving_cursor_out_closes_dialog() {
	let mut fx = Fixture::new("foo ap", 6);
	fx.install(4, &["apple"]);
	fx.apply(move_cursor(&fx.editor, 5));
	assert!(fx.state.open().is_some());

	fx.apply(move_cursor(&fx.editor, 1));
	assert!(fx.state.open().is_none());
	assert_eq!(fx.state.status(), None);
}

#[test]
fn test_unrelated_edit_remaps_anchor() {
	let mut fx = Fixture::new("foo ap", 6);
	fx.install(4, &["apple"]);
	assert_eq!(fx.state.open().unwrap().anchor(), 4);

	fx.apply(edit(&fx.editor, vec![Change::insert(0, "xx")]));
	assert_eq!(fx.state.open().unwrap().anchor(), 6);
	assert_eq!(fx.labels(), ["apple"]);
}
