//! Reference host loop.
//!
//! [`Session`] owns a document, its completion state and a scheduler, and
//! wires them together the way an editor would: every transaction goes
//! through [`Session::dispatch`], which advances the completion state and
//! lets the scheduler observe the update; [`Session::poll`] dispatches
//! whatever the scheduler produced.

use quill_primitives::{Change, EditorState, Selection, StateUpdate, Transaction, UserEvent};
use tokio::time::Instant;
use tracing::trace;

use crate::commands::{self, CompletionCommand, Step};
use crate::effect::Effect;
use crate::render::RenderModel;
use crate::scheduler::Scheduler;
use crate::setup::CompletionSetup;
use crate::state::CompletionState;

/// Rows a page move covers unless the host reports its own.
const DEFAULT_PAGE_ROWS: usize = 10;

pub struct Session {
	state: EditorState,
	completion: CompletionState,
	scheduler: Scheduler,
	setup: CompletionSetup,
	page_rows: usize,
}

impl Session {
	pub fn new(state: EditorState, setup: CompletionSetup) -> Self {
		Self {
			completion: CompletionState::new(&setup),
			state,
			scheduler: Scheduler::new(),
			setup,
			page_rows: DEFAULT_PAGE_ROWS,
		}
	}

	pub fn state(&self) -> &EditorState {
		&self.state
	}

	pub fn completion(&self) -> &CompletionState {
		&self.completion
	}

	pub fn scheduler(&self) -> &Scheduler {
		&self.scheduler
	}

	pub fn setup(&self) -> &CompletionSetup {
		&self.setup
	}

	/// Sets how many rows the dialog shows; page moves step by one less.
	pub fn set_page_rows(&mut self, rows: usize) {
		self.page_rows = rows;
	}

	/// Applies a transaction.
	pub fn dispatch(&mut self, tx: Transaction) -> StateUpdate {
		let now = Instant::now();
		let update = StateUpdate::new(self.state.clone(), tx);
		let next = self.completion.update(&update, &self.setup, now);
		self.scheduler.observe(&update, &self.completion, &next, &self.setup, now);
		trace!(
			event = update.user_event().map(UserEvent::as_str),
			version = update.state().version(),
			status = ?next.status(),
			"completion.dispatch"
		);
		self.completion = next;
		self.state = update.state().clone();
		update
	}

	fn dispatch_effects(&mut self, effects: Vec<Effect>) {
		if !effects.is_empty() {
			self.dispatch(Transaction::empty(self.state.len_chars()).with_effects(effects));
		}
	}

	/// Starts due queries and folds finished ones.
	pub fn poll(&mut self) {
		let effects = self.scheduler.poll(Instant::now(), &self.state, &self.completion, &self.setup);
		self.dispatch_effects(effects);
	}

	/// Waits for the next scheduler event, then polls.
	pub async fn tick(&mut self) {
		self.scheduler.wait().await;
		self.poll();
	}

	/// Polls until the scheduler has nothing left to do.
	///
	/// Does not return while a source that never answers is running.
	pub async fn settle(&mut self) {
		loop {
			self.poll();
			if self.scheduler.is_idle() {
				return;
			}
			self.scheduler.wait().await;
		}
	}

	/// Types `text` at every cursor, accepting the selected option first if
	/// `text` is one of its commit characters.
	pub fn type_text(&mut self, text: &str) {
		if let Some(tx) = commands::commit_completion(&self.state, &self.completion, text) {
			self.dispatch(tx);
		}
		self.insert(text, UserEvent::Type);
	}

	/// Inserts `text` as part of an input method composition.
	pub fn compose(&mut self, text: &str) {
		self.insert(text, UserEvent::Compose);
	}

	fn insert(&mut self, text: &str, event: UserEvent) {
		let tx = Transaction::insert(self.state.doc().slice(..), self.state.selection(), text.into()).with_user_event(event);
		self.dispatch(tx);
	}

	/// Deletes the character before every cursor, or the selected text.
	pub fn backspace(&mut self) {
		let changes: Vec<Change> = self
			.state
			.selection()
			.iter()
			.filter_map(|r| match (r.is_point(), r.head) {
				(true, 0) => None,
				(true, head) => Some(Change::delete(head - 1, head)),
				(false, _) => Some(Change::delete(r.from(), r.to())),
			})
			.collect();
		let tx = Transaction::change(self.state.doc().slice(..), changes).with_user_event(UserEvent::DeleteBackward);
		self.dispatch(tx);
	}

	pub fn move_cursor(&mut self, pos: usize) {
		let tx = Transaction::empty(self.state.len_chars())
			.with_selection(Selection::point(pos))
			.with_user_event(UserEvent::Select);
		self.dispatch(tx);
	}

	/// Explicitly requests completion.
	pub fn start(&mut self) {
		self.dispatch(commands::start_completion(&self.state));
	}

	pub fn close(&mut self) -> bool {
		self.run(commands::close_completion(&self.state, &self.completion))
	}

	/// Applies the selected option.
	pub fn accept(&mut self) -> bool {
		let tx = commands::accept_completion(&self.state, &self.completion, &self.setup.config, Instant::now());
		self.run(tx)
	}

	pub fn move_selection(&mut self, forward: bool, step: Step) -> bool {
		let tx = commands::move_completion_selection(&self.state, &self.completion, &self.setup.config, Instant::now(), forward, step);
		self.run(tx)
	}

	/// Selects the option at `index` of the open dialog.
	pub fn select(&mut self, index: usize) -> bool {
		if self.completion.open().is_none() {
			return false;
		}
		self.dispatch_effects(vec![Effect::SetSelected(index)]);
		true
	}

	pub fn composition_start(&mut self) {
		self.scheduler.composition_start();
	}

	pub fn composition_end(&mut self) {
		self.scheduler.composition_end(Instant::now());
	}

	/// Aborts running queries, e.g. when the editor is torn down.
	pub fn abort_queries(&mut self) {
		self.scheduler.abort_all();
	}

	/// Closes the dialog when the editor loses focus, if configured to.
	pub fn blur(&mut self) -> bool {
		self.setup.config.close_on_blur && self.completion.open().is_some() && self.close()
	}

	pub fn run_command(&mut self, command: CompletionCommand) -> bool {
		match command {
			CompletionCommand::Start => {
				self.start();
				true
			}
			CompletionCommand::Close => self.close(),
			CompletionCommand::Next => self.move_selection(true, Step::Option),
			CompletionCommand::Previous => self.move_selection(false, Step::Option),
			CompletionCommand::PageDown => self.move_selection(true, Step::Page(self.page_rows)),
			CompletionCommand::PageUp => self.move_selection(false, Step::Page(self.page_rows)),
			CompletionCommand::Accept => self.accept(),
		}
	}

	/// Runs the command bound to `key` in the default keymap.
	pub fn handle_key(&mut self, key: &str) -> bool {
		let command = commands::default_keymap(&self.setup.config)
			.into_iter()
			.find_map(|(bound, command)| (bound == key).then_some(command));
		command.is_some_and(|command| self.run_command(command))
	}

	/// The dialog as a renderer sees it.
	pub fn render(&self) -> Option<RenderModel> {
		RenderModel::build(&self.completion, &self.setup)
	}

	fn run(&mut self, tx: Option<Transaction>) -> bool {
		match tx {
			Some(tx) => {
				self.dispatch(tx);
				true
			}
			None => false,
		}
	}
}
