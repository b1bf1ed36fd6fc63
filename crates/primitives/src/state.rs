//! Immutable editor snapshots and the updates between them.

use std::sync::Arc;

use crate::range::CharIdx;
use crate::transaction::{ChangeSet, Transaction, UserEvent};
use crate::{Rope, Selection};

/// An immutable document snapshot with its selection.
///
/// Cloning is cheap: the rope shares its nodes. Applying a transaction
/// produces a new snapshot and never changes an existing one.
#[derive(Debug, Clone)]
pub struct EditorState {
	doc: Rope,
	selection: Selection,
	version: u64,
}

impl EditorState {
	/// Creates a snapshot from text and a selection (clamped to the text).
	pub fn new(text: &str, mut selection: Selection) -> Self {
		let doc = Rope::from(text);
		selection.clamp(doc.len_chars());
		Self {
			doc,
			selection,
			version: 0,
		}
	}

	/// Creates a snapshot with a cursor at `pos`.
	pub fn with_cursor(text: &str, pos: CharIdx) -> Self {
		Self::new(text, Selection::point(pos))
	}

	/// Returns the document text.
	pub fn doc(&self) -> &Rope {
		&self.doc
	}

	/// Returns the selection.
	pub fn selection(&self) -> &Selection {
		&self.selection
	}

	/// Returns the primary cursor position.
	pub fn cursor(&self) -> CharIdx {
		self.selection.cursor()
	}

	/// Document version; bumped by every text change.
	pub fn version(&self) -> u64 {
		self.version
	}

	/// Returns the document length in characters.
	pub fn len_chars(&self) -> usize {
		self.doc.len_chars()
	}

	/// Returns the text in `[from, to)`, clamped to the document.
	pub fn slice_to_string(&self, from: CharIdx, to: CharIdx) -> String {
		let len = self.doc.len_chars();
		let to = to.min(len);
		let from = from.min(to);
		self.doc.slice(from..to).to_string()
	}

	/// Returns the start of the line containing `pos` and the text between
	/// that start and `pos`.
	pub fn line_before(&self, pos: CharIdx) -> (CharIdx, String) {
		let pos = pos.min(self.doc.len_chars());
		let line = self.doc.char_to_line(pos);
		let start = self.doc.line_to_char(line);
		(start, self.doc.slice(start..pos).to_string())
	}

	/// Applies a transaction, returning the resulting snapshot.
	pub fn apply(&self, tx: &Transaction) -> EditorState {
		let mut doc = self.doc.clone();
		let mut version = self.version;
		if tx.doc_changed() {
			tx.apply(&mut doc);
			version += 1;
		}

		let mut selection = match tx.selection() {
			Some(selection) => selection.clone(),
			None => tx.map_selection(&self.selection),
		};
		selection.clamp(doc.len_chars());

		EditorState {
			doc,
			selection,
			version,
		}
	}
}

/// One applied transaction: the state before, the state after, and the
/// transaction that connects them.
#[derive(Debug, Clone)]
pub struct StateUpdate {
	start: EditorState,
	state: EditorState,
	transaction: Arc<Transaction>,
}

impl StateUpdate {
	/// Applies `tx` to `start`.
	pub fn new(start: EditorState, tx: Transaction) -> Self {
		let state = start.apply(&tx);
		Self {
			start,
			state,
			transaction: Arc::new(tx),
		}
	}

	/// State before the transaction.
	pub fn start(&self) -> &EditorState {
		&self.start
	}

	/// State after the transaction.
	pub fn state(&self) -> &EditorState {
		&self.state
	}

	/// The transaction.
	pub fn transaction(&self) -> &Transaction {
		&self.transaction
	}

	/// The transaction's changes.
	pub fn changes(&self) -> &ChangeSet {
		self.transaction.changes()
	}

	/// Returns true if the document text changed.
	pub fn doc_changed(&self) -> bool {
		self.transaction.doc_changed()
	}

	/// Returns true if the transaction set an explicit selection.
	pub fn selection_set(&self) -> bool {
		self.transaction.selection().is_some()
	}

	/// Returns the user event tag.
	pub fn user_event(&self) -> Option<UserEvent> {
		self.transaction.user_event()
	}

	/// Returns true if the transaction was produced by `event`.
	pub fn is_user_event(&self, event: UserEvent) -> bool {
		self.user_event() == Some(event)
	}

	/// Returns true if the transaction was produced by typing.
	pub fn is_typing(&self) -> bool {
		self.user_event().is_some_and(UserEvent::is_typing)
	}
}
