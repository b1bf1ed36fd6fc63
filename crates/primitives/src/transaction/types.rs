use crate::range::{CharIdx, CharLen};

/// A tendril is the owned string type used for inserted text.
pub type Tendril = String;

/// Represents a single text change operation.
///
/// A change describes replacing the text range `[start, end)` with the optional
/// `replacement` text. If `replacement` is [`None`], this represents a deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
	/// The starting character index of the change.
	pub start: CharIdx,
	/// The ending character index of the change (exclusive).
	pub end: CharIdx,
	/// The replacement text, or [`None`] for deletion.
	pub replacement: Option<Tendril>,
}

impl Change {
	/// Inserts `text` at `pos`.
	pub fn insert(pos: CharIdx, text: impl Into<Tendril>) -> Self {
		Self {
			start: pos,
			end: pos,
			replacement: Some(text.into()),
		}
	}

	/// Deletes `[start, end)`.
	pub fn delete(start: CharIdx, end: CharIdx) -> Self {
		Self {
			start,
			end,
			replacement: None,
		}
	}

	/// Replaces `[start, end)` with `text`.
	pub fn replace(start: CharIdx, end: CharIdx, text: impl Into<Tendril>) -> Self {
		Self {
			start,
			end,
			replacement: Some(text.into()),
		}
	}
}

/// Bias determines how positions at change boundaries are mapped.
///
/// When mapping a position through a change, bias determines whether the position
/// moves with insertions or stays before them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
	/// Position stays before insertions at the same location.
	Left,
	/// Position moves after insertions at the same location.
	Right,
}

/// A text insertion with cached character length.
///
/// Fields are private so `char_len` always equals `text.chars().count()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
	text: Tendril,
	char_len: CharLen,
}

impl Insertion {
	/// Creates a new insertion, computing the character length once.
	#[inline]
	pub fn new(text: Tendril) -> Self {
		let char_len = text.chars().count();
		Self { text, char_len }
	}

	/// Returns the inserted text.
	#[inline]
	pub fn text(&self) -> &str {
		&self.text
	}

	/// Returns the cached character length.
	#[inline]
	pub fn char_len(&self) -> CharLen {
		self.char_len
	}

	/// Appends text from another insertion, updating the cached length.
	pub(super) fn push(&mut self, other: &Insertion) {
		self.text.push_str(&other.text);
		self.char_len += other.char_len;
	}
}

/// A single operation in a changeset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
	/// Retain the next N characters from the source document.
	Retain(CharLen),
	/// Delete the next N characters from the source document.
	Delete(CharLen),
	/// Insert new text at the current position.
	Insert(Insertion),
}

/// What kind of user interaction produced a transaction.
///
/// Completion treats typing and backspacing as "simple interactions" whose
/// results can be revalidated in place; everything else resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserEvent {
	/// Plain typed input.
	Type,
	/// Input committed by an input method composition.
	Compose,
	/// Pasted text.
	Paste,
	/// Backward deletion (backspace).
	DeleteBackward,
	/// Forward deletion.
	DeleteForward,
	/// Text inserted by accepting a completion.
	Complete,
	/// Selection changed by pointer or keyboard selection.
	Select,
	/// Undo.
	Undo,
	/// Redo.
	Redo,
}

impl UserEvent {
	/// Returns true for events that count as typing.
	pub const fn is_typing(self) -> bool {
		matches!(self, Self::Type | Self::Compose)
	}

	/// Dotted event name, used in logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Type => "input.type",
			Self::Compose => "input.type.compose",
			Self::Paste => "input.paste",
			Self::DeleteBackward => "delete.backward",
			Self::DeleteForward => "delete.forward",
			Self::Complete => "input.complete",
			Self::Select => "select",
			Self::Undo => "undo",
			Self::Redo => "redo",
		}
	}
}
