//! Transactions: a change set plus the metadata other subsystems react to.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use ropey::RopeSlice;

use crate::{Range, Rope, Selection};

mod changeset;
mod types;


pub use changeset::ChangeSet;
pub use types::{Bias, Change, Insertion, Operation, Tendril, UserEvent};

/// Typed, type-erased values attached to a transaction.
///
/// Used for both annotations (facts about the transaction, such as which
/// completion was picked) and effects (requests to other subsystems, such as
/// "start completion"). Consumers look values up by type.
#[derive(Clone, Default)]
pub struct Payloads(Vec<Arc<dyn Any + Send + Sync>>);

impl Payloads {
	/// Appends a value.
	pub fn push<T: Any + Send + Sync>(&mut self, value: T) {
		self.0.push(Arc::new(value));
	}

	/// Iterates over every value of type `T`, in insertion order.
	pub fn of<T: Any>(&self) -> impl Iterator<Item = &T> {
		self.0.iter().filter_map(|v| v.downcast_ref::<T>())
	}

	/// Returns the first value of type `T`.
	pub fn get<T: Any>(&self) -> Option<&T> {
		self.of::<T>().next()
	}

	/// Returns true if no values are attached.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns the number of attached values.
	pub fn len(&self) -> usize {
		self.0.len()
	}
}

impl fmt::Debug for Payloads {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Payloads").field("len", &self.0.len()).finish()
	}
}

/// A document change with its selection, origin and attached payloads.
#[derive(Debug, Clone)]
pub struct Transaction {
	changes: ChangeSet,
	selection: Option<Selection>,
	user_event: Option<UserEvent>,
	annotations: Payloads,
	effects: Payloads,
}

impl Transaction {
	/// Creates a transaction that changes nothing in a document of `len` characters.
	pub fn empty(len: usize) -> Self {
		Self::from_changes(ChangeSet::identity(len))
	}

	/// Wraps an existing changeset.
	pub fn from_changes(changes: ChangeSet) -> Self {
		Self {
			changes,
			selection: None,
			user_event: None,
			annotations: Payloads::default(),
			effects: Payloads::default(),
		}
	}

	/// Creates a transaction from sorted, non-overlapping changes.
	pub fn change(doc: RopeSlice, changes: impl IntoIterator<Item = Change>) -> Self {
		Self::from_changes(ChangeSet::from_changes(doc.len_chars(), changes))
	}

	/// Replaces every selected range with `text`.
	pub fn insert(doc: RopeSlice, selection: &Selection, text: Tendril) -> Self {
		let changes = selection
			.iter()
			.map(|r| Change::replace(r.from(), r.to(), text.clone()));
		Self::change(doc, changes)
	}

	/// Deletes every selected range.
	pub fn delete(doc: RopeSlice, selection: &Selection) -> Self {
		let changes = selection
			.iter()
			.filter(|r| !r.is_point())
			.map(|r| Change::delete(r.from(), r.to()));
		Self::change(doc, changes)
	}

	/// Sets the selection after the transaction.
	pub fn with_selection(mut self, selection: Selection) -> Self {
		self.selection = Some(selection);
		self
	}

	/// Tags the transaction with the user interaction that produced it.
	pub fn with_user_event(mut self, event: UserEvent) -> Self {
		self.user_event = Some(event);
		self
	}

	/// Attaches an annotation.
	pub fn annotate<T: Any + Send + Sync>(mut self, value: T) -> Self {
		self.annotations.push(value);
		self
	}

	/// Attaches an effect.
	pub fn with_effect<T: Any + Send + Sync>(mut self, value: T) -> Self {
		self.effects.push(value);
		self
	}

	/// Attaches several effects.
	pub fn with_effects<T: Any + Send + Sync>(mut self, values: impl IntoIterator<Item = T>) -> Self {
		for value in values {
			self.effects.push(value);
		}
		self
	}

	/// Returns the changeset.
	pub fn changes(&self) -> &ChangeSet {
		&self.changes
	}

	/// Returns the explicit selection, if the transaction sets one.
	pub fn selection(&self) -> Option<&Selection> {
		self.selection.as_ref()
	}

	/// Returns the user event tag.
	pub fn user_event(&self) -> Option<UserEvent> {
		self.user_event
	}

	/// Returns the first annotation of type `T`.
	pub fn annotation<T: Any>(&self) -> Option<&T> {
		self.annotations.get::<T>()
	}

	/// Iterates over the effects of type `T`.
	pub fn effects<T: Any>(&self) -> impl Iterator<Item = &T> {
		self.effects.of::<T>()
	}

	/// Returns true if the document text changes.
	pub fn doc_changed(&self) -> bool {
		!self.changes.is_empty()
	}

	/// Applies the changes to a document in place.
	pub fn apply(&self, doc: &mut Rope) {
		self.changes.apply(doc);
	}

	/// Maps a selection through the changes; cursors move past inserted text.
	pub fn map_selection(&self, selection: &Selection) -> Selection {
		selection.transform(|r| {
			Range::new(
				self.changes.map_pos(r.anchor, Bias::Right),
				self.changes.map_pos(r.head, Bias::Right),
			)
		})
	}
}
