use super::types::{Bias, Change, Insertion, Operation, Tendril};
use crate::Rope;
use crate::range::{CharIdx, CharLen};

/// A sequence of operations representing a set of changes to a document.
///
/// ChangeSet represents document changes as a sequence of retain, delete and
/// insert operations covering the whole source document. This representation
/// makes position mapping and "did this edit touch that span" queries linear
/// scans.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangeSet {
	/// Sequence of retain/delete/insert operations.
	changes: Vec<Operation>,
	/// Length of the source document before changes.
	len: CharLen,
	/// Length of the document after applying changes.
	len_after: CharLen,
}

impl ChangeSet {
	/// Creates a changeset that retains a document of `len` characters unchanged.
	pub fn identity(len: CharLen) -> Self {
		let mut cs = Self::default();
		cs.retain(len);
		cs
	}

	/// Builds a changeset from sorted, non-overlapping changes against a
	/// document of `len` characters.
	///
	/// # Panics
	///
	/// Debug builds assert that changes are sorted, non-overlapping and in bounds.
	pub fn from_changes(len: CharLen, changes: impl IntoIterator<Item = Change>) -> Self {
		let mut cs = Self::default();
		let mut pos = 0;

		for change in changes {
			debug_assert!(change.start >= pos, "changes must be sorted and non-overlapping");
			debug_assert!(change.start <= change.end && change.end <= len, "change out of bounds");
			cs.retain(change.start - pos);
			cs.delete(change.end - change.start);
			if let Some(text) = change.replacement {
				cs.insert(text);
			}
			pos = change.end;
		}
		cs.retain(len - pos);
		cs
	}

	/// Returns the length of the source document (before changes).
	pub fn len(&self) -> CharLen {
		self.len
	}

	/// Returns the length of the document after applying changes.
	pub fn len_after(&self) -> CharLen {
		self.len_after
	}

	/// Returns true if this changeset does not modify the document.
	pub fn is_empty(&self) -> bool {
		self.changes.iter().all(|op| matches!(op, Operation::Retain(_)))
	}

	/// Returns a slice of all operations in this changeset.
	pub fn operations(&self) -> &[Operation] {
		&self.changes
	}

	/// Adds a retain operation. Consecutive retains are merged.
	pub(crate) fn retain(&mut self, n: CharLen) {
		if n == 0 {
			return;
		}

		self.len += n;
		self.len_after += n;

		if let Some(Operation::Retain(count)) = self.changes.last_mut() {
			*count += n;
		} else {
			self.changes.push(Operation::Retain(n));
		}
	}

	/// Adds a delete operation. Consecutive deletes are merged.
	pub(crate) fn delete(&mut self, n: CharLen) {
		if n == 0 {
			return;
		}

		self.len += n;

		if let Some(Operation::Delete(count)) = self.changes.last_mut() {
			*count += n;
		} else {
			self.changes.push(Operation::Delete(n));
		}
	}

	/// Adds an insert operation.
	///
	/// Inserts are kept in front of an adjacent delete so that a replacement
	/// always reads `Insert, Delete`.
	pub(crate) fn insert(&mut self, text: Tendril) {
		if text.is_empty() {
			return;
		}

		let ins = Insertion::new(text);
		self.len_after += ins.char_len();

		match self.changes.as_mut_slice() {
			[.., Operation::Insert(prev)] | [.., Operation::Insert(prev), Operation::Delete(_)] => {
				prev.push(&ins);
			}
			[.., last @ Operation::Delete(_)] => {
				let del = std::mem::replace(last, Operation::Insert(ins));
				self.changes.push(del);
			}
			_ => {
				self.changes.push(Operation::Insert(ins));
			}
		}
	}

	/// Applies this changeset to a document, modifying it in place.
	pub fn apply(&self, doc: &mut Rope) {
		let mut pos = 0;
		for op in &self.changes {
			match op {
				Operation::Retain(n) => pos += n,
				Operation::Delete(n) => doc.remove(pos..pos + n),
				Operation::Insert(ins) => {
					doc.insert(pos, ins.text());
					pos += ins.char_len();
				}
			}
		}
	}

	/// Maps a position through this changeset using the specified bias.
	///
	/// Positions inside deleted text collapse to the deletion point.
	pub fn map_pos(&self, pos: CharIdx, bias: Bias) -> CharIdx {
		let mut old_pos = 0;
		let mut new_pos = 0;

		for op in &self.changes {
			if old_pos > pos {
				break;
			}

			match op {
				Operation::Retain(n) => {
					if old_pos + n > pos {
						return new_pos + (pos - old_pos);
					}
					old_pos += n;
					new_pos += n;
				}
				Operation::Delete(n) => {
					if old_pos + n > pos {
						return new_pos;
					}
					old_pos += n;
				}
				Operation::Insert(ins) => {
					if !(old_pos == pos && bias == Bias::Left) {
						new_pos += ins.char_len();
					}
				}
			}
		}

		new_pos + pos.saturating_sub(old_pos)
	}

	/// Returns true if any edit touches `[from, to]`.
	///
	/// An edit touches the span when it overlaps it or is adjacent to either end,
	/// so typing right after a word touches that word.
	pub fn touches_range(&self, from: CharIdx, to: CharIdx) -> bool {
		let mut old_pos = 0;
		for op in &self.changes {
			if old_pos > to {
				break;
			}
			match op {
				Operation::Retain(n) => old_pos += n,
				Operation::Delete(n) => {
					if old_pos <= to && old_pos + n >= from {
						return true;
					}
					old_pos += n;
				}
				Operation::Insert(_) => {
					if old_pos <= to && old_pos >= from {
						return true;
					}
				}
			}
		}
		false
	}

	/// Returns true if a deletion swallows `[from, to)` entirely.
	///
	/// For an empty span this means the point lies strictly inside deleted text.
	pub fn deletes_range(&self, from: CharIdx, to: CharIdx) -> bool {
		let mut old_pos = 0;
		for op in &self.changes {
			match op {
				Operation::Retain(n) => old_pos += n,
				Operation::Insert(_) => {}
				Operation::Delete(n) => {
					let end = old_pos + n;
					let swallowed = if from == to {
						old_pos < from && from < end
					} else {
						old_pos <= from && to <= end
					};
					if swallowed {
						return true;
					}
					old_pos = end;
				}
			}
			if old_pos > to {
				break;
			}
		}
		false
	}
}
