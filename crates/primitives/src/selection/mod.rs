use smallvec::{SmallVec, smallvec};

use crate::range::{CharIdx, Range};

#[cfg(test)]
mod tests;

/// One or more ranges, sorted by start and never overlapping, with one of
/// them marked primary.
///
/// The primary range's head is the cursor completion anchors to; the other
/// ranges receive the same edit when a completion is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
	ranges: SmallVec<[Range; 1]>,
	primary: usize,
}

impl Selection {
	/// Builds a selection from `primary` and any further ranges.
	///
	/// Overlapping ranges are merged; the primary is whichever merged range
	/// swallowed the given primary.
	pub fn new(primary: Range, others: impl IntoIterator<Item = Range>) -> Self {
		let mut ranges: SmallVec<[Range; 1]> = smallvec![primary];
		ranges.extend(others);
		if ranges.len() == 1 {
			return Self { ranges, primary: 0 };
		}

		ranges.sort_by_key(Range::from);
		let mut merged: SmallVec<[Range; 1]> = SmallVec::with_capacity(ranges.len());
		let mut primary_at = 0;
		for range in ranges {
			let is_primary = range == primary;
			match merged.last_mut() {
				Some(last) if last.overlaps(&range) => *last = last.union(&range),
				_ => merged.push(range),
			}
			if is_primary {
				primary_at = merged.len() - 1;
			}
		}
		Self {
			ranges: merged,
			primary: primary_at,
		}
	}

	pub fn single(anchor: CharIdx, head: CharIdx) -> Self {
		Self::new(Range::new(anchor, head), [])
	}

	pub fn point(pos: CharIdx) -> Self {
		Self::single(pos, pos)
	}

	pub fn primary(&self) -> Range {
		self.ranges[self.primary]
	}

	pub fn primary_index(&self) -> usize {
		self.primary
	}

	/// Head of the primary range.
	pub fn cursor(&self) -> CharIdx {
		self.primary().head
	}

	pub fn ranges(&self) -> &[Range] {
		&self.ranges
	}

	#[allow(clippy::len_without_is_empty, reason = "never empty")]
	pub fn len(&self) -> usize {
		self.ranges.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Range> {
		self.ranges.iter()
	}

	/// Maps every range through `f`, merging any that come to overlap.
	pub fn transform(&self, mut f: impl FnMut(&Range) -> Range) -> Self {
		let others: SmallVec<[Range; 4]> = self
			.ranges
			.iter()
			.enumerate()
			.filter(|&(i, _)| i != self.primary)
			.map(|(_, r)| f(r))
			.collect();
		Self::new(f(&self.primary()), others)
	}

	/// Pulls every range end back to at most `len`.
	pub fn clamp(&mut self, len: CharIdx) {
		*self = self.transform(|r| r.map(|p| p.min(len)));
	}
}
