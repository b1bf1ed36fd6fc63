/// A position in the text, measured in characters (not bytes).
pub type CharIdx = usize;

/// A length or count in the text, measured in characters (not bytes).
pub type CharLen = usize;

/// A selected span: `anchor` stays put, `head` is the cursor.
///
/// The covered extent is `[from, to)` whichever way the range points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
	pub anchor: CharIdx,
	pub head: CharIdx,
}

impl Range {
	pub fn new(anchor: CharIdx, head: CharIdx) -> Self {
		Self { anchor, head }
	}

	/// A cursor at `pos`.
	pub fn point(pos: CharIdx) -> Self {
		Self::new(pos, pos)
	}

	#[inline]
	pub fn from(&self) -> CharIdx {
		self.anchor.min(self.head)
	}

	#[inline]
	pub fn to(&self) -> CharIdx {
		self.anchor.max(self.head)
	}

	#[inline]
	pub fn is_point(&self) -> bool {
		self.anchor == self.head
	}

	/// Maps both ends through `f`.
	pub fn map(self, mut f: impl FnMut(CharIdx) -> CharIdx) -> Self {
		Self::new(f(self.anchor), f(self.head))
	}

	/// Ranges overlap when their extents share a character, or when both
	/// are cursors at the same position.
	pub(crate) fn overlaps(&self, other: &Range) -> bool {
		(self.from() < other.to() && other.from() < self.to()) || (self.is_point() && other.is_point() && self.head == other.head)
	}

	/// The extent covering both ranges, pointing the way `self` points.
	pub(crate) fn union(&self, other: &Range) -> Self {
		let (from, to) = (self.from().min(other.from()), self.to().max(other.to()));
		if self.head < self.anchor { Self::new(to, from) } else { Self::new(from, to) }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn extent_ignores_orientation() {
		let back = Range::new(10, 5);
		assert_eq!((back.from(), back.to()), (5, 10));
		assert!(!back.is_point());
	}

	#[test]
	fn overlap_rules() {
		assert!(Range::new(5, 10).overlaps(&Range::new(8, 15)));
		assert!(!Range::new(5, 10).overlaps(&Range::new(10, 15)));
		assert!(Range::point(5).overlaps(&Range::point(5)));
		assert!(!Range::point(5).overlaps(&Range::new(5, 8)));
	}

	#[test]
	fn union_keeps_orientation() {
		assert_eq!(Range::new(10, 5).union(&Range::new(8, 15)), Range::new(15, 5));
		assert_eq!(Range::new(1, 3).union(&Range::point(7)), Range::new(1, 7));
	}
}
