use super::*;
use crate::Range;

#[test]
fn point_selection_cursor() {
	let sel = Selection::point(5);
	assert_eq!(sel.len(), 1);
	assert!(sel.primary().is_point());
	assert_eq!(sel.cursor(), 5);
}

#[test]
fn multi_selection_sorts_and_tracks_primary() {
	let primary = Range::new(10, 15);
	let others = vec![Range::new(20, 25), Range::new(0, 5)];
	let sel = Selection::new(primary, others);
	assert_eq!(sel.len(), 3);
	assert_eq!(sel.primary(), Range::new(10, 15));
	assert_eq!(sel.primary_index(), 1);
	assert_eq!(sel.ranges()[0], Range::new(0, 5));
}

#[test]
fn merge_overlapping() {
	let sel = Selection::new(Range::new(0, 10), vec![Range::new(5, 15)]);
	assert_eq!(sel.len(), 1);
	assert_eq!(sel.ranges()[0].from(), 0);
	assert_eq!(sel.ranges()[0].to(), 15);
}

#[test]
fn merge_duplicate_cursors() {
	let sel = Selection::new(Range::point(5), vec![Range::point(5)]);
	assert_eq!(sel.len(), 1);
	assert_eq!(sel.primary(), Range::point(5));
}

#[test]
fn adjacent_ranges_stay_separate() {
	let sel = Selection::new(Range::new(0, 5), vec![Range::new(5, 10)]);
	assert_eq!(sel.len(), 2);
}

#[test]
fn transform_shifts_every_range() {
	let sel = Selection::new(Range::point(2), vec![Range::point(8)]);
	let shifted = sel.transform(|r| r.map(|p| p + 1));
	assert_eq!(shifted.primary(), Range::point(3));
	assert_eq!(shifted.ranges()[1], Range::point(9));
}

#[test]
fn clamp_to_document() {
	let mut sel = Selection::single(3, 40);
	sel.clamp(10);
	assert_eq!(sel.primary(), Range::new(3, 10));
}
