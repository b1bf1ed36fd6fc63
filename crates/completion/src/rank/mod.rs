//! Ranking: turns the results of every source into one ordered option list.
//!
//! # Scoring
//!
//! - Filtered results: each label is matched against the text between the
//!   result's start and the cursor. Non-matching options are dropped; the
//!   match score plus the scaled boost is the option's score.
//! - Unfiltered results: every option is kept, scored just below
//!   `unfiltered_base` in source order, so they float to the top.
//!
//! # Sections
//!
//! Sectioned options are pushed down once per section, in section order, by
//! `section_step` or by the spread of all scores when that is wider, so each
//! section sorts as a block after the unsectioned options.
//!
//! # Order and deduplication
//!
//! Descending score, then the configured comparator. Adjacent options that
//! look identical are collapsed into the one with the higher quality.

use std::cmp::Reverse;
use std::sync::Arc;

use quill_matcher::Matcher;
use quill_primitives::EditorState;

use crate::active::ActiveSource;
use crate::item::{Completion, Highlights, Section, SectionRank};
use crate::setup::CompletionSetup;
use crate::source::Source;


/// An option as shown in the dialog.
#[derive(Debug, Clone)]
pub struct RankedOption {
	pub completion: Arc<Completion>,
	/// The source the option came from.
	pub source: Source,
	/// Byte ranges of the displayed label to highlight.
	pub highlights: Highlights,
	pub score: i64,
}

impl PartialEq for RankedOption {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.completion, &other.completion) && self.source == other.source && self.highlights == other.highlights && self.score == other.score
	}
}

/// Ranks the options of every source holding a result.
pub fn sort_options(active: &[ActiveSource], state: &EditorState, setup: &CompletionSetup) -> Vec<RankedOption> {
	let weights = setup.config.ranking;
	let match_config = setup.config.match_config();
	let mut options: Vec<RankedOption> = Vec::new();
	let mut sections: Vec<Arc<Section>> = Vec::new();

	for a in active {
		let Some(r) = a.result() else { continue };
		let result = r.result();

		if !result.filter() {
			for option in result.options() {
				let highlights = result.get_match().map_or_else(Vec::new, |f| f(option, None));
				let score = weights.unfiltered_base - options.len() as i64;
				push_option(&mut options, &mut sections, option, a.source(), highlights, score);
			}
			continue;
		}

		let cursor = state.cursor().min(r.to()).max(r.from());
		let pattern = state.slice_to_string(r.from(), cursor);
		let matcher = Matcher::new(&pattern, &match_config);
		for option in result.options() {
			let Some(m) = matcher.match_label(&option.label) else { continue };
			let highlights = match &option.display_label {
				None => m.highlights,
				Some(_) => result.get_match().map_or_else(Vec::new, |f| f(option, Some(&m.highlights))),
			};
			let score = i64::from(m.score) + i64::from(option.boost) * weights.boost_scale;
			push_option(&mut options, &mut sections, option, a.source(), highlights, score);
		}
	}

	if !sections.is_empty() {
		apply_section_offsets(&mut options, &mut sections, weights.section_step);
	}

	options.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| setup.compare(&a.completion, &b.completion)));
	dedup(options)
}

fn push_option(
	options: &mut Vec<RankedOption>,
	sections: &mut Vec<Arc<Section>>,
	completion: &Arc<Completion>,
	source: &Source,
	highlights: Highlights,
	score: i64,
) {
	if let Some(section) = &completion.section
		&& !sections.iter().any(|s| s.name == section.name)
	{
		sections.push(section.clone());
	}
	options.push(RankedOption {
		completion: completion.clone(),
		source: source.clone(),
		highlights,
		score,
	});
}

/// Orders sections and folds each section's offset into its options' scores.
///
/// Ranked sections come first, lowest rank first. The rest follow by name,
/// except that dynamic sections trade places among themselves so the one with
/// the best option comes first.
///
/// Each section is pushed down by at least `step` and by more than the spread
/// of all scores, so no option of a later group outscores one of an earlier
/// group.
fn apply_section_offsets(options: &mut [RankedOption], sections: &mut [Arc<Section>], step: i64) {
	let best_score = |name: &str| {
		options
			.iter()
			.filter(|o| o.completion.section.as_ref().is_some_and(|s| s.name == name))
			.map(|o| o.score)
			.max()
			.unwrap_or(i64::MIN)
	};
	sections.sort_by_cached_key(|s| {
		let rank = match s.rank {
			SectionRank::Rank(n) => i64::from(n),
			SectionRank::Dynamic | SectionRank::Unranked => i64::MAX,
		};
		(rank, s.name.clone())
	});
	let slots: Vec<usize> = (0..sections.len()).filter(|&i| matches!(sections[i].rank, SectionRank::Dynamic)).collect();
	let mut dynamic: Vec<Arc<Section>> = slots.iter().map(|&i| sections[i].clone()).collect();
	dynamic.sort_by_cached_key(|s| Reverse(best_score(&s.name)));
	for (slot, section) in slots.into_iter().zip(dynamic) {
		sections[slot] = section;
	}

	let (low, high) = options
		.iter()
		.fold((i64::MAX, i64::MIN), |(low, high), o| (low.min(o.score), high.max(o.score)));
	let step = step.max(high.saturating_sub(low).saturating_add(1));
	let offsets: Vec<(&str, i64)> = sections
		.iter()
		.zip(1i64..)
		.map(|(s, i)| (s.name.as_str(), step.saturating_mul(i).saturating_neg()))
		.collect();
	for option in options.iter_mut() {
		if let Some(section) = &option.completion.section
			&& let Some((_, offset)) = offsets.iter().find(|(name, _)| *name == section.name)
		{
			option.score = option.score.saturating_add(*offset);
		}
	}
}

/// Two adjacent options are duplicates when they would look and apply the same.
fn is_duplicate(a: &Completion, b: &Completion) -> bool {
	let same_kind = match (&a.kind, &b.kind) {
		(Some(x), Some(y)) => x == y,
		_ => true,
	};
	let same_apply = match (&a.apply, &b.apply) {
		(None, None) => true,
		(Some(x), Some(y)) => x.same(y),
		_ => false,
	};
	a.label == b.label && a.detail == b.detail && same_kind && same_apply && a.boost == b.boost
}

fn dedup(sorted: Vec<RankedOption>) -> Vec<RankedOption> {
	let mut ranked: Vec<RankedOption> = Vec::with_capacity(sorted.len());
	for option in sorted {
		match ranked.last_mut() {
			Some(prev) if is_duplicate(&prev.completion, &option.completion) => {
				if option.completion.quality() > prev.completion.quality() {
					*prev = option;
				}
			}
			_ => ranked.push(option),
		}
	}
	ranked
}
