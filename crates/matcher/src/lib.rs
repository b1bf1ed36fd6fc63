//! Label matching for completion ranking.
//!
//! Two modes are provided:
//! - [`FuzzyMatcher`]: the pattern must appear as a subsequence of the label.
//!   Matches are tiered (exact prefix, by-word, adjacent, subsequence) and
//!   scored with the penalties in [`Penalties`].
//! - [`StrictMatcher`]: the pattern must appear contiguously, preferably as a
//!   prefix, with optional case folding.
//!
//! Scores are non-positive; `0` is an exact, full-length match. Highlights are
//! ascending, non-overlapping byte ranges into the label.

use std::ops::Range;

mod fuzzy;
mod strict;

pub use fuzzy::FuzzyMatcher;
pub use strict::StrictMatcher;


/// Only the first `MAX_SCAN` characters of a label are searched for
/// non-contiguous matches.
pub(crate) const MAX_SCAN: usize = 200;

/// Score penalties applied by the matchers.
///
/// All values should be negative. Larger magnitudes push a match tier further
/// down the ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "kebab-case"))]
pub struct Penalties {
	/// Applied once when a non-adjacent match has gaps.
	pub gap: i32,
	/// The match does not start at the start of the label.
	pub not_start: i32,
	/// At least one character needed case folding to match.
	pub case_fold: i32,
	/// Every pattern character matched the start of a word in the label.
	pub by_word: i32,
	/// The match does not cover the whole label.
	pub not_full: i32,
}

impl Default for Penalties {
	fn default() -> Self {
		Self {
			gap: -1100,
			not_start: -700,
			case_fold: -200,
			by_word: -100,
			not_full: -100,
		}
	}
}

/// Which matcher to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum MatchMode {
	/// Subsequence matching.
	#[default]
	Fuzzy,
	/// Contiguous matching.
	Strict,
}

/// Matcher configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchConfig {
	/// Matching mode.
	pub mode: MatchMode,
	/// Disables case folding in strict mode.
	pub case_sensitive: bool,
	/// Score penalties.
	pub penalties: Penalties,
}

/// A successful match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
	/// Match quality; higher is better, `0` is a full exact match.
	pub score: i32,
	/// Matched byte ranges into the label, for highlighting.
	pub highlights: Vec<Range<usize>>,
}

impl Match {
	pub(crate) fn new(score: i32, highlights: Vec<Range<usize>>) -> Self {
		Self { score, highlights }
	}
}

/// A matcher for one pattern, in either mode.
#[derive(Debug, Clone)]
pub enum Matcher {
	/// Fuzzy mode.
	Fuzzy(FuzzyMatcher),
	/// Strict mode.
	Strict(StrictMatcher),
}

impl Matcher {
	/// Builds the matcher selected by `config` for `pattern`.
	pub fn new(pattern: &str, config: &MatchConfig) -> Self {
		match config.mode {
			MatchMode::Fuzzy => Self::Fuzzy(FuzzyMatcher::new(pattern, config.penalties)),
			MatchMode::Strict => Self::Strict(StrictMatcher::new(pattern, config.case_sensitive, config.penalties)),
		}
	}

	/// Matches `label`, returning `None` when it does not match.
	pub fn match_label(&self, label: &str) -> Option<Match> {
		match self {
			Self::Fuzzy(m) => m.match_label(label),
			Self::Strict(m) => m.match_label(label),
		}
	}

	/// Returns the pattern.
	pub fn pattern(&self) -> &str {
		match self {
			Self::Fuzzy(m) => m.pattern(),
			Self::Strict(m) => m.pattern(),
		}
	}
}

/// Returns the opposite-case variant of `c`, or `c` when it has none.
pub(crate) fn fold_char(c: char) -> char {
	let upper = c.to_uppercase().next().unwrap_or(c);
	if upper == c { c.to_lowercase().next().unwrap_or(c) } else { upper }
}
