use std::ops::Range;

use crate::{MAX_SCAN, Match, Penalties, fold_char};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharType {
	NonWord,
	Upper,
	Lower,
}

impl CharType {
	fn of(c: char) -> Self {
		if c.is_ascii() {
			if c.is_ascii_digit() || c.is_ascii_lowercase() {
				Self::Lower
			} else if c.is_ascii_uppercase() {
				Self::Upper
			} else {
				Self::NonWord
			}
		} else if c.is_uppercase() {
			Self::Upper
		} else if c.is_lowercase() {
			Self::Lower
		} else {
			Self::NonWord
		}
	}
}

/// Subsequence matcher with tiered scoring.
///
/// Tiers, best first: exact prefix, by-word from the label start, case-folded
/// adjacent prefix, contiguous substring, case-folded adjacent substring,
/// by-word anywhere, exact-case subsequence, folded subsequence. Two-character
/// patterns never match as a plain subsequence.
#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
	pattern: String,
	chars: Vec<char>,
	folded: Vec<char>,
	penalties: Penalties,
}

impl FuzzyMatcher {
	/// Creates a matcher for `pattern`.
	pub fn new(pattern: &str, penalties: Penalties) -> Self {
		let chars: Vec<char> = pattern.chars().collect();
		let folded = chars.iter().copied().map(fold_char).collect();
		Self {
			pattern: pattern.to_owned(),
			chars,
			folded,
			penalties,
		}
	}

	/// Returns the pattern.
	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	/// Matches `word` against the pattern.
	pub fn match_label(&self, word: &str) -> Option<Match> {
		let p = &self.penalties;
		if self.chars.is_empty() {
			return Some(Match::new(p.not_full, Vec::new()));
		}

		let word_chars: Vec<(usize, char)> = word.char_indices().collect();
		let len = self.chars.len();
		if word_chars.len() < len {
			return None;
		}
		let (chars, folded) = (&self.chars, &self.folded);

		// Single-character patterns only match at the start of the label.
		if len == 1 {
			let (_, first) = word_chars[0];
			let mut score = if word_chars.len() == 1 { 0 } else { p.not_full };
			if first != chars[0] {
				if first != folded[0] {
					return None;
				}
				score += p.case_fold;
			}
			return Some(Match::new(score, vec![0..first.len_utf8()]));
		}

		let direct = word.find(self.pattern.as_str());
		if direct == Some(0) {
			let score = if word.len() == self.pattern.len() { 0 } else { p.not_full };
			return Some(Match::new(score, vec![0..self.pattern.len()]));
		}

		let scan = &word_chars[..word_chars.len().min(MAX_SCAN)];
		let mut any = Vec::with_capacity(len);
		if direct.is_none() {
			for &(i, c) in scan {
				if any.len() == len {
					break;
				}
				let k = any.len();
				if c == chars[k] || c == folded[k] {
					any.push(i);
				}
			}
			if any.len() < len {
				return None;
			}
		}

		let mut precise = Vec::with_capacity(len);
		let mut by_word = Vec::with_capacity(len);
		let mut by_word_folded = false;
		let mut adjacent_to = 0;
		let mut adjacent_start = 0;
		let mut adjacent_end = 0;
		let has_lower = word.chars().any(|c| c.is_ascii_lowercase());
		let mut word_adjacent = true;
		let mut prev_type = CharType::NonWord;

		for (idx, &(i, c)) in scan.iter().enumerate() {
			if by_word.len() >= len {
				break;
			}
			if direct.is_none() {
				if precise.len() < len && c == chars[precise.len()] {
					precise.push(i);
				}
				if adjacent_to < len {
					if c == chars[adjacent_to] || c == folded[adjacent_to] {
						if adjacent_to == 0 {
							adjacent_start = i;
						}
						adjacent_end = i + c.len_utf8();
						adjacent_to += 1;
					} else {
						adjacent_to = 0;
					}
				}
			}

			let ty = CharType::of(c);
			let word_start = idx == 0
				|| (ty == CharType::Upper && has_lower)
				|| (prev_type == CharType::NonWord && ty != CharType::NonWord);
			if word_start {
				let k = by_word.len();
				if chars[k] == c {
					by_word.push(i);
				} else if folded[k] == c {
					by_word_folded = true;
					by_word.push(i);
				} else if !by_word.is_empty() {
					word_adjacent = false;
				}
			}
			prev_type = ty;
		}

		let word_len = word_chars.len() as i32;
		let fold_penalty = if by_word_folded { p.case_fold } else { 0 };

		if by_word.len() == len && by_word[0] == 0 && word_adjacent {
			return Some(self.spread(p.by_word + fold_penalty, &by_word, word, word_len));
		}
		if adjacent_to == len && adjacent_start == 0 {
			let full = if adjacent_end == word.len() { 0 } else { p.not_full };
			return Some(Match::new(p.case_fold - word_len + full, vec![0..adjacent_end]));
		}
		if let Some(start) = direct {
			return Some(Match::new(p.not_start - word_len, vec![start..start + self.pattern.len()]));
		}
		if adjacent_to == len {
			return Some(Match::new(
				p.case_fold + p.not_start - word_len,
				vec![adjacent_start..adjacent_end],
			));
		}
		if by_word.len() == len {
			let gap = if word_adjacent { 0 } else { p.gap };
			return Some(self.spread(p.by_word + fold_penalty + p.not_start + gap, &by_word, word, word_len));
		}
		if len == 2 {
			return None;
		}
		if precise.len() == len {
			let start = if precise[0] == 0 { 0 } else { p.not_start };
			return Some(self.spread(start + p.gap, &precise, word, word_len));
		}
		let start = if any[0] == 0 { 0 } else { p.not_start };
		Some(self.spread(start + p.case_fold + p.gap, &any, word, word_len))
	}

	/// Builds a match from individual character positions, merging runs of
	/// adjacent characters into single highlight ranges.
	fn spread(&self, score: i32, positions: &[usize], word: &str, word_len: i32) -> Match {
		let mut highlights: Vec<Range<usize>> = Vec::with_capacity(positions.len());
		for &pos in positions {
			let width = word[pos..].chars().next().map_or(1, char::len_utf8);
			match highlights.last_mut() {
				Some(last) if last.end == pos => last.end = pos + width,
				_ => highlights.push(pos..pos + width),
			}
		}
		Match::new(score - word_len, highlights)
	}
}
