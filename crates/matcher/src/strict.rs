use crate::{Match, Penalties};

/// Contiguous matcher.
///
/// Prefers a prefix match; otherwise accepts the first contiguous occurrence
/// anywhere in the label with a `not_start` penalty. Case folding is allowed
/// unless the matcher is case sensitive, and costs `case_fold`.
#[derive(Debug, Clone)]
pub struct StrictMatcher {
	pattern: String,
	chars: Vec<char>,
	case_sensitive: bool,
	penalties: Penalties,
}

impl StrictMatcher {
	/// Creates a matcher for `pattern`.
	pub fn new(pattern: &str, case_sensitive: bool, penalties: Penalties) -> Self {
		Self {
			pattern: pattern.to_owned(),
			chars: pattern.chars().collect(),
			case_sensitive,
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

		let (start, folded) = self
			.find(&word_chars, |a, b| a == b)
			.map(|start| (start, false))
			.or_else(|| {
				(!self.case_sensitive)
					.then(|| self.find(&word_chars, eq_ignore_case))
					.flatten()
					.map(|start| (start, true))
			})?;

		let from = word_chars[start].0;
		let to = word_chars.get(start + len).map_or(word.len(), |&(i, _)| i);
		let word_len = word_chars.len() as i32;
		let base = if start > 0 {
			p.not_start - word_len
		} else if word_chars.len() == len {
			0
		} else {
			p.not_full
		};
		let fold = if folded { p.case_fold } else { 0 };
		Some(Match::new(base + fold, vec![from..to]))
	}

	/// Returns the char index of the first window equal to the pattern under `eq`.
	fn find(&self, word: &[(usize, char)], eq: impl Fn(char, char) -> bool) -> Option<usize> {
		let len = self.chars.len();
		(0..=word.len() - len).find(|&start| {
			word[start..start + len]
				.iter()
				.zip(&self.chars)
				.all(|(&(_, w), &c)| eq(w, c))
		})
	}
}

fn eq_ignore_case(a: char, b: char) -> bool {
	a == b || a.to_lowercase().eq(b.to_lowercase())
}
