use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::{Arc, LazyLock};

use lru::LruCache;
use parking_lot::Mutex;
use quill_primitives::{BoxFutureStatic, CharIdx, Rope, ready};
use regex::Regex;
use rustc_hash::{FxHashSet, FxHasher};
use tracing::trace;
use unicode_segmentation::UnicodeSegmentation;

use crate::context::CompletionContext;
use crate::item::{Completion, CompletionResult, ValidFor};
use crate::source::{CompletionSource, SourceOutput};

/// Lines remembered by a default [`WordCache`].
const DEFAULT_CACHED_LINES: usize = 4096;

/// Options offered by a default [`WordSource`].
const DEFAULT_MAX_WORDS: usize = 2000;

static WORD_BEFORE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\p{Alphabetic}\p{N}_]+").expect("valid regex"));
static WORD_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\p{Alphabetic}\p{N}_]*$").expect("valid regex"));

/// A word and its char offset within its line.
type LineWords = Arc<[(usize, Box<str>)]>;

/// Words per line, keyed by a hash of the line's text.
///
/// Snapshots never change in place, so an unchanged line always splits into
/// the same words and the cache can be shared between documents and
/// sessions.
pub struct WordCache {
	lines: Mutex<LruCache<u64, LineWords>>,
}

impl WordCache {
	pub fn new(capacity: NonZeroUsize) -> Self {
		Self {
			lines: Mutex::new(LruCache::new(capacity)),
		}
	}

	/// Splits `line` into words, from the cache when possible.
	pub fn words(&self, line: &str) -> LineWords {
		let mut hasher = FxHasher::default();
		line.hash(&mut hasher);
		let key = hasher.finish();

		if let Some(words) = self.lines.lock().get(&key) {
			return words.clone();
		}
		let words: LineWords = line
			.unicode_word_indices()
			.map(|(byte, word)| (line[..byte].chars().count(), word.into()))
			.collect();
		self.lines.lock().put(key, words.clone());
		words
	}

	/// Number of cached lines.
	pub fn len(&self) -> usize {
		self.lines.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl Default for WordCache {
	fn default() -> Self {
		Self::new(NonZeroUsize::new(DEFAULT_CACHED_LINES).unwrap_or(NonZeroUsize::MIN))
	}
}

/// Completes words found in the document.
///
/// Lines are scanned outward from the cursor's line, so nearby words come
/// first when the list is cut at `max_words`. The word being typed is
/// skipped.
#[derive(Clone)]
pub struct WordSource {
	cache: Arc<WordCache>,
	max_words: usize,
}

impl WordSource {
	pub fn new() -> Self {
		Self::with_cache(Arc::new(WordCache::default()))
	}

	/// Shares `cache` with other word sources.
	pub fn with_cache(cache: Arc<WordCache>) -> Self {
		Self {
			cache,
			max_words: DEFAULT_MAX_WORDS,
		}
	}

	pub fn with_max_words(mut self, max_words: usize) -> Self {
		self.max_words = max_words;
		self
	}

	fn complete_sync(&self, cx: &CompletionContext) -> SourceOutput {
		let token = cx.match_before(&WORD_BEFORE)?;
		if token.is_none() && !cx.explicit() {
			return Ok(None);
		}
		let from = token.map_or(cx.pos(), |t| t.from);
		let words = self.collect(cx.state().doc(), from);
		trace!(from, count = words.len(), "completion.words");

		let result = CompletionResult::builder(from, words.into_iter().map(|w| Completion::new(w).with_kind("text")))
			.valid_for(ValidFor::Pattern(WORD_PREFIX.clone()))
			.build()?;
		Ok(Some(result))
	}

	fn collect(&self, doc: &Rope, skip_at: CharIdx) -> Vec<String> {
		let lines = doc.len_lines();
		let center = doc.char_to_line(skip_at.min(doc.len_chars()));
		let order = (0..lines * 2).map(|i| if i % 2 == 0 { center + i / 2 } else { center.wrapping_sub(i / 2 + 1) });

		let mut seen = FxHashSet::default();
		let mut out = Vec::new();
		let mut visited = 0;
		for line_idx in order {
			if visited == lines || out.len() >= self.max_words {
				break;
			}
			if line_idx >= lines {
				continue;
			}
			visited += 1;

			let start = doc.line_to_char(line_idx);
			let line = doc.line(line_idx).to_string();
			for (offset, word) in self.cache.words(line.trim_end_matches(['\n', '\r'])).iter() {
				if start + offset == skip_at || !seen.insert(word.clone()) {
					continue;
				}
				out.push(word.to_string());
				if out.len() >= self.max_words {
					break;
				}
			}
		}
		out
	}
}

impl Default for WordSource {
	fn default() -> Self {
		Self::new()
	}
}

impl CompletionSource for WordSource {
	fn complete(&self, cx: &CompletionContext) -> BoxFutureStatic<SourceOutput> {
		ready(self.complete_sync(cx))
	}
}
