use quill_primitives::{BoxFutureStatic, ready};
use regex::Regex;

use crate::context::CompletionContext;
use crate::error::CompletionError;
use crate::item::{Completion, CompletionResult, ValidFor};
use crate::source::{CompletionSource, SourceOutput};

/// Completes from a fixed list of options.
///
/// The token before the cursor is derived from the labels: plain word
/// characters when every label is a word, else the set of characters that
/// start labels followed by any characters that occur later in them. Outside
/// a token, the list is offered only on explicit requests.
#[derive(Debug, Clone)]
pub struct ListSource {
	options: Vec<Completion>,
	token: Regex,
	valid_for: ValidFor,
}

impl ListSource {
	pub fn new(options: impl IntoIterator<Item = Completion>) -> Result<Self, CompletionError> {
		let options: Vec<Completion> = options.into_iter().collect();
		let pattern = if options.iter().all(|o| is_word(&o.label)) {
			r"\w+".to_owned()
		} else {
			label_pattern(&options)
		};
		Ok(Self {
			token: Regex::new(&pattern)?,
			valid_for: ValidFor::pattern(&format!("(?:{pattern})?"))?,
			options,
		})
	}

	/// Creates a list of plain labels.
	pub fn from_labels<S: Into<String>>(labels: impl IntoIterator<Item = S>) -> Result<Self, CompletionError> {
		Self::new(labels.into_iter().map(Completion::new))
	}

	fn complete_sync(&self, cx: &CompletionContext) -> SourceOutput {
		let token = cx.match_before(&self.token)?;
		if token.is_none() && !cx.explicit() {
			return Ok(None);
		}
		let from = token.map_or(cx.pos(), |t| t.from);
		let result = CompletionResult::builder(from, self.options.iter().cloned())
			.valid_for(self.valid_for.clone())
			.build()?;
		Ok(Some(result))
	}
}

impl CompletionSource for ListSource {
	fn complete(&self, cx: &CompletionContext) -> BoxFutureStatic<SourceOutput> {
		ready(self.complete_sync(cx))
	}
}

fn is_word_char(c: char) -> bool {
	c.is_alphanumeric() || c == '_'
}

fn is_word(label: &str) -> bool {
	!label.is_empty() && label.chars().all(is_word_char)
}

/// `[first chars][later chars]*`, with word characters folded into `\w`.
fn label_pattern(options: &[Completion]) -> String {
	let mut first = Vec::new();
	let mut rest = Vec::new();
	for option in options {
		let mut chars = option.label.chars();
		first.extend(chars.next());
		rest.extend(chars);
	}
	match char_class(rest) {
		Some(rest) => format!("{}{rest}*", char_class(first).unwrap_or_else(|| r"\w".to_owned())),
		None => char_class(first).unwrap_or_else(|| r"\w".to_owned()),
	}
}

fn char_class(mut chars: Vec<char>) -> Option<String> {
	if chars.is_empty() {
		return None;
	}
	chars.sort_unstable();
	chars.dedup();
	let words = chars.iter().any(|c| is_word_char(*c));
	let mut class = String::from("[");
	if words {
		class.push_str(r"\w");
	}
	for c in chars.into_iter().filter(|c| !(words && is_word_char(*c))) {
		class.push_str(&regex::escape(c.encode_utf8(&mut [0; 4])));
	}
	class.push(']');
	Some(class)
}

#[cfg(test)]
mod tests {
	use quill_primitives::EditorState;

	use super::*;

	fn complete(source: &ListSource, text: &str, explicit: bool) -> Option<CompletionResult> {
		let cx = CompletionContext::new(EditorState::with_cursor(text, text.chars().count()), text.chars().count(), explicit);
		source.complete_sync(&cx).unwrap()
	}

	#[test]
	fn test_word_labels_complete_word_before_cursor() {
		let source = ListSource::from_labels(["let", "loop"]).unwrap();
		let result = complete(&source, "fn lo", false).unwrap();
		assert_eq!(result.from(), 3);
		assert_eq!(result.options().len(), 2);

		let state = EditorState::with_cursor("fn loo", 6);
		assert!(result.valid_for().unwrap().check(&state, 3, 6));
		let state = EditorState::with_cursor("fn lo.", 6);
		assert!(!result.valid_for().unwrap().check(&state, 3, 6));
	}

	#[test]
	fn test_outside_token_only_explicit() {
		let source = ListSource::from_labels(["let"]).unwrap();
		assert!(complete(&source, "x ", false).is_none());
		assert_eq!(complete(&source, "x ", true).unwrap().from(), 2);
	}

	#[test]
	fn test_symbol_labels_derive_token() {
		let source = ListSource::from_labels(["@media", "@import", "::before"]).unwrap();
		let result = complete(&source, "a { @im", false).unwrap();
		assert_eq!(result.from(), 4);

		let result = complete(&source, "p::be", false).unwrap();
		assert_eq!(result.from(), 1);
	}

	#[test]
	fn test_single_char_labels() {
		let source = ListSource::from_labels(["+", "-"]).unwrap();
		assert_eq!(complete(&source, "1 -", false).unwrap().from(), 2);
	}
}
