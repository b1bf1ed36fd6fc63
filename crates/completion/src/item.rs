//! Completion options and the results sources return.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use quill_primitives::{BoxFutureStatic, ChangeSet, CharIdx, EditorState, Transaction};
use regex::Regex;
use smallvec::SmallVec;

use crate::context::CompletionContext;
use crate::error::CompletionError;

/// Characters that accept the selected option when typed.
pub type CommitCharacters = SmallVec<[char; 4]>;

/// Highlight ranges, as byte offsets into a label.
pub type Highlights = Vec<Range<usize>>;

/// Boost values are clamped to this range.
pub const BOOST_RANGE: std::ops::RangeInclusive<i32> = -99..=99;

/// A single completion option.
///
/// Options are immutable once built and shared as `Arc<Completion>`; the
/// engine identifies an option by pointer, so two options with equal fields
/// are still distinct.
#[derive(Debug, Clone, Default)]
pub struct Completion {
	/// Text matched against the typed pattern, and inserted unless `apply` is set.
	pub label: String,
	/// Text shown instead of the label.
	pub display_label: Option<String>,
	/// Short text shown after the label.
	pub detail: Option<String>,
	/// Additional information shown next to the dialog.
	pub info: Option<Info>,
	/// How to apply the option. Defaults to inserting the label.
	pub apply: Option<Apply>,
	/// Opaque type tag, used for icons and deduplication.
	pub kind: Option<String>,
	/// Ranking adjustment, within [`BOOST_RANGE`].
	pub boost: i32,
	/// Characters that accept this option when typed.
	pub commit_characters: Option<CommitCharacters>,
	/// Section the option is grouped under.
	pub section: Option<Arc<Section>>,
}

impl Completion {
	/// Creates an option with the given label.
	pub fn new(label: impl Into<String>) -> Self {
		Self {
			label: label.into(),
			..Self::default()
		}
	}

	pub fn with_display_label(mut self, label: impl Into<String>) -> Self {
		self.display_label = Some(label.into());
		self
	}

	pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
		self.detail = Some(detail.into());
		self
	}

	pub fn with_info(mut self, info: Info) -> Self {
		self.info = Some(info);
		self
	}

	pub fn with_apply(mut self, apply: Apply) -> Self {
		self.apply = Some(apply);
		self
	}

	pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
		self.kind = Some(kind.into());
		self
	}

	/// Sets the boost, clamped to [`BOOST_RANGE`].
	pub fn with_boost(mut self, boost: i32) -> Self {
		self.boost = boost.clamp(*BOOST_RANGE.start(), *BOOST_RANGE.end());
		self
	}

	pub fn with_commit_characters(mut self, chars: impl IntoIterator<Item = char>) -> Self {
		self.commit_characters = Some(chars.into_iter().collect());
		self
	}

	pub fn with_section(mut self, section: Arc<Section>) -> Self {
		self.section = Some(section);
		self
	}

	/// Text shown in the dialog.
	pub fn display(&self) -> &str {
		self.display_label.as_deref().unwrap_or(&self.label)
	}

	/// Preference when deduplicating otherwise identical options.
	pub(crate) fn quality(&self) -> i32 {
		self.boost * 100 + if self.apply.is_some() { 10 } else { 0 } + if self.info.is_some() { 5 } else { 0 } + i32::from(self.kind.is_some())
	}
}

/// Asynchronously resolves an option's info text.
pub type ResolveInfoFn = Arc<dyn Fn(&Completion) -> BoxFutureStatic<anyhow::Result<Option<String>>> + Send + Sync>;

/// Information shown next to the selected option.
#[derive(Clone)]
pub enum Info {
	/// Plain text.
	Text(String),
	/// Computed when the option is selected.
	Resolve(ResolveInfoFn),
}

impl fmt::Debug for Info {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
			Self::Resolve(_) => f.write_str("Resolve(..)"),
		}
	}
}

/// Builds the transaction for a custom apply action, given the state, the
/// picked option and the span it replaces.
pub type ApplyFn = Arc<dyn Fn(&EditorState, &Arc<Completion>, CharIdx, CharIdx) -> Transaction + Send + Sync>;

/// How an option is applied.
#[derive(Clone)]
pub enum Apply {
	/// Replace the span with this text.
	Text(String),
	/// Build the transaction with a custom routine.
	Custom(ApplyFn),
}

impl Apply {
	pub fn custom(f: impl Fn(&EditorState, &Arc<Completion>, CharIdx, CharIdx) -> Transaction + Send + Sync + 'static) -> Self {
		Self::Custom(Arc::new(f))
	}

	/// Same text, or the same routine.
	pub(crate) fn same(&self, other: &Apply) -> bool {
		match (self, other) {
			(Self::Text(a), Self::Text(b)) => a == b,
			(Self::Custom(a), Self::Custom(b)) => Arc::ptr_eq(a, b),
			_ => false,
		}
	}
}

impl fmt::Debug for Apply {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
			Self::Custom(_) => f.write_str("Custom(..)"),
		}
	}
}

/// Orders sections relative to each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SectionRank {
	/// Sorted after ranked sections, by name.
	#[default]
	Unranked,
	/// Lower ranks come first.
	Rank(i32),
	/// Dynamic sections are ordered among themselves by their best option's score.
	Dynamic,
}

/// A named group of options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
	/// Header text; also the identity of the section.
	pub name: String,
	/// Ordering relative to other sections.
	pub rank: SectionRank,
}

impl Section {
	pub fn new(name: impl Into<String>, rank: SectionRank) -> Arc<Self> {
		Arc::new(Self { name: name.into(), rank })
	}
}

/// Decides whether a result still applies to the text in its span.
pub type ValidForFn = Arc<dyn Fn(&str, CharIdx, CharIdx, &EditorState) -> bool + Send + Sync>;

/// Rule for reusing a result as the user keeps typing.
#[derive(Clone)]
pub enum ValidFor {
	/// The whole span text must match the pattern.
	Pattern(Regex),
	/// Called with the span text, the span and the state.
	Predicate(ValidForFn),
}

impl ValidFor {
	/// Compiles `pattern`, anchored so it must match the entire span text.
	pub fn pattern(pattern: &str) -> Result<Self, CompletionError> {
		Ok(Self::Pattern(Regex::new(&format!("^(?:{pattern})$"))?))
	}

	pub fn predicate(f: impl Fn(&str, CharIdx, CharIdx, &EditorState) -> bool + Send + Sync + 'static) -> Self {
		Self::Predicate(Arc::new(f))
	}

	/// Checks the span text of `state` against the rule.
	pub fn check(&self, state: &EditorState, from: CharIdx, to: CharIdx) -> bool {
		let text = state.slice_to_string(from, to);
		match self {
			Self::Pattern(re) => re.is_match(&text),
			Self::Predicate(f) => f(&text, from, to, state),
		}
	}
}

impl fmt::Debug for ValidFor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
			Self::Predicate(_) => f.write_str("Predicate(..)"),
		}
	}
}

/// Adapts a result to a new span as the user types, or gives up.
pub type UpdateFn = Arc<dyn Fn(&Arc<CompletionResult>, CharIdx, CharIdx, &CompletionContext) -> Option<Arc<CompletionResult>> + Send + Sync>;

/// Adapts a result to a document change, or drops it.
pub type MapFn = Arc<dyn Fn(&Arc<CompletionResult>, &ChangeSet) -> Option<Arc<CompletionResult>> + Send + Sync>;

/// Computes highlight ranges for unfiltered or display-labelled options.
///
/// Receives the label match ranges when the option was filtered.
pub type GetMatchFn = Arc<dyn Fn(&Completion, Option<&[Range<usize>]>) -> Highlights + Send + Sync>;

/// Orders options that scored equally.
pub type CompareFn = Arc<dyn Fn(&Completion, &Completion) -> Ordering + Send + Sync>;

/// Options returned by a source for one span of the document.
#[derive(Clone)]
pub struct CompletionResult {
	from: CharIdx,
	to: Option<CharIdx>,
	options: Vec<Arc<Completion>>,
	valid_for: Option<ValidFor>,
	update: Option<UpdateFn>,
	map: Option<MapFn>,
	filter: bool,
	commit_characters: Option<CommitCharacters>,
	get_match: Option<GetMatchFn>,
}

impl CompletionResult {
	/// Starts building a result replacing text from `from` with `options`.
	pub fn builder(from: CharIdx, options: impl IntoIterator<Item = Completion>) -> CompletionResultBuilder {
		CompletionResultBuilder {
			result: CompletionResult {
				from,
				to: None,
				options: options.into_iter().map(Arc::new).collect(),
				valid_for: None,
				update: None,
				map: None,
				filter: true,
				commit_characters: None,
				get_match: None,
			},
		}
	}

	/// Start of the replaced span.
	pub fn from(&self) -> CharIdx {
		self.from
	}

	/// End of the replaced span; the query position when unset.
	pub fn to(&self) -> Option<CharIdx> {
		self.to
	}

	pub fn options(&self) -> &[Arc<Completion>] {
		&self.options
	}

	pub fn valid_for(&self) -> Option<&ValidFor> {
		self.valid_for.as_ref()
	}

	pub fn update_fn(&self) -> Option<&UpdateFn> {
		self.update.as_ref()
	}

	pub fn map_fn(&self) -> Option<&MapFn> {
		self.map.as_ref()
	}

	/// Whether options are matched against the typed pattern.
	pub fn filter(&self) -> bool {
		self.filter
	}

	pub fn commit_characters(&self) -> Option<&CommitCharacters> {
		self.commit_characters.as_ref()
	}

	pub fn get_match(&self) -> Option<&GetMatchFn> {
		self.get_match.as_ref()
	}

	/// Returns a builder seeded with this result, for `update` and `map` hooks
	/// that derive a new result from an old one.
	pub fn to_builder(&self) -> CompletionResultBuilder {
		CompletionResultBuilder { result: self.clone() }
	}
}

impl fmt::Debug for CompletionResult {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CompletionResult")
			.field("from", &self.from)
			.field("to", &self.to)
			.field("options", &self.options.len())
			.field("valid_for", &self.valid_for)
			.field("filter", &self.filter)
			.finish_non_exhaustive()
	}
}

/// Builder for [`CompletionResult`].
#[must_use]
pub struct CompletionResultBuilder {
	result: CompletionResult,
}

impl CompletionResultBuilder {
	pub fn from(mut self, from: CharIdx) -> Self {
		self.result.from = from;
		self
	}

	pub fn to(mut self, to: CharIdx) -> Self {
		self.result.to = Some(to);
		self
	}

	pub fn options(mut self, options: impl IntoIterator<Item = Arc<Completion>>) -> Self {
		self.result.options = options.into_iter().collect();
		self
	}

	pub fn valid_for(mut self, valid_for: ValidFor) -> Self {
		self.result.valid_for = Some(valid_for);
		self
	}

	pub fn update(mut self, f: impl Fn(&Arc<CompletionResult>, CharIdx, CharIdx, &CompletionContext) -> Option<Arc<CompletionResult>> + Send + Sync + 'static) -> Self {
		self.result.update = Some(Arc::new(f));
		self
	}

	pub fn map(mut self, f: impl Fn(&Arc<CompletionResult>, &ChangeSet) -> Option<Arc<CompletionResult>> + Send + Sync + 'static) -> Self {
		self.result.map = Some(Arc::new(f));
		self
	}

	pub fn filter(mut self, filter: bool) -> Self {
		self.result.filter = filter;
		self
	}

	pub fn commit_characters(mut self, chars: impl IntoIterator<Item = char>) -> Self {
		self.result.commit_characters = Some(chars.into_iter().collect());
		self
	}

	pub fn get_match(mut self, f: impl Fn(&Completion, Option<&[Range<usize>]>) -> Highlights + Send + Sync + 'static) -> Self {
		self.result.get_match = Some(Arc::new(f));
		self
	}

	/// Validates and returns the result.
	pub fn build(self) -> Result<CompletionResult, CompletionError> {
		let result = self.result;
		if result.valid_for.is_some() && !result.filter {
			return Err(CompletionError::ValidForWithoutFilter);
		}
		if let Some(to) = result.to
			&& to < result.from
		{
			return Err(CompletionError::InvertedSpan { from: result.from, to });
		}
		Ok(result)
	}
}
