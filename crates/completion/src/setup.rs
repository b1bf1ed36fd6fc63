//! Runtime completion setup: configuration plus the parts that cannot be
//! serialized.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::config::CompletionConfig;
use crate::item::{CompareFn, Completion};
use crate::render::OptionDecoration;
use crate::source::Source;

/// Decides whether accepting an option should immediately start a new
/// completion session.
pub type ActivateOnCompletionFn = Arc<dyn Fn(&Completion) -> bool + Send + Sync>;

/// Everything the engine needs besides the document.
#[derive(Clone, Default)]
pub struct CompletionSetup {
	/// Serializable options.
	pub config: CompletionConfig,
	/// Sources queried for this document.
	pub sources: Vec<Source>,
	/// Replaces `sources` when set.
	pub override_sources: Option<Vec<Source>>,
	/// Orders equally scored options; see [`default_compare`].
	pub compare: Option<CompareFn>,
	/// Extra render columns.
	pub decorations: Vec<OptionDecoration>,
	/// Consulted when an option is accepted.
	pub activate_on_completion: Option<ActivateOnCompletionFn>,
}

impl CompletionSetup {
	pub fn new(config: CompletionConfig) -> Self {
		Self {
			config,
			..Self::default()
		}
	}

	pub fn with_source(mut self, source: Source) -> Self {
		self.sources.push(source);
		self
	}

	pub fn with_override(mut self, sources: Vec<Source>) -> Self {
		self.override_sources = Some(sources);
		self
	}

	pub fn with_comparator(mut self, f: impl Fn(&Completion, &Completion) -> Ordering + Send + Sync + 'static) -> Self {
		self.compare = Some(Arc::new(f));
		self
	}

	pub fn with_decoration(mut self, decoration: OptionDecoration) -> Self {
		self.decorations.push(decoration);
		self
	}

	pub fn with_activate_on_completion(mut self, f: impl Fn(&Completion) -> bool + Send + Sync + 'static) -> Self {
		self.activate_on_completion = Some(Arc::new(f));
		self
	}

	/// The sources in effect: the override list if set, else the configured ones.
	pub fn active_sources(&self) -> &[Source] {
		self.override_sources.as_deref().unwrap_or(&self.sources)
	}

	/// Orders two equally scored options.
	pub fn compare(&self, a: &Completion, b: &Completion) -> Ordering {
		match &self.compare {
			Some(f) => f(a, b),
			None => default_compare(a, b),
		}
	}

	pub(crate) fn activates_on_completion(&self, completion: &Completion) -> bool {
		self.activate_on_completion.as_ref().is_some_and(|f| f(completion))
	}
}

/// Case-insensitive label order, with exact order as the tie breaker.
pub fn default_compare(a: &Completion, b: &Completion) -> Ordering {
	let folded = a.label.chars().flat_map(char::to_lowercase).cmp(b.label.chars().flat_map(char::to_lowercase));
	folded.then_with(|| a.label.cmp(&b.label))
}

impl fmt::Debug for CompletionSetup {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CompletionSetup")
			.field("config", &self.config)
			.field("sources", &self.sources)
			.field("override_sources", &self.override_sources)
			.field("decorations", &self.decorations.len())
			.finish_non_exhaustive()
	}
}
