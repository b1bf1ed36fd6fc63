use std::sync::Arc;

use quill_primitives::{Bias, ChangeSet, CharIdx, EditorState};
use tokio::time::Instant;

use crate::active::ActiveSource;
use crate::rank::{RankedOption, sort_options};
use crate::setup::CompletionSetup;

/// The open completion dialog.
///
/// Never empty: when ranking yields nothing, the dialog either closes or, if
/// a source is still pending, keeps its previous options and is disabled.
#[derive(Debug, Clone)]
pub struct CompletionDialog {
	options: Arc<[RankedOption]>,
	selected: Option<usize>,
	disabled: bool,
	timestamp: Instant,
	anchor: CharIdx,
	above: bool,
}

impl CompletionDialog {
	/// Ranked options, best first.
	pub fn options(&self) -> &[RankedOption] {
		&self.options
	}

	/// Index of the selected option.
	pub fn selected(&self) -> Option<usize> {
		self.selected
	}

	pub fn selected_option(&self) -> Option<&RankedOption> {
		self.selected.and_then(|i| self.options.get(i))
	}

	/// A disabled dialog shows stale options while sources are pending and
	/// ignores accept and move commands.
	pub fn disabled(&self) -> bool {
		self.disabled
	}

	/// When the dialog first opened.
	pub fn timestamp(&self) -> Instant {
		self.timestamp
	}

	/// Document position the dialog is attached to.
	pub fn anchor(&self) -> CharIdx {
		self.anchor
	}

	/// Whether the dialog renders above the cursor.
	pub fn above(&self) -> bool {
		self.above
	}

	pub(crate) fn build(
		active: &[ActiveSource],
		state: &EditorState,
		prev: Option<&CompletionDialog>,
		setup: &CompletionSetup,
		did_set_active: bool,
		now: Instant,
	) -> Option<Self> {
		let pending = active.iter().any(ActiveSource::is_pending);
		if let Some(prev) = prev
			&& !did_set_active
			&& pending
		{
			return Some(prev.set_disabled());
		}

		let options = sort_options(active, state, setup);
		if options.is_empty() {
			return prev.filter(|_| pending).map(Self::set_disabled);
		}

		let mut selected = setup.config.select_on_open.then_some(0);
		if let Some(prev) = prev
			&& prev.selected != selected
			&& let Some(previous) = prev.selected_option()
			&& let Some(i) = options.iter().position(|o| Arc::ptr_eq(&o.completion, &previous.completion))
		{
			selected = Some(i);
		}

		let anchor = active
			.iter()
			.filter_map(ActiveSource::result)
			.map(|r| r.from())
			.min()
			.unwrap_or_else(|| state.cursor());

		Some(Self {
			options: options.into(),
			selected,
			disabled: false,
			timestamp: prev.map_or(now, |p| p.timestamp),
			anchor,
			above: setup.config.above_cursor,
		})
	}

	pub(crate) fn map(&self, changes: &ChangeSet) -> Self {
		Self {
			anchor: changes.map_pos(self.anchor, Bias::Left),
			..self.clone()
		}
	}

	pub(crate) fn set_disabled(&self) -> Self {
		Self {
			disabled: true,
			..self.clone()
		}
	}

	/// Selects the option at `index`, clamped to the last option.
	pub(crate) fn set_selected(&self, index: usize) -> Self {
		let index = index.min(self.options.len().saturating_sub(1));
		Self {
			selected: Some(index),
			..self.clone()
		}
	}
}

impl PartialEq for CompletionDialog {
	fn eq(&self, other: &Self) -> bool {
		(Arc::ptr_eq(&self.options, &other.options) || self.options == other.options)
			&& self.selected == other.selected
			&& self.disabled == other.disabled
			&& self.timestamp == other.timestamp
			&& self.anchor == other.anchor
			&& self.above == other.above
	}
}
