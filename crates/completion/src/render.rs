//! Renderer-facing view of the completion state.
//!
//! The engine does not draw anything. [`RenderModel`] is what a frontend
//! needs to draw the dialog: a window of options, each broken into ordered
//! columns, plus the selection and placement flags.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::item::{Completion, Highlights, Info};
use crate::setup::CompletionSetup;
use crate::state::CompletionState;

/// Column position of the built-in type icon.
pub const ICON_POSITION: i32 = 20;
/// Column position of the built-in label.
pub const LABEL_POSITION: i32 = 50;
/// Column position of the built-in detail.
pub const DETAIL_POSITION: i32 = 80;

type DecorateFn = Arc<dyn Fn(&Completion) -> Option<String> + Send + Sync>;

/// An extra column rendered for every option.
#[derive(Clone)]
pub struct OptionDecoration {
	/// Columns are laid out in ascending position.
	pub position: i32,
	render: DecorateFn,
}

impl OptionDecoration {
	pub fn new(position: i32, render: impl Fn(&Completion) -> Option<String> + Send + Sync + 'static) -> Self {
		Self {
			position,
			render: Arc::new(render),
		}
	}
}

impl fmt::Debug for OptionDecoration {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("OptionDecoration").field("position", &self.position).finish_non_exhaustive()
	}
}

/// What a column shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
	/// The option's type tag.
	Icon(String),
	/// The displayed label, with highlighted byte ranges.
	Label { text: String, highlights: Highlights },
	Detail(String),
	/// Output of an [`OptionDecoration`].
	Custom(String),
}

/// One option as drawn.
#[derive(Debug, Clone)]
pub struct RenderedOption {
	pub completion: Arc<Completion>,
	pub columns: Vec<Column>,
}

/// Everything needed to draw the dialog.
#[derive(Debug, Clone)]
pub struct RenderModel {
	/// Session id; stable while the dialog stays open.
	pub id: Arc<str>,
	/// Index of the first rendered option in the full list.
	pub offset: usize,
	pub options: Vec<RenderedOption>,
	/// Total number of options, rendered or not.
	pub total: usize,
	/// Selected index in the full list.
	pub selected: Option<usize>,
	pub disabled: bool,
	pub above: bool,
	/// Document position to attach to.
	pub anchor: usize,
}

impl RenderModel {
	/// Builds the model for the open dialog, or `None` if it is closed.
	pub fn build(completion: &CompletionState, setup: &CompletionSetup) -> Option<Self> {
		let open = completion.open()?;
		let total = open.options().len();
		let window = range_around_selected(total, open.selected(), setup.config.max_rendered_options);

		let mut decorations: Vec<(i32, Option<&OptionDecoration>)> = Vec::new();
		if setup.config.icons {
			decorations.push((ICON_POSITION, None));
		}
		decorations.push((LABEL_POSITION, None));
		decorations.push((DETAIL_POSITION, None));
		decorations.extend(setup.decorations.iter().map(|d| (d.position, Some(d))));
		decorations.sort_by_key(|(position, _)| *position);

		let options = open.options()[window.clone()]
			.iter()
			.map(|option| {
				let c = &option.completion;
				let columns = decorations
					.iter()
					.filter_map(|(position, decoration)| match (position, decoration) {
						(_, Some(d)) => (d.render)(c).map(Column::Custom),
						(&ICON_POSITION, None) => c.kind.clone().map(Column::Icon),
						(&LABEL_POSITION, None) => Some(Column::Label {
							text: c.display().to_owned(),
							highlights: option.highlights.clone(),
						}),
						(_, None) => c.detail.clone().map(Column::Detail),
					})
					.collect();
				RenderedOption {
					completion: c.clone(),
					columns,
				}
			})
			.collect();

		Some(Self {
			id: completion.id().into(),
			offset: window.start,
			options,
			total,
			selected: open.selected(),
			disabled: open.disabled(),
			above: open.above(),
			anchor: open.anchor(),
		})
	}
}

/// The window of at most `max` options to render so the selection stays
/// visible. Windows are aligned to multiples of `max` from whichever end of
/// the list is closer to the selection.
pub fn range_around_selected(total: usize, selected: Option<usize>, max: usize) -> Range<usize> {
	if total <= max || max == 0 {
		return 0..total;
	}
	let selected = selected.unwrap_or(0);
	if selected <= total / 2 {
		let page = selected / max;
		return page * max..(page + 1) * max;
	}
	let page = (total - selected) / max;
	total - (page + 1) * max..total - page * max
}

/// Resolves the info shown next to an option.
pub async fn resolve_info(completion: &Completion) -> anyhow::Result<Option<String>> {
	match &completion.info {
		None => Ok(None),
		Some(Info::Text(text)) => Ok(Some(text.clone())),
		Some(Info::Resolve(resolve)) => resolve(completion).await,
	}
}
