//! Completion configuration.
//!
//! [`CompletionConfig`] holds the serializable options: activation, timing,
//! matching and ranking. Runtime-only pieces (sources, comparators, render
//! decorations) live in [`CompletionSetup`](crate::CompletionSetup).

use std::time::Duration;

use quill_matcher::{MatchConfig, MatchMode, Penalties};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Delay before completion restarts after an input method composition that
/// both inserted text and moved the cursor.
pub const COMPOSITION_RESTART_DELAY: Duration = Duration::from_millis(20);

/// Serializable completion options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct CompletionConfig {
	/// Start completion on typing, without an explicit request.
	pub activate_on_typing: bool,
	/// Select the first option when the dialog opens.
	pub select_on_open: bool,
	/// Close the dialog when the editor loses focus.
	pub close_on_blur: bool,
	/// Maximum number of options handed to the renderer at once.
	pub max_rendered_options: usize,
	/// Expose the default completion keymap.
	pub default_keymap: bool,
	/// Render the dialog above the cursor.
	pub above_cursor: bool,
	/// Render option type icons.
	pub icons: bool,
	/// Accept and move commands within this window after the dialog opens are ignored.
	pub interaction_delay_ms: u64,
	/// How long to wait for slower sources before showing results from faster ones.
	pub update_sync_time_ms: u64,
	/// Debounce before querying sources activated by typing.
	pub activate_on_typing_delay_ms: u64,
	/// Debounce before querying sources after an explicit start.
	pub explicit_delay_ms: u64,
	/// Use contiguous instead of fuzzy matching.
	pub filter_strict: bool,
	/// Disable case folding in strict matching.
	pub strict_case_sensitive: bool,
	/// Backlog length beyond which old queries are aborted.
	pub max_backlog: usize,
	/// A query must be at least this old to be aborted for backlog length.
	pub min_abort_age_ms: u64,
	/// Matcher score penalties.
	pub penalties: Penalties,
	/// Ranking weights.
	pub ranking: RankingWeights,
}

impl Default for CompletionConfig {
	fn default() -> Self {
		Self {
			activate_on_typing: true,
			select_on_open: true,
			close_on_blur: true,
			max_rendered_options: 100,
			default_keymap: true,
			above_cursor: false,
			icons: true,
			interaction_delay_ms: 75,
			update_sync_time_ms: 100,
			activate_on_typing_delay_ms: 100,
			explicit_delay_ms: 50,
			filter_strict: false,
			strict_case_sensitive: false,
			max_backlog: 50,
			min_abort_age_ms: 1000,
			penalties: Penalties::default(),
			ranking: RankingWeights::default(),
		}
	}
}

impl CompletionConfig {
	/// Parses and validates configuration from TOML.
	pub fn from_toml(input: &str) -> Result<Self> {
		let config: Self = toml::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	/// Checks option values that serde cannot express.
	pub fn validate(&self) -> Result<()> {
		if self.max_rendered_options == 0 {
			return Err(ConfigError::InvalidValue {
				option: "max-rendered-options",
				reason: "must be at least 1".into(),
			});
		}
		if self.ranking.section_step <= 0 {
			return Err(ConfigError::InvalidValue {
				option: "ranking.section-step",
				reason: format!("must be positive, got {}", self.ranking.section_step),
			});
		}
		let p = &self.penalties;
		for (option, value) in [
			("penalties.gap", p.gap),
			("penalties.not-start", p.not_start),
			("penalties.case-fold", p.case_fold),
			("penalties.by-word", p.by_word),
			("penalties.not-full", p.not_full),
		] {
			if value > 0 {
				return Err(ConfigError::InvalidValue {
					option,
					reason: format!("penalties must not be positive, got {value}"),
				});
			}
		}
		Ok(())
	}

	/// Matcher configuration derived from the filter options.
	pub fn match_config(&self) -> MatchConfig {
		MatchConfig {
			mode: if self.filter_strict { MatchMode::Strict } else { MatchMode::Fuzzy },
			case_sensitive: self.strict_case_sensitive,
			penalties: self.penalties,
		}
	}

	pub fn interaction_delay(&self) -> Duration {
		Duration::from_millis(self.interaction_delay_ms)
	}

	pub fn update_sync_time(&self) -> Duration {
		Duration::from_millis(self.update_sync_time_ms)
	}

	pub fn activate_on_typing_delay(&self) -> Duration {
		Duration::from_millis(self.activate_on_typing_delay_ms)
	}

	pub fn explicit_delay(&self) -> Duration {
		Duration::from_millis(self.explicit_delay_ms)
	}

	pub fn min_abort_age(&self) -> Duration {
		Duration::from_millis(self.min_abort_age_ms)
	}
}

/// Weights combining match quality, boost and section placement into one score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RankingWeights {
	/// Score given to the first option of an unfiltered result; later options
	/// count down from here.
	pub unfiltered_base: i64,
	/// Minimum score offset separating consecutive sections; widened when
	/// scores spread further.
	pub section_step: i64,
	/// Multiplier applied to an option's boost before it is added to its score.
	pub boost_scale: i64,
}

impl Default for RankingWeights {
	fn default() -> Self {
		Self {
			unfiltered_base: 1_000_000_000,
			section_step: 100_000,
			boost_scale: 1,
		}
	}
}
