//! Incremental completion engine.
//!
//! Sources are queried asynchronously for candidate options; their results
//! are kept valid across edits without re-querying where possible, ranked
//! with a fuzzy or strict matcher and shown in a dialog.
//!
//! # Layers
//!
//! - [`ActiveSource`]: per-source state machine, advanced by every applied
//!   transaction.
//! - [`CompletionState`]: all sources plus the open [`CompletionDialog`].
//! - [`Scheduler`]: queries pending sources, debounces, aborts stale
//!   queries and folds answers back in through [`Effect`]s.
//! - [`rank`]: turns results into the ordered option list.
//!
//! [`Session`] shows how a host drives the three together.

mod active;
mod commands;
mod config;
mod context;
mod effect;
mod error;
mod item;
pub mod rank;
pub mod render;
mod scheduler;
mod session;
mod setup;
mod source;
pub mod sources;
mod state;
#[cfg(test)]
mod testing;

pub use active::{ActiveResult, ActiveSource, SourceState, UpdateType};
pub use commands::{
	CompletionCommand, Step, accept_completion, apply_completion, close_completion, commit_completion, default_keymap,
	insert_completion_text, move_completion_selection, picked_completion, start_completion,
};
pub use config::{COMPOSITION_RESTART_DELAY, CompletionConfig, RankingWeights};
pub use context::{CompletionContext, MatchBefore};
pub use effect::{Effect, PickedCompletion};
pub use error::{CompletionError, ConfigError};
pub use item::{
	Apply, ApplyFn, BOOST_RANGE, CommitCharacters, CompareFn, Completion, CompletionResult, CompletionResultBuilder, GetMatchFn,
	Highlights, Info, MapFn, ResolveInfoFn, Section, SectionRank, UpdateFn, ValidFor, ValidForFn,
};
pub use quill_matcher::{MatchMode, Penalties};
pub use scheduler::{Composition, Scheduler};
pub use session::Session;
pub use setup::{ActivateOnCompletionFn, CompletionSetup, default_compare};
pub use source::{CompletionSource, Source, SourceOutput};
pub use state::{CompletionDialog, CompletionState, CompletionStatus};
