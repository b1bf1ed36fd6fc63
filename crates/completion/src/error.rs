//! Error types for result construction and configuration.

use thiserror::Error;

/// Errors raised when a completion result is assembled incorrectly.
///
/// These are programmer errors in a source implementation; they are reported
/// when the result is built, never while the engine is running.
#[derive(Debug, Error)]
pub enum CompletionError {
	/// `valid_for` only makes sense for filtered results.
	#[error("a result with filtering disabled cannot have a valid_for rule")]
	ValidForWithoutFilter,

	/// The replacement span is inverted.
	#[error("result span is inverted: from {from} is after to {to}")]
	InvertedSpan {
		/// Start of the span.
		from: usize,
		/// End of the span.
		to: usize,
	},

	/// A `valid_for` or `match_before` pattern failed to compile.
	#[error("invalid pattern: {0}")]
	Pattern(#[from] regex::Error),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing TOML.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// An option has a value outside its accepted range.
	#[error("invalid value for '{option}': {reason}")]
	InvalidValue {
		/// The option's key.
		option: &'static str,
		/// Why the value was rejected.
		reason: String,
	},
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
