//! Host editing primitives: ranges, selections, transactions and snapshots.

/// Async future aliases.
pub mod future;
/// Text range types measured in characters.
pub mod range;
/// Selection types for single and multi-cursor editing.
pub mod selection;
/// Immutable editor snapshots and state updates.
pub mod state;
/// Change sets and transactions.
pub mod transaction;

pub use future::{BoxFutureStatic, ready};
pub use range::{CharIdx, CharLen, Range};
pub use ropey::{Rope, RopeSlice};
pub use selection::Selection;
pub use state::{EditorState, StateUpdate};
pub use transaction::{Bias, Change, ChangeSet, Payloads, Transaction, UserEvent};
