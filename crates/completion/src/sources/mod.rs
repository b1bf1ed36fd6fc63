//! Ready-made completion sources.

mod list;
mod words;

pub use list::ListSource;
pub use words::{WordCache, WordSource};
