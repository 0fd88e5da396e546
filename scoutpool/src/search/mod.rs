//! Single-pattern search: the Boyer-Moore-Horspool matcher, the task and
//! outcome types that flow through the worker pool, and the per-file
//! processor every substrate runs.

pub mod matcher;
pub mod processor;
pub mod task;
mod wire;

pub use matcher::{search, PatternMatcher, ShiftTable};
pub use processor::FileProcessor;
pub use task::{MatchResult, SearchTask, TaskOutcome};
