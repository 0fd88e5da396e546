use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::errors::{SearchError, SearchResult};
use crate::reader::ReadOptions;
use crate::search::{FileProcessor, PatternMatcher, SearchTask, TaskOutcome};

/// Which substrate runs the units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubstrateKind {
    /// Threads sharing memory with the pool
    #[default]
    Lightweight,
    /// Child processes that exchange serialized tasks and outcomes
    Isolated,
}

impl SubstrateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubstrateKind::Lightweight => "lightweight",
            SubstrateKind::Isolated => "isolated",
        }
    }
}

impl fmt::Display for SubstrateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubstrateKind {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lightweight" | "thread" | "threads" => Ok(SubstrateKind::Lightweight),
            "isolated" | "process" | "processes" => Ok(SubstrateKind::Isolated),
            other => Err(SearchError::config_error(format!(
                "unknown substrate {other:?} (expected lightweight or isolated)"
            ))),
        }
    }
}

/// How a unit actually carries out its task.
///
/// The pool owns permits, dispatch and result delivery; a substrate only
/// turns a task into an outcome. `Err` means the unit itself failed, not
/// that the file was unreadable.
pub trait Substrate: Send + Sync {
    fn name(&self) -> &str;
    fn execute(&self, task: &SearchTask) -> SearchResult<TaskOutcome>;
}

/// Runs tasks on the unit's own thread with a shared, read-only matcher
#[derive(Debug, Clone)]
pub struct LightweightSubstrate {
    processor: FileProcessor,
}

impl LightweightSubstrate {
    pub fn new(matcher: Arc<PatternMatcher>, options: ReadOptions) -> Self {
        Self {
            processor: FileProcessor::new(matcher, options),
        }
    }
}

impl Substrate for LightweightSubstrate {
    fn name(&self) -> &str {
        SubstrateKind::Lightweight.as_str()
    }

    fn execute(&self, task: &SearchTask) -> SearchResult<TaskOutcome> {
        let expected = self.processor.matcher().pattern();
        if task.pattern() != expected {
            return Err(SearchError::invalid_pattern(format!(
                "substrate was built for {:?} but task asks for {:?}",
                expected,
                task.pattern()
            )));
        }
        Ok(self.processor.process(task))
    }
}
