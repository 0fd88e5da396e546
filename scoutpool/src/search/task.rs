use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{SearchError, SearchResult};

/// One unit of work: find `pattern` in the file at `path`.
///
/// Tasks are immutable once built and consumed by exactly one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchTask {
    #[serde(with = "super::wire")]
    path: PathBuf,
    pattern: String,
}

impl SearchTask {
    pub fn new(path: impl Into<PathBuf>, pattern: impl Into<String>) -> SearchResult<Self> {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return Err(SearchError::invalid_pattern("pattern must not be empty"));
        }
        Ok(Self {
            path: path.into(),
            pattern,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

/// A successful match: the file and the character index of the first occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    #[serde(with = "super::wire")]
    pub path: PathBuf,
    pub index: usize,
}

/// What a unit reports once its task is done
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TaskOutcome {
    Matched(MatchResult),
    Missed {
        #[serde(with = "super::wire")]
        path: PathBuf,
    },
    Unreadable {
        #[serde(with = "super::wire")]
        path: PathBuf,
        reason: String,
    },
}

impl TaskOutcome {
    pub fn path(&self) -> &Path {
        match self {
            TaskOutcome::Matched(m) => &m.path,
            TaskOutcome::Missed { path } | TaskOutcome::Unreadable { path, .. } => path,
        }
    }

    pub fn into_match(self) -> Option<MatchResult> {
        match self {
            TaskOutcome::Matched(m) => Some(m),
            _ => None,
        }
    }
}
