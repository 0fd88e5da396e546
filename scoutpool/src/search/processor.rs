use std::sync::Arc;
use tracing::{debug, info, warn};

use super::matcher::PatternMatcher;
use super::task::{MatchResult, SearchTask, TaskOutcome};
use crate::reader::{read_text, ReadOptions};

/// Runs one task to completion: read the file, search it, classify the result.
///
/// The processor never fails. Read problems become
/// [`TaskOutcome::Unreadable`] and are logged here, so a bad file only
/// removes itself from the result set.
#[derive(Debug, Clone)]
pub struct FileProcessor {
    matcher: Arc<PatternMatcher>,
    options: ReadOptions,
}

impl FileProcessor {
    pub fn new(matcher: Arc<PatternMatcher>, options: ReadOptions) -> Self {
        Self { matcher, options }
    }

    pub fn matcher(&self) -> &PatternMatcher {
        &self.matcher
    }

    /// Processes a task whose pattern equals this processor's pattern
    pub fn process(&self, task: &SearchTask) -> TaskOutcome {
        let path = task.path();
        debug!("Starting unit for {}", path.display());

        let text = match read_text(path, &self.options) {
            Ok(text) => text,
            Err(e) => {
                warn!("Error reading file {}: {}", path.display(), e);
                return TaskOutcome::Unreadable {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                };
            }
        };

        match self.matcher.find(&text) {
            Some(index) => {
                info!("Pattern found in file: {}, index: {}", path.display(), index);
                TaskOutcome::Matched(MatchResult {
                    path: path.to_path_buf(),
                    index,
                })
            }
            None => {
                info!("Pattern not found in file: {}", path.display());
                TaskOutcome::Missed {
                    path: path.to_path_buf(),
                }
            }
        }
    }
}
