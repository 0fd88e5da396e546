//! Result aggregation.
//!
//! [`collect`] turns the drained result channel into a [`ResultSet`]: a map
//! from the run's pattern to the files that contained it. Membership is
//! deterministic for a given file set; the order of paths is whatever order
//! the units finished in and varies between runs. Compare results with
//! [`ResultSet::same_membership`] or [`ResultSet::matched_paths`], not `==`.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::metrics::PoolStats;
use crate::pool::ResultChannel;

/// Pattern to matching paths, in arrival order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet {
    #[serde(serialize_with = "serialize_lossy")]
    matches: BTreeMap<String, Vec<PathBuf>>,
}

/// Reports show paths as text; names that are not UTF-8 are rendered lossily
fn serialize_lossy<S>(
    matches: &BTreeMap<String, Vec<PathBuf>>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(matches.iter().map(|(pattern, paths)| {
        let rendered: Vec<_> = paths.iter().map(|p| p.to_string_lossy()).collect();
        (pattern, rendered)
    }))
}

impl ResultSet {
    pub fn new() -> Self {
        Default::default()
    }

    /// Appends a path under `pattern`
    pub fn add(&mut self, pattern: &str, path: PathBuf) {
        self.matches
            .entry(pattern.to_string())
            .or_default()
            .push(path);
    }

    /// Paths for `pattern` in arrival order; empty if nothing matched
    pub fn paths(&self, pattern: &str) -> &[PathBuf] {
        self.matches.get(pattern).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Paths for `pattern` as an order-free set
    pub fn matched_paths(&self, pattern: &str) -> BTreeSet<PathBuf> {
        self.paths(pattern).iter().cloned().collect()
    }

    pub fn contains(&self, pattern: &str, path: &Path) -> bool {
        self.paths(pattern).iter().any(|p| p == path)
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.matches.keys().map(String::as_str)
    }

    /// Total number of matching paths across patterns
    pub fn total_matches(&self) -> usize {
        self.matches.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// True when both sets hold the same paths per pattern, ignoring order
    pub fn same_membership(&self, other: &ResultSet) -> bool {
        self.matches.len() == other.matches.len()
            && self
                .matches
                .keys()
                .all(|pattern| self.matched_paths(pattern) == other.matched_paths(pattern))
    }
}

/// Drains `channel` and groups every match under `pattern`.
///
/// Must only be called once the producing pool has returned; it blocks until
/// the channel is closed.
pub fn collect(channel: ResultChannel, pattern: &str) -> ResultSet {
    let mut set = ResultSet::new();
    for result in channel {
        set.add(pattern, result.path);
    }
    debug!(
        "Collected {} matching paths for {:?}",
        set.total_matches(),
        pattern
    );
    set
}

/// Everything one orchestrated run produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub pattern: String,
    pub substrate: String,
    pub files_scanned: usize,
    pub results: ResultSet,
    pub stats: PoolStats,
}

/// The same file set run under both substrates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub lightweight: ScanReport,
    pub isolated: ScanReport,
}

impl Comparison {
    /// True when both substrates found the same files
    pub fn agrees(&self) -> bool {
        self.lightweight
            .results
            .same_membership(&self.isolated.results)
    }
}
