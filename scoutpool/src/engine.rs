use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ScanConfig;
use crate::errors::SearchResult;
use crate::pool::{
    BoundedWorkerPool, IsolatedSubstrate, LightweightSubstrate, Substrate, SubstrateKind,
};
use crate::reader::ReadOptions;
use crate::results::{collect, Comparison, ScanReport};
use crate::search::{PatternMatcher, SearchTask};
use crate::walk::collect_files;

/// Orchestrates scans for one immutable configuration.
///
/// The pattern is validated and its shift table built once, in
/// [`Scanner::new`]. Each run builds one task per file, drives a fresh
/// [`BoundedWorkerPool`] under the chosen substrate, and collects the matches.
#[derive(Debug, Clone)]
pub struct Scanner {
    config: ScanConfig,
    matcher: Arc<PatternMatcher>,
    options: ReadOptions,
}

impl Scanner {
    /// Fails on an empty pattern or an unknown encoding label
    pub fn new(config: ScanConfig) -> SearchResult<Self> {
        let matcher = Arc::new(PatternMatcher::new(config.pattern.clone())?);
        let options = ReadOptions::new(config.encoding.clone(), config.encoding_mode);
        options.resolve()?;
        Ok(Self {
            config,
            matcher,
            options,
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn pattern(&self) -> &str {
        self.matcher.pattern()
    }

    /// Enumerates the files under the configured root
    pub fn discover(&self) -> SearchResult<Vec<PathBuf>> {
        collect_files(
            &self.config.root_path,
            &self.config.file_extensions,
            &self.config.ignore_patterns,
        )
    }

    /// One task per file
    pub fn tasks(&self, files: &[PathBuf]) -> SearchResult<Vec<SearchTask>> {
        files
            .iter()
            .map(|path| SearchTask::new(path.clone(), self.pattern()))
            .collect()
    }

    pub fn lightweight_substrate(&self) -> LightweightSubstrate {
        LightweightSubstrate::new(Arc::clone(&self.matcher), self.options.clone())
    }

    /// Worker command: the configured program, or this executable.
    ///
    /// The fallback only works when the running program is the `scoutpool`
    /// binary (or otherwise answers the `worker` subcommand); anything else
    /// makes every isolated unit fault.
    pub fn isolated_substrate(&self) -> SearchResult<IsolatedSubstrate> {
        let substrate = match &self.config.worker_program {
            Some(program) => IsolatedSubstrate::new(program.clone(), self.options.clone()),
            None => {
                let substrate = IsolatedSubstrate::current_exe(self.options.clone())?;
                if !is_worker_binary(substrate.program()) {
                    warn!(
                        "No worker_program configured; spawning {} as the worker. \
                         Set worker_program to the scoutpool binary unless this program handles `worker`.",
                        substrate.program().display()
                    );
                }
                substrate
            }
        };
        Ok(substrate
            .arg("--log-level")
            .arg(self.config.log_level.clone()))
    }

    /// Runs `files` under any substrate
    pub fn run_with(
        &self,
        files: &[PathBuf],
        substrate: &dyn Substrate,
    ) -> SearchResult<ScanReport> {
        let tasks = self.tasks(files)?;
        let files_scanned = tasks.len();
        info!(
            "Starting {} scan for {:?} over {} files",
            substrate.name(),
            self.pattern(),
            files_scanned
        );

        let pool = BoundedWorkerPool::new(self.config.capacity);
        let channel = pool.run(tasks, substrate);
        let results = collect(channel, self.pattern());
        let stats = pool.metrics().get_stats();

        info!(
            "Scan complete. Pattern found in {} of {} files ({} unreadable, {} faulted)",
            results.total_matches(),
            files_scanned,
            stats.unreadable,
            stats.faulted
        );

        Ok(ScanReport {
            pattern: self.pattern().to_string(),
            substrate: substrate.name().to_string(),
            files_scanned,
            results,
            stats,
        })
    }

    pub fn run_lightweight(&self, files: &[PathBuf]) -> SearchResult<ScanReport> {
        self.run_with(files, &self.lightweight_substrate())
    }

    /// Runs `files` with one child process per file.
    ///
    /// Without `worker_program` the children are this executable, see
    /// [`Scanner::isolated_substrate`].
    pub fn run_isolated(&self, files: &[PathBuf]) -> SearchResult<ScanReport> {
        self.run_with(files, &self.isolated_substrate()?)
    }

    /// Runs `files` under the configured substrate
    pub fn run(&self, files: &[PathBuf]) -> SearchResult<ScanReport> {
        match self.config.substrate {
            SubstrateKind::Lightweight => self.run_lightweight(files),
            SubstrateKind::Isolated => self.run_isolated(files),
        }
    }

    /// Discovers files under the root, then runs them
    pub fn scan(&self) -> SearchResult<ScanReport> {
        let files = self.discover()?;
        self.run(&files)
    }

    /// Runs the same files under both substrates
    pub fn compare(&self, files: &[PathBuf]) -> SearchResult<Comparison> {
        let lightweight = self.run_lightweight(files)?;
        let isolated = self.run_isolated(files)?;
        let comparison = Comparison {
            lightweight,
            isolated,
        };
        debug!("Substrates agree: {}", comparison.agrees());
        Ok(comparison)
    }
}

/// True when `program` is the scoutpool binary, which serves `worker` requests
fn is_worker_binary(program: &Path) -> bool {
    program.file_stem().is_some_and(|stem| stem == "scoutpool")
}

/// Scans the configured root with the configured substrate
pub fn scan(config: &ScanConfig) -> SearchResult<ScanReport> {
    Scanner::new(config.clone())?.scan()
}
