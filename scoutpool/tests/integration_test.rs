use anyhow::Result;
use scoutpool::pool::{PermitPool, PermitSource};
use scoutpool::search::search;
use scoutpool::{
    collect, BoundedWorkerPool, EncodingMode, ScanConfig, Scanner, SearchError, SearchResult,
    SearchTask, Substrate, TaskOutcome,
};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;
use tempfile::{tempdir, TempDir};

fn create_test_files(dir: &TempDir, files: &[(&str, &str)]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::with_capacity(files.len());
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        paths.push(path);
    }
    Ok(paths)
}

fn file_names(paths: &[PathBuf]) -> Vec<String> {
    let mut names: Vec<String> = paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_example_scenario() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(
        &dir,
        &[("a.txt", "the algorithm list"), ("b.txt", "nothing here")],
    )?;

    let report = scoutpool::scan(&ScanConfig::new("algorithm", dir.path()))?;
    assert_eq!(
        file_names(report.results.paths("algorithm")),
        vec!["a.txt".to_string()]
    );
    assert_eq!(search("the algorithm list", "algorithm")?, Some(4));
    Ok(())
}

#[test]
fn test_extension_and_ignore_filters() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(
        &dir,
        &[
            ("keep/a.txt", "needle"),
            ("keep/b.md", "needle"),
            ("drafts/c.txt", "needle"),
            ("d.txt", "haystack"),
        ],
    )?;

    let config = ScanConfig {
        ignore_patterns: vec!["drafts/**".to_string()],
        ..ScanConfig::new("needle", dir.path())
    };
    let report = Scanner::new(config)?.scan()?;

    assert_eq!(report.files_scanned, 2);
    assert_eq!(
        file_names(report.results.paths("needle")),
        vec!["a.txt".to_string()]
    );
    Ok(())
}

#[test]
fn test_all_extensions() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &[("a.txt", "needle"), ("b.md", "needle")])?;

    let config = ScanConfig {
        file_extensions: None,
        ..ScanConfig::new("needle", dir.path())
    };
    let report = Scanner::new(config)?.scan()?;
    assert_eq!(report.results.paths("needle").len(), 2);
    Ok(())
}

#[test]
fn test_windows_1251_corpus() -> Result<()> {
    let dir = tempdir()?;
    let (bytes, _, unmappable) = encoding_rs::WINDOWS_1251.encode("Огляд алгоритмів сортування");
    assert!(!unmappable);
    fs::write(dir.path().join("cp.txt"), &bytes)?;

    let config = ScanConfig {
        encoding: "windows-1251".to_string(),
        ..ScanConfig::new("алгоритмів", dir.path())
    };
    let report = Scanner::new(config)?.scan()?;
    assert_eq!(report.results.paths("алгоритмів").len(), 1);

    // Read as UTF-8 the file is undecodable and silently drops out
    let report = Scanner::new(ScanConfig::new("алгоритмів", dir.path()))?.scan()?;
    assert!(report.results.is_empty());
    assert_eq!(report.stats.unreadable, 1);

    // Lossy UTF-8 keeps it but cannot match the Cyrillic text
    let config = ScanConfig {
        encoding_mode: EncodingMode::Lossy,
        ..ScanConfig::new("алгоритмів", dir.path())
    };
    let report = Scanner::new(config)?.scan()?;
    assert!(report.results.is_empty());
    assert_eq!(report.stats.missed, 1);
    Ok(())
}

#[test]
fn test_pattern_at_boundaries_of_files() -> Result<()> {
    let dir = tempdir()?;
    let files = create_test_files(
        &dir,
        &[
            ("exact.txt", "needle"),
            ("start.txt", "needle in a haystack"),
            ("end.txt", "a haystack with a needle"),
            ("short.txt", "need"),
            ("empty.txt", ""),
        ],
    )?;

    let scanner = Scanner::new(ScanConfig::new("needle", dir.path()))?;
    let report = scanner.run_lightweight(&files)?;
    assert_eq!(
        file_names(report.results.paths("needle")),
        vec![
            "end.txt".to_string(),
            "exact.txt".to_string(),
            "start.txt".to_string()
        ]
    );
    assert_eq!(report.stats.missed, 2);
    Ok(())
}

#[test]
fn test_empty_pattern_rejected_everywhere() {
    assert!(matches!(
        Scanner::new(ScanConfig::new("", ".")),
        Err(SearchError::InvalidPattern(_))
    ));
    assert!(matches!(
        SearchTask::new("a.txt", ""),
        Err(SearchError::InvalidPattern(_))
    ));
    assert!(search("abc", "").is_err());
}

/// Substrate that tracks how many units are inside `execute` at once
struct CountingSubstrate {
    inside: AtomicUsize,
    peak: AtomicUsize,
}

impl Substrate for CountingSubstrate {
    fn name(&self) -> &str {
        "counting"
    }

    fn execute(&self, task: &SearchTask) -> SearchResult<TaskOutcome> {
        let now = self.inside.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(5));
        self.inside.fetch_sub(1, Ordering::SeqCst);
        Ok(TaskOutcome::Missed {
            path: task.path().to_path_buf(),
        })
    }
}

#[test]
fn test_bounded_concurrency_for_many_capacities() -> Result<()> {
    let files: Vec<PathBuf> = (0..32).map(|i| PathBuf::from(format!("{i}.txt"))).collect();

    for capacity in [1, 2, 3, 5, 8] {
        let substrate = CountingSubstrate {
            inside: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        };
        let config = ScanConfig {
            capacity: NonZeroUsize::new(capacity).unwrap(),
            ..ScanConfig::new("x", ".")
        };
        let report = Scanner::new(config)?.run_with(&files, &substrate)?;

        assert!(substrate.peak.load(Ordering::SeqCst) <= capacity);
        assert!(report.stats.peak_permits as usize <= capacity);
        assert_eq!(report.stats.missed, 32);
        assert!(report.results.is_empty());
    }
    Ok(())
}

/// Permit source that records every grant, to check the pool pairs acquire with release
struct AuditedPermits {
    inner: PermitPool,
    granted: AtomicUsize,
    released: AtomicUsize,
}

impl PermitSource for AuditedPermits {
    fn acquire(&self) -> usize {
        self.granted.fetch_add(1, Ordering::SeqCst);
        self.inner.acquire()
    }

    fn release(&self) {
        self.released.fetch_add(1, Ordering::SeqCst);
        self.inner.release();
    }

    fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    fn in_use(&self) -> usize {
        self.inner.in_use()
    }
}

#[test]
fn test_every_permit_is_released() -> Result<()> {
    let dir = tempdir()?;
    let mut files = create_test_files(&dir, &[("a.txt", "needle"), ("b.txt", "hay")])?;
    files.push(dir.path().join("missing.txt"));

    let permits = std::sync::Arc::new(AuditedPermits {
        inner: PermitPool::new(NonZeroUsize::new(2).unwrap()),
        granted: AtomicUsize::new(0),
        released: AtomicUsize::new(0),
    });
    let pool = BoundedWorkerPool::with_permits(SharedPermits(permits.clone()));
    let scanner = Scanner::new(ScanConfig::new("needle", dir.path()))?;

    let channel = pool.run(scanner.tasks(&files)?, &scanner.lightweight_substrate());
    let results = collect(channel, "needle");

    assert_eq!(results.paths("needle").len(), 1);
    assert!(results.contains("needle", Path::new(&files[0])));
    assert_eq!(permits.granted.load(Ordering::SeqCst), 3);
    assert_eq!(permits.released.load(Ordering::SeqCst), 3);
    assert_eq!(permits.in_use(), 0);
    Ok(())
}

struct SharedPermits(std::sync::Arc<AuditedPermits>);

impl PermitSource for SharedPermits {
    fn acquire(&self) -> usize {
        self.0.acquire()
    }

    fn release(&self) {
        self.0.release()
    }

    fn capacity(&self) -> usize {
        self.0.capacity()
    }

    fn in_use(&self) -> usize {
        self.0.in_use()
    }
}
