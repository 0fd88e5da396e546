use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::errors::{unify_path, SearchError, SearchResult};
use crate::filters::{compile_ignore_patterns, should_include_file};

/// Collects every regular file under `root` that passes the extension and
/// ignore filters.
///
/// Returned paths are absolute and sorted. Hidden files and files listed in
/// `.gitignore` are *not* skipped: the caller asked for a tree, so the whole
/// tree is enumerated.
pub fn collect_files(
    root: &Path,
    extensions: &Option<Vec<String>>,
    ignore_patterns: &[String],
) -> SearchResult<Vec<PathBuf>> {
    if !root.exists() {
        return Err(SearchError::file_not_found(root));
    }
    let root = unify_path(root);
    let ignore_patterns = compile_ignore_patterns(ignore_patterns);

    let mut walker = WalkBuilder::new(&root);
    walker.standard_filters(false).follow_links(false);

    let mut files: Vec<PathBuf> = walker
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .filter(|entry| {
            let relative = entry.path().strip_prefix(&root).unwrap_or(entry.path());
            should_include_file(relative, extensions, &ignore_patterns)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    debug!("Found {} files to scan under {}", files.len(), root.display());
    Ok(files)
}
