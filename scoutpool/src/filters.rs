//! Path filters applied during file enumeration.
//!
//! Extension checks are case-insensitive and tolerate a leading dot in the
//! configured value, so `"txt"` and `".txt"` are equivalent. Ignore patterns
//! use `glob` syntax and are matched against the path relative to the scan
//! root, with `/` as separator on every platform.

use glob::Pattern;
use std::path::Path;
use tracing::warn;

/// Checks if a file has one of the wanted extensions. `None` accepts everything.
pub fn has_valid_extension(path: &Path, extensions: &Option<Vec<String>>) -> bool {
    match extensions {
        None => true,
        Some(exts) => {
            if let Some(ext) = path.extension() {
                if let Some(ext_str) = ext.to_str() {
                    return exts
                        .iter()
                        .map(|e| e.trim().trim_start_matches('.'))
                        .any(|e| e.eq_ignore_ascii_case(ext_str));
                }
            }
            false
        }
    }
}

/// Compiles ignore globs, dropping (and logging) invalid ones
pub fn compile_ignore_patterns(ignore_patterns: &[String]) -> Vec<Pattern> {
    ignore_patterns
        .iter()
        .filter_map(|pattern| match Pattern::new(pattern) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!("Skipping invalid ignore pattern {:?}: {}", pattern, e);
                None
            }
        })
        .collect()
}

/// Checks if a path matches any compiled ignore pattern
pub fn should_ignore(path: &Path, ignore_patterns: &[Pattern]) -> bool {
    if ignore_patterns.is_empty() {
        return false;
    }
    let normalized_path = path.to_string_lossy().replace('\\', "/");
    ignore_patterns.iter().any(|p| p.matches(&normalized_path))
}

/// Determines if a file should be included in the scan
pub fn should_include_file(
    path: &Path,
    extensions: &Option<Vec<String>>,
    ignore_patterns: &[Pattern],
) -> bool {
    has_valid_extension(path, extensions) && !should_ignore(path, ignore_patterns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn globs(patterns: &[&str]) -> Vec<Pattern> {
        let owned: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
        compile_ignore_patterns(&owned)
    }

    #[test]
    fn test_has_valid_extension() {
        let extensions = Some(vec!["txt".to_string()]);
        assert!(has_valid_extension(Path::new("a.txt"), &extensions));
        assert!(has_valid_extension(Path::new("a.TXT"), &extensions));
        assert!(!has_valid_extension(Path::new("a.md"), &extensions));
        assert!(!has_valid_extension(Path::new("txt"), &extensions));
        assert!(has_valid_extension(Path::new("a.md"), &None));
    }

    #[test]
    fn test_leading_dot_extension() {
        let extensions = Some(vec![".txt".to_string(), " md ".to_string()]);
        assert!(has_valid_extension(Path::new("notes/a.txt"), &extensions));
        assert!(has_valid_extension(Path::new("b.md"), &extensions));
        assert!(!has_valid_extension(Path::new("c.rs"), &extensions));
    }

    #[test]
    fn test_should_ignore() {
        let ignore_patterns = globs(&["**/test_[0-4].txt", "drafts/**", "**/*.tmp.txt"]);

        assert!(should_ignore(Path::new("test_0.txt"), &ignore_patterns));
        assert!(should_ignore(Path::new("dir/test_2.txt"), &ignore_patterns));
        assert!(should_ignore(Path::new("drafts/x/y.txt"), &ignore_patterns));
        assert!(should_ignore(Path::new("src/a.tmp.txt"), &ignore_patterns));

        assert!(!should_ignore(Path::new("test_5.txt"), &ignore_patterns));
        assert!(!should_ignore(Path::new("final/y.txt"), &ignore_patterns));
        assert!(!should_ignore(Path::new("anything"), &[]));
    }

    #[test]
    fn test_invalid_patterns_are_dropped() {
        let compiled = globs(&["[", "*.txt"]);
        assert_eq!(compiled.len(), 1);
    }

    #[test]
    fn test_should_include_file() {
        let extensions = Some(vec!["txt".to_string()]);
        let ignore_patterns = globs(&["drafts/**"]);

        assert!(should_include_file(
            Path::new("data/a.txt"),
            &extensions,
            &ignore_patterns
        ));
        assert!(!should_include_file(
            Path::new("data/a.rs"),
            &extensions,
            &ignore_patterns
        ));
        assert!(!should_include_file(
            Path::new("drafts/a.txt"),
            &extensions,
            &ignore_patterns
        ));
    }
}
