use config::{Config as ConfigBuilder, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::errors::SearchResult;
use crate::pool::SubstrateKind;

/// How to handle bytes that are not valid in the configured encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingMode {
    /// Treat malformed input as a read failure
    #[default]
    FailFast,
    /// Replace malformed sequences and keep going
    Lossy,
}

/// Immutable configuration for one scan.
///
/// # Configuration Locations
///
/// Loaded from, in increasing order of precedence:
/// 1. Global `$CONFIG_DIR/scoutpool/config.yaml`
/// 2. Local `.scoutpool.yaml` in the current directory
/// 3. A file passed via `--config`
///
/// CLI flags win over every file (see [`ScanConfig::merge_with_cli`]).
///
/// # Configuration Format
///
/// ```yaml
/// pattern: "алгоритмів"
/// root_path: "data"
/// file_extensions: ["txt"]
/// ignore_patterns: ["**/drafts/**"]
/// capacity: 3
/// substrate: "isolated"
/// encoding: "windows-1251"
/// encoding_mode: "lossy"
/// log_level: "info"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// The fixed pattern to search for
    #[serde(default)]
    pub pattern: String,

    /// Root directory to enumerate files from
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,

    /// Extensions to include, with or without the leading dot.
    /// `None` includes every file.
    #[serde(default = "default_file_extensions")]
    pub file_extensions: Option<Vec<String>>,

    /// Glob patterns for paths to skip
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Maximum number of units searching at once
    #[serde(default = "default_capacity")]
    pub capacity: NonZeroUsize,

    /// Which execution substrate `run` and `scan` use
    #[serde(default)]
    pub substrate: SubstrateKind,

    /// `encoding_rs` label used to decode files
    #[serde(default = "default_encoding")]
    pub encoding: String,

    #[serde(default)]
    pub encoding_mode: EncodingMode,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Executable spawned for isolated units. Defaults to the current executable.
    #[serde(default)]
    pub worker_program: Option<PathBuf>,
}

fn default_root_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_file_extensions() -> Option<Vec<String>> {
    Some(vec!["txt".to_string()])
}

pub(crate) fn default_capacity() -> NonZeroUsize {
    NonZeroUsize::MIN.saturating_add(2)
}

fn default_encoding() -> String {
    "utf-8".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            pattern: String::new(),
            root_path: default_root_path(),
            file_extensions: default_file_extensions(),
            ignore_patterns: Vec::new(),
            capacity: default_capacity(),
            substrate: SubstrateKind::default(),
            encoding: default_encoding(),
            encoding_mode: EncodingMode::default(),
            log_level: default_log_level(),
            worker_program: None,
        }
    }
}

impl ScanConfig {
    /// Config with the given pattern and root, defaults elsewhere
    pub fn new(pattern: impl Into<String>, root_path: impl Into<PathBuf>) -> Self {
        Self {
            pattern: pattern.into(),
            root_path: root_path.into(),
            ..Self::default()
        }
    }

    /// Loads configuration, layering an optional explicit file on top of the defaults
    pub fn load_from(config_path: Option<&Path>) -> SearchResult<Self> {
        let mut builder = ConfigBuilder::builder();

        let config_files = [
            dirs::config_dir().map(|p| p.join("scoutpool/config.yaml")),
            Some(PathBuf::from(".scoutpool.yaml")),
        ];

        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // An explicit file must exist
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Merges CLI arguments with configuration file values
    pub fn merge_with_cli(mut self, cli: CliOverrides) -> Self {
        if let Some(pattern) = cli.pattern {
            self.pattern = pattern;
        }
        if let Some(root) = cli.root_path {
            self.root_path = root;
        }
        if cli.file_extensions.is_some() {
            self.file_extensions = cli.file_extensions;
        }
        if !cli.ignore_patterns.is_empty() {
            self.ignore_patterns = cli.ignore_patterns;
        }
        if let Some(capacity) = cli.capacity {
            self.capacity = capacity;
        }
        if let Some(substrate) = cli.substrate {
            self.substrate = substrate;
        }
        if let Some(encoding) = cli.encoding {
            self.encoding = encoding;
        }
        if let Some(mode) = cli.encoding_mode {
            self.encoding_mode = mode;
        }
        if let Some(level) = cli.log_level {
            self.log_level = level;
        }
        self
    }
}

/// Values supplied on the command line; `None` keeps the file value
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub pattern: Option<String>,
    pub root_path: Option<PathBuf>,
    pub file_extensions: Option<Vec<String>>,
    pub ignore_patterns: Vec<String>,
    pub capacity: Option<NonZeroUsize>,
    pub substrate: Option<SubstrateKind>,
    pub encoding: Option<String>,
    pub encoding_mode: Option<EncodingMode>,
    pub log_level: Option<String>,
}
