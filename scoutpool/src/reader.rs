use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{trace, warn};

use crate::config::EncodingMode;
use crate::errors::{SearchError, SearchResult};

/// How file bytes are turned into text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadOptions {
    /// Any label `encoding_rs` understands ("utf-8", "windows-1251", "koi8-r", ...)
    pub encoding: String,
    pub mode: EncodingMode,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            encoding: "utf-8".to_string(),
            mode: EncodingMode::FailFast,
        }
    }
}

impl ReadOptions {
    pub fn new(encoding: impl Into<String>, mode: EncodingMode) -> Self {
        Self {
            encoding: encoding.into(),
            mode,
        }
    }

    /// Resolves the label, failing early on unknown encodings
    pub fn resolve(&self) -> SearchResult<&'static Encoding> {
        Encoding::for_label(self.encoding.trim().as_bytes())
            .ok_or_else(|| SearchError::unknown_encoding(&self.encoding))
    }
}

/// Decodes bytes according to the encoding and mode. A BOM overrides the label.
fn decode_bytes(bytes: &[u8], path: &Path, options: &ReadOptions) -> SearchResult<String> {
    let encoding = options.resolve()?;
    let (encoding, bom_len) = Encoding::for_bom(bytes).unwrap_or((encoding, 0));
    let body = &bytes[bom_len..];

    match options.mode {
        EncodingMode::FailFast => encoding
            .decode_without_bom_handling_and_without_replacement(body)
            .map(|text| text.into_owned())
            .ok_or_else(|| SearchError::encoding_error(path, encoding.name())),
        EncodingMode::Lossy => {
            let (text, had_errors) = encoding.decode_without_bom_handling(body);
            if had_errors {
                warn!(
                    "Malformed {} replaced in file: {}",
                    encoding.name(),
                    path.display()
                );
            }
            Ok(text.into_owned())
        }
    }
}

/// Reads a whole file and decodes it to text
pub fn read_text(path: &Path, options: &ReadOptions) -> SearchResult<String> {
    trace!("Reading {} as {}", path.display(), options.encoding);
    let bytes = std::fs::read(path).map_err(|e| SearchError::from_io(path, e))?;
    decode_bytes(&bytes, path, options)
}
