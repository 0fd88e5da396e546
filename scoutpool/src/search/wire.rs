//! Path encoding for everything that crosses the worker pipe.
//!
//! Paths that are valid UTF-8 travel as plain JSON strings. Anything else
//! travels as the raw OS units (bytes on Unix, UTF-16 units on Windows), so a
//! worker sees exactly the path the parent enumerated.

use serde::de::{Error as DeError, SeqAccess, Visitor};
use serde::{Deserializer, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};

pub fn serialize<S>(path: &Path, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if let Some(text) = path.to_str() {
        return serializer.serialize_str(text);
    }
    serialize_raw(path, serializer)
}

#[cfg(unix)]
fn serialize_raw<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
    use std::os::unix::ffi::OsStrExt;
    serializer.collect_seq(path.as_os_str().as_bytes())
}

#[cfg(windows)]
fn serialize_raw<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
    use std::os::windows::ffi::OsStrExt;
    serializer.collect_seq(path.as_os_str().encode_wide())
}

#[cfg(not(any(unix, windows)))]
fn serialize_raw<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&path.to_string_lossy())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
where
    D: Deserializer<'de>,
{
    struct PathVisitor;

    impl<'de> Visitor<'de> for PathVisitor {
        type Value = PathBuf;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a path string or a sequence of raw path units")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: DeError,
        {
            Ok(PathBuf::from(value))
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: DeError,
        {
            Ok(PathBuf::from(value))
        }

        #[cfg(unix)]
        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            use std::ffi::OsString;
            use std::os::unix::ffi::OsStringExt;

            let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
            while let Some(byte) = seq.next_element::<u8>()? {
                bytes.push(byte);
            }
            Ok(PathBuf::from(OsString::from_vec(bytes)))
        }

        #[cfg(windows)]
        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            use std::ffi::OsString;
            use std::os::windows::ffi::OsStringExt;

            let mut units = Vec::with_capacity(seq.size_hint().unwrap_or(0));
            while let Some(unit) = seq.next_element::<u16>()? {
                units.push(unit);
            }
            Ok(PathBuf::from(OsString::from_wide(&units)))
        }

        #[cfg(not(any(unix, windows)))]
        fn visit_seq<A>(self, _seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            Err(A::Error::custom("raw path units are not supported on this platform"))
        }
    }

    deserializer.deserialize_any(PathVisitor)
}
