//! Snapshot file formats and the reader factory.

mod ascii;
mod json;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use coef_core::errors::{CoefError, ErrorInfo};
use coef_core::{SnapshotGroup, SnapshotReader, SnapshotSource};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::memory::MemorySnapshot;

pub use ascii::read_ascii;
pub use json::{read_json, JsonComponent, JsonSnapshot};

/// Supported on-disk snapshot formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReaderKind {
    /// Whitespace separated text stanzas.
    #[default]
    Ascii,
    /// JSON documents.
    Json,
}

impl ReaderKind {
    /// Stable name of the format.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReaderKind::Ascii => "ascii",
            ReaderKind::Json => "json",
        }
    }

    fn read_file(&self, path: &Path) -> Result<MemorySnapshot, CoefError> {
        match self {
            ReaderKind::Ascii => read_ascii(path),
            ReaderKind::Json => read_json(path),
        }
    }
}

impl fmt::Display for ReaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReaderKind {
    type Err = CoefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ascii" => Ok(ReaderKind::Ascii),
            "json" => Ok(ReaderKind::Json),
            other => Err(CoefError::Config(
                ErrorInfo::new("reader-kind", "unknown snapshot format")
                    .with_context("format", other)
                    .with_hint("expected one of: ascii, json"),
            )),
        }
    }
}

/// Loads every file of `group` with the given format and merges them into
/// one snapshot.
pub fn load_group(kind: ReaderKind, group: &SnapshotGroup) -> Result<MemorySnapshot, CoefError> {
    let mut files = group.files.iter();
    let first = files.next().ok_or_else(|| {
        CoefError::GroupLoad(
            ErrorInfo::new("group-empty", "snapshot group lists no files")
                .with_context("group", group.label()),
        )
    })?;
    let mut snapshot = kind.read_file(first)?;
    for path in files {
        snapshot.merge(kind.read_file(path)?)?;
    }
    debug!(group = %group, format = %kind, "loaded snapshot group");
    Ok(snapshot)
}

impl SnapshotSource for ReaderKind {
    fn open(&self, group: &SnapshotGroup) -> Result<Box<dyn SnapshotReader>, CoefError> {
        Ok(Box::new(load_group(*self, group)?))
    }
}
