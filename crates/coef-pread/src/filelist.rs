//! Batch manifest parsing.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use coef_core::errors::{CoefError, ErrorInfo};
use coef_core::SnapshotGroup;
use tracing::debug;

const TIME_PREFIX: &str = "time=";

/// Ordered list of snapshot groups read from a manifest.
///
/// Iteration is restartable: [`BatchFileList::iter`] may be called any
/// number of times and always yields the groups in manifest order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchFileList {
    source: Option<PathBuf>,
    groups: Vec<SnapshotGroup>,
}

impl BatchFileList {
    /// Reads and parses the manifest at `path`.
    ///
    /// With a `delimiter`, consecutive lines whose first file shares the
    /// same stem (the file name up to the last delimiter) are merged into a
    /// single group.
    pub fn parse(path: &Path, delimiter: Option<&str>) -> Result<Self, CoefError> {
        if !path.exists() {
            return Err(CoefError::ManifestNotFound(
                ErrorInfo::new("manifest-missing", "batch manifest does not exist")
                    .with_context("path", path.display().to_string()),
            ));
        }
        let contents = read_manifest(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let mut list = Self::parse_str(&contents, base, delimiter)?;
        list.source = Some(path.to_path_buf());
        debug!(
            manifest = %path.display(),
            groups = list.len(),
            "parsed batch manifest"
        );
        Ok(list)
    }

    /// Parses manifest text, resolving relative paths against `base`.
    pub fn parse_str(
        contents: &str,
        base: &Path,
        delimiter: Option<&str>,
    ) -> Result<Self, CoefError> {
        let mut groups: Vec<SnapshotGroup> = Vec::new();
        let mut last_stem: Option<String> = None;
        for (line_idx, raw) in contents.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let entry = parse_line(line, line_idx + 1, base)?;
            let stem = delimiter.and_then(|delim| file_stem(&entry.files[0], delim));

            let merge = stem.is_some() && stem == last_stem && !groups.is_empty();
            if merge {
                if let Some(group) = groups.last_mut() {
                    if let (Some(existing), Some(hint)) = (group.time_hint, entry.time_hint) {
                        if existing != hint {
                            return Err(parse_error(
                                line_idx + 1,
                                line,
                                "conflicting time annotations within one group",
                            ));
                        }
                    }
                    group.time_hint = group.time_hint.or(entry.time_hint);
                    group.files.extend(entry.files);
                }
            } else {
                let mut group = SnapshotGroup::new(groups.len(), entry.files);
                group.time_hint = entry.time_hint;
                groups.push(group);
            }
            last_stem = stem;
        }
        Ok(Self {
            source: None,
            groups,
        })
    }

    /// Builds a list from pre-constructed groups, re-indexing them in order.
    pub fn from_groups(groups: impl IntoIterator<Item = SnapshotGroup>) -> Self {
        let groups = groups
            .into_iter()
            .enumerate()
            .map(|(index, mut group)| {
                group.index = index;
                group
            })
            .collect();
        Self {
            source: None,
            groups,
        }
    }

    /// Manifest path the list was parsed from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Iterates over the groups in manifest order.
    pub fn iter(&self) -> std::slice::Iter<'_, SnapshotGroup> {
        self.groups.iter()
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns true when the manifest lists no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Borrow the groups as a slice.
    pub fn groups(&self) -> &[SnapshotGroup] {
        &self.groups
    }
}

impl<'a> IntoIterator for &'a BatchFileList {
    type Item = &'a SnapshotGroup;
    type IntoIter = std::slice::Iter<'a, SnapshotGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

struct LineEntry {
    files: Vec<PathBuf>,
    time_hint: Option<f64>,
}

fn parse_line(line: &str, line_no: usize, base: &Path) -> Result<LineEntry, CoefError> {
    let mut files = Vec::new();
    let mut time_hint = None;
    for token in line.split_whitespace() {
        if let Some(raw) = token.strip_prefix(TIME_PREFIX) {
            if time_hint.is_some() {
                return Err(parse_error(line_no, line, "duplicate time annotation"));
            }
            let value: f64 = raw
                .parse()
                .map_err(|_| parse_error(line_no, line, "time annotation is not a number"))?;
            if !value.is_finite() {
                return Err(parse_error(line_no, line, "time annotation must be finite"));
            }
            time_hint = Some(value);
            continue;
        }
        let path = Path::new(token);
        if path.is_absolute() {
            files.push(path.to_path_buf());
        } else {
            files.push(base.join(path));
        }
    }
    if files.is_empty() {
        return Err(parse_error(line_no, line, "entry does not name any file"));
    }
    Ok(LineEntry { files, time_hint })
}

fn file_stem(path: &Path, delimiter: &str) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let cut = name.rfind(delimiter)?;
    let mut stem = path.with_file_name("").display().to_string();
    stem.push_str(&name[..cut]);
    Some(stem)
}

/// Open failures mean the manifest is unavailable; anything wrong with what
/// was opened is a parse error.
fn read_manifest(path: &Path) -> Result<String, CoefError> {
    let mut file = File::open(path).map_err(|err| {
        CoefError::ManifestNotFound(
            ErrorInfo::new("manifest-open", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })?;
    let content_error = |code: &str, message: String| {
        CoefError::ManifestParse(
            ErrorInfo::new(code, message).with_context("path", path.display().to_string()),
        )
    };
    let is_file = file
        .metadata()
        .map_err(|err| content_error("manifest-read", err.to_string()))?
        .is_file();
    if !is_file {
        return Err(content_error(
            "manifest-not-a-file",
            "manifest path is not a regular file".to_string(),
        ));
    }
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|err| content_error("manifest-read", err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| content_error("manifest-encoding", err.to_string()))
}

fn parse_error(line_no: usize, line: &str, message: &str) -> CoefError {
    CoefError::ManifestParse(
        ErrorInfo::new("manifest-entry", message)
            .with_context("line", line_no.to_string())
            .with_context("text", line),
    )
}
