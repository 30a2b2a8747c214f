use std::fs;
use std::path::Path;

use coef_core::errors::{CoefError, ErrorInfo};
use coef_core::{BasisDescriptor, CoefficientSet, SchemaVersion};
use serde::{Deserialize, Serialize};

use crate::series::CoefficientSeries;

/// Schema written into every persisted series.
pub const SERIES_SCHEMA: SchemaVersion = SchemaVersion::new(1, 0, 0);

/// Encoding used for a persisted series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesFormat {
    /// Pretty printed JSON.
    Json,
    /// Compact bincode.
    Bincode,
}

impl SeriesFormat {
    /// Picks the format from the file extension: `.bin`/`.bincode` select
    /// bincode, anything else JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("bin") | Some("bincode") => SeriesFormat::Bincode,
            _ => SeriesFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SeriesDocument {
    schema: SchemaVersion,
    basis: BasisDescriptor,
    entries: Vec<CoefficientSet>,
}

fn persist_error(code: &str, err: impl ToString, path: &Path) -> CoefError {
    CoefError::Serde(
        ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
    )
}

impl CoefficientSeries {
    /// Writes the series to `path`, creating parent directories.
    pub fn store(&self, path: &Path) -> Result<(), CoefError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|err| persist_error("series-mkdir", err, parent))?;
            }
        }
        let doc = SeriesDocument {
            schema: SERIES_SCHEMA,
            basis: self.basis().clone(),
            entries: self.iter().cloned().collect(),
        };
        let bytes = match SeriesFormat::from_path(path) {
            SeriesFormat::Json => serde_json::to_vec_pretty(&doc)
                .map_err(|err| persist_error("series-serialize", err, path))?,
            SeriesFormat::Bincode => bincode::serialize(&doc)
                .map_err(|err| persist_error("series-serialize", err, path))?,
        };
        fs::write(path, bytes).map_err(|err| persist_error("series-write", err, path))
    }

    /// Restores a series written by [`CoefficientSeries::store`].
    ///
    /// Every ordering and basis invariant is checked again; a document that
    /// violates them is rejected.
    pub fn load(path: &Path) -> Result<Self, CoefError> {
        let bytes = fs::read(path).map_err(|err| persist_error("series-read", err, path))?;
        let doc: SeriesDocument = match SeriesFormat::from_path(path) {
            SeriesFormat::Json => serde_json::from_slice(&bytes)
                .map_err(|err| persist_error("series-parse", err, path))?,
            SeriesFormat::Bincode => bincode::deserialize(&bytes)
                .map_err(|err| persist_error("series-parse", err, path))?,
        };
        if !SERIES_SCHEMA.accepts(&doc.schema) {
            return Err(CoefError::Serde(
                ErrorInfo::new("series-schema", "unsupported series schema")
                    .with_context("path", path.display().to_string())
                    .with_context(
                        "schema",
                        format!("{}.{}.{}", doc.schema.major, doc.schema.minor, doc.schema.patch),
                    ),
            ));
        }
        let series = CoefficientSeries::from_entries(doc.entries).map_err(|err| {
            let info = err.info().clone();
            CoefError::Serde(
                ErrorInfo::new("series-invalid", info.message)
                    .with_context("path", path.display().to_string())
                    .with_context("cause", info.code),
            )
        })?;
        if series.basis() != &doc.basis {
            return Err(persist_error(
                "series-invalid",
                "header basis differs from entry basis",
                path,
            ));
        }
        Ok(series)
    }
}
