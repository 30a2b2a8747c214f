//! Column-oriented species diagnostic files.
//!
//! A file carries a header line naming every column (it contains the token
//! `Time`), an optional index line mapping columns to 1-based header
//! positions (it contains `[1]`), comment lines containing `#`, and data
//! rows. `#` and `|` act as column separators everywhere.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use coef_core::errors::{CoefError, ErrorInfo};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Species names assumed by [`Layout::detect`].
pub const DEFAULT_SPECIES: [&str; 5] = ["H", "H+", "He", "He+", "He++"];

const HEADER_MARKER: &str = "Time";
const INDEX_MARKER: &str = "[1]";

/// How the columns of a diagnostic file are grouped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Layout {
    /// Every column after the time is a global field.
    Flat,
    /// `head` leading and `tail` trailing global columns around blocks of
    /// `columns_per_species` columns, one block per entry of `names`.
    Species {
        /// Species owning each block, in column order.
        names: Vec<String>,
        /// Leading global columns, time included.
        head: usize,
        /// Trailing global columns.
        tail: usize,
        /// Width of one species block.
        columns_per_species: usize,
    },
}

impl Layout {
    /// Derives the species layout from the raw header line.
    pub fn detect(header: &str) -> Self {
        let mut columns_per_species = 9;
        let mut head = 2;
        let mut tail = 2;
        if header.contains("W(") {
            columns_per_species = 13;
            head = 3;
        }
        if header.contains("N(ie") {
            columns_per_species = 16;
            head = 3;
        }
        if header.contains("EratC") || header.contains("Efrac") {
            tail = 12;
        }
        Layout::Species {
            names: DEFAULT_SPECIES.iter().map(|name| name.to_string()).collect(),
            head,
            tail,
            columns_per_species,
        }
    }
}

/// Knobs for [`parse_species`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParseOptions {
    /// Layout to use instead of detecting one from the header.
    pub layout: Option<Layout>,
    /// Rows with a later time are dropped.
    pub tmax: Option<f64>,
    /// Drop rows with no positive value past the first two columns.
    pub skip_zero_rows: bool,
}

impl ParseOptions {
    /// Options for files where every column is a global field.
    pub fn flat() -> Self {
        Self {
            layout: Some(Layout::Flat),
            ..Self::default()
        }
    }
}

/// A data row that was not taken into the series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// 1-based line number.
    pub line: usize,
    /// Number of columns found on the line.
    pub columns: usize,
    /// Why the row was rejected.
    pub reason: String,
}

/// Parsed diagnostic file.
///
/// Every sample vector, global or per species, is aligned by row with
/// [`DiagnosticSeries::time`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticSeries {
    /// Layout the columns were grouped with.
    pub layout: Layout,
    /// Header labels in column order.
    pub fields: Vec<String>,
    /// First column of every accepted row.
    pub time: Vec<f64>,
    /// Global fields by label.
    pub global: BTreeMap<String, Vec<f64>>,
    /// Species name to field label to samples.
    pub species: BTreeMap<String, BTreeMap<String, Vec<f64>>>,
    /// Rows rejected because they did not match the header.
    pub skipped: Vec<SkippedRow>,
}

impl DiagnosticSeries {
    fn new(layout: Layout, fields: Vec<String>) -> Self {
        Self {
            layout,
            fields,
            time: Vec::new(),
            global: BTreeMap::new(),
            species: BTreeMap::new(),
            skipped: Vec::new(),
        }
    }

    /// Number of accepted rows.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Returns true when no row was accepted.
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Samples of a global field; the time column is addressable by its
    /// header label.
    pub fn field(&self, name: &str) -> Option<&[f64]> {
        if self.fields.first().map(String::as_str) == Some(name) {
            return Some(&self.time);
        }
        self.global.get(name).map(Vec::as_slice)
    }

    /// Samples of `field` for one species.
    pub fn species_field(&self, species: &str, field: &str) -> Option<&[f64]> {
        self.species.get(species)?.get(field).map(Vec::as_slice)
    }

    /// Species present in the file.
    pub fn species_names(&self) -> impl Iterator<Item = &str> {
        self.species.keys().map(String::as_str)
    }

    fn push_row(&mut self, columns: &[Column], values: &[f64]) {
        for (column, &value) in columns.iter().zip(values) {
            match column {
                Column::Time => self.time.push(value),
                Column::Global(name) => self.global.entry(name.clone()).or_default().push(value),
                Column::Species(species, field) => self
                    .species
                    .entry(species.clone())
                    .or_default()
                    .entry(field.clone())
                    .or_default()
                    .push(value),
            }
        }
    }

    fn register(&mut self, columns: &[Column]) {
        for column in columns {
            match column {
                Column::Time => {}
                Column::Global(name) => {
                    self.global.entry(name.clone()).or_default();
                }
                Column::Species(species, field) => {
                    self.species
                        .entry(species.clone())
                        .or_default()
                        .entry(field.clone())
                        .or_default();
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Column {
    Time,
    Global(String),
    Species(String, String),
}

/// Reads a species file from disk.
pub fn read_species(path: &Path, options: &ParseOptions) -> Result<DiagnosticSeries, CoefError> {
    let file = File::open(path).map_err(|err| {
        CoefError::Diagnostic(
            ErrorInfo::new("diag-open", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })?;
    parse_species(BufReader::new(file), options).map_err(|err| match err {
        CoefError::Diagnostic(info) => {
            CoefError::Diagnostic(info.with_context("path", path.display().to_string()))
        }
        other => other,
    })
}

/// Parses species file contents.
pub fn parse_species<R: BufRead>(
    reader: R,
    options: &ParseOptions,
) -> Result<DiagnosticSeries, CoefError> {
    let mut series: Option<DiagnosticSeries> = None;
    let mut index: Option<Vec<String>> = None;
    let mut columns: Option<Vec<Column>> = None;

    for (line_idx, line) in reader.lines().enumerate() {
        let line_no = line_idx + 1;
        let line = line.map_err(|err| diag_error("diag-read", err.to_string()))?;
        if line.trim().is_empty() {
            continue;
        }
        let tokens = tokenize(&line);

        if line.contains(HEADER_MARKER) {
            if let Some(existing) = &series {
                if existing.fields != tokens {
                    return Err(line_error(line_no, "header changed within the file"));
                }
                continue;
            }
            let layout = options
                .layout
                .clone()
                .unwrap_or_else(|| Layout::detect(&line));
            debug!(fields = tokens.len(), layout = ?layout, "read diagnostic header");
            series = Some(DiagnosticSeries::new(layout, tokens));
            columns = None;
            continue;
        }
        if line.contains(INDEX_MARKER) {
            index = Some(tokens);
            columns = None;
            continue;
        }
        if line.contains('#') {
            continue;
        }

        let Some(series) = series.as_mut() else {
            return Err(line_error(line_no, "data row before the header line"));
        };
        if columns.is_none() {
            let built = build_columns(&series.fields, index.as_deref(), &series.layout)?;
            series.register(&built);
            columns = Some(built);
        }
        let Some(columns) = columns.as_deref() else {
            continue;
        };

        if tokens.len() != columns.len() {
            let reason = format!("expected {} columns, found {}", columns.len(), tokens.len());
            warn!(
                line = line_no,
                columns = tokens.len(),
                expected = columns.len(),
                "skipping malformed row"
            );
            series.skipped.push(SkippedRow {
                line: line_no,
                columns: tokens.len(),
                reason,
            });
            continue;
        }
        let values = match tokens
            .iter()
            .map(|token| token.parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(values) => values,
            Err(err) => {
                warn!(line = line_no, error = %err, "skipping non-numeric row");
                series.skipped.push(SkippedRow {
                    line: line_no,
                    columns: tokens.len(),
                    reason: format!("non-numeric value: {err}"),
                });
                continue;
            }
        };
        if options.skip_zero_rows && values.iter().skip(2).all(|value| *value <= 0.0) {
            continue;
        }
        if matches!(options.tmax, Some(tmax) if values[0] > tmax) {
            continue;
        }
        series.push_row(columns, &values);
    }

    let mut series =
        series.ok_or_else(|| diag_error("diag-no-header", "no line containing `Time` found"))?;
    if columns.is_none() {
        let built = build_columns(&series.fields, index.as_deref(), &series.layout)?;
        series.register(&built);
    }
    debug!(rows = series.len(), skipped = series.skipped.len(), "parsed diagnostic file");
    Ok(series)
}

fn tokenize(line: &str) -> Vec<String> {
    line.split(|c: char| c.is_whitespace() || c == '#' || c == '|')
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn build_columns(
    labels: &[String],
    index: Option<&[String]>,
    layout: &Layout,
) -> Result<Vec<Column>, CoefError> {
    let total = labels.len();
    let mut columns = Vec::with_capacity(total);
    match layout {
        Layout::Flat => {
            for (i, label) in labels.iter().enumerate() {
                columns.push(if i == 0 {
                    Column::Time
                } else {
                    Column::Global(label.clone())
                });
            }
        }
        Layout::Species {
            names,
            head,
            tail,
            columns_per_species,
        } => {
            if *head == 0 || *columns_per_species == 0 || total < head + tail {
                return Err(CoefError::Diagnostic(
                    ErrorInfo::new("diag-layout", "header does not fit the species layout")
                        .with_context("columns", total.to_string())
                        .with_context("head", head.to_string())
                        .with_context("tail", tail.to_string()),
                ));
            }
            for i in 0..total {
                if i == 0 {
                    columns.push(Column::Time);
                } else if i < *head || i >= total - tail {
                    columns.push(Column::Global(labels[i].clone()));
                } else {
                    let field = match index {
                        Some(tokens) => indexed_label(tokens, i, labels)?,
                        None => labels[i].clone(),
                    };
                    let block = (i - head) / columns_per_species;
                    let species = names.get(block).ok_or_else(|| {
                        CoefError::Diagnostic(
                            ErrorInfo::new(
                                "diag-species-overflow",
                                "more species blocks than names",
                            )
                            .with_context("column", (i + 1).to_string())
                            .with_context("species", names.len().to_string()),
                        )
                    })?;
                    columns.push(Column::Species(species.clone(), field));
                }
            }
        }
    }

    let mut seen = BTreeSet::new();
    for column in &columns {
        let key = match column {
            Column::Time => continue,
            Column::Global(name) => (None, name),
            Column::Species(species, field) => (Some(species), field),
        };
        if !seen.insert(key) {
            return Err(CoefError::Diagnostic(
                ErrorInfo::new("diag-duplicate-field", "field label used twice")
                    .with_context("field", key.1.clone()),
            ));
        }
    }
    Ok(columns)
}

fn indexed_label(tokens: &[String], column: usize, labels: &[String]) -> Result<String, CoefError> {
    let position = tokens
        .get(column)
        .and_then(|token| token.strip_prefix('['))
        .and_then(|token| token.strip_suffix(']'))
        .and_then(|token| token.parse::<usize>().ok())
        .filter(|position| (1..=labels.len()).contains(position));
    match position {
        Some(position) => Ok(labels[position - 1].clone()),
        None => Err(CoefError::Diagnostic(
            ErrorInfo::new("diag-index", "index line does not map this column")
                .with_context("column", (column + 1).to_string()),
        )),
    }
}

fn diag_error(code: &str, message: impl Into<String>) -> CoefError {
    CoefError::Diagnostic(ErrorInfo::new(code, message))
}

fn line_error(line_no: usize, message: &str) -> CoefError {
    CoefError::Diagnostic(
        ErrorInfo::new("diag-parse", message).with_context("line", line_no.to_string()),
    )
}
