//! Diagnostic time series written alongside a simulation run.
//!
//! [`read_species`] turns a column-oriented species file into a
//! [`DiagnosticSeries`]; [`polyfit`] and [`cooling_curve`] fit smooth
//! curves through its fields.

pub mod fit;
pub mod species;

pub use fit::{cooling_curve, polyfit, CoolingCurve, CoolingRow, Polynomial};
pub use species::{
    parse_species, read_species, DiagnosticSeries, Layout, ParseOptions, SkippedRow,
    DEFAULT_SPECIES,
};
