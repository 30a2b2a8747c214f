//! Least-squares polynomial fits through diagnostic fields.

use coef_core::errors::{CoefError, ErrorInfo};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::species::DiagnosticSeries;

const RANK_TOLERANCE: f64 = 1e-12;

/// Polynomial with coefficients in ascending powers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Polynomial {
    coefficients: Vec<f64>,
}

impl Polynomial {
    /// Builds `c[0] + c[1] x + c[2] x^2 + ...`.
    pub fn new(coefficients: Vec<f64>) -> Self {
        Self { coefficients }
    }

    /// Coefficients, lowest power first.
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Highest power carried.
    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// Evaluates the polynomial at `x` (Horner).
    pub fn eval(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, coefficient| acc * x + coefficient)
    }

    /// First derivative.
    pub fn derivative(&self) -> Polynomial {
        if self.coefficients.len() <= 1 {
            return Polynomial::new(vec![0.0]);
        }
        let coefficients = self
            .coefficients
            .iter()
            .enumerate()
            .skip(1)
            .map(|(power, coefficient)| coefficient * power as f64)
            .collect();
        Polynomial::new(coefficients)
    }
}

/// Fits a polynomial of `degree` through `(x, y)` by least squares.
///
/// Design matrix columns are normalised before the SVD solve. Rank-deficient
/// systems (for example every `x` equal with `degree >= 1`) are rejected.
pub fn polyfit(x: &[f64], y: &[f64], degree: usize) -> Result<Polynomial, CoefError> {
    if x.len() != y.len() {
        return Err(CoefError::Diagnostic(
            ErrorInfo::new("fit-length-mismatch", "x and y differ in length")
                .with_context("x", x.len().to_string())
                .with_context("y", y.len().to_string()),
        ));
    }
    if x.len() <= degree {
        return Err(CoefError::Diagnostic(
            ErrorInfo::new("fit-underdetermined", "not enough samples for the degree")
                .with_context("samples", x.len().to_string())
                .with_context("degree", degree.to_string()),
        ));
    }
    if x.iter().chain(y).any(|value| !value.is_finite()) {
        return Err(CoefError::Diagnostic(ErrorInfo::new(
            "fit-non-finite",
            "samples must be finite",
        )));
    }

    let terms = degree + 1;
    let raw = DMatrix::<f64>::from_fn(x.len(), terms, |row, col| x[row].powi(col as i32));
    let scale: Vec<f64> = raw
        .column_iter()
        .map(|column| {
            let norm = column.norm();
            if norm > 0.0 {
                norm
            } else {
                1.0
            }
        })
        .collect();
    let design = DMatrix::<f64>::from_fn(x.len(), terms, |row, col| raw[(row, col)] / scale[col]);
    let rhs = DVector::<f64>::from_column_slice(y);

    let svd = design.svd(true, true);
    let largest = svd.singular_values.max();
    let smallest = svd.singular_values.min();
    if largest <= 0.0 || smallest <= largest * RANK_TOLERANCE {
        return Err(CoefError::Diagnostic(
            ErrorInfo::new("fit-singular", "design matrix is rank deficient")
                .with_context("degree", degree.to_string())
                .with_hint("lower the degree or supply more distinct samples"),
        ));
    }
    let solution = svd
        .solve(&rhs, largest * RANK_TOLERANCE)
        .map_err(|message| CoefError::Diagnostic(ErrorInfo::new("fit-singular", message)))?;

    let coefficients = solution
        .iter()
        .zip(&scale)
        .map(|(value, scale)| value / scale)
        .collect();
    Ok(Polynomial::new(coefficients))
}

/// One line of a [`CoolingCurve`] table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoolingRow {
    /// Sample time multiplied by the time scale.
    pub time: f64,
    /// Recorded field value.
    pub observed: f64,
    /// Fitted field value.
    pub fitted: f64,
    /// Fitted slope per unscaled time unit.
    pub slope: f64,
}

/// Polynomial fit of one global field against time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoolingCurve {
    /// Fitted field label.
    pub field: String,
    /// Factor applied to the reported times.
    pub tscale: f64,
    /// Fitted polynomial in unscaled time.
    pub polynomial: Polynomial,
    /// Per-sample table.
    pub rows: Vec<CoolingRow>,
}

/// Fits `field` of `series` against time and tabulates the fit and slope.
pub fn cooling_curve(
    series: &DiagnosticSeries,
    field: &str,
    degree: usize,
    tscale: f64,
) -> Result<CoolingCurve, CoefError> {
    let observed = series.field(field).ok_or_else(|| {
        CoefError::Diagnostic(
            ErrorInfo::new("diag-field-missing", "field not present in the file")
                .with_context("field", field)
                .with_context("available", series.fields.join(", ")),
        )
    })?;
    let polynomial = polyfit(&series.time, observed, degree)?;
    let slope = polynomial.derivative();
    let rows = series
        .time
        .iter()
        .zip(observed)
        .map(|(&time, &value)| CoolingRow {
            time: time * tscale,
            observed: value,
            fitted: polynomial.eval(time),
            slope: slope.eval(time),
        })
        .collect();
    debug!(field, degree, samples = series.len(), "fitted cooling curve");
    Ok(CoolingCurve {
        field: field.to_string(),
        tscale,
        polynomial,
        rows,
    })
}
