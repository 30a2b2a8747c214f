//! Basis configuration, coefficient sets and the projection trait.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{CoefError, ErrorInfo};
use crate::hash::stable_hash_string;
use crate::types::Particle;

/// Opaque basis configuration: a family identifier plus free-form
/// parameters interpreted only by the engine that family names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasisConfig {
    /// Basis family identifier (e.g. `polar-rings`).
    pub id: String,
    /// Family specific parameters.
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
}

impl BasisConfig {
    /// Creates a configuration without parameters.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Builder style parameter setter.
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Stable digest of the whole configuration.
    pub fn fingerprint(&self) -> Result<String, CoefError> {
        stable_hash_string(self)
    }

    /// Reads a required non-negative integer parameter.
    pub fn usize_param(&self, key: &str) -> Result<usize, CoefError> {
        let value = self.require(key)?;
        value
            .as_u64()
            .map(|raw| raw as usize)
            .ok_or_else(|| self.param_error(key, "expected a non-negative integer"))
    }

    /// Reads an optional non-negative integer parameter.
    pub fn usize_param_or(&self, key: &str, default: usize) -> Result<usize, CoefError> {
        if self.parameters.contains_key(key) {
            self.usize_param(key)
        } else {
            Ok(default)
        }
    }

    /// Reads a required finite floating point parameter.
    pub fn f64_param(&self, key: &str) -> Result<f64, CoefError> {
        let value = self.require(key)?;
        value
            .as_f64()
            .filter(|raw| raw.is_finite())
            .ok_or_else(|| self.param_error(key, "expected a finite number"))
    }

    fn require(&self, key: &str) -> Result<&Value, CoefError> {
        self.parameters.get(key).ok_or_else(|| {
            CoefError::Config(
                ErrorInfo::new("basis-param-missing", "missing basis parameter")
                    .with_context("basis", self.id.clone())
                    .with_context("parameter", key),
            )
        })
    }

    fn param_error(&self, key: &str, message: &str) -> CoefError {
        CoefError::Config(
            ErrorInfo::new("basis-param-invalid", message)
                .with_context("basis", self.id.clone())
                .with_context("parameter", key),
        )
    }
}

/// Largest coefficient count a single basis may describe.
pub const MAX_COEFFICIENTS: usize = 1 << 24;

/// Product of `shape`, or `None` on overflow.
pub fn checked_len(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
}

/// Identity of the basis a coefficient set was computed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasisDescriptor {
    /// Basis family identifier.
    pub kind: String,
    /// Dimensions of the coefficient array (row-major).
    pub shape: Vec<usize>,
    /// Digest of the full [`BasisConfig`].
    pub fingerprint: String,
}

impl BasisDescriptor {
    /// Builds the descriptor for `config` producing arrays of `shape`.
    ///
    /// Shapes whose coefficient count overflows or exceeds
    /// [`MAX_COEFFICIENTS`] are rejected as invalid parameters.
    pub fn from_config(config: &BasisConfig, shape: Vec<usize>) -> Result<Self, CoefError> {
        match checked_len(&shape) {
            Some(count) if count <= MAX_COEFFICIENTS => {}
            _ => {
                return Err(CoefError::Config(
                    ErrorInfo::new("basis-param-invalid", "basis shape is too large")
                        .with_context("basis", config.id.clone())
                        .with_context("shape", format!("{shape:?}"))
                        .with_context("limit", MAX_COEFFICIENTS.to_string()),
                ))
            }
        }
        Ok(Self {
            kind: config.id.clone(),
            shape,
            fingerprint: config.fingerprint()?,
        })
    }

    /// Number of coefficients implied by the shape; saturates for shapes no
    /// engine can produce.
    pub fn len(&self) -> usize {
        checked_len(&self.shape).unwrap_or(usize::MAX)
    }

    /// Returns true if the shape describes no coefficients.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Two descriptors are compatible when kind, shape and configuration
    /// digest all agree.
    pub fn is_compatible(&self, other: &BasisDescriptor) -> bool {
        self == other
    }
}

/// Coefficients of one snapshot component projected at one time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientSet {
    time: f64,
    component: String,
    basis: BasisDescriptor,
    values: Vec<f64>,
}

impl CoefficientSet {
    /// Creates a coefficient set, checking that `values` fills the basis
    /// shape exactly.
    pub fn new(
        time: f64,
        component: impl Into<String>,
        basis: BasisDescriptor,
        values: Vec<f64>,
    ) -> Result<Self, CoefError> {
        if values.len() != basis.len() {
            return Err(CoefError::BasisComputation(
                ErrorInfo::new("coef-shape-mismatch", "coefficient count does not match shape")
                    .with_context("expected", basis.len().to_string())
                    .with_context("actual", values.len().to_string()),
            ));
        }
        Ok(Self {
            time,
            component: component.into(),
            basis,
            values,
        })
    }

    /// Simulation time the coefficients represent.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Name of the component type that was projected.
    pub fn component(&self) -> &str {
        &self.component
    }

    /// Basis the coefficients were computed under.
    pub fn basis(&self) -> &BasisDescriptor {
        &self.basis
    }

    /// Flat row-major coefficient values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns the coefficient at the given multi-index, if in range.
    pub fn get(&self, index: &[usize]) -> Option<f64> {
        if index.len() != self.basis.shape.len() {
            return None;
        }
        let mut flat = 0usize;
        for (idx, dim) in index.iter().zip(&self.basis.shape) {
            if idx >= dim {
                return None;
            }
            flat = flat * dim + idx;
        }
        self.values.get(flat).copied()
    }
}

/// Projects a particle stream onto a fixed basis.
pub trait BasisEngine: Send + Sync {
    /// Descriptor attached to every coefficient set this engine produces.
    fn descriptor(&self) -> &BasisDescriptor;

    /// Computes the coefficients of `particles`, labelled with `time` and
    /// `component`. Must be deterministic for identical input.
    fn project(
        &self,
        time: f64,
        component: &str,
        particles: &mut dyn Iterator<Item = Particle>,
    ) -> Result<CoefficientSet, CoefError>;
}
