//! Structured error types shared across the coefficient workspace.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`CoefError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (group labels, times, paths, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for manifest parsing, snapshot reading, projection
/// and coefficient accumulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum CoefError {
    /// The batch manifest does not exist.
    #[error("manifest not found: {0}")]
    ManifestNotFound(ErrorInfo),
    /// The batch manifest contains a malformed entry.
    #[error("manifest parse error: {0}")]
    ManifestParse(ErrorInfo),
    /// A snapshot group could not be opened or decoded.
    #[error("group load error: {0}")]
    GroupLoad(ErrorInfo),
    /// The requested component type is not present in the snapshot.
    #[error("unknown component type: {0}")]
    UnknownComponentType(ErrorInfo),
    /// The selected component type has no particles.
    #[error("empty selection: {0}")]
    EmptySelection(ErrorInfo),
    /// The basis projection failed numerically.
    #[error("basis computation error: {0}")]
    BasisComputation(ErrorInfo),
    /// A coefficient set was not strictly later than the series maximum.
    #[error("out of order time: {0}")]
    OutOfOrderTime(ErrorInfo),
    /// A coefficient set was computed under a different basis.
    #[error("incompatible basis: {0}")]
    IncompatibleBasis(ErrorInfo),
    /// The series no longer accepts coefficient sets.
    #[error("series closed: {0}")]
    SeriesClosed(ErrorInfo),
    /// Invalid configuration supplied by the caller.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Serialization, persistence and schema errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
    /// A diagnostic time-series file could not be read or fitted.
    #[error("diagnostic error: {0}")]
    Diagnostic(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl CoefError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            CoefError::ManifestNotFound(info)
            | CoefError::ManifestParse(info)
            | CoefError::GroupLoad(info)
            | CoefError::UnknownComponentType(info)
            | CoefError::EmptySelection(info)
            | CoefError::BasisComputation(info)
            | CoefError::OutOfOrderTime(info)
            | CoefError::IncompatibleBasis(info)
            | CoefError::SeriesClosed(info)
            | CoefError::Config(info)
            | CoefError::Serde(info)
            | CoefError::Diagnostic(info) => info,
        }
    }

    /// Stable kebab-case name of the error family.
    pub fn kind(&self) -> &'static str {
        match self {
            CoefError::ManifestNotFound(_) => "manifest-not-found",
            CoefError::ManifestParse(_) => "manifest-parse",
            CoefError::GroupLoad(_) => "group-load",
            CoefError::UnknownComponentType(_) => "unknown-component-type",
            CoefError::EmptySelection(_) => "empty-selection",
            CoefError::BasisComputation(_) => "basis-computation",
            CoefError::OutOfOrderTime(_) => "out-of-order-time",
            CoefError::IncompatibleBasis(_) => "incompatible-basis",
            CoefError::SeriesClosed(_) => "series-closed",
            CoefError::Config(_) => "config",
            CoefError::Serde(_) => "serde",
            CoefError::Diagnostic(_) => "diagnostic",
        }
    }

    /// Returns true for failures confined to a single snapshot group.
    ///
    /// The batch driver may skip a group that failed with one of these and
    /// carry on with the rest of the manifest. Everything else is fatal.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CoefError::GroupLoad(_)
                | CoefError::UnknownComponentType(_)
                | CoefError::EmptySelection(_)
                | CoefError::BasisComputation(_)
        )
    }

    /// Returns true when the error signals a broken accumulator contract.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            CoefError::OutOfOrderTime(_)
                | CoefError::IncompatibleBasis(_)
                | CoefError::SeriesClosed(_)
        )
    }
}
