use std::fs;
use std::path::Path;

use coef_core::errors::{CoefError, ErrorInfo};
use coef_core::Particle;
use serde::{Deserialize, Serialize};

use crate::memory::MemorySnapshot;

/// On-disk layout of a JSON snapshot file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSnapshot {
    /// Simulation time.
    pub time: f64,
    /// Components in file order.
    pub components: Vec<JsonComponent>,
}

/// One named component of a [`JsonSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonComponent {
    /// Component type name.
    pub name: String,
    /// Particles belonging to the component.
    #[serde(default)]
    pub particles: Vec<Particle>,
}

impl From<JsonSnapshot> for MemorySnapshot {
    fn from(doc: JsonSnapshot) -> Self {
        let mut snap = MemorySnapshot::new(doc.time);
        for component in doc.components {
            snap.extend_component(&component.name, component.particles);
        }
        snap
    }
}

/// Reads one JSON snapshot file.
pub fn read_json(path: &Path) -> Result<MemorySnapshot, CoefError> {
    let bytes = fs::read(path).map_err(|err| {
        CoefError::GroupLoad(
            ErrorInfo::new("json-open", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })?;
    let doc: JsonSnapshot = serde_json::from_slice(&bytes).map_err(|err| {
        CoefError::GroupLoad(
            ErrorInfo::new("json-parse", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })?;
    if !doc.time.is_finite() {
        return Err(CoefError::GroupLoad(
            ErrorInfo::new("json-time", "snapshot time must be finite")
                .with_context("path", path.display().to_string()),
        ));
    }
    Ok(doc.into())
}
