use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Phase-space record for a single particle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Particle {
    /// Particle mass.
    pub mass: f64,
    /// Cartesian position.
    pub pos: [f64; 3],
    /// Cartesian velocity.
    pub vel: [f64; 3],
    /// Additional per-particle attributes in file order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attrs: Vec<f64>,
}

impl Particle {
    /// Creates a particle without extra attributes.
    pub fn new(mass: f64, pos: [f64; 3], vel: [f64; 3]) -> Self {
        Self {
            mass,
            pos,
            vel,
            attrs: Vec::new(),
        }
    }

    /// Returns true if mass, position and velocity are all finite.
    pub fn is_finite(&self) -> bool {
        self.mass.is_finite()
            && self.pos.iter().all(|v| v.is_finite())
            && self.vel.iter().all(|v| v.is_finite())
    }
}

/// One entry of a batch manifest: a snapshot, possibly split over several
/// files, to be read as a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotGroup {
    /// Zero-based position in the manifest.
    pub index: usize,
    /// Files making up the snapshot, in manifest order.
    pub files: Vec<PathBuf>,
    /// Optional time annotation supplied by the manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_hint: Option<f64>,
}

impl SnapshotGroup {
    /// Creates a group from its files.
    pub fn new(index: usize, files: Vec<PathBuf>) -> Self {
        Self {
            index,
            files,
            time_hint: None,
        }
    }

    /// Human readable identifier used in logs and run summaries.
    pub fn label(&self) -> String {
        match self.files.first() {
            Some(first) if self.files.len() > 1 => {
                format!("{} (+{} files)", first.display(), self.files.len() - 1)
            }
            Some(first) => first.display().to_string(),
            None => format!("group #{}", self.index),
        }
    }
}

impl fmt::Display for SnapshotGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
