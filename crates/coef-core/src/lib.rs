#![deny(missing_docs)]
#![doc = "Core traits and data types shared by the coefficient accumulation workspace."]

pub mod basis;
pub mod errors;
pub mod hash;
pub mod provenance;
pub mod reader;
mod types;

pub use basis::{BasisConfig, BasisDescriptor, BasisEngine, CoefficientSet, MAX_COEFFICIENTS};
pub use errors::{CoefError, ErrorInfo};
pub use hash::stable_hash_string;
pub use provenance::SchemaVersion;
pub use reader::{SnapshotReader, SnapshotSource};
pub use types::{Particle, SnapshotGroup};
