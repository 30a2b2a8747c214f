//! Snapshot reader traits consumed by the batch driver.

use crate::errors::CoefError;
use crate::types::{Particle, SnapshotGroup};

/// Streaming access to the particles of one loaded snapshot group.
///
/// A reader exposes a single component type at a time. The particle stream
/// is single-pass: once [`SnapshotReader::particles`] has been called the
/// component has to be selected again before it can be read a second time.
pub trait SnapshotReader: Send {
    /// Component type names present in the loaded group, in file order.
    fn available_component_types(&self) -> &[String];

    /// Binds the reader to one component type.
    fn select_component_type(&mut self, name: &str) -> Result<(), CoefError>;

    /// Simulation time of the loaded group.
    fn current_time(&self) -> f64;

    /// Number of particles [`SnapshotReader::particles`] will yield for the
    /// selected component, or zero when nothing is selected.
    fn current_particle_count(&self) -> usize;

    /// Streams the particles of the selected component.
    fn particles(&mut self) -> Result<Box<dyn Iterator<Item = Particle> + '_>, CoefError>;
}

/// Opens readers for snapshot groups.
pub trait SnapshotSource: Send + Sync {
    /// Loads `group` and returns a reader positioned on it.
    fn open(&self, group: &SnapshotGroup) -> Result<Box<dyn SnapshotReader>, CoefError>;
}
