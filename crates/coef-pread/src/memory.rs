//! In-memory snapshot shared by every file format.

use coef_core::errors::{CoefError, ErrorInfo};
use coef_core::{Particle, SnapshotReader};

/// One decoded snapshot: a time and its named particle components.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MemorySnapshot {
    time: f64,
    names: Vec<String>,
    components: Vec<Vec<Particle>>,
    selected: Option<usize>,
    consumed: bool,
}

impl MemorySnapshot {
    /// Creates an empty snapshot at `time`.
    pub fn new(time: f64) -> Self {
        Self {
            time,
            ..Self::default()
        }
    }

    /// Appends particles to the named component, creating it on first use.
    pub fn extend_component(
        &mut self,
        name: &str,
        particles: impl IntoIterator<Item = Particle>,
    ) {
        let idx = match self.names.iter().position(|existing| existing == name) {
            Some(idx) => idx,
            None => {
                self.names.push(name.to_string());
                self.components.push(Vec::new());
                self.names.len() - 1
            }
        };
        self.components[idx].extend(particles);
    }

    /// Builder form of [`MemorySnapshot::extend_component`].
    pub fn with_component(
        mut self,
        name: &str,
        particles: impl IntoIterator<Item = Particle>,
    ) -> Self {
        self.extend_component(name, particles);
        self
    }

    /// Merges another piece of the same snapshot (one file of a split group).
    pub(crate) fn merge(&mut self, other: MemorySnapshot) -> Result<(), CoefError> {
        if other.time != self.time {
            return Err(CoefError::GroupLoad(
                ErrorInfo::new("group-time-mismatch", "files of one group disagree on time")
                    .with_context("expected", self.time.to_string())
                    .with_context("found", other.time.to_string()),
            ));
        }
        for (name, particles) in other.names.into_iter().zip(other.components) {
            self.extend_component(&name, particles);
        }
        Ok(())
    }
}

impl SnapshotReader for MemorySnapshot {
    fn available_component_types(&self) -> &[String] {
        &self.names
    }

    fn select_component_type(&mut self, name: &str) -> Result<(), CoefError> {
        match self.names.iter().position(|existing| existing == name) {
            Some(idx) => {
                self.selected = Some(idx);
                self.consumed = false;
                Ok(())
            }
            None => Err(CoefError::UnknownComponentType(
                ErrorInfo::new("component-unknown", "component type not present in snapshot")
                    .with_context("component", name)
                    .with_context("available", self.names.join(", ")),
            )),
        }
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn current_particle_count(&self) -> usize {
        self.selected
            .map(|idx| self.components[idx].len())
            .unwrap_or(0)
    }

    fn particles(&mut self) -> Result<Box<dyn Iterator<Item = Particle> + '_>, CoefError> {
        let idx = self.selected.ok_or_else(|| {
            CoefError::UnknownComponentType(ErrorInfo::new(
                "component-unselected",
                "no component type selected",
            ))
        })?;
        if self.consumed {
            return Err(CoefError::GroupLoad(
                ErrorInfo::new("particles-consumed", "particle stream already consumed")
                    .with_context("component", self.names[idx].clone())
                    .with_hint("select the component again to re-read it"),
            ));
        }
        self.consumed = true;
        Ok(Box::new(self.components[idx].iter().cloned()))
    }
}
