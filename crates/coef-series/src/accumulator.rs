use coef_core::errors::{CoefError, ErrorInfo};
use coef_core::CoefficientSet;
use serde::{Deserialize, Serialize};

use crate::series::CoefficientSeries;

/// Lifecycle stage of a [`CoefficientAccumulator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccumulatorState {
    /// Nothing ingested yet.
    Empty,
    /// A series exists and accepts further sets.
    Seeded,
    /// Closed for ingestion.
    Finalized,
}

#[derive(Debug, Clone, PartialEq)]
enum Stage {
    Empty,
    Seeded(CoefficientSeries),
    Finalized(Option<CoefficientSeries>),
}

/// Merges coefficient sets into a single time ordered series.
///
/// `Empty -> Seeded -> Finalized`. The first successful [`ingest`] seeds
/// the series; later ones append. [`finalize`] closes it for good.
///
/// [`ingest`]: CoefficientAccumulator::ingest
/// [`finalize`]: CoefficientAccumulator::finalize
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientAccumulator {
    stage: Stage,
}

impl Default for CoefficientAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl CoefficientAccumulator {
    /// Creates an accumulator in the `Empty` state.
    pub fn new() -> Self {
        Self { stage: Stage::Empty }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> AccumulatorState {
        match self.stage {
            Stage::Empty => AccumulatorState::Empty,
            Stage::Seeded(_) => AccumulatorState::Seeded,
            Stage::Finalized(_) => AccumulatorState::Finalized,
        }
    }

    /// Seeds or extends the series with `set`.
    ///
    /// Fails with `OutOfOrderTime` or `IncompatibleBasis` when `set` breaks
    /// the series invariants, and with `SeriesClosed` once finalized. A
    /// failed call never changes the accumulator.
    pub fn ingest(&mut self, set: CoefficientSet) -> Result<(), CoefError> {
        match &mut self.stage {
            Stage::Empty => {
                self.stage = Stage::Seeded(CoefficientSeries::from_seed(set)?);
                Ok(())
            }
            Stage::Seeded(series) => series.add(set),
            Stage::Finalized(_) => Err(CoefError::SeriesClosed(
                ErrorInfo::new("accumulator-closed", "series is finalized")
                    .with_context("time", set.time().to_string()),
            )),
        }
    }

    /// Ordered times of the accumulated series; empty before seeding.
    pub fn times(&self) -> Vec<f64> {
        self.series().map(CoefficientSeries::times).unwrap_or_default()
    }

    /// Closes the accumulator. Calling it again has no effect.
    pub fn finalize(&mut self) {
        let stage = std::mem::replace(&mut self.stage, Stage::Finalized(None));
        self.stage = match stage {
            Stage::Empty => Stage::Finalized(None),
            Stage::Seeded(series) => Stage::Finalized(Some(series)),
            finalized @ Stage::Finalized(_) => finalized,
        };
    }

    /// Borrows the series, if one has been seeded.
    pub fn series(&self) -> Option<&CoefficientSeries> {
        match &self.stage {
            Stage::Seeded(series) | Stage::Finalized(Some(series)) => Some(series),
            Stage::Empty | Stage::Finalized(None) => None,
        }
    }

    /// Takes the series out of the accumulator.
    pub fn into_series(self) -> Option<CoefficientSeries> {
        match self.stage {
            Stage::Seeded(series) | Stage::Finalized(Some(series)) => Some(series),
            Stage::Empty | Stage::Finalized(None) => None,
        }
    }

    /// Number of accumulated entries.
    pub fn len(&self) -> usize {
        self.series().map(CoefficientSeries::len).unwrap_or(0)
    }

    /// Returns true when nothing has been accumulated.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
