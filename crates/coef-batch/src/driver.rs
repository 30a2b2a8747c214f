use std::path::Path;

use coef_basis::basis_factory;
use coef_core::errors::{CoefError, ErrorInfo};
use coef_core::{BasisConfig, BasisEngine, CoefficientSet, SnapshotGroup, SnapshotSource};
use coef_pread::BatchFileList;
use coef_series::{CoefficientAccumulator, CoefficientSeries};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::{FailurePolicy, PipelineConfig};
use crate::summary::{RunSummary, SkippedGroup};

/// Accumulated series plus run statistics.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Finalized accumulator.
    pub accumulator: CoefficientAccumulator,
    /// Processing statistics.
    pub summary: RunSummary,
}

impl BatchOutcome {
    /// Takes the accumulated series, if any group succeeded.
    pub fn into_series(self) -> Option<CoefficientSeries> {
        self.accumulator.into_series()
    }
}

/// Reads `manifest`, builds the reader and basis named by the
/// configuration and runs [`run_batches`].
pub fn run_manifest(
    manifest: &Path,
    basis: &BasisConfig,
    config: &PipelineConfig,
) -> Result<BatchOutcome, CoefError> {
    config.validate()?;
    let list = BatchFileList::parse(manifest, config.delimiter.as_deref())?;
    let engine = basis_factory(basis)?;
    run_batches(&list, &config.reader, engine.as_ref(), config)
}

/// Projects every group of `list` and merges the results in manifest order.
///
/// Recoverable per-group failures are skipped or returned depending on
/// `config.on_error`. Accumulator contract violations always end the run.
/// The accumulator is finalized before returning.
pub fn run_batches(
    list: &BatchFileList,
    source: &dyn SnapshotSource,
    engine: &dyn BasisEngine,
    config: &PipelineConfig,
) -> Result<BatchOutcome, CoefError> {
    config.validate()?;
    let component = config.component.as_str();
    let mut driver = Driver::new(list.len(), config);

    if config.parallelism > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallelism)
            .build()
            .map_err(|err| CoefError::Config(ErrorInfo::new("thread-pool", err.to_string())))?;
        // Indexed collect keeps manifest order.
        let results: Vec<Result<CoefficientSet, CoefError>> = pool.install(|| {
            list.groups()
                .par_iter()
                .map(|group| project_group(group, source, engine, component))
                .collect()
        });
        for (group, result) in list.iter().zip(results) {
            driver.accept(group, result)?;
        }
    } else {
        for group in list {
            let result = project_group(group, source, engine, component);
            driver.accept(group, result)?;
        }
    }

    driver.finish()
}

/// Loads one group, selects the component and projects it.
pub fn project_group(
    group: &SnapshotGroup,
    source: &dyn SnapshotSource,
    engine: &dyn BasisEngine,
    component: &str,
) -> Result<CoefficientSet, CoefError> {
    let mut reader = source.open(group)?;
    reader.select_component_type(component)?;
    let time = reader.current_time();
    let count = reader.current_particle_count();
    info!(group = %group, time, particles = count, component, "projecting group");
    if let Some(hint) = group.time_hint {
        if hint != time {
            warn!(group = %group, hint, time, "manifest time differs from snapshot time");
        }
    }
    if count == 0 {
        return Err(CoefError::EmptySelection(
            ErrorInfo::new("selection-empty", "selected component has no particles")
                .with_context("group", group.label())
                .with_context("component", component),
        ));
    }
    let mut particles = reader.particles()?;
    engine.project(time, component, &mut particles)
}

struct Driver<'a> {
    config: &'a PipelineConfig,
    accumulator: CoefficientAccumulator,
    summary: RunSummary,
}

impl<'a> Driver<'a> {
    fn new(groups_total: usize, config: &'a PipelineConfig) -> Self {
        Self {
            config,
            accumulator: CoefficientAccumulator::new(),
            summary: RunSummary {
                groups_total,
                ..RunSummary::default()
            },
        }
    }

    fn accept(
        &mut self,
        group: &SnapshotGroup,
        result: Result<CoefficientSet, CoefError>,
    ) -> Result<(), CoefError> {
        match result {
            Ok(set) => {
                let time = set.time();
                self.accumulator.ingest(set)?;
                self.summary.groups_processed += 1;
                debug!(group = %group, time, entries = self.accumulator.len(), "ingested coefficients");
                let interval = self.config.checkpoint.interval;
                if interval > 0 && self.summary.groups_processed % interval == 0 {
                    self.checkpoint()?;
                }
                Ok(())
            }
            Err(err) if err.is_recoverable() && self.config.on_error == FailurePolicy::Skip => {
                warn!(group = %group, kind = err.kind(), error = %err, "skipping group");
                self.summary.skipped.push(SkippedGroup::new(group, &err));
                Ok(())
            }
            Err(err) => {
                warn!(group = %group, kind = err.kind(), error = %err, "aborting run");
                Err(err)
            }
        }
    }

    fn checkpoint(&mut self) -> Result<(), CoefError> {
        let (Some(path), Some(series)) = (&self.config.checkpoint.path, self.accumulator.series())
        else {
            return Ok(());
        };
        series.store(path)?;
        self.summary.checkpoints_written += 1;
        debug!(path = %path.display(), entries = series.len(), "wrote checkpoint");
        Ok(())
    }

    fn finish(mut self) -> Result<BatchOutcome, CoefError> {
        self.accumulator.finalize();
        if self.config.checkpoint.interval > 0 {
            self.checkpoint()?;
        }
        self.summary.entries = self.accumulator.len();
        self.summary.time_range = self.accumulator.series().map(CoefficientSeries::time_range);
        info!(
            processed = self.summary.groups_processed,
            skipped = self.summary.skipped.len(),
            entries = self.summary.entries,
            "completed batch run"
        );
        Ok(BatchOutcome {
            accumulator: self.accumulator,
            summary: self.summary,
        })
    }
}
