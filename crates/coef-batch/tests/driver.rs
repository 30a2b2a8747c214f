use std::collections::BTreeMap;
use std::path::PathBuf;

use coef_batch::{run_batches, FailurePolicy, PipelineConfig};
use coef_core::errors::ErrorInfo;
use coef_core::{
    BasisConfig, BasisDescriptor, BasisEngine, CoefError, CoefficientSet, Particle, SnapshotGroup,
    SnapshotReader, SnapshotSource,
};
use coef_pread::{BatchFileList, MemorySnapshot};
use coef_series::AccumulatorState;
use serde_json::json;

/// Serves in-memory snapshots keyed by manifest index.
struct FakeSource {
    snapshots: BTreeMap<usize, Result<MemorySnapshot, CoefError>>,
}

impl SnapshotSource for FakeSource {
    fn open(&self, group: &SnapshotGroup) -> Result<Box<dyn SnapshotReader>, CoefError> {
        match self.snapshots.get(&group.index) {
            Some(Ok(snap)) => Ok(Box::new(snap.clone())),
            Some(Err(err)) => Err(err.clone()),
            None => Err(CoefError::GroupLoad(ErrorInfo::new("fake-missing", "no snapshot"))),
        }
    }
}

/// Sums particle masses; fails for the configured times.
struct MassEngine {
    descriptor: BasisDescriptor,
    fail_at: Vec<f64>,
}

impl MassEngine {
    fn new(fail_at: Vec<f64>) -> Self {
        Self::with_config(BasisConfig::new("mass"), fail_at)
    }

    fn with_config(config: BasisConfig, fail_at: Vec<f64>) -> Self {
        Self {
            descriptor: BasisDescriptor::from_config(&config, vec![1]).unwrap(),
            fail_at,
        }
    }
}

impl BasisEngine for MassEngine {
    fn descriptor(&self) -> &BasisDescriptor {
        &self.descriptor
    }

    fn project(
        &self,
        time: f64,
        component: &str,
        particles: &mut dyn Iterator<Item = Particle>,
    ) -> Result<CoefficientSet, CoefError> {
        if self.fail_at.contains(&time) {
            return Err(CoefError::BasisComputation(ErrorInfo::new(
                "fake-degenerate",
                "refusing this time",
            )));
        }
        let mass = particles.map(|p| p.mass).sum();
        CoefficientSet::new(time, component, self.descriptor.clone(), vec![mass])
    }
}

fn snapshot(time: f64, halo_particles: usize) -> MemorySnapshot {
    MemorySnapshot::new(time)
        .with_component(
            "dark halo",
            (0..halo_particles).map(|i| Particle::new(1.0 + i as f64, [1.0, 0.0, 0.0], [0.0; 3])),
        )
        .with_component("star disk", vec![Particle::new(0.5, [0.0; 3], [0.0; 3])])
}

fn manifest(count: usize) -> BatchFileList {
    BatchFileList::from_groups(
        (0..count).map(|i| SnapshotGroup::new(i, vec![PathBuf::from(format!("snap_{i:03}"))])),
    )
}

fn source(entries: Vec<Result<MemorySnapshot, CoefError>>) -> FakeSource {
    FakeSource {
        snapshots: entries.into_iter().enumerate().collect(),
    }
}

#[test]
fn clean_manifest_yields_one_entry_per_group() {
    let source = source(vec![Ok(snapshot(1.0, 2)), Ok(snapshot(2.0, 3)), Ok(snapshot(3.0, 1))]);
    let engine = MassEngine::new(Vec::new());
    let config = PipelineConfig::for_component("dark halo");

    let outcome = run_batches(&manifest(3), &source, &engine, &config).unwrap();
    assert_eq!(outcome.accumulator.state(), AccumulatorState::Finalized);
    assert_eq!(outcome.accumulator.times(), vec![1.0, 2.0, 3.0]);
    assert_eq!(outcome.summary.groups_processed, 3);
    assert!(outcome.summary.skipped.is_empty());
    assert_eq!(outcome.summary.time_range, Some((1.0, 3.0)));

    let series = outcome.into_series().unwrap();
    assert_eq!(series.at(2.0).unwrap().values(), &[6.0]);
}

#[test]
fn failed_projection_in_the_middle_is_skipped() {
    let source = source(vec![Ok(snapshot(1.0, 1)), Ok(snapshot(2.0, 1)), Ok(snapshot(3.0, 1))]);
    let engine = MassEngine::new(vec![2.0]);
    let config = PipelineConfig::for_component("dark halo");

    let outcome = run_batches(&manifest(3), &source, &engine, &config).unwrap();
    assert_eq!(outcome.accumulator.times(), vec![1.0, 3.0]);
    assert_eq!(outcome.summary.skipped.len(), 1);
    let skipped = &outcome.summary.skipped[0];
    assert_eq!(skipped.index, 1);
    assert_eq!(skipped.kind, "basis-computation");
    assert_eq!(skipped.label, "snap_001");
}

#[test]
fn each_recoverable_failure_costs_exactly_one_entry() {
    let source = source(vec![
        Ok(snapshot(1.0, 1)),
        Err(CoefError::GroupLoad(ErrorInfo::new("corrupt", "bad header"))),
        Ok(snapshot(3.0, 0)),
        Ok(MemorySnapshot::new(4.0).with_component("gas", vec![Particle::default()])),
        Ok(snapshot(5.0, 2)),
        Ok(snapshot(6.0, 2)),
    ]);
    let engine = MassEngine::new(vec![5.0]);
    let config = PipelineConfig::for_component("dark halo");

    let outcome = run_batches(&manifest(6), &source, &engine, &config).unwrap();
    assert_eq!(outcome.accumulator.times(), vec![1.0, 6.0]);
    let kinds: Vec<_> = outcome
        .summary
        .skipped
        .iter()
        .map(|s| s.kind.as_str())
        .collect();
    assert_eq!(
        kinds,
        vec![
            "group-load",
            "empty-selection",
            "unknown-component-type",
            "basis-computation"
        ]
    );
    assert_eq!(outcome.summary.groups_total, 6);
    assert_eq!(outcome.summary.groups_processed, 2);
}

#[test]
fn abort_policy_returns_first_failure() {
    let source = source(vec![Ok(snapshot(1.0, 1)), Ok(snapshot(2.0, 0)), Ok(snapshot(3.0, 1))]);
    let engine = MassEngine::new(Vec::new());
    let mut config = PipelineConfig::for_component("dark halo");
    config.on_error = FailurePolicy::Abort;

    let err = run_batches(&manifest(3), &source, &engine, &config).unwrap_err();
    assert!(matches!(err, CoefError::EmptySelection(_)));
}

#[test]
fn out_of_order_manifest_is_fatal() {
    let source = source(vec![Ok(snapshot(2.0, 1)), Ok(snapshot(1.0, 1))]);
    let engine = MassEngine::new(Vec::new());
    let config = PipelineConfig::for_component("dark halo");

    let err = run_batches(&manifest(2), &source, &engine, &config).unwrap_err();
    assert!(matches!(err, CoefError::OutOfOrderTime(_)));
}

#[test]
fn empty_manifest_never_seeds() {
    let source = source(Vec::new());
    let engine = MassEngine::new(Vec::new());
    let config = PipelineConfig::for_component("dark halo");

    let outcome = run_batches(&manifest(0), &source, &engine, &config).unwrap();
    assert!(outcome.accumulator.times().is_empty());
    assert_eq!(outcome.summary.time_range, None);
    assert!(outcome.into_series().is_none());
}

#[test]
fn parallel_run_matches_sequential_run() {
    let snapshots: Vec<_> = (0..16)
        .map(|i| Ok(snapshot(i as f64 * 0.5, 1 + i % 4)))
        .collect();
    let source = source(snapshots);
    let engine = MassEngine::new(vec![2.0, 5.5]);
    let sequential = PipelineConfig::for_component("dark halo");
    let mut parallel = sequential.clone();
    parallel.parallelism = 4;

    let a = run_batches(&manifest(16), &source, &engine, &sequential).unwrap();
    let b = run_batches(&manifest(16), &source, &engine, &parallel).unwrap();
    assert_eq!(a.summary, b.summary);
    assert_eq!(a.into_series(), b.into_series());
}

#[test]
fn invalid_configuration_is_rejected_up_front() {
    let source = source(Vec::new());
    let engine = MassEngine::with_config(BasisConfig::new("mass").with_parameter("k", json!(1)), Vec::new());
    let mut config = PipelineConfig::for_component("dark halo");
    config.parallelism = 0;
    assert!(matches!(
        run_batches(&manifest(0), &source, &engine, &config),
        Err(CoefError::Config(_))
    ));

    let mut config = PipelineConfig::for_component("dark halo");
    config.checkpoint.interval = 2;
    assert!(matches!(
        run_batches(&manifest(0), &source, &engine, &config),
        Err(CoefError::Config(_))
    ));
}
