use std::fs;
use std::path::Path;

use coef_batch::{load_pipeline_config, run_manifest, FailurePolicy, PipelineConfig};
use coef_core::{BasisConfig, CoefError};
use coef_pread::ReaderKind;
use coef_series::CoefficientSeries;
use serde_json::json;
use tempfile::tempdir;

fn polar() -> BasisConfig {
    BasisConfig::new("polar-rings")
        .with_parameter("mmax", json!(2))
        .with_parameter("nmax", json!(4))
        .with_parameter("rmax", json!(2.0))
}

fn write_snapshot(dir: &Path, name: &str, time: f64, halo: &[(f64, f64)]) {
    let mut text = format!("# time {time}\n[dark halo]\n");
    for (x, y) in halo {
        text.push_str(&format!("1.0 {x} {y} 0 0 0 0\n"));
    }
    text.push_str("[star disk]\n0.5 0.1 0 0 0 0 0\n");
    fs::write(dir.join(name), text).unwrap();
}

#[test]
fn corrupt_snapshot_is_skipped_end_to_end() {
    let dir = tempdir().unwrap();
    write_snapshot(dir.path(), "snap_000", 1.0, &[(1.0, 0.0), (0.0, 1.0)]);
    fs::write(dir.path().join("snap_001"), "# time 2.0\n[dark halo]\n1 2\n").unwrap();
    write_snapshot(dir.path(), "snap_002", 3.0, &[(0.5, 0.5)]);
    let manifest = dir.path().join("files.txt");
    fs::write(&manifest, "# run A\nsnap_000\nsnap_001\nsnap_002 time=3.0\n").unwrap();

    let config = PipelineConfig::for_component("dark halo");
    let outcome = run_manifest(&manifest, &polar(), &config).unwrap();
    assert_eq!(outcome.accumulator.times(), vec![1.0, 3.0]);
    assert_eq!(outcome.summary.skipped.len(), 1);
    assert_eq!(outcome.summary.skipped[0].code, "ascii-parse");

    let series = outcome.into_series().unwrap();
    assert_eq!(series.basis().shape, vec![5, 4]);
}

#[test]
fn split_files_are_merged_into_one_group() {
    let dir = tempdir().unwrap();
    write_snapshot(dir.path(), "snap_000.0", 1.0, &[(1.0, 0.0)]);
    write_snapshot(dir.path(), "snap_000.1", 1.0, &[(0.0, 1.0)]);
    write_snapshot(dir.path(), "snap_001.0", 2.0, &[(1.0, 1.0)]);
    let manifest = dir.path().join("files.txt");
    fs::write(&manifest, "snap_000.0\nsnap_000.1\nsnap_001.0\n").unwrap();

    let mut config = PipelineConfig::for_component("dark halo");
    config.delimiter = Some(".".to_string());
    let outcome = run_manifest(&manifest, &polar(), &config).unwrap();
    assert_eq!(outcome.summary.groups_total, 2);
    assert_eq!(outcome.accumulator.times(), vec![1.0, 2.0]);
}

#[test]
fn checkpoints_hold_the_partial_series() {
    let dir = tempdir().unwrap();
    let mut lines = String::new();
    for i in 0..5 {
        let name = format!("snap_{i:03}");
        write_snapshot(dir.path(), &name, i as f64, &[(1.0, 0.0)]);
        lines.push_str(&name);
        lines.push('\n');
    }
    let manifest = dir.path().join("files.txt");
    fs::write(&manifest, lines).unwrap();
    let checkpoint = dir.path().join("out").join("partial.json");

    let mut config = PipelineConfig::for_component("dark halo");
    config.checkpoint.interval = 2;
    config.checkpoint.path = Some(checkpoint.clone());
    let outcome = run_manifest(&manifest, &polar(), &config).unwrap();
    // Two periodic writes plus the final one.
    assert_eq!(outcome.summary.checkpoints_written, 3);

    let stored = CoefficientSeries::load(&checkpoint).unwrap();
    assert_eq!(stored.times(), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn missing_manifest_is_reported() {
    let dir = tempdir().unwrap();
    let config = PipelineConfig::for_component("dark halo");
    let err = run_manifest(&dir.path().join("absent.txt"), &polar(), &config).unwrap_err();
    assert!(matches!(err, CoefError::ManifestNotFound(_)));
}

#[test]
fn unknown_basis_is_a_config_error() {
    let dir = tempdir().unwrap();
    let manifest = dir.path().join("files.txt");
    fs::write(&manifest, "").unwrap();
    let config = PipelineConfig::for_component("dark halo");
    let err = run_manifest(&manifest, &BasisConfig::new("bessel"), &config).unwrap_err();
    assert!(matches!(err, CoefError::Config(ref info) if info.code == "basis-unknown"));
}

#[test]
fn pipeline_yaml_fills_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pipeline.yaml");
    fs::write(&path, "component: star disk\nreader: json\non_error: abort\n").unwrap();
    let config = load_pipeline_config(&path).unwrap();
    assert_eq!(config.component, "star disk");
    assert_eq!(config.reader, ReaderKind::Json);
    assert_eq!(config.on_error, FailurePolicy::Abort);
    assert_eq!(config.parallelism, 1);
    assert_eq!(config.checkpoint.interval, 0);
    assert!(config.delimiter.is_none());

    fs::write(&path, "component: halo\ncheckpoint:\n  interval: 3\n").unwrap();
    let err = load_pipeline_config(&path).unwrap_err();
    assert!(matches!(err, CoefError::Config(ref info) if info.code == "pipeline-checkpoint"));
}
