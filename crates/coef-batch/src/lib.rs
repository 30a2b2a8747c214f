//! Batch driver: manifest in, finalized coefficient series out.

pub mod config;
pub mod driver;
pub mod summary;

pub use config::{load_pipeline_config, CheckpointConfig, FailurePolicy, PipelineConfig};
pub use driver::{project_group, run_batches, run_manifest, BatchOutcome};
pub use summary::{RunSummary, SkippedGroup};
