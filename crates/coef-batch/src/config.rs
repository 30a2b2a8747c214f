use std::fs;
use std::path::{Path, PathBuf};

use coef_core::errors::{CoefError, ErrorInfo};
use coef_pread::ReaderKind;
use serde::{Deserialize, Serialize};

/// What the driver does with a group that fails in a recoverable way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the failure, record it in the summary and move on.
    #[default]
    Skip,
    /// Stop the run and return the error.
    Abort,
}

/// Periodic persistence of the partially accumulated series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CheckpointConfig {
    /// Successful ingests between writes (0 disables checkpoints).
    #[serde(default)]
    pub interval: usize,
    /// Destination file; the extension selects the encoding.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// YAML-configurable parameters of a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Component type projected from every group.
    pub component: String,
    /// Snapshot file format.
    #[serde(default)]
    pub reader: ReaderKind,
    /// Delimiter used to merge split snapshot files in the manifest.
    #[serde(default)]
    pub delimiter: Option<String>,
    /// Handling of per-group failures.
    #[serde(default)]
    pub on_error: FailurePolicy,
    /// Worker threads used for reading and projection (1 = sequential).
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Checkpoint behaviour.
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
}

fn default_parallelism() -> usize {
    1
}

impl PipelineConfig {
    /// Default configuration projecting `component`.
    pub fn for_component(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            reader: ReaderKind::default(),
            delimiter: None,
            on_error: FailurePolicy::default(),
            parallelism: default_parallelism(),
            checkpoint: CheckpointConfig::default(),
        }
    }

    /// Rejects settings the driver cannot honour.
    pub fn validate(&self) -> Result<(), CoefError> {
        if self.component.trim().is_empty() {
            return Err(config_error("pipeline-component", "component name is empty"));
        }
        if self.parallelism == 0 {
            return Err(config_error("pipeline-parallelism", "parallelism must be at least 1"));
        }
        if self.checkpoint.interval > 0 && self.checkpoint.path.is_none() {
            return Err(config_error(
                "pipeline-checkpoint",
                "checkpoint interval set without a checkpoint path",
            ));
        }
        Ok(())
    }
}

fn config_error(code: &str, message: &str) -> CoefError {
    CoefError::Config(ErrorInfo::new(code, message))
}

/// Reads a pipeline configuration from YAML.
pub fn load_pipeline_config(path: &Path) -> Result<PipelineConfig, CoefError> {
    let text = fs::read_to_string(path).map_err(|err| {
        CoefError::Config(
            ErrorInfo::new("pipeline-config-read", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })?;
    let config: PipelineConfig = serde_yaml::from_str(&text).map_err(|err| {
        CoefError::Config(
            ErrorInfo::new("pipeline-config-parse", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })?;
    config.validate()?;
    Ok(config)
}
