use std::fs;
use std::path::Path;

use coef_core::errors::{CoefError, ErrorInfo};
use coef_core::{BasisConfig, BasisEngine};
use tracing::debug;

use crate::polar::{PolarRings, POLAR_RINGS};
use crate::spherical::{SphericalShells, SPHERICAL_SHELLS};

/// Parses a YAML basis description.
pub fn parse_basis_config(text: &str) -> Result<BasisConfig, CoefError> {
    serde_yaml::from_str(text)
        .map_err(|err| CoefError::Config(ErrorInfo::new("basis-config-parse", err.to_string())))
}

/// Reads a YAML basis description from disk.
pub fn load_basis_config(path: &Path) -> Result<BasisConfig, CoefError> {
    let text = fs::read_to_string(path).map_err(|err| {
        CoefError::Config(
            ErrorInfo::new("basis-config-read", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })?;
    parse_basis_config(&text)
}

/// Instantiates the engine named by `config.id`.
pub fn basis_factory(config: &BasisConfig) -> Result<Box<dyn BasisEngine>, CoefError> {
    let engine: Box<dyn BasisEngine> = match config.id.as_str() {
        POLAR_RINGS => Box::new(PolarRings::from_config(config)?),
        SPHERICAL_SHELLS => Box::new(SphericalShells::from_config(config)?),
        other => {
            return Err(CoefError::Config(
                ErrorInfo::new("basis-unknown", "unknown basis family")
                    .with_context("id", other)
                    .with_hint(format!("expected one of: {POLAR_RINGS}, {SPHERICAL_SHELLS}")),
            ))
        }
    };
    debug!(basis = %config.id, shape = ?engine.descriptor().shape, "constructed basis engine");
    Ok(engine)
}
