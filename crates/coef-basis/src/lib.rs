//! Reference basis engines and the configuration driven factory.
//!
//! Two families are provided: [`PolarRings`] for disks and
//! [`SphericalShells`] for spheroids. Both accumulate mass-weighted angular
//! moments on radial bins and normalise by the enclosed mass.

pub mod factory;
pub mod polar;
pub mod spherical;

use coef_core::errors::{CoefError, ErrorInfo};

pub use factory::{basis_factory, load_basis_config, parse_basis_config};
pub use polar::{PolarRings, POLAR_RINGS};
pub use spherical::{SphericalShells, SPHERICAL_SHELLS};

/// Radial bin of `radius` among `nmax` equal-width bins out to `rmax`.
pub(crate) fn shell_index(radius: f64, rmax: f64, nmax: usize) -> usize {
    let raw = (radius / rmax * nmax as f64).floor() as usize;
    raw.min(nmax - 1)
}

pub(crate) fn degenerate(basis: &str, time: f64, enclosed: f64) -> CoefError {
    CoefError::BasisComputation(
        ErrorInfo::new("basis-degenerate", "no mass inside the expansion radius")
            .with_context("basis", basis)
            .with_context("time", time.to_string())
            .with_context("enclosed_mass", enclosed.to_string()),
    )
}

pub(crate) fn non_finite(basis: &str, time: f64) -> CoefError {
    CoefError::BasisComputation(
        ErrorInfo::new("basis-non-finite", "particle with non-finite phase-space value")
            .with_context("basis", basis)
            .with_context("time", time.to_string()),
    )
}
