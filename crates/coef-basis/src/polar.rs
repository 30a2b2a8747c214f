//! Azimuthal harmonics accumulated on concentric annuli.

use coef_core::errors::{CoefError, ErrorInfo};
use coef_core::{BasisConfig, BasisDescriptor, BasisEngine, CoefficientSet, Particle};

use crate::{degenerate, non_finite, shell_index};

/// Identifier used in basis configuration files.
pub const POLAR_RINGS: &str = "polar-rings";

/// Disk basis: `cos(m phi)` / `sin(m phi)` moments per annulus.
///
/// Rows are ordered by `m`; each `m` contributes a cosine row and, for
/// `m > 0`, a sine row. Columns are annuli of width `rmax / nmax`.
#[derive(Debug, Clone)]
pub struct PolarRings {
    mmin: usize,
    mmax: usize,
    nmax: usize,
    rmax: f64,
    descriptor: BasisDescriptor,
}

impl PolarRings {
    /// Builds the engine from `mmin` (default 0), `mmax`, `nmax` and `rmax`.
    pub fn from_config(config: &BasisConfig) -> Result<Self, CoefError> {
        let mmin = config.usize_param_or("mmin", 0)?;
        let mmax = config.usize_param("mmax")?;
        let nmax = config.usize_param("nmax")?;
        let rmax = config.f64_param("rmax")?;
        if mmin > mmax {
            return Err(invalid(config, "mmin must not exceed mmax"));
        }
        if nmax == 0 {
            return Err(invalid(config, "nmax must be positive"));
        }
        if rmax <= 0.0 {
            return Err(invalid(config, "rmax must be positive"));
        }
        let rows = (mmax - mmin)
            .checked_add(1)
            .and_then(|orders| orders.checked_mul(2))
            .map(|rows| if mmin == 0 { rows - 1 } else { rows })
            .ok_or_else(|| invalid(config, "mmax is too large"))?;
        let descriptor = BasisDescriptor::from_config(config, vec![rows, nmax])?;
        Ok(Self {
            mmin,
            mmax,
            nmax,
            rmax,
            descriptor,
        })
    }

    fn rows(&self) -> usize {
        self.descriptor.shape[0]
    }
}

impl BasisEngine for PolarRings {
    fn descriptor(&self) -> &BasisDescriptor {
        &self.descriptor
    }

    fn project(
        &self,
        time: f64,
        component: &str,
        particles: &mut dyn Iterator<Item = Particle>,
    ) -> Result<CoefficientSet, CoefError> {
        let mut values = vec![0.0; self.rows() * self.nmax];
        let mut enclosed = 0.0;
        for particle in particles {
            if !particle.is_finite() {
                return Err(non_finite(POLAR_RINGS, time));
            }
            let [x, y, _] = particle.pos;
            let radius = x.hypot(y);
            if radius > self.rmax {
                continue;
            }
            let n = shell_index(radius, self.rmax, self.nmax);
            let phi = y.atan2(x);
            enclosed += particle.mass;
            let mut row = 0;
            for m in self.mmin..=self.mmax {
                let angle = m as f64 * phi;
                values[row * self.nmax + n] += particle.mass * angle.cos();
                row += 1;
                if m > 0 {
                    values[row * self.nmax + n] += particle.mass * angle.sin();
                    row += 1;
                }
            }
        }
        if enclosed <= 0.0 {
            return Err(degenerate(POLAR_RINGS, time, enclosed));
        }
        for value in &mut values {
            *value /= enclosed;
        }
        CoefficientSet::new(time, component, self.descriptor.clone(), values)
    }
}

fn invalid(config: &BasisConfig, message: &str) -> CoefError {
    CoefError::Config(
        ErrorInfo::new("basis-param-invalid", message).with_context("basis", config.id.clone()),
    )
}
