//! Real spherical-harmonic moments accumulated on radial shells.

use std::f64::consts::PI;

use coef_core::errors::{CoefError, ErrorInfo};
use coef_core::{BasisConfig, BasisDescriptor, BasisEngine, CoefficientSet, Particle};

use crate::{degenerate, non_finite, shell_index};

/// Identifier used in basis configuration files.
pub const SPHERICAL_SHELLS: &str = "spherical-shells";

/// Sphere basis: `Y_lm(theta, phi)` moments per radial shell.
///
/// Row `l * l + l + m` holds harmonic `(l, m)` for `-l <= m <= l`, negative
/// `m` selecting the sine-type real harmonic.
#[derive(Debug, Clone)]
pub struct SphericalShells {
    lmax: usize,
    nmax: usize,
    rmax: f64,
    norms: Vec<Vec<f64>>,
    descriptor: BasisDescriptor,
}

impl SphericalShells {
    /// Builds the engine from `lmax`, `nmax` and `rmax`.
    pub fn from_config(config: &BasisConfig) -> Result<Self, CoefError> {
        let lmax = config.usize_param("lmax")?;
        let nmax = config.usize_param("nmax")?;
        let rmax = config.f64_param("rmax")?;
        if nmax == 0 || rmax <= 0.0 {
            return Err(CoefError::Config(
                ErrorInfo::new("basis-param-invalid", "nmax and rmax must be positive")
                    .with_context("basis", config.id.clone()),
            ));
        }
        let rows = lmax
            .checked_add(1)
            .and_then(|degrees| degrees.checked_mul(degrees))
            .ok_or_else(|| {
                CoefError::Config(
                    ErrorInfo::new("basis-param-invalid", "lmax is too large")
                        .with_context("basis", config.id.clone()),
                )
            })?;
        let descriptor = BasisDescriptor::from_config(config, vec![rows, nmax])?;
        Ok(Self {
            lmax,
            nmax,
            rmax,
            norms: normalization(lmax),
            descriptor,
        })
    }

    /// Evaluates all real harmonics at one direction, in row order.
    fn harmonics(&self, cos_theta: f64, phi: f64) -> Vec<f64> {
        let plm = legendre(self.lmax, cos_theta);
        let mut out = vec![0.0; (self.lmax + 1) * (self.lmax + 1)];
        for l in 0..=self.lmax {
            let base = l * l + l;
            out[base] = self.norms[l][0] * plm[l][0];
            for m in 1..=l {
                let scaled = std::f64::consts::SQRT_2 * self.norms[l][m] * plm[l][m];
                let angle = m as f64 * phi;
                out[base + m] = scaled * angle.cos();
                out[base - m] = scaled * angle.sin();
            }
        }
        out
    }
}

impl BasisEngine for SphericalShells {
    fn descriptor(&self) -> &BasisDescriptor {
        &self.descriptor
    }

    fn project(
        &self,
        time: f64,
        component: &str,
        particles: &mut dyn Iterator<Item = Particle>,
    ) -> Result<CoefficientSet, CoefError> {
        let rows = self.descriptor.shape[0];
        let mut values = vec![0.0; rows * self.nmax];
        let mut enclosed = 0.0;
        for particle in particles {
            if !particle.is_finite() {
                return Err(non_finite(SPHERICAL_SHELLS, time));
            }
            let [x, y, z] = particle.pos;
            let radius = (x * x + y * y + z * z).sqrt();
            if radius > self.rmax {
                continue;
            }
            let n = shell_index(radius, self.rmax, self.nmax);
            let cos_theta = if radius > 0.0 { z / radius } else { 1.0 };
            let phi = y.atan2(x);
            enclosed += particle.mass;
            for (row, ylm) in self.harmonics(cos_theta, phi).into_iter().enumerate() {
                values[row * self.nmax + n] += particle.mass * ylm;
            }
        }
        if enclosed <= 0.0 {
            return Err(degenerate(SPHERICAL_SHELLS, time, enclosed));
        }
        for value in &mut values {
            *value /= enclosed;
        }
        CoefficientSet::new(time, component, self.descriptor.clone(), values)
    }
}

/// Associated Legendre functions `P_l^m(x)` for `0 <= m <= l <= lmax`.
fn legendre(lmax: usize, x: f64) -> Vec<Vec<f64>> {
    let mut p: Vec<Vec<f64>> = (0..=lmax).map(|l| vec![0.0; l + 1]).collect();
    let somx2 = ((1.0 - x) * (1.0 + x)).max(0.0).sqrt();
    p[0][0] = 1.0;
    for m in 0..=lmax {
        if m > 0 {
            p[m][m] = -((2 * m - 1) as f64) * somx2 * p[m - 1][m - 1];
        }
        if m < lmax {
            p[m + 1][m] = x * (2 * m + 1) as f64 * p[m][m];
        }
        for l in (m + 2)..=lmax {
            p[l][m] = ((2 * l - 1) as f64 * x * p[l - 1][m] - (l + m - 1) as f64 * p[l - 2][m])
                / (l - m) as f64;
        }
    }
    p
}

/// `sqrt((2l+1)/(4 pi) * (l-m)!/(l+m)!)`.
fn normalization(lmax: usize) -> Vec<Vec<f64>> {
    (0..=lmax)
        .map(|l| {
            (0..=l)
                .map(|m| {
                    let ratio: f64 = ((l - m + 1)..=(l + m)).map(|k| 1.0 / k as f64).product();
                    ((2 * l + 1) as f64 / (4.0 * PI) * ratio).sqrt()
                })
                .collect()
        })
        .collect()
}
