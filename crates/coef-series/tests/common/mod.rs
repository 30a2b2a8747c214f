#![allow(dead_code)]

use coef_core::{BasisConfig, BasisDescriptor, CoefficientSet};
use serde_json::json;

pub fn basis(nmax: u64) -> BasisDescriptor {
    let config = BasisConfig::new("polar-rings")
        .with_parameter("mmax", json!(0))
        .with_parameter("nmax", json!(nmax))
        .with_parameter("rmax", json!(1.0));
    BasisDescriptor::from_config(&config, vec![1, nmax as usize]).unwrap()
}

pub fn set_at(time: f64) -> CoefficientSet {
    set_with(time, basis(2))
}

pub fn set_with(time: f64, basis: BasisDescriptor) -> CoefficientSet {
    let values = (0..basis.len()).map(|i| time + i as f64).collect();
    CoefficientSet::new(time, "dark halo", basis, values).unwrap()
}
