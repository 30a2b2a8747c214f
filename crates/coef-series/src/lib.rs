//! Time indexed coefficient store.
//!
//! [`CoefficientSeries`] is the ordered store; [`CoefficientAccumulator`]
//! wraps it in an explicit `Empty -> Seeded -> Finalized` lifecycle so that
//! callers never special-case "no series yet".

pub mod accumulator;
pub mod persist;
pub mod series;

pub use accumulator::{AccumulatorState, CoefficientAccumulator};
pub use persist::{SeriesFormat, SERIES_SCHEMA};
pub use series::CoefficientSeries;
