use coef_core::errors::{CoefError, ErrorInfo};
use coef_core::{BasisDescriptor, CoefficientSet};
use serde::{Deserialize, Serialize};

/// Time ordered collection of coefficient sets sharing one basis.
///
/// A series always holds at least one entry: it is created from a seed set
/// and only ever grows through [`CoefficientSeries::add`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SeriesParts")]
pub struct CoefficientSeries {
    basis: BasisDescriptor,
    entries: Vec<CoefficientSet>,
}

/// Unchecked serialized form; only reaches a series through `from_entries`.
#[derive(Deserialize)]
struct SeriesParts {
    basis: BasisDescriptor,
    entries: Vec<CoefficientSet>,
}

impl TryFrom<SeriesParts> for CoefficientSeries {
    type Error = CoefError;

    fn try_from(parts: SeriesParts) -> Result<Self, Self::Error> {
        let series = Self::from_entries(parts.entries)?;
        if series.basis != parts.basis {
            return Err(CoefError::IncompatibleBasis(ErrorInfo::new(
                "series-basis-mismatch",
                "series basis differs from its entries",
            )));
        }
        Ok(series)
    }
}

impl CoefficientSeries {
    /// Starts a series from its first coefficient set.
    ///
    /// The seed fixes the reference basis. Its time must be finite.
    pub fn from_seed(seed: CoefficientSet) -> Result<Self, CoefError> {
        if !seed.time().is_finite() {
            return Err(CoefError::OutOfOrderTime(
                ErrorInfo::new("series-time-non-finite", "coefficient time must be finite")
                    .with_context("time", seed.time().to_string()),
            ));
        }
        if seed.values().len() != seed.basis().len() {
            return Err(length_mismatch(seed.basis().len(), seed.values().len()));
        }
        Ok(Self {
            basis: seed.basis().clone(),
            entries: vec![seed],
        })
    }

    /// Rebuilds a series from stored entries, re-checking every invariant.
    pub fn from_entries(entries: Vec<CoefficientSet>) -> Result<Self, CoefError> {
        let mut iter = entries.into_iter();
        let seed = iter.next().ok_or_else(|| {
            CoefError::Serde(ErrorInfo::new("series-empty", "a series needs at least one entry"))
        })?;
        let mut series = Self::from_seed(seed)?;
        for entry in iter {
            series.add(entry)?;
        }
        Ok(series)
    }

    /// Validates `set` against the series without modifying it.
    pub fn check(&self, set: &CoefficientSet) -> Result<(), CoefError> {
        let last = self.last_time();
        if set.time().is_nan() || set.time() <= last {
            return Err(CoefError::OutOfOrderTime(
                ErrorInfo::new("series-out-of-order", "time must exceed the latest entry")
                    .with_context("time", set.time().to_string())
                    .with_context("latest", last.to_string()),
            ));
        }
        if !self.basis.is_compatible(set.basis()) {
            return Err(CoefError::IncompatibleBasis(
                ErrorInfo::new("series-basis-mismatch", "basis differs from the series seed")
                    .with_context("expected_kind", self.basis.kind.clone())
                    .with_context("found_kind", set.basis().kind.clone())
                    .with_context("expected_shape", format!("{:?}", self.basis.shape))
                    .with_context("found_shape", format!("{:?}", set.basis().shape)),
            ));
        }
        if set.values().len() != self.basis.len() {
            return Err(length_mismatch(self.basis.len(), set.values().len()));
        }
        Ok(())
    }

    /// Appends `set`, which must be strictly later than every entry and
    /// computed under the seed's basis. On error the series is unchanged.
    pub fn add(&mut self, set: CoefficientSet) -> Result<(), CoefError> {
        self.check(&set)?;
        self.entries.push(set);
        Ok(())
    }

    /// Reference basis fixed by the seed.
    pub fn basis(&self) -> &BasisDescriptor {
        &self.basis
    }

    /// Component name recorded on the seed entry.
    pub fn component(&self) -> &str {
        self.entries[0].component()
    }

    /// All entry times in increasing order.
    pub fn times(&self) -> Vec<f64> {
        self.entries.iter().map(CoefficientSet::time).collect()
    }

    /// Latest time in the series.
    pub fn last_time(&self) -> f64 {
        self.entries[self.entries.len() - 1].time()
    }

    /// First and last time.
    pub fn time_range(&self) -> (f64, f64) {
        (self.entries[0].time(), self.last_time())
    }

    /// Entry recorded at exactly `time`.
    pub fn at(&self, time: f64) -> Option<&CoefficientSet> {
        self.entries
            .binary_search_by(|entry| entry.time().total_cmp(&time))
            .ok()
            .map(|idx| &self.entries[idx])
    }

    /// Entry whose time is closest to `time`; ties go to the earlier entry.
    pub fn nearest(&self, time: f64) -> Option<&CoefficientSet> {
        if time.is_nan() {
            return None;
        }
        let idx = self.entries.partition_point(|entry| entry.time() < time);
        let after = self.entries.get(idx);
        let before = idx.checked_sub(1).and_then(|i| self.entries.get(i));
        match (before, after) {
            (Some(b), Some(a)) => {
                if (time - b.time()) <= (a.time() - time) {
                    Some(b)
                } else {
                    Some(a)
                }
            }
            (Some(b), None) => Some(b),
            (None, a) => a,
        }
    }

    /// Iterates over entries in time order.
    pub fn iter(&self) -> std::slice::Iter<'_, CoefficientSet> {
        self.entries.iter()
    }

    /// Number of entries (never zero).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; kept for API symmetry with collections.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consumes the series, returning its entries.
    pub fn into_entries(self) -> Vec<CoefficientSet> {
        self.entries
    }
}

fn length_mismatch(expected: usize, found: usize) -> CoefError {
    CoefError::IncompatibleBasis(
        ErrorInfo::new("series-length-mismatch", "coefficient count does not match shape")
            .with_context("expected", expected.to_string())
            .with_context("found", found.to_string()),
    )
}

impl<'a> IntoIterator for &'a CoefficientSeries {
    type Item = &'a CoefficientSet;
    type IntoIter = std::slice::Iter<'a, CoefficientSet>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
