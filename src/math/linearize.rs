//! Collapse of multi-dimensional metric vectors onto a sortable scalar key
//!
//! Each component is clamped into the library's bounds, normalised to `[0, 1]`
//! and weighted by a distinct power of two, so the resulting key orders
//! vectors primarily by their last component. Vectors pointing in different
//! directions can land on nearby keys; fast matching accepts that error.

use ndarray::{Array1, Zip};

/// Componentwise minimum and maximum over a set of metric vectors
#[derive(Debug, Clone, PartialEq)]
pub struct MetricBounds {
    /// Componentwise minimum
    pub min: Array1<f64>,
    /// Componentwise maximum
    pub max: Array1<f64>,
}

impl MetricBounds {
    /// Compute bounds over all vectors
    ///
    /// Returns `None` for an empty input or when vector lengths disagree.
    pub fn from_vectors<'a, I>(vectors: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Array1<f64>>,
    {
        let mut iter = vectors.into_iter();
        let first = iter.next()?;
        let mut min = first.clone();
        let mut max = first.clone();

        for vector in iter {
            if vector.len() != min.len() {
                return None;
            }
            Zip::from(&mut min)
                .and(&mut max)
                .and(vector)
                .for_each(|lo, hi, &value| {
                    *lo = lo.min(value);
                    *hi = hi.max(value);
                });
        }

        Some(Self { min, max })
    }

    /// Number of dimensions covered
    pub fn dimensions(&self) -> usize {
        self.min.len()
    }
}

/// Map a metric vector onto a scalar key
///
/// Component `i` contributes `normalised_i * 2^i`. A component whose bounds
/// collapse to a single value contributes nothing. Missing components (a
/// shorter vector) also contribute nothing.
pub fn linearize(vector: &Array1<f64>, bounds: &MetricBounds) -> f64 {
    let mut key = 0.0;
    let mut weight = 1.0;

    for ((&value, &lo), &hi) in vector.iter().zip(&bounds.min).zip(&bounds.max) {
        let range = hi - lo;
        if range > 0.0 {
            let normalised = (value.clamp(lo, hi) - lo) / range;
            key += normalised * weight;
        }
        weight *= 2.0;
    }

    key
}

/// Squared Euclidean distance between two metric vectors
///
/// Only relative order matters for matching, so the square root is skipped.
pub fn squared_distance(a: &Array1<f64>, b: &Array1<f64>) -> f64 {
    let delta = a - b;
    delta.dot(&delta)
}
