//! Frequency and histogram primitives used by the impurity calculator.
//!
//! Kept behind [`NumericKernel`] so an accelerated backend can replace the
//! scalar loops without touching split search or tree growth.

/// Equal-width histogram over the range of a set of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Number of values falling into each bin.
    pub counts: Vec<usize>,
    /// Lower edge of the first bin.
    pub min: f64,
    /// Width of every bin. Always finite; zero when all values are equal.
    pub bin_width: f64,
}

/// Narrow numeric interface for the hot loops of impurity computation.
pub trait NumericKernel {
    /// Count occurrences of each non-negative integer.
    ///
    /// The result has length `max(max_value + 1, min_length)`.
    fn bincount(&self, values: &[usize], min_length: usize) -> Vec<usize>;

    /// Bin `values` into `n_bins` equal-width bins spanning `[min, max]`.
    ///
    /// The maximum value is counted in the last bin. An empty input yields
    /// all-zero counts with `min = 0` and `bin_width = 0`.
    fn histogram(&self, values: &[f64], n_bins: usize) -> Histogram;
}

/// Straightforward single-threaded kernel.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarKernel;

impl NumericKernel for ScalarKernel {
    fn bincount(&self, values: &[usize], min_length: usize) -> Vec<usize> {
        let len = values
            .iter()
            .max()
            .map_or(0, |&m| m + 1)
            .max(min_length);
        let mut counts = vec![0usize; len];
        for &v in values {
            counts[v] += 1;
        }
        counts
    }

    fn histogram(&self, values: &[f64], n_bins: usize) -> Histogram {
        let mut counts = vec![0usize; n_bins];
        if values.is_empty() || n_bins == 0 {
            return Histogram {
                counts,
                min: 0.0,
                bin_width: 0.0,
            };
        }

        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let bins = n_bins as f64;
        let mut bin_width = (max - min) / bins;
        // The span of two huge values of opposite sign overflows.
        if !bin_width.is_finite() {
            bin_width = (max / bins - min / bins).min(f64::MAX);
        }

        let last = n_bins - 1;
        for &v in values {
            let bin = if bin_width > 0.0 {
                // Saturating float-to-int cast keeps this in range.
                (((v - min) / bin_width).floor() as usize).min(last)
            } else {
                0
            };
            counts[bin] += 1;
        }

        Histogram {
            counts,
            min,
            bin_width,
        }
    }
}
