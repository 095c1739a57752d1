//! Fixed-range density histograms.

pub const HISTOGRAM_BINS: usize = 100;

/// Equal-width bins over `[low, high]`, normalized so the bars integrate to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub low: f64,
    pub high: f64,
    pub densities: Vec<f64>,
}

impl Histogram {
    /// Values outside the range and non-finite values are ignored; `high` falls in the last bin.
    pub fn density(values: &[f64], (low, high): (f64, f64), bins: usize) -> Self {
        let bins = bins.max(1);
        let width = (high - low) / bins as f64;
        let mut counts = vec![0usize; bins];
        let mut total = 0usize;
        for &value in values {
            if !value.is_finite() || value < low || value > high {
                continue;
            }
            let bin = (((value - low) / width) as usize).min(bins - 1);
            counts[bin] += 1;
            total += 1;
        }
        let densities = counts
            .into_iter()
            .map(|count| {
                if total == 0 {
                    0.0
                } else {
                    count as f64 / (total as f64 * width)
                }
            })
            .collect();
        Self { low, high, densities }
    }

    pub fn bin_width(&self) -> f64 {
        (self.high - self.low) / self.densities.len() as f64
    }

    /// `(left edge, right edge, density)` per bin.
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        let width = self.bin_width();
        self.densities.iter().enumerate().map(move |(i, &density)| {
            let left = self.low + i as f64 * width;
            (left, left + width, density)
        })
    }

    pub fn max_density(&self) -> f64 {
        self.densities.iter().copied().fold(0.0, f64::max)
    }

    pub fn min_positive_density(&self) -> Option<f64> {
        self.densities
            .iter()
            .copied()
            .filter(|d| *d > 0.0)
            .min_by(|a, b| a.total_cmp(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn densities_integrate_to_one() {
        let values: Vec<f64> = (0..50).map(|i| i as f64 / 10.0).collect();
        let hist = Histogram::density(&values, (0.0, 5.0), 10);
        let area: f64 = hist.densities.iter().map(|d| d * hist.bin_width()).sum();
        assert!((area - 1.0).abs() < 1e-12);
        assert_eq!(hist.bins().count(), 10);
    }

    #[test]
    fn upper_edge_lands_in_last_bin_and_outliers_are_dropped() {
        let hist = Histogram::density(&[0.0, 1.0, 2.0, f64::NAN, f64::INFINITY], (0.0, 1.0), 4);
        assert_eq!(hist.densities, vec![2.0, 0.0, 0.0, 2.0]);
        assert_eq!(hist.min_positive_density(), Some(2.0));
    }

    #[test]
    fn empty_input_gives_flat_zero() {
        let hist = Histogram::density(&[], (0.0, 1.0), HISTOGRAM_BINS);
        assert_eq!(hist.max_density(), 0.0);
        assert_eq!(hist.min_positive_density(), None);
    }
}
