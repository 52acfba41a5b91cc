//! Frozen baseline statistics for a cohort's salary sample.

use super::{mean, sample_std};

/// Baseline mean, sample standard deviation, and ±3σ control limits.
///
/// Computed once from the cleaned, *unfiltered* sample and never updated
/// afterwards: any later display-only trimming (outlier removal) must not
/// feed back into these values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub mean: f64,
    pub std: f64,
    /// Upper control limit: mean + 3σ.
    pub ucl: f64,
    /// Lower control limit: mean − 3σ.
    pub lcl: f64,
}

impl Baseline {
    /// Compute the baseline from a salary slice. `None` for an empty slice;
    /// a single value yields `std = 0` and collapsed control limits.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mean = mean(values)?;
        let std = sample_std(values)?;
        Some(Baseline {
            mean,
            std,
            ucl: mean + 3.0 * std,
            lcl: mean - 3.0 * std,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_are_three_sigma() {
        let values = [10.0, 12.0, 14.0, 16.0, 18.0];
        let b = Baseline::from_values(&values).unwrap();
        assert!((b.mean - 14.0).abs() < 1e-12);
        assert!((b.ucl - (b.mean + 3.0 * b.std)).abs() < 1e-12);
        assert!((b.lcl - (b.mean - 3.0 * b.std)).abs() < 1e-12);
        assert!(b.lcl < b.mean && b.mean < b.ucl);
    }

    #[test]
    fn zero_variance_collapses_limits() {
        let values = [75_000.0; 8];
        let b = Baseline::from_values(&values).unwrap();
        assert_eq!(b.std, 0.0);
        assert_eq!(b.mean, 75_000.0);
        assert_eq!(b.ucl, 75_000.0);
        assert_eq!(b.lcl, 75_000.0);
    }

    #[test]
    fn empty_sample_is_none() {
        assert!(Baseline::from_values(&[]).is_none());
    }
}
