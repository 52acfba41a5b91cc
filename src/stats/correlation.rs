//! Pearson correlation and the salary-driver correlation ranking.

use crate::data::model::SurveyDataset;

use super::regression::encode_first_seen;
use super::{covariance, sample_std, tdist};

/// Result of a correlation computation.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationResult {
    /// Correlation coefficient in [-1, 1].
    pub r: f64,
    /// Two-tailed p-value for testing H₀: ρ = 0.
    pub p_value: f64,
    /// Sample size.
    pub n: usize,
}

impl CorrelationResult {
    /// Coefficient of determination for the paired scatter.
    pub fn r_squared(&self) -> f64 {
        self.r * self.r
    }
}

/// Pearson product-moment correlation with a t-test p-value
/// (t = r·√(n−2) / √(1−r²), df = n−2).
///
/// Returns `None` for fewer than 3 pairs, mismatched lengths, non-finite
/// input, or zero variance in either variable; callers render "no
/// correlation" rather than propagating NaN.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<CorrelationResult> {
    let n = x.len();
    if n < 3 || n != y.len() {
        return None;
    }
    if x.iter().any(|v| !v.is_finite()) || y.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let cov = covariance(x, y)?;
    let sx = sample_std(x)?;
    let sy = sample_std(y)?;
    if sx < 1e-300 || sy < 1e-300 {
        return None; // zero variance
    }

    let r = (cov / (sx * sy)).clamp(-1.0, 1.0);
    let df = (n - 2) as f64;
    let denom = (1.0 - r * r).max(1e-300);
    let t = r * (df / denom).sqrt();
    let p_value = tdist::two_tailed_p(t, df);

    Some(CorrelationResult { r, p_value, n })
}

// ---------------------------------------------------------------------------
// Correlation ranking (salary drivers)
// ---------------------------------------------------------------------------

/// One row of the correlation-ranking table.
#[derive(Debug, Clone)]
pub struct FactorCorrelation {
    pub factor: String,
    pub r: f64,
    pub p_value: f64,
    pub n: usize,
}

/// Correlate each factor column against the response over the given rows,
/// encoding factor values as first-seen integer codes, and rank by |r|
/// descending. Factors with `min_rows` or fewer complete pairs are skipped.
/// Ties keep the caller's factor order (the sort is stable).
pub fn rank_factor_correlations(
    dataset: &SurveyDataset,
    indices: &[usize],
    factors: &[&str],
    response: &str,
    min_rows: usize,
) -> Vec<FactorCorrelation> {
    let mut results = Vec::new();

    for &factor in factors {
        let mut factor_values = Vec::new();
        let mut response_values = Vec::new();
        for &i in indices {
            let Some(rec) = dataset.records.get(i) else { continue };
            let Some(val) = rec.get(factor) else { continue };
            if val.is_null() {
                continue;
            }
            let Some(y) = rec.numeric(response) else { continue };
            factor_values.push(val.clone());
            response_values.push(y);
        }

        if factor_values.len() <= min_rows {
            continue;
        }

        let encoded = encode_first_seen(&factor_values);
        if let Some(result) = pearson(&encoded, &response_values) {
            results.push(FactorCorrelation {
                factor: factor.to_string(),
                r: result.r,
                p_value: result.p_value,
                n: result.n,
            });
        }
    }

    results.sort_by(|a, b| b.r.abs().total_cmp(&a.r.abs()));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{FieldValue, SurveyRecord};

    #[test]
    fn perfect_linear_relation() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 6.0, 8.0, 10.0];
        let result = pearson(&x, &y).unwrap();
        assert!((result.r - 1.0).abs() < 1e-12);
        assert!((result.r_squared() - 1.0).abs() < 1e-12);
        assert!(result.p_value < 1e-6);
    }

    #[test]
    fn zero_variance_is_none() {
        let x = [3.0, 3.0, 3.0, 3.0];
        let y = [1.0, 2.0, 3.0, 4.0];
        assert!(pearson(&x, &y).is_none());
        assert!(pearson(&y, &x).is_none());
    }

    #[test]
    fn weak_relation_has_large_p() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let y = [5.0, 3.0, 6.0, 2.0, 7.0, 4.0, 5.0, 4.0];
        let result = pearson(&x, &y).unwrap();
        assert!(result.r.abs() < 0.5);
        assert!(result.p_value > 0.2);
    }

    #[test]
    fn ranking_sorts_by_absolute_r() {
        // Salary tracks experience strongly; membership only weakly.
        let records: Vec<SurveyRecord> = (0..40)
            .map(|i| {
                let mut rec = SurveyRecord::default();
                rec.fields
                    .insert("Experience".into(), FieldValue::Integer(i as i64));
                rec.fields.insert(
                    "Member".into(),
                    FieldValue::String(if i % 7 == 0 { "Yes" } else { "No" }.into()),
                );
                rec.fields.insert(
                    "SalaryUSD".into(),
                    FieldValue::Float(50_000.0 + 3_000.0 * i as f64 + ((i * 37) % 11) as f64 * 500.0),
                );
                rec
            })
            .collect();
        let ds = SurveyDataset::from_records(records);
        let indices: Vec<usize> = (0..ds.len()).collect();

        let ranked =
            rank_factor_correlations(&ds, &indices, &["Member", "Experience"], "SalaryUSD", 10);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].factor, "Experience");
        assert!(ranked[0].r > 0.9);
    }

    #[test]
    fn sparse_factors_are_skipped() {
        let records: Vec<SurveyRecord> = (0..8)
            .map(|i| {
                let mut rec = SurveyRecord::default();
                rec.fields
                    .insert("Experience".into(), FieldValue::Integer(i as i64));
                rec.fields
                    .insert("SalaryUSD".into(), FieldValue::Float(60_000.0 + i as f64));
                rec
            })
            .collect();
        let ds = SurveyDataset::from_records(records);
        let indices: Vec<usize> = (0..ds.len()).collect();
        // Only 8 complete rows, below the >10 requirement.
        let ranked = rank_factor_correlations(&ds, &indices, &["Experience"], "SalaryUSD", 10);
        assert!(ranked.is_empty());
    }
}
