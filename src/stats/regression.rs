//! Multiple OLS regression of salary on encoded survey factors.

use crate::data::model::{FieldValue, SurveyDataset};

use super::{linalg, tdist};

// ---------------------------------------------------------------------------
// Factor encoding
// ---------------------------------------------------------------------------

/// Encode values as integer codes **in order of first appearance**.
///
/// The code assignment is deterministic and data-ordered, never
/// alphabetical: `["No", "Yes", "No"]` encodes as `[0, 1, 0]` and
/// `["Yes", "No", "Yes"]` as `[0, 1, 0]`. Coefficient signs and the
/// |impact| ranking downstream depend on this ordering, so it must not
/// change.
pub fn encode_first_seen(values: &[FieldValue]) -> Vec<f64> {
    let mut codes: Vec<&FieldValue> = Vec::new();
    values
        .iter()
        .map(|v| {
            if let Some(pos) = codes.iter().position(|&seen| seen == v) {
                pos as f64
            } else {
                codes.push(v);
                (codes.len() - 1) as f64
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// OLS
// ---------------------------------------------------------------------------

/// A fitted linear model `salary = β₀ + Σ βⱼ·factorⱼ`.
#[derive(Debug, Clone)]
pub struct LinearModel {
    /// Factor column names, in the order supplied by the caller.
    pub factors: Vec<String>,
    /// `[β₀, β₁, …, βₚ]`, intercept first.
    pub coefficients: Vec<f64>,
    /// Standard error per coefficient.
    pub std_errors: Vec<f64>,
    /// t statistic per coefficient.
    pub t_statistics: Vec<f64>,
    /// Two-tailed p-value per coefficient.
    pub p_values: Vec<f64>,
    pub r_squared: f64,
    pub n: usize,
}

/// One row of the driver-ranking table.
#[derive(Debug, Clone)]
pub struct DriverRow {
    pub factor: String,
    pub beta: f64,
    pub p_value: f64,
    /// |beta|; the display sorts on this.
    pub impact: f64,
}

impl LinearModel {
    /// Factors ranked by |coefficient| descending. The sort is stable, so
    /// equal impacts keep the original factor order.
    pub fn ranked_by_impact(&self) -> Vec<DriverRow> {
        let mut rows: Vec<DriverRow> = self
            .factors
            .iter()
            .enumerate()
            .map(|(j, factor)| DriverRow {
                factor: factor.clone(),
                beta: self.coefficients[j + 1],
                p_value: self.p_values[j + 1],
                impact: self.coefficients[j + 1].abs(),
            })
            .collect();
        rows.sort_by(|a, b| b.impact.total_cmp(&a.impact));
        rows
    }
}

/// Fit `response ~ factors` over the given rows by ordinary least squares.
///
/// Rows missing the response or any factor cell are excluded (complete-case
/// analysis); factor cells are then encoded first-seen, an intercept column
/// is prepended, and the normal equations `X'Xβ = X'y` are solved directly.
///
/// Returns `None` when fewer than `p + 2` complete rows remain or the
/// system is singular (e.g. a factor with a single level).
pub fn fit_linear_model(
    dataset: &SurveyDataset,
    indices: &[usize],
    factors: &[&str],
    response: &str,
) -> Option<LinearModel> {
    let p = factors.len();
    if p == 0 {
        return None;
    }

    // Complete-case rows.
    let mut raw_columns: Vec<Vec<FieldValue>> = vec![Vec::new(); p];
    let mut y = Vec::new();
    'rows: for &i in indices {
        let Some(rec) = dataset.records.get(i) else { continue };
        let Some(resp) = rec.numeric(response) else { continue };
        let mut row_cells = Vec::with_capacity(p);
        for &factor in factors {
            match rec.get(factor) {
                Some(v) if !v.is_null() => row_cells.push(v.clone()),
                _ => continue 'rows,
            }
        }
        for (col, cell) in raw_columns.iter_mut().zip(row_cells) {
            col.push(cell);
        }
        y.push(resp);
    }

    let n = y.len();
    if n < p + 2 {
        return None;
    }

    let encoded: Vec<Vec<f64>> = raw_columns.iter().map(|col| encode_first_seen(col)).collect();

    // Design matrix rows: [1, x₁, …, xₚ].
    let n_coef = p + 1;
    let design_row = |i: usize| {
        let mut row = Vec::with_capacity(n_coef);
        row.push(1.0);
        for col in &encoded {
            row.push(col[i]);
        }
        row
    };

    // Normal equations.
    let mut xtx = vec![vec![0.0; n_coef]; n_coef];
    let mut xty = vec![0.0; n_coef];
    for i in 0..n {
        let row = design_row(i);
        for a in 0..n_coef {
            xty[a] += row[a] * y[i];
            for b in 0..n_coef {
                xtx[a][b] += row[a] * row[b];
            }
        }
    }

    let coefficients = linalg::solve(xtx.clone(), xty)?;
    let xtx_inv = linalg::invert(&xtx)?;

    // Residual sum of squares and R².
    let y_mean = y.iter().sum::<f64>() / n as f64;
    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for i in 0..n {
        let row = design_row(i);
        let fitted: f64 = row
            .iter()
            .zip(coefficients.iter())
            .map(|(x, b)| x * b)
            .sum();
        ss_res += (y[i] - fitted).powi(2);
        ss_tot += (y[i] - y_mean).powi(2);
    }
    let r_squared = if ss_tot > 1e-300 {
        1.0 - ss_res / ss_tot
    } else {
        1.0
    };

    let df = (n - n_coef) as f64;
    if df <= 0.0 {
        return None;
    }
    let mse = ss_res / df;

    let std_errors: Vec<f64> = (0..n_coef)
        .map(|j| (mse * xtx_inv[j][j]).max(0.0).sqrt())
        .collect();
    let t_statistics: Vec<f64> = coefficients
        .iter()
        .zip(std_errors.iter())
        .map(|(&b, &se)| if se > 1e-300 { b / se } else { f64::INFINITY })
        .collect();
    let p_values: Vec<f64> = t_statistics
        .iter()
        .map(|&t| tdist::two_tailed_p(t, df))
        .collect();

    Some(LinearModel {
        factors: factors.iter().map(|s| s.to_string()).collect(),
        coefficients,
        std_errors,
        t_statistics,
        p_values,
        r_squared,
        n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::SurveyRecord;

    #[test]
    fn encoding_is_first_seen_not_alphabetical() {
        let values = vec![
            FieldValue::String("No".into()),
            FieldValue::String("Yes".into()),
            FieldValue::String("No".into()),
            FieldValue::String("Yes".into()),
        ];
        assert_eq!(encode_first_seen(&values), vec![0.0, 1.0, 0.0, 1.0]);

        // Reversed appearance order flips the codes.
        let reversed = vec![
            FieldValue::String("Yes".into()),
            FieldValue::String("No".into()),
        ];
        assert_eq!(encode_first_seen(&reversed), vec![0.0, 1.0]);
    }

    #[test]
    fn encoding_handles_mixed_types() {
        let values = vec![
            FieldValue::Bool(true),
            FieldValue::Integer(7),
            FieldValue::Bool(true),
            FieldValue::Integer(3),
        ];
        assert_eq!(encode_first_seen(&values), vec![0.0, 1.0, 0.0, 2.0]);
    }

    fn synthetic_dataset() -> SurveyDataset {
        // salary = 40_000 + 3_000·exp + 10_000·member(code) exactly.
        let records: Vec<SurveyRecord> = (0..30)
            .map(|i| {
                let member = i % 2; // first-seen: code 0 for i=0 ("A"), 1 for "B"
                let mut rec = SurveyRecord::default();
                rec.fields
                    .insert("Experience".into(), FieldValue::Integer(i as i64));
                rec.fields.insert(
                    "Member".into(),
                    FieldValue::String(if member == 0 { "A" } else { "B" }.into()),
                );
                rec.fields.insert(
                    "SalaryUSD".into(),
                    FieldValue::Float(40_000.0 + 3_000.0 * i as f64 + 10_000.0 * member as f64),
                );
                rec
            })
            .collect();
        SurveyDataset::from_records(records)
    }

    #[test]
    fn recovers_exact_coefficients() {
        let ds = synthetic_dataset();
        let indices: Vec<usize> = (0..ds.len()).collect();
        let model =
            fit_linear_model(&ds, &indices, &["Experience", "Member"], "SalaryUSD").unwrap();

        assert!((model.coefficients[0] - 40_000.0).abs() < 1e-6);
        assert!((model.coefficients[1] - 3_000.0).abs() < 1e-6);
        assert!((model.coefficients[2] - 10_000.0).abs() < 1e-6);
        assert!((model.r_squared - 1.0).abs() < 1e-9);

        // An exact fit drives the standard errors to ~0 and the t statistics
        // off the chart; the p-values must still be well defined.
        assert_eq!(model.std_errors.len(), 3);
        assert!(model.std_errors.iter().all(|se| *se < 1e-3));
        assert!(model.t_statistics.iter().all(|t| !t.is_nan()));
        assert!(model.p_values.iter().all(|p| *p < 1e-6));

        let ranked = model.ranked_by_impact();
        assert_eq!(ranked[0].factor, "Member");
        assert_eq!(ranked[1].factor, "Experience");
        assert!((ranked[0].impact - 10_000.0).abs() < 1e-6);
    }

    #[test]
    fn single_level_factor_is_singular() {
        let records: Vec<SurveyRecord> = (0..10)
            .map(|i| {
                let mut rec = SurveyRecord::default();
                rec.fields
                    .insert("Member".into(), FieldValue::String("Yes".into()));
                rec.fields
                    .insert("SalaryUSD".into(), FieldValue::Float(60_000.0 + i as f64));
                rec
            })
            .collect();
        let ds = SurveyDataset::from_records(records);
        let indices: Vec<usize> = (0..ds.len()).collect();
        assert!(fit_linear_model(&ds, &indices, &["Member"], "SalaryUSD").is_none());
    }

    #[test]
    fn too_few_complete_rows_is_none() {
        let ds = synthetic_dataset();
        // Only two rows available.
        assert!(fit_linear_model(&ds, &[0, 1], &["Experience", "Member"], "SalaryUSD").is_none());
    }
}
