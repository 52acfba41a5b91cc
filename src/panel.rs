//! The SPC band pipeline: clean a cohort's (experience, salary) sample,
//! freeze baseline control limits, trim the display sample, fit the
//! best-fit curve, and package the summary. Pure arithmetic; rendering
//! lives in `ui::plot`, which only draws what is computed here.

use crate::stats::baseline::Baseline;
use crate::stats::correlation::pearson;
use crate::stats::polyfit;

/// Number of evaluation points for the fitted curve.
const CURVE_GRID: usize = 200;
/// Minimum display points before a curve fit is attempted.
const CURVE_MIN_POINTS: usize = 5;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Per-panel knobs. Sanity bounds discard entry errors (hourly rates,
/// salaries in thousands) before any statistics are computed.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelConfig {
    /// Lower salary sanity bound (inclusive).
    pub min_salary: f64,
    /// Upper salary sanity bound (inclusive).
    pub max_salary: f64,
    /// Minimum cleaned sample size; below this the panel reports
    /// insufficient data instead of plotting.
    pub min_points: usize,
    /// Degree of the best-fit polynomial (2 or 3).
    pub curve_degree: usize,
    /// Trim display points above the frozen UCL. The limit itself is always
    /// computed from the untrimmed sample; LCL never trims.
    pub remove_outliers: bool,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            min_salary: 10_000.0,
            max_salary: 500_000.0,
            min_points: 12,
            curve_degree: 2,
            remove_outliers: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Summary statistics reported alongside the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelSummary {
    /// Rows surviving cleaning (missing values and sanity bounds).
    pub n_clean: usize,
    /// Rows actually plotted (after optional outlier trim).
    pub n_display: usize,
    pub mean: f64,
    pub std: f64,
    pub ucl: f64,
    pub lcl: f64,
    /// Pearson r over the display sample; `None` when degenerate.
    pub correlation: Option<f64>,
    /// R² over the display sample; `None` when degenerate.
    pub r_squared: Option<f64>,
}

/// Everything `ui::plot` needs to draw one cohort chart.
#[derive(Debug, Clone)]
pub struct SpcPanel {
    pub title: String,
    /// The display sample: scatter points after optional trimming.
    pub display: Vec<(f64, f64)>,
    /// The fitted curve evaluated on an even grid, when feasible.
    pub curve: Option<Vec<(f64, f64)>>,
    /// Frozen baseline statistics (pre-trim).
    pub baseline: Baseline,
    /// Vertical axis range: covers display extremes *and* LCL/UCL with a
    /// 5% margin, so control lines are never clipped.
    pub y_range: (f64, f64),
    /// x position for the Mean/UCL/LCL labels, just right of the data.
    pub label_x: f64,
    pub summary: PanelSummary,
}

/// Soft result of a panel build: a drawable panel, or a reason the cohort
/// could not be plotted. Never an error.
#[derive(Debug, Clone)]
pub enum PanelOutcome {
    Panel(Box<SpcPanel>),
    InsufficientData { title: String, reason: String },
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Build one cohort panel from raw (experience, salary) pairs.
///
/// Order matters: the baseline is computed from the cleaned sample *before*
/// the outlier trim and reused unchanged by every later step.
pub fn build_panel(sample: &[(f64, f64)], title: &str, config: &PanelConfig) -> PanelOutcome {
    let total = sample.len();

    // Step 1: cleaning. Pairs with a missing value were dropped during
    // extraction; non-finite leftovers and out-of-bounds salaries go here.
    let clean: Vec<(f64, f64)> = sample
        .iter()
        .copied()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .filter(|(_, y)| *y >= config.min_salary && *y <= config.max_salary)
        .collect();

    if clean.len() < config.min_points {
        return PanelOutcome::InsufficientData {
            title: title.to_string(),
            reason: format!(
                "{} of {} rows usable after cleaning (minimum {})",
                clean.len(),
                total,
                config.min_points
            ),
        };
    }

    // Step 2: frozen baseline over the cleaned, unfiltered salaries.
    let salaries: Vec<f64> = clean.iter().map(|&(_, y)| y).collect();
    let baseline = match Baseline::from_values(&salaries) {
        Some(b) => b,
        None => {
            return PanelOutcome::InsufficientData {
                title: title.to_string(),
                reason: "no salary values after cleaning".to_string(),
            };
        }
    };

    // Step 3: display filtering against the frozen UCL only.
    let display: Vec<(f64, f64)> = if config.remove_outliers {
        clean
            .iter()
            .copied()
            .filter(|&(_, y)| y <= baseline.ucl)
            .collect()
    } else {
        clean
    };

    // Step 4: best-fit curve over the display sample.
    let curve = if display.len() > CURVE_MIN_POINTS {
        let x_min = display.iter().map(|&(x, _)| x).fold(f64::INFINITY, f64::min);
        let x_max = display
            .iter()
            .map(|&(x, _)| x)
            .fold(f64::NEG_INFINITY, f64::max);
        polyfit::fit(&display, config.curve_degree)
            .map(|poly| poly.curve_points(x_min, x_max, CURVE_GRID))
    } else {
        None
    };

    // Step 5: axis range covering both the display extremes and the frozen
    // control limits, with a 5% margin each side.
    let display_y_min = display
        .iter()
        .map(|&(_, y)| y)
        .fold(f64::INFINITY, f64::min);
    let display_y_max = display
        .iter()
        .map(|&(_, y)| y)
        .fold(f64::NEG_INFINITY, f64::max);
    let raw_min = display_y_min.min(baseline.lcl);
    let raw_max = display_y_max.max(baseline.ucl);
    let margin = ((raw_max - raw_min) * 0.05).max(1.0);
    let y_range = (raw_min - margin, raw_max + margin);

    let x_min = display.iter().map(|&(x, _)| x).fold(f64::INFINITY, f64::min);
    let x_max = display
        .iter()
        .map(|&(x, _)| x)
        .fold(f64::NEG_INFINITY, f64::max);
    let label_x = x_max + ((x_max - x_min) * 0.02).max(0.25);

    // Step 6: summary over the display sample (not the full cleaned set).
    let xs: Vec<f64> = display.iter().map(|&(x, _)| x).collect();
    let ys: Vec<f64> = display.iter().map(|&(_, y)| y).collect();
    let corr = pearson(&xs, &ys);

    let summary = PanelSummary {
        n_clean: salaries.len(),
        n_display: display.len(),
        mean: baseline.mean,
        std: baseline.std,
        ucl: baseline.ucl,
        lcl: baseline.lcl,
        correlation: corr.map(|c| c.r),
        r_squared: corr.map(|c| c.r_squared()),
    };

    PanelOutcome::Panel(Box::new(SpcPanel {
        title: title.to_string(),
        display,
        curve,
        baseline,
        y_range,
        label_x,
        summary,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic pseudo-noise in [-1, 1] without pulling in an RNG.
    fn noise(i: usize) -> f64 {
        (((i * 2654435761) % 1000) as f64 / 500.0) - 1.0
    }

    fn linear_sample(n: usize) -> Vec<(f64, f64)> {
        (0..n)
            .map(|i| {
                let x = i as f64 * 20.0 / (n - 1) as f64;
                (x, 50_000.0 + 3_000.0 * x + 2_000.0 * noise(i))
            })
            .collect()
    }

    fn expect_panel(outcome: PanelOutcome) -> SpcPanel {
        match outcome {
            PanelOutcome::Panel(p) => *p,
            PanelOutcome::InsufficientData { reason, .. } => {
                panic!("expected a panel, got insufficient data: {reason}")
            }
        }
    }

    #[test]
    fn baseline_invariant_to_outlier_trim() {
        let mut sample = linear_sample(40);
        sample.push((10.0, 400_000.0)); // an extreme outlier above UCL

        let with_trim = expect_panel(build_panel(
            &sample,
            "t",
            &PanelConfig {
                remove_outliers: true,
                ..PanelConfig::default()
            },
        ));
        let without_trim = expect_panel(build_panel(
            &sample,
            "t",
            &PanelConfig {
                remove_outliers: false,
                ..PanelConfig::default()
            },
        ));

        // Property 1: the frozen statistics are identical either way.
        assert_eq!(with_trim.summary.mean, without_trim.summary.mean);
        assert_eq!(with_trim.summary.std, without_trim.summary.std);
        assert_eq!(with_trim.summary.ucl, without_trim.summary.ucl);
        assert_eq!(with_trim.summary.lcl, without_trim.summary.lcl);
        // But the display samples differ: the outlier is gone from one.
        assert_eq!(without_trim.summary.n_display, 41);
        assert_eq!(with_trim.summary.n_display, 40);
    }

    #[test]
    fn insufficient_data_is_soft() {
        let sample = linear_sample(8);
        let outcome = build_panel(&sample, "small cohort", &PanelConfig::default());
        match outcome {
            PanelOutcome::InsufficientData { title, reason } => {
                assert_eq!(title, "small cohort");
                assert!(reason.contains("8 of 8"));
                assert!(reason.contains("minimum 12"));
            }
            PanelOutcome::Panel(_) => panic!("expected insufficient data"),
        }
    }

    #[test]
    fn sanity_bounds_drop_rows_before_statistics() {
        let mut sample = linear_sample(20);
        sample.push((3.0, 500.0)); // below min_salary: an hourly rate
        sample.push((4.0, 2_000_000.0)); // above max_salary
        let panel = expect_panel(build_panel(&sample, "t", &PanelConfig::default()));
        assert_eq!(panel.summary.n_clean, 20);
    }

    #[test]
    fn axis_range_always_covers_control_limits() {
        // Property 3: even when the trim removes every extreme point, the
        // axis still spans [LCL, UCL] with margin.
        let sample = linear_sample(30);
        let panel = expect_panel(build_panel(&sample, "t", &PanelConfig::default()));
        assert!(panel.y_range.0 <= panel.summary.lcl);
        assert!(panel.y_range.1 >= panel.summary.ucl);
        assert!(panel.label_x > panel.display.iter().map(|p| p.0).fold(f64::MIN, f64::max));
    }

    #[test]
    fn strong_linear_trend_fits_well() {
        // Property 4: 20 points, salary = 50k + 3k·exp + small noise.
        let sample = linear_sample(20);
        let panel = expect_panel(build_panel(&sample, "t", &PanelConfig::default()));
        let r = panel.summary.correlation.expect("correlation defined");
        let r2 = panel.summary.r_squared.expect("r² defined");
        assert!(r > 0.8, "r = {r}");
        assert!(r2 > 0.8, "r² = {r2}");
        let curve = panel.curve.expect("curve fitted");
        assert_eq!(curve.len(), 200);
    }

    #[test]
    fn zero_variance_omits_curve_and_correlation() {
        // Property 5: constant salary collapses the limits and omits the
        // degenerate fields instead of propagating NaN.
        let sample: Vec<(f64, f64)> = (0..15).map(|i| (i as f64, 80_000.0)).collect();
        let panel = expect_panel(build_panel(&sample, "t", &PanelConfig::default()));
        assert_eq!(panel.summary.mean, 80_000.0);
        assert_eq!(panel.summary.ucl, 80_000.0);
        assert_eq!(panel.summary.lcl, 80_000.0);
        assert!(panel.summary.correlation.is_none());
        assert!(panel.summary.r_squared.is_none());
        // Axis range still has breathing room around the collapsed limits.
        assert!(panel.y_range.0 < 80_000.0 && panel.y_range.1 > 80_000.0);
    }

    #[test]
    fn few_distinct_x_values_skip_the_curve() {
        // Everything at two distinct experience values: a degree-2 fit is
        // infeasible, but the panel still renders.
        let sample: Vec<(f64, f64)> = (0..20)
            .map(|i| {
                let x = if i % 2 == 0 { 5.0 } else { 10.0 };
                (x, 60_000.0 + 1_000.0 * (i as f64))
            })
            .collect();
        let panel = expect_panel(build_panel(&sample, "t", &PanelConfig::default()));
        assert!(panel.curve.is_none());
        assert!(panel.summary.correlation.is_some());
    }

    #[test]
    fn rebuild_is_deterministic() {
        let sample = linear_sample(25);
        let config = PanelConfig::default();
        let a = expect_panel(build_panel(&sample, "t", &config));
        let b = expect_panel(build_panel(&sample, "t", &config));
        assert_eq!(a.summary, b.summary);
        assert_eq!(a.display, b.display);
        assert_eq!(a.curve, b.curve);
        assert_eq!(a.y_range, b.y_range);
    }
}
