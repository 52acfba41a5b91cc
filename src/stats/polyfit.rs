//! Least-squares polynomial fitting for the best-fit curve overlay.

use super::linalg;

/// A fitted polynomial with coefficients in ascending power order:
/// `y = c[0] + c[1]·x + c[2]·x² + …`
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    pub coefficients: Vec<f64>,
}

impl Polynomial {
    /// Evaluate via Horner's rule.
    pub fn evaluate(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * x + c)
    }

    /// Evaluate over `n` evenly spaced points spanning `[x_min, x_max]`,
    /// producing the line vertices for rendering.
    pub fn curve_points(&self, x_min: f64, x_max: f64, n: usize) -> Vec<(f64, f64)> {
        if n < 2 || !(x_max > x_min) {
            return vec![(x_min, self.evaluate(x_min))];
        }
        let step = (x_max - x_min) / (n - 1) as f64;
        (0..n)
            .map(|i| {
                let x = x_min + step * i as f64;
                (x, self.evaluate(x))
            })
            .collect()
    }
}

/// Fit a least-squares polynomial of the given degree via the normal
/// equations.
///
/// Returns `None` when the fit is infeasible: fewer than `degree + 1`
/// points, fewer than `degree + 1` distinct x values, non-finite input, or
/// a singular normal matrix. Callers treat a `None` as "skip the curve",
/// not an error.
pub fn fit(points: &[(f64, f64)], degree: usize) -> Option<Polynomial> {
    let n_coef = degree + 1;
    if points.len() < n_coef {
        return None;
    }
    if points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
        return None;
    }

    // The normal matrix is singular when x values repeat too much; check
    // explicitly so the failure mode doesn't depend on pivot tolerances.
    let mut xs: Vec<f64> = points.iter().map(|(x, _)| *x).collect();
    xs.sort_by(f64::total_cmp);
    xs.dedup();
    if xs.len() < n_coef {
        return None;
    }

    // Normal equations: A[i][j] = Σ x^(i+j), b[i] = Σ x^i · y.
    let mut powers = vec![0.0; 2 * degree + 1];
    let mut b = vec![0.0; n_coef];
    for &(x, y) in points {
        let mut xp = 1.0;
        for (i, slot) in powers.iter_mut().enumerate() {
            *slot += xp;
            if i < n_coef {
                b[i] += xp * y;
            }
            xp *= x;
        }
    }
    let a: Vec<Vec<f64>> = (0..n_coef)
        .map(|i| (0..n_coef).map(|j| powers[i + j]).collect())
        .collect();

    linalg::solve(a, b).map(|coefficients| Polynomial { coefficients })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_an_exact_quadratic() {
        // y = 2 + 3x + 0.5x²
        let points: Vec<(f64, f64)> = (0..10)
            .map(|i| {
                let x = i as f64;
                (x, 2.0 + 3.0 * x + 0.5 * x * x)
            })
            .collect();
        let poly = fit(&points, 2).unwrap();
        assert!((poly.coefficients[0] - 2.0).abs() < 1e-6);
        assert!((poly.coefficients[1] - 3.0).abs() < 1e-6);
        assert!((poly.coefficients[2] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn cubic_fit_evaluates_on_the_grid() {
        let points: Vec<(f64, f64)> = (0..20)
            .map(|i| {
                let x = i as f64 * 0.5;
                (x, 1.0 - x + 0.2 * x.powi(3))
            })
            .collect();
        let poly = fit(&points, 3).unwrap();
        let curve = poly.curve_points(0.0, 9.5, 200);
        assert_eq!(curve.len(), 200);
        assert!((curve[0].0 - 0.0).abs() < 1e-12);
        assert!((curve[199].0 - 9.5).abs() < 1e-9);
        // Grid is evenly spaced.
        let step0 = curve[1].0 - curve[0].0;
        let step_mid = curve[100].0 - curve[99].0;
        assert!((step0 - step_mid).abs() < 1e-9);
    }

    #[test]
    fn too_few_distinct_x_values_is_none() {
        let points = vec![(5.0, 1.0), (5.0, 2.0), (5.0, 3.0), (5.0, 4.0)];
        assert!(fit(&points, 2).is_none());

        let two_distinct = vec![(1.0, 1.0), (1.0, 2.0), (2.0, 3.0), (2.0, 4.0)];
        assert!(fit(&two_distinct, 2).is_none());
        // Degree 1 is feasible with two distinct x values.
        assert!(fit(&two_distinct, 1).is_some());
    }

    #[test]
    fn non_finite_points_are_rejected() {
        let points = vec![(1.0, 1.0), (2.0, f64::NAN), (3.0, 3.0), (4.0, 4.0)];
        assert!(fit(&points, 2).is_none());
    }
}
