//! Dense solves for the small symmetric systems produced by least squares.
//!
//! The normal matrices here are at most (degree+1) or (factors+1) square,
//! so plain Gaussian elimination with partial pivoting is both sufficient
//! and easy to audit. Singular systems return `None` rather than panicking;
//! degenerate fits are an expected input, not a bug.

const PIVOT_EPS: f64 = 1e-12;

/// Solve `A·x = b` by Gaussian elimination with partial pivoting.
///
/// Returns `None` when the matrix is singular (or numerically so), when the
/// dimensions are inconsistent, or when any input is non-finite.
pub fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = a.len();
    if n == 0 || b.len() != n || a.iter().any(|row| row.len() != n) {
        return None;
    }
    if a.iter().flatten().any(|v| !v.is_finite()) || b.iter().any(|v| !v.is_finite()) {
        return None;
    }

    for col in 0..n {
        // Partial pivot: largest |value| in this column at or below the diagonal.
        let pivot_row = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap();
        if a[pivot_row][col].abs() < PIVOT_EPS {
            return None;
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    // Back substitution.
    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let mut sum = b[row];
        for k in (row + 1)..n {
            sum -= a[row][k] * x[k];
        }
        x[row] = sum / a[row][row];
    }

    if x.iter().any(|v| !v.is_finite()) {
        return None;
    }
    Some(x)
}

/// Invert a square matrix by Gauss–Jordan elimination.
///
/// Used for the `(X'X)⁻¹` diagonal in coefficient standard errors.
/// Returns `None` on singular or inconsistent input.
pub fn invert(a: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = a.len();
    if n == 0 || a.iter().any(|row| row.len() != n) {
        return None;
    }

    // Augment [A | I] and reduce.
    let mut aug: Vec<Vec<f64>> = a
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mut r = row.clone();
            r.extend((0..n).map(|j| if i == j { 1.0 } else { 0.0 }));
            r
        })
        .collect();

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&i, &j| aug[i][col].abs().total_cmp(&aug[j][col].abs()))
            .unwrap();
        if aug[pivot_row][col].abs() < PIVOT_EPS {
            return None;
        }
        aug.swap(col, pivot_row);

        let pivot = aug[col][col];
        for v in aug[col].iter_mut() {
            *v /= pivot;
        }
        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = aug[row][col];
            if factor == 0.0 {
                continue;
            }
            for k in 0..(2 * n) {
                let sub = factor * aug[col][k];
                aug[row][k] -= sub;
            }
        }
    }

    let inv: Vec<Vec<f64>> = aug.into_iter().map(|row| row[n..].to_vec()).collect();
    if inv.iter().flatten().any(|v| !v.is_finite()) {
        return None;
    }
    Some(inv)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_a_small_system() {
        // 2x + y = 5, x + 3y = 10 → x = 1, y = 3
        let a = vec![vec![2.0, 1.0], vec![1.0, 3.0]];
        let x = solve(a, vec![5.0, 10.0]).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-10);
        assert!((x[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn singular_matrix_is_none() {
        let a = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        assert!(solve(a.clone(), vec![1.0, 2.0]).is_none());
        assert!(invert(&a).is_none());
    }

    #[test]
    fn inverse_round_trips() {
        let a = vec![
            vec![4.0, 7.0, 2.0],
            vec![3.0, 6.0, 1.0],
            vec![2.0, 5.0, 3.0],
        ];
        let inv = invert(&a).unwrap();
        // A · A⁻¹ ≈ I
        for i in 0..3 {
            for j in 0..3 {
                let v: f64 = (0..3).map(|k| a[i][k] * inv[k][j]).sum();
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((v - expected).abs() < 1e-9, "cell ({i},{j}) = {v}");
            }
        }
    }

    #[test]
    fn non_finite_input_is_none() {
        let a = vec![vec![f64::NAN, 0.0], vec![0.0, 1.0]];
        assert!(solve(a, vec![1.0, 1.0]).is_none());
    }
}
