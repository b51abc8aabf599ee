//! Dense helpers for the small systems the optimizer solves (n = ticker count).

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn mat_vec(m: &[Vec<f64>], v: &[f64]) -> Vec<f64> {
    m.iter().map(|row| dot(row, v)).collect()
}

/// `vᵀ M v`
pub fn quad_form(m: &[Vec<f64>], v: &[f64]) -> f64 {
    dot(v, &mat_vec(m, v))
}

/// Solve `A x = b` by Gaussian elimination with partial pivoting.
///
/// Returns `None` when `A` is singular to working precision.
pub fn solve(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    let scale = a
        .iter()
        .flat_map(|r| r.iter())
        .fold(0.0_f64, |acc, v| acc.max(v.abs()))
        .max(f64::MIN_POSITIVE);
    let mut aug: Vec<Vec<f64>> = a
        .iter()
        .zip(b)
        .map(|(row, &bi)| {
            let mut r = row.clone();
            r.push(bi);
            r
        })
        .collect();

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| aug[i][col].abs().total_cmp(&aug[j][col].abs()))?;
        if aug[pivot][col].abs() <= scale * 1e-14 {
            return None;
        }
        aug.swap(col, pivot);
        for row in (col + 1)..n {
            let factor = aug[row][col] / aug[col][col];
            if factor != 0.0 {
                for k in col..=n {
                    aug[row][k] -= factor * aug[col][k];
                }
            }
        }
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let tail: f64 = ((i + 1)..n).map(|k| aug[i][k] * x[k]).sum();
        x[i] = (aug[i][n] - tail) / aug[i][i];
    }
    Some(x)
}

/// Like [`solve`], but falls back to a small ridge on the diagonal for
/// near-singular covariance blocks (e.g. two perfectly correlated tickers).
pub fn solve_regularized(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    if let Some(x) = solve(a, b) {
        return Some(x);
    }
    let trace: f64 = (0..b.len()).map(|i| a[i][i]).sum();
    let ridge = (trace / b.len().max(1) as f64).abs().max(1e-12) * 1e-8;
    let bumped: Vec<Vec<f64>> = a
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mut r = row.clone();
            r[i] += ridge;
            r
        })
        .collect();
    solve(&bumped, b)
}
