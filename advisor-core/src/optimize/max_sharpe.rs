//! Long-only tangency portfolio.
//!
//! Maximizing `(wᵀμ − r_f) / √(wᵀΣw)` over the simplex is rewritten with the
//! Charnes–Cooper substitution `y = w / κ` into the convex problem
//!
//! ```text
//! minimize    yᵀ Σ y
//! subject to  (μ − r_f)ᵀ y = 1,   y ≥ 0
//! ```
//!
//! which a primal active-set loop solves exactly for the handful of tickers
//! the dashboard deals with. Weights are recovered as `w = y / Σy`.

use super::linalg::{dot, mat_vec, solve_regularized};
use super::OptimizeError;

const TOLERANCE: f64 = 1e-12;

/// Unnormalized solution `y` of the transformed problem.
pub fn tangency_direction(
    expected_returns: &[f64],
    covariance: &[Vec<f64>],
    risk_free_rate: f64,
) -> Result<Vec<f64>, OptimizeError> {
    let n = expected_returns.len();
    if n == 0 {
        return Err(OptimizeError::NoAssets);
    }
    let excess: Vec<f64> = expected_returns.iter().map(|m| m - risk_free_rate).collect();

    // Start from the best standalone Sharpe among assets beating the risk-free rate
    let start = (0..n)
        .filter(|&i| excess[i] > 0.0)
        .max_by(|&i, &j| {
            let si = excess[i] / covariance[i][i].max(TOLERANCE).sqrt();
            let sj = excess[j] / covariance[j][j].max(TOLERANCE).sqrt();
            si.total_cmp(&sj)
        })
        .ok_or(OptimizeError::NoPositiveExcessReturn { risk_free_rate })?;

    let mut y = vec![0.0; n];
    y[start] = 1.0 / excess[start];
    let mut free = vec![false; n];
    free[start] = true;

    for _ in 0..(50 * n + 50) {
        let idx: Vec<usize> = (0..n).filter(|&i| free[i]).collect();
        let target = subproblem(&idx, &excess, covariance)
            .ok_or(OptimizeError::SingularCovariance)?;

        let mut candidate = vec![0.0; n];
        for (&i, &v) in idx.iter().zip(&target) {
            candidate[i] = v;
        }

        if idx.iter().all(|&i| candidate[i] >= -TOLERANCE) {
            y = candidate.iter().map(|v| v.max(0.0)).collect();

            // Bound multipliers 2(Σy)_j − λ·excess_j, where λ = 2yᵀΣy since excessᵀy = 1
            let sigma_y = mat_vec(covariance, &y);
            let lambda = 2.0 * dot(&y, &sigma_y);
            let entering = (0..n)
                .filter(|&j| !free[j])
                .map(|j| (j, 2.0 * sigma_y[j] - lambda * excess[j]))
                .filter(|&(_, mu)| mu < -TOLERANCE)
                .min_by(|a, b| a.1.total_cmp(&b.1));

            match entering {
                Some((j, _)) => free[j] = true,
                None => return Ok(y),
            }
        } else {
            // Walk towards the subproblem optimum until a weight hits zero
            let mut alpha = 1.0_f64;
            let mut blocking = None;
            for &i in &idx {
                let step = candidate[i] - y[i];
                if candidate[i] < 0.0 && step < 0.0 {
                    let a = -y[i] / step;
                    if a < alpha {
                        alpha = a;
                        blocking = Some(i);
                    }
                }
            }
            for &i in &idx {
                y[i] += alpha * (candidate[i] - y[i]);
            }
            if let Some(b) = blocking {
                y[b] = 0.0;
                free[b] = false;
            }
        }
    }

    Err(OptimizeError::DidNotConverge)
}

/// Equality-constrained optimum on the free set:
/// `y_F = Σ_FF⁻¹ a_F / (a_Fᵀ Σ_FF⁻¹ a_F)`.
fn subproblem(idx: &[usize], excess: &[f64], covariance: &[Vec<f64>]) -> Option<Vec<f64>> {
    let sub: Vec<Vec<f64>> = idx
        .iter()
        .map(|&i| idx.iter().map(|&j| covariance[i][j]).collect())
        .collect();
    let a: Vec<f64> = idx.iter().map(|&i| excess[i]).collect();
    let z = solve_regularized(&sub, &a)?;
    let denom = dot(&a, &z);
    if denom.abs() < TOLERANCE {
        return None;
    }
    Some(z.iter().map(|v| v / denom).collect())
}

/// Normalized long-only max-Sharpe weights.
pub fn max_sharpe_weights(
    expected_returns: &[f64],
    covariance: &[Vec<f64>],
    risk_free_rate: f64,
) -> Result<Vec<f64>, OptimizeError> {
    let y = tangency_direction(expected_returns, covariance, risk_free_rate)?;
    let total: f64 = y.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return Err(OptimizeError::DidNotConverge);
    }
    Ok(y.iter().map(|v| v / total).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::linalg::quad_form;

    fn sharpe(w: &[f64], mu: &[f64], cov: &[Vec<f64>], rf: f64) -> f64 {
        (dot(w, mu) - rf) / quad_form(cov, w).sqrt()
    }

    #[test]
    fn uncorrelated_assets_weight_by_excess_over_variance() {
        let mu = [0.12, 0.10];
        let cov = vec![vec![0.04, 0.0], vec![0.0, 0.02]];
        let w = max_sharpe_weights(&mu, &cov, 0.02).unwrap();
        // Unconstrained tangency ∝ Σ⁻¹(μ − r_f) = [2.5, 4.0]
        assert!((w[0] - 2.5 / 6.5).abs() < 1e-9);
        assert!((w[1] - 4.0 / 6.5).abs() < 1e-9);
    }

    #[test]
    fn negative_unconstrained_weight_is_clipped() {
        // Asset 1 is a worse, highly correlated copy of asset 0: unconstrained solution shorts it
        let mu = [0.15, 0.05];
        let cov = vec![vec![0.04, 0.038], vec![0.038, 0.04]];
        let w = max_sharpe_weights(&mu, &cov, 0.02).unwrap();
        assert!((w[0] - 1.0).abs() < 1e-9);
        assert!(w[1].abs() < 1e-9);
    }

    #[test]
    fn hedge_asset_with_negative_excess_can_enter() {
        let mu = [0.20, 0.0];
        let cov = vec![vec![0.09, -0.02], vec![-0.02, 0.01]];
        let w = max_sharpe_weights(&mu, &cov, 0.02).unwrap();
        assert!(w[1] > 0.0);
        let single = sharpe(&[1.0, 0.0], &mu, &cov, 0.02);
        assert!(sharpe(&w, &mu, &cov, 0.02) > single);
    }

    #[test]
    fn beats_equal_weights() {
        let mu = [0.08, 0.12, 0.15, 0.03];
        let cov = vec![
            vec![0.040, 0.006, 0.010, 0.002],
            vec![0.006, 0.090, 0.030, 0.001],
            vec![0.010, 0.030, 0.160, 0.004],
            vec![0.002, 0.001, 0.004, 0.010],
        ];
        let w = max_sharpe_weights(&mu, &cov, 0.02).unwrap();
        assert!(w.iter().all(|&x| x >= 0.0));
        assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        let eq = [0.25; 4];
        assert!(sharpe(&w, &mu, &cov, 0.02) >= sharpe(&eq, &mu, &cov, 0.02) - 1e-12);
    }

    #[test]
    fn all_below_risk_free_is_an_error() {
        let mu = [0.01, 0.015];
        let cov = vec![vec![0.04, 0.0], vec![0.0, 0.02]];
        assert!(matches!(
            max_sharpe_weights(&mu, &cov, 0.02),
            Err(OptimizeError::NoPositiveExcessReturn { .. })
        ));
    }

    #[test]
    fn single_asset_gets_everything() {
        let w = max_sharpe_weights(&[0.3], &[vec![0.25]], 0.02).unwrap();
        assert_eq!(w, vec![1.0]);
    }
}
