//! Property tests for the pipeline invariants.
//!
//! 1. Cumulative returns start at zero and equal `P_t / P_0 - 1`
//! 2. Discrete allocation never spends more than the budget, and stops only
//!    when the leftover cannot buy another share
//! 3. Max-Sharpe weights are long-only and fully invested

use advisor_core::allocation::greedy_allocation;
use advisor_core::optimize::{max_sharpe_weights, TickerWeight};
use advisor_core::returns::cumulative_returns;
use proptest::prelude::*;
use std::collections::HashMap;

fn arb_price() -> impl Strategy<Value = f64> {
    (1.0..1000.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

fn arb_prices() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(arb_price(), 1..200)
}

// ── 1. Cumulative returns ─────────────────────────────────────────────

proptest! {
    #[test]
    fn cumulative_returns_start_at_zero(prices in arb_prices()) {
        let r = cumulative_returns(&prices);
        prop_assert_eq!(r.len(), prices.len());
        prop_assert_eq!(r[0], 0.0);
    }

    #[test]
    fn cumulative_returns_match_price_ratio(prices in arb_prices()) {
        let r = cumulative_returns(&prices);
        let p0 = prices[0];
        for (rt, pt) in r.iter().zip(&prices) {
            let expected = pt / p0 - 1.0;
            prop_assert!((rt - expected).abs() <= 1e-9 * (1.0 + expected.abs()),
                "got {} expected {}", rt, expected);
        }
    }

    #[test]
    fn gaps_hold_the_last_value(
        prices in arb_prices(),
        gap_mask in prop::collection::vec(prop::bool::weighted(0.2), 200),
    ) {
        let with_gaps: Vec<f64> = prices
            .iter()
            .zip(&gap_mask)
            .enumerate()
            .map(|(i, (p, gap))| if i > 0 && *gap { f64::NAN } else { *p })
            .collect();
        let r = cumulative_returns(&with_gaps);
        for i in 1..r.len() {
            if with_gaps[i].is_nan() {
                prop_assert_eq!(r[i], r[i - 1]);
            }
        }
    }
}

// ── 2. Discrete allocation ────────────────────────────────────────────

fn arb_book() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    (1usize..8).prop_flat_map(|n| {
        (
            prop::collection::vec(0.0..1.0_f64, n),
            prop::collection::vec(arb_price(), n),
        )
    })
}

proptest! {
    #[test]
    fn allocation_never_exceeds_budget(
        (raw_weights, prices) in arb_book(),
        budget in 1.0..250_000.0_f64,
    ) {
        let total: f64 = raw_weights.iter().sum();
        prop_assume!(total > 0.0);

        let weights: Vec<TickerWeight> = raw_weights
            .iter()
            .enumerate()
            .map(|(i, w)| TickerWeight { ticker: format!("T{i}"), weight: w / total })
            .collect();
        let latest: HashMap<String, f64> = prices
            .iter()
            .enumerate()
            .map(|(i, p)| (format!("T{i}"), *p))
            .collect();

        let alloc = greedy_allocation(&weights, &latest, budget).unwrap();
        prop_assert!(alloc.invested() <= budget + 1e-6,
            "invested {} > budget {}", alloc.invested(), budget);
        prop_assert!(alloc.leftover >= 0.0);
        prop_assert!((alloc.invested() + alloc.leftover - budget).abs() < 1e-6);
        prop_assert!(alloc.shares.iter().all(|s| s.shares > 0));
    }

    #[test]
    fn leftover_cannot_buy_another_share(
        (raw_weights, prices) in arb_book(),
        budget in 1.0..50_000.0_f64,
    ) {
        let total: f64 = raw_weights.iter().sum();
        prop_assume!(total > 0.0);
        let weights: Vec<TickerWeight> = raw_weights
            .iter()
            .enumerate()
            .map(|(i, w)| TickerWeight { ticker: format!("T{i}"), weight: w / total })
            .collect();
        let latest: HashMap<String, f64> = prices
            .iter()
            .enumerate()
            .map(|(i, p)| (format!("T{i}"), *p))
            .collect();

        let alloc = greedy_allocation(&weights, &latest, budget).unwrap();
        let cheapest = weights
            .iter()
            .filter(|w| w.weight > 0.0)
            .map(|w| latest[&w.ticker])
            .fold(f64::INFINITY, f64::min);
        prop_assert!(alloc.leftover < cheapest + 1e-6,
            "leftover {} could still buy a share at {}", alloc.leftover, cheapest);
    }
}

// ── 3. Max-Sharpe weights ─────────────────────────────────────────────

fn arb_problem() -> impl Strategy<Value = (Vec<f64>, Vec<Vec<f64>>)> {
    (1usize..6).prop_flat_map(|n| {
        (
            prop::collection::vec(0.03..0.4_f64, n),
            prop::collection::vec(prop::collection::vec(-0.3..0.3_f64, n), n + 2),
        )
    })
    .prop_map(|(mu, factors)| {
        // Σ = FᵀF / k + δI is symmetric positive definite
        let n = mu.len();
        let k = factors.len() as f64;
        let mut cov = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..n {
                cov[i][j] = factors.iter().map(|f| f[i] * f[j]).sum::<f64>() / k;
            }
            cov[i][i] += 0.01;
        }
        (mu, cov)
    })
}

proptest! {
    #[test]
    fn max_sharpe_is_long_only_and_fully_invested((mu, cov) in arb_problem()) {
        let w = max_sharpe_weights(&mu, &cov, 0.02).unwrap();
        prop_assert!(w.iter().all(|x| *x >= 0.0));
        prop_assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn max_sharpe_beats_equal_weights((mu, cov) in arb_problem()) {
        let sharpe = |w: &[f64]| {
            let ret: f64 = w.iter().zip(&mu).map(|(a, b)| a * b).sum();
            let var: f64 = (0..w.len())
                .map(|i| (0..w.len()).map(|j| w[i] * w[j] * cov[i][j]).sum::<f64>())
                .sum();
            (ret - 0.02) / var.sqrt()
        };
        let w = max_sharpe_weights(&mu, &cov, 0.02).unwrap();
        let eq = vec![1.0 / mu.len() as f64; mu.len()];
        prop_assert!(sharpe(&w) >= sharpe(&eq) - 1e-9);
    }
}
