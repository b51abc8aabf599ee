//! Mean-variance portfolio optimization.
//!
//! - `estimate` — expected returns and covariance from prices
//! - `max_sharpe` — long-only tangency portfolio
//! - `linalg` — small dense solves used by the above

pub mod estimate;
pub mod linalg;
pub mod max_sharpe;

use crate::data::PriceTable;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use estimate::{mean_historical_return, returns_matrix, sample_covariance};
pub use max_sharpe::max_sharpe_weights;

/// Risk-free rate assumed when none is configured.
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;

#[derive(Debug, Error, PartialEq)]
pub enum OptimizeError {
    #[error("no assets to optimize")]
    NoAssets,

    #[error("not enough overlapping history for '{ticker}' ({observations} daily returns)")]
    InsufficientHistory { ticker: String, observations: usize },

    #[error("no asset has an expected return above the risk-free rate ({risk_free_rate})")]
    NoPositiveExcessReturn { risk_free_rate: f64 },

    #[error("covariance matrix is singular")]
    SingularCovariance,

    #[error("optimizer did not converge")]
    DidNotConverge,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerWeight {
    pub ticker: String,
    pub weight: f64,
}

/// Expected annual return, annual volatility and Sharpe ratio of a weighting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    pub expected_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedPortfolio {
    pub weights: Vec<TickerWeight>,
    pub performance: Performance,
    pub risk_free_rate: f64,
}

/// Zero out weights below `cutoff`, renormalize, round to `decimals` places.
pub fn clean_weights(weights: &[f64], cutoff: f64, decimals: i32) -> Vec<f64> {
    let kept: Vec<f64> = weights
        .iter()
        .map(|&w| if w.abs() < cutoff { 0.0 } else { w })
        .collect();
    let total: f64 = kept.iter().sum();
    let factor = 10_f64.powi(decimals);
    kept.iter()
        .map(|&w| {
            let w = if total > 0.0 { w / total } else { w };
            (w * factor).round() / factor
        })
        .collect()
}

pub fn portfolio_performance(
    weights: &[f64],
    expected_returns: &[f64],
    covariance: &[Vec<f64>],
    risk_free_rate: f64,
) -> Performance {
    let expected_return = linalg::dot(weights, expected_returns);
    let volatility = linalg::quad_form(covariance, weights).max(0.0).sqrt();
    let sharpe_ratio = if volatility > 0.0 {
        (expected_return - risk_free_rate) / volatility
    } else {
        0.0
    };
    Performance {
        expected_return,
        volatility,
        sharpe_ratio,
    }
}

/// Estimate from prices and solve for the max-Sharpe portfolio.
pub fn optimize_max_sharpe(
    prices: &PriceTable,
    risk_free_rate: f64,
) -> Result<OptimizedPortfolio, OptimizeError> {
    let returns = returns_matrix(prices)?;
    let mu = mean_historical_return(&returns);
    let cov = sample_covariance(&returns);

    let raw = max_sharpe_weights(&mu, &cov, risk_free_rate)?;
    let cleaned = clean_weights(&raw, 1e-4, 5);
    let performance = portfolio_performance(&cleaned, &mu, &cov, risk_free_rate);

    tracing::debug!(
        tickers = prices.tickers.len(),
        sharpe = performance.sharpe_ratio,
        "max-sharpe portfolio solved"
    );

    Ok(OptimizedPortfolio {
        weights: prices
            .tickers
            .iter()
            .zip(cleaned)
            .map(|(ticker, weight)| TickerWeight {
                ticker: ticker.clone(),
                weight,
            })
            .collect(),
        performance,
        risk_free_rate,
    })
}
