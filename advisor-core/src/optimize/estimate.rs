//! Expected returns and risk from a price history.
//!
//! Both estimators work on the same aligned matrix of daily returns: a date
//! contributes only when every ticker has a price on it and on the previous
//! row (after forward-filling interior gaps).

use super::OptimizeError;
use crate::data::PriceTable;
use crate::returns::daily_returns;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Daily returns as columns, restricted to rows where every ticker has a value.
pub fn returns_matrix(prices: &PriceTable) -> Result<Vec<Vec<f64>>, OptimizeError> {
    if prices.tickers.is_empty() {
        return Err(OptimizeError::NoAssets);
    }

    let daily: Vec<Vec<f64>> = prices.columns.iter().map(|c| daily_returns(c)).collect();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); daily.len()];
    for t in 0..prices.len() {
        let row: Option<Vec<f64>> = daily
            .iter()
            .map(|c| c.get(t).copied().filter(|r| r.is_finite()))
            .collect();
        if let Some(row) = row {
            for (col, r) in columns.iter_mut().zip(row) {
                col.push(r);
            }
        }
    }

    let observations = columns.first().map_or(0, Vec::len);
    if observations < 2 {
        // Name the ticker that limits the overlap
        let shortest = prices
            .tickers
            .iter()
            .zip(&prices.columns)
            .min_by_key(|(_, c)| c.iter().filter(|p| p.is_finite()).count())
            .map(|(t, _)| t.clone())
            .unwrap_or_default();
        return Err(OptimizeError::InsufficientHistory {
            ticker: shortest,
            observations,
        });
    }
    Ok(columns)
}

/// Annualized compounded mean of daily returns: `(Π(1 + r))^(252 / n) - 1`.
pub fn mean_historical_return(returns: &[Vec<f64>]) -> Vec<f64> {
    returns
        .iter()
        .map(|col| {
            let growth: f64 = col.iter().map(|r| 1.0 + r).product();
            growth.powf(TRADING_DAYS_PER_YEAR / col.len() as f64) - 1.0
        })
        .collect()
}

/// Annualized sample covariance (n - 1 denominator) of daily returns.
pub fn sample_covariance(returns: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = returns.first().map_or(0, Vec::len);
    let means: Vec<f64> = returns
        .iter()
        .map(|c| c.iter().sum::<f64>() / n as f64)
        .collect();
    let denom = (n as f64 - 1.0).max(1.0);

    let k = returns.len();
    let mut cov = vec![vec![0.0; k]; k];
    for i in 0..k {
        for j in i..k {
            let s: f64 = returns[i]
                .iter()
                .zip(&returns[j])
                .map(|(a, b)| (a - means[i]) * (b - means[j]))
                .sum();
            let v = s / denom * TRADING_DAYS_PER_YEAR;
            cov[i][j] = v;
            cov[j][i] = v;
        }
    }
    cov
}
