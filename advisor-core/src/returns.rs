//! Cumulative return normalization.
//!
//! Every series is rebased to its first valid price: `r_t = P_t / P_0 - 1`,
//! which is the running product of `(1 + period change)` minus one. Gaps are
//! forward-filled from the previous valid price, and anything before the first
//! valid price reads as zero.

use crate::data::PriceTable;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Cumulative returns, same shape as the price table they came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnTable {
    pub dates: Vec<NaiveDate>,
    pub tickers: Vec<String>,
    pub columns: Vec<Vec<f64>>,
}

impl ReturnTable {
    pub fn from_prices(prices: &PriceTable) -> Self {
        Self {
            dates: prices.dates.clone(),
            tickers: prices.tickers.clone(),
            columns: prices.columns.iter().map(|c| cumulative_returns(c)).collect(),
        }
    }

    /// Final cumulative return per ticker.
    pub fn final_returns(&self) -> Vec<(String, f64)> {
        self.tickers
            .iter()
            .zip(&self.columns)
            .map(|(t, c)| (t.clone(), c.last().copied().unwrap_or(0.0)))
            .collect()
    }
}

/// Cumulative return series for one price column.
pub fn cumulative_returns(prices: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(prices.len());
    let mut growth = 1.0_f64;
    let mut prev: Option<f64> = None;

    for &p in prices {
        if p.is_finite() {
            if let Some(prev_p) = prev {
                growth *= 1.0 + (p - prev_p) / prev_p;
            }
            prev = Some(p);
        }
        out.push(growth - 1.0);
    }
    out
}

/// Simple period-over-period returns on the forward-filled series, aligned
/// with the input dates.
///
/// Entries with no earlier valid price (the first date and everything up to
/// the first valid price) are `NaN`. A gap after that reads as no move.
pub fn daily_returns(prices: &[f64]) -> Vec<f64> {
    let mut prev: Option<f64> = None;
    prices
        .iter()
        .map(|&p| match prev {
            Some(prev_p) if p.is_finite() => {
                prev = Some(p);
                p / prev_p - 1.0
            }
            Some(_) => 0.0,
            None => {
                if p.is_finite() {
                    prev = Some(p);
                }
                f64::NAN
            }
        })
        .collect()
}
