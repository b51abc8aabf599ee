//! Multi-ticker price table.
//!
//! Fetches each requested ticker and aligns the adjusted closes on the union of
//! all trading dates. A ticker with no bar on a date gets `NaN` there; filling
//! is left to the return calculation.

use super::provider::{DataError, DataProvider, PriceBar};
use crate::period::Period;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Adjusted closes indexed by date, one column per ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    /// Common date axis, ascending.
    pub dates: Vec<NaiveDate>,
    /// Ticker order as requested.
    pub tickers: Vec<String>,
    /// `columns[i]` belongs to `tickers[i]`; every column has `dates.len()` entries.
    pub columns: Vec<Vec<f64>>,
}

impl PriceTable {
    /// Align per-ticker bars on the union of their dates.
    pub fn from_bars(series: Vec<(String, Vec<PriceBar>)>) -> Self {
        let dates: Vec<NaiveDate> = series
            .iter()
            .flat_map(|(_, bars)| bars.iter().map(|b| b.date))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut tickers = Vec::with_capacity(series.len());
        let mut columns = Vec::with_capacity(series.len());
        for (ticker, bars) in series {
            let by_date: HashMap<NaiveDate, f64> =
                bars.iter().map(|b| (b.date, b.adj_close)).collect();
            columns.push(
                dates
                    .iter()
                    .map(|d| by_date.get(d).copied().unwrap_or(f64::NAN))
                    .collect(),
            );
            tickers.push(ticker);
        }

        Self {
            dates,
            tickers,
            columns,
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Last finite price per ticker, in ticker order. `None` for an all-NaN column.
    pub fn latest_prices(&self) -> Vec<(String, Option<f64>)> {
        self.tickers
            .iter()
            .zip(&self.columns)
            .map(|(t, col)| {
                let last = col.iter().rev().copied().find(|p| p.is_finite());
                (t.clone(), last)
            })
            .collect()
    }
}

/// Fetch and align prices for `tickers` over `period`.
///
/// Duplicate tickers are collapsed, keeping the first occurrence. Any failing
/// ticker fails the whole table.
pub fn fetch_prices(
    provider: &dyn DataProvider,
    tickers: &[String],
    period: Period,
) -> Result<PriceTable, DataError> {
    let mut seen = BTreeSet::new();
    let unique: Vec<&String> = tickers.iter().filter(|t| seen.insert(t.as_str())).collect();
    if unique.is_empty() {
        return Err(DataError::ValidationError("no tickers requested".into()));
    }

    let mut series = Vec::with_capacity(unique.len());
    for ticker in unique {
        if !provider.is_available() {
            return Err(DataError::CircuitBreakerTripped);
        }
        tracing::info!(ticker = %ticker, %period, provider = provider.name(), "fetching prices");
        let fetched = provider.fetch(ticker, period)?;
        tracing::debug!(
            symbol = %fetched.symbol,
            source = ?fetched.source,
            bars = fetched.bars.len(),
            "prices received"
        );
        series.push((ticker.clone(), fetched.bars));
    }

    Ok(PriceTable::from_bars(series))
}
