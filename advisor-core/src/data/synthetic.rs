//! Deterministic synthetic prices for offline use.
//!
//! Each symbol gets its own weekday random walk seeded from the BLAKE3 hash of
//! the symbol, so the same ticker always produces the same series.

use super::provider::{DataError, DataProvider, DataSource, FetchResult, PriceBar};
use crate::period::Period;
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Never reach further back than this, even for `Period::Max`.
const MAX_HISTORY_YEARS: i32 = 20;

pub struct SyntheticProvider {
    today: NaiveDate,
}

impl SyntheticProvider {
    /// Windows end on `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn generate(&self, symbol: &str, period: Period) -> Vec<PriceBar> {
        let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let floor = NaiveDate::from_ymd_opt(self.today.year() - MAX_HISTORY_YEARS, 1, 1)
            .unwrap_or(self.today);
        let start = period.start_date(self.today).max(floor);

        // Per-symbol drift and volatility so the curves fan out
        let drift: f64 = rng.gen_range(-0.0004..0.0012);
        let vol: f64 = rng.gen_range(0.008..0.03);

        let mut bars = Vec::new();
        let mut price: f64 = rng.gen_range(20.0..400.0);
        let mut current = start;
        while current <= self.today {
            if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
                let shock: f64 = rng.gen_range(-1.0..1.0) * vol;
                price = (price * (1.0 + drift + shock)).max(0.01);
                bars.push(PriceBar {
                    date: current,
                    close: price,
                    adj_close: price,
                });
            }
            current += chrono::Duration::days(1);
        }
        bars
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, symbol: &str, period: Period) -> Result<FetchResult, DataError> {
        if symbol.trim().is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        let bars = self.generate(symbol, period);
        if bars.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::Synthetic,
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}
