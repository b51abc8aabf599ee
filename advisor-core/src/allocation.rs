//! Greedy discrete allocation: fractional weights → whole shares under a budget.
//!
//! Round one buys `floor(weight · budget / price)` shares of every ticker in
//! descending weight order. Round two spends what is left one share at a time,
//! always on the affordable ticker furthest below (or least above) its target
//! weight, until no ticker is affordable. The leftover is therefore smaller
//! than the cheapest weighted share.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::optimize::TickerWeight;

#[derive(Debug, Error, PartialEq)]
pub enum AllocationError {
    #[error("investment amount must be a positive number (got {0})")]
    InvalidBudget(f64),

    #[error("no positive weights to allocate")]
    NoWeights,

    #[error("no latest price for '{0}'")]
    MissingPrice(String),

    #[error("latest price for '{ticker}' is not positive ({price})")]
    InvalidPrice { ticker: String, price: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareCount {
    pub ticker: String,
    pub shares: u64,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    /// Only tickers with at least one share, in descending target-weight order.
    pub shares: Vec<ShareCount>,
    pub leftover: f64,
}

impl Allocation {
    pub fn invested(&self) -> f64 {
        self.shares.iter().map(|s| s.shares as f64 * s.price).sum()
    }
}

struct Slot {
    ticker: String,
    weight: f64,
    price: f64,
    shares: u64,
}

pub fn greedy_allocation(
    weights: &[TickerWeight],
    latest_prices: &HashMap<String, f64>,
    budget: f64,
) -> Result<Allocation, AllocationError> {
    if !budget.is_finite() || budget <= 0.0 {
        return Err(AllocationError::InvalidBudget(budget));
    }

    let mut slots = Vec::new();
    for w in weights.iter().filter(|w| w.weight > 0.0) {
        let price = *latest_prices
            .get(&w.ticker)
            .ok_or_else(|| AllocationError::MissingPrice(w.ticker.clone()))?;
        if !price.is_finite() || price <= 0.0 {
            return Err(AllocationError::InvalidPrice {
                ticker: w.ticker.clone(),
                price,
            });
        }
        slots.push(Slot {
            ticker: w.ticker.clone(),
            weight: w.weight,
            price,
            shares: 0,
        });
    }
    if slots.is_empty() {
        return Err(AllocationError::NoWeights);
    }
    slots.sort_by(|a, b| b.weight.total_cmp(&a.weight));

    let weight_total: f64 = slots.iter().map(|s| s.weight).sum();
    let mut available = budget;

    for slot in &mut slots {
        let target = slot.weight / weight_total * budget;
        let mut n = (target / slot.price).floor();
        // Rounded weights can sum slightly above one
        if n * slot.price > available {
            n = (available / slot.price).floor();
        }
        slot.shares = n as u64;
        available -= slot.shares as f64 * slot.price;
    }

    loop {
        let held: f64 = slots.iter().map(|s| s.shares as f64 * s.price).sum();
        let best = slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.price <= available)
            .map(|(i, s)| {
                let current = if held > 0.0 {
                    s.shares as f64 * s.price / held
                } else {
                    0.0
                };
                (i, s.weight / weight_total - current)
            })
            .max_by(|a, b| a.1.total_cmp(&b.1));

        let Some((i, _)) = best else { break };
        slots[i].shares += 1;
        available -= slots[i].price;
    }

    let shares: Vec<ShareCount> = slots
        .into_iter()
        .filter(|s| s.shares > 0)
        .map(|s| ShareCount {
            ticker: s.ticker,
            shares: s.shares,
            price: s.price,
        })
        .collect();

    let mut allocation = Allocation {
        shares,
        leftover: 0.0,
    };
    allocation.leftover = (budget - allocation.invested()).max(0.0);
    Ok(allocation)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(ticker: &str, weight: f64) -> TickerWeight {
        TickerWeight {
            ticker: ticker.into(),
            weight,
        }
    }

    fn prices(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(t, p)| (t.to_string(), *p)).collect()
    }

    #[test]
    fn first_round_floors_then_second_round_fills() {
        let weights = [w("AAPL", 0.5), w("TSLA", 0.5)];
        let px = prices(&[("AAPL", 30.0), ("TSLA", 40.0)]);
        let alloc = greedy_allocation(&weights, &px, 100.0).unwrap();
        // Round one: AAPL 1 (30), TSLA 1 (40); 30 left → one more AAPL
        let aapl = alloc.shares.iter().find(|s| s.ticker == "AAPL").unwrap();
        let tsla = alloc.shares.iter().find(|s| s.ticker == "TSLA").unwrap();
        assert_eq!(aapl.shares, 2);
        assert_eq!(tsla.shares, 1);
        assert!((alloc.leftover - 0.0).abs() < 1e-9);
    }

    #[test]
    fn second_round_spends_until_nothing_is_affordable() {
        let weights = [w("A", 0.5), w("B", 0.5)];
        let px = prices(&[("A", 10.0), ("B", 10.0)]);
        let alloc = greedy_allocation(&weights, &px, 30.0).unwrap();
        let total: u64 = alloc.shares.iter().map(|s| s.shares).sum();
        assert_eq!(total, 3);
        assert!(alloc.leftover < 10.0, "leftover {} buys another share", alloc.leftover);
    }

    #[test]
    fn overweight_ticker_is_bought_when_it_is_the_only_affordable_one() {
        // Round one: A 1 (60), B 2 (40). B ends above target as the only affordable ticker
        let weights = [w("A", 0.6), w("B", 0.4)];
        let px = prices(&[("A", 60.0), ("B", 20.0)]);
        let alloc = greedy_allocation(&weights, &px, 125.0).unwrap();
        let b = alloc.shares.iter().find(|s| s.ticker == "B").unwrap();
        assert_eq!(b.shares, 3);
        assert!((alloc.leftover - 5.0).abs() < 1e-9);
    }

    #[test]
    fn never_exceeds_budget() {
        let weights = [w("A", 0.7), w("B", 0.3)];
        let px = prices(&[("A", 333.33), ("B", 77.7)]);
        let alloc = greedy_allocation(&weights, &px, 1000.0).unwrap();
        assert!(alloc.invested() <= 1000.0);
        assert!((alloc.invested() + alloc.leftover - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn unaffordable_everything_leaves_all_cash() {
        let weights = [w("BRK", 1.0)];
        let px = prices(&[("BRK", 600_000.0)]);
        let alloc = greedy_allocation(&weights, &px, 1000.0).unwrap();
        assert!(alloc.shares.is_empty());
        assert_eq!(alloc.leftover, 1000.0);
    }

    #[test]
    fn zero_weights_are_ignored() {
        let weights = [w("A", 1.0), w("B", 0.0)];
        let px = prices(&[("A", 10.0)]);
        let alloc = greedy_allocation(&weights, &px, 95.0).unwrap();
        assert_eq!(alloc.shares.len(), 1);
        assert_eq!(alloc.shares[0].shares, 9);
        assert!((alloc.leftover - 5.0).abs() < 1e-9);
    }

    #[test]
    fn bad_inputs() {
        let weights = [w("A", 1.0)];
        assert_eq!(
            greedy_allocation(&weights, &prices(&[("A", 10.0)]), 0.0),
            Err(AllocationError::InvalidBudget(0.0))
        );
        assert_eq!(
            greedy_allocation(&weights, &prices(&[]), 100.0),
            Err(AllocationError::MissingPrice("A".into()))
        );
        assert!(matches!(
            greedy_allocation(&weights, &prices(&[("A", f64::NAN)]), 100.0),
            Err(AllocationError::InvalidPrice { .. })
        ));
        assert_eq!(
            greedy_allocation(&[w("A", 0.0)], &prices(&[("A", 1.0)]), 100.0),
            Err(AllocationError::NoWeights)
        );
    }
}
