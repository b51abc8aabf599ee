//! The dashboard pipeline: one request in, one rendered view out.
//!
//! fetch → cumulative returns → long form → chart, then, when an investment
//! amount is given, max-Sharpe weights and a greedy share allocation. A failing
//! optimization never fails the view; it is reported as a fixed message next
//! to the chart.

use crate::allocation::{greedy_allocation, Allocation, AllocationError};
use crate::chart::render_returns_chart;
use crate::data::{fetch_prices, DataError, DataProvider, PriceTable};
use crate::frame::{melt, LongFrame};
use crate::optimize::{optimize_max_sharpe, OptimizeError, Performance, TickerWeight};
use crate::period::Period;
use crate::returns::ReturnTable;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub const DEFAULT_TICKER: &str = "TSLA";
pub const DEFAULT_TICKER_CHOICES: [&str; 4] = ["TSLA", "GOOGL", "AAPL", "AMZN"];
pub const OPTIMIZE_FAILED_MESSAGE: &str = "Unable to optimize portfolio.";

const MAX_TICKER_LEN: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid ticker '{0}'")]
pub struct InvalidTicker(pub String);

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    InvalidTicker(#[from] InvalidTicker),
    #[error(transparent)]
    Data(#[from] DataError),
}

/// Trimmed, upper-cased ticker made only of letters, digits and `.-^=`.
///
/// Tickers end up in the quote URL path, so anything that could change the
/// request (`?`, `#`, `/`, whitespace) is refused.
pub fn validate_ticker(ticker: &str) -> Result<String, InvalidTicker> {
    let ticker = ticker.trim();
    let valid = !ticker.is_empty()
        && ticker.len() <= MAX_TICKER_LEN
        && ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));
    if valid {
        Ok(ticker.to_ascii_uppercase())
    } else {
        Err(InvalidTicker(ticker.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Optimize(#[from] OptimizeError),
    #[error(transparent)]
    Allocation(#[from] AllocationError),
}

/// Form input as submitted by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardRequest {
    pub period: Period,
    pub tickers: Vec<String>,
    pub investment: Option<f64>,
}

impl Default for DashboardRequest {
    fn default() -> Self {
        Self {
            period: Period::default(),
            tickers: vec![DEFAULT_TICKER.to_string()],
            investment: None,
        }
    }
}

impl DashboardRequest {
    /// Validate and upper-case tickers, drop blanks and repeats, fall back to
    /// `default_ticker` when nothing is left. Non-positive amounts count as absent.
    pub fn normalized(&self, default_ticker: &str) -> Result<Self, InvalidTicker> {
        let mut tickers: Vec<String> = Vec::with_capacity(self.tickers.len());
        for t in self.tickers.iter().filter(|t| !t.trim().is_empty()) {
            let t = validate_ticker(t)?;
            if !tickers.contains(&t) {
                tickers.push(t);
            }
        }
        if tickers.is_empty() {
            tickers.push(validate_ticker(default_ticker)?);
        }
        Ok(Self {
            period: self.period,
            tickers,
            investment: self.investment.filter(|v| v.is_finite() && *v > 0.0),
        })
    }
}

/// Pipeline knobs that come from configuration rather than the form.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSettings {
    pub risk_free_rate: f64,
    pub default_ticker: String,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            risk_free_rate: crate::optimize::DEFAULT_RISK_FREE_RATE,
            default_ticker: DEFAULT_TICKER.to_string(),
        }
    }
}

/// Weights, expected performance and whole-share purchase list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioPlan {
    pub investment: f64,
    pub weights: Vec<TickerWeight>,
    pub performance: Performance,
    pub allocation: Allocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlanOutcome {
    Ready(PortfolioPlan),
    Failed { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub request: DashboardRequest,
    pub returns: ReturnTable,
    pub long: LongFrame,
    #[serde(skip)]
    pub chart_svg: String,
    /// `None` when no investment amount was given.
    pub plan: Option<PlanOutcome>,
}

/// Run the full pipeline for one form submission.
pub fn build_dashboard(
    provider: &dyn DataProvider,
    request: &DashboardRequest,
    settings: &DashboardSettings,
) -> Result<DashboardView, DashboardError> {
    let request = request.normalized(&settings.default_ticker)?;
    let prices = fetch_prices(provider, &request.tickers, request.period)?;
    let returns = ReturnTable::from_prices(&prices);
    let long = melt(&returns);
    let chart_svg = render_returns_chart(&returns);

    let plan = request.investment.map(|amount| {
        match plan_portfolio(&prices, amount, settings.risk_free_rate) {
            Ok(plan) => PlanOutcome::Ready(plan),
            Err(e) => {
                tracing::warn!(error = %e, "portfolio optimization failed");
                PlanOutcome::Failed {
                    message: OPTIMIZE_FAILED_MESSAGE.to_string(),
                }
            }
        }
    });

    tracing::info!(
        tickers = ?request.tickers,
        period = %request.period,
        rows = long.len(),
        optimized = plan.is_some(),
        "dashboard built"
    );

    Ok(DashboardView {
        request,
        returns,
        long,
        chart_svg,
        plan,
    })
}

/// Max-Sharpe weights plus a greedy share allocation of `investment`.
pub fn plan_portfolio(
    prices: &PriceTable,
    investment: f64,
    risk_free_rate: f64,
) -> Result<PortfolioPlan, PlanError> {
    let optimized = optimize_max_sharpe(prices, risk_free_rate)?;
    let latest: HashMap<String, f64> = prices
        .latest_prices()
        .into_iter()
        .filter_map(|(t, p)| p.map(|p| (t, p)))
        .collect();
    let allocation = greedy_allocation(&optimized.weights, &latest, investment)?;
    Ok(PortfolioPlan {
        investment,
        weights: optimized.weights,
        performance: optimized.performance,
        allocation,
    })
}
