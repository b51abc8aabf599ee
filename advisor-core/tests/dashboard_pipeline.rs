//! Integration tests for the dashboard pipeline against in-memory providers.

use advisor_core::dashboard::{
    build_dashboard, DashboardRequest, DashboardSettings, PlanOutcome, OPTIMIZE_FAILED_MESSAGE,
};
use advisor_core::data::{
    fetch_prices, DataError, DataProvider, DataSource, FetchResult, PriceBar, SyntheticProvider,
};
use advisor_core::Period;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Serves fixed bars and counts requests.
struct FixtureProvider {
    bars: HashMap<String, Vec<PriceBar>>,
    calls: AtomicUsize,
}

impl FixtureProvider {
    fn new(series: &[(&str, &[f64])]) -> Self {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = series
            .iter()
            .map(|(t, prices)| {
                let bars = prices
                    .iter()
                    .enumerate()
                    .map(|(i, p)| PriceBar {
                        date: start + chrono::Duration::days(i as i64),
                        close: *p,
                        adj_close: *p,
                    })
                    .collect();
                (t.to_string(), bars)
            })
            .collect();
        Self {
            bars,
            calls: AtomicUsize::new(0),
        }
    }
}

impl DataProvider for FixtureProvider {
    fn name(&self) -> &str {
        "fixture"
    }

    fn fetch(&self, symbol: &str, _period: Period) -> Result<FetchResult, DataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let bars = self
            .bars
            .get(symbol)
            .cloned()
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })?;
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

fn request(tickers: &[&str], investment: Option<f64>) -> DashboardRequest {
    DashboardRequest {
        period: Period::OneYear,
        tickers: tickers.iter().map(|t| t.to_string()).collect(),
        investment,
    }
}

fn wiggly(start: f64, drift: f64, n: usize, phase: usize) -> Vec<f64> {
    (0..n)
        .map(|i| start * (1.0 + drift).powi(i as i32) * (1.0 + 0.01 * (((i + phase) % 5) as f64 - 2.0)))
        .collect()
}

#[test]
fn chart_only_when_no_investment() {
    let provider = FixtureProvider::new(&[("TSLA", &[100.0, 110.0, 121.0])]);
    let view = build_dashboard(&provider, &request(&["tsla"], None), &DashboardSettings::default())
        .unwrap();

    assert_eq!(view.request.tickers, vec!["TSLA"]);
    assert!(view.plan.is_none());
    assert_eq!(view.long.len(), 3);
    assert_eq!(view.long.rows[0].value, 0.0);
    assert!((view.long.rows[2].value - 0.21).abs() < 1e-12);
    assert!(view.chart_svg.contains("<polyline"));
}

#[test]
fn empty_selection_uses_default_ticker() {
    let provider = FixtureProvider::new(&[("TSLA", &[1.0, 2.0])]);
    let view =
        build_dashboard(&provider, &request(&[], None), &DashboardSettings::default()).unwrap();
    assert_eq!(view.returns.tickers, vec!["TSLA"]);
}

#[test]
fn investment_produces_a_plan_within_budget() {
    let a = wiggly(100.0, 0.002, 150, 0);
    let b = wiggly(40.0, 0.001, 150, 2);
    let provider = FixtureProvider::new(&[("AAPL", &a), ("AMZN", &b)]);

    let view = build_dashboard(
        &provider,
        &request(&["AAPL", "AMZN"], Some(10_000.0)),
        &DashboardSettings::default(),
    )
    .unwrap();

    match view.plan {
        Some(PlanOutcome::Ready(plan)) => {
            let total: f64 = plan.weights.iter().map(|w| w.weight).sum();
            assert!((total - 1.0).abs() < 1e-4);
            assert!(plan.allocation.invested() <= 10_000.0 + 1e-6);
            assert!(!plan.allocation.shares.is_empty());
        }
        other => panic!("expected a plan, got {other:?}"),
    }
}

#[test]
fn losing_history_reports_static_message() {
    let falling: Vec<f64> = wiggly(100.0, -0.004, 100, 1);
    let provider = FixtureProvider::new(&[("TSLA", &falling)]);

    let view = build_dashboard(
        &provider,
        &request(&["TSLA"], Some(5_000.0)),
        &DashboardSettings::default(),
    )
    .unwrap();

    assert_eq!(
        view.plan,
        Some(PlanOutcome::Failed {
            message: OPTIMIZE_FAILED_MESSAGE.to_string()
        })
    );
    // The chart still renders
    assert!(!view.chart_svg.is_empty());
}

#[test]
fn unknown_ticker_is_a_data_error() {
    let provider = FixtureProvider::new(&[("TSLA", &[1.0, 2.0])]);
    let err = build_dashboard(
        &provider,
        &request(&["TSLA", "NOPE"], None),
        &DashboardSettings::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("NOPE"));
}

#[test]
fn duplicate_tickers_fetch_once() {
    let provider = FixtureProvider::new(&[("AAPL", &[1.0, 2.0])]);
    let tickers = vec!["AAPL".to_string(), "AAPL".to_string()];
    let table = fetch_prices(&provider, &tickers, Period::OneYear).unwrap();
    assert_eq!(table.tickers, vec!["AAPL"]);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn no_tickers_is_a_validation_error() {
    let provider = FixtureProvider::new(&[]);
    assert!(matches!(
        fetch_prices(&provider, &[], Period::OneYear),
        Err(DataError::ValidationError(_))
    ));
}

#[test]
fn synthetic_provider_drives_the_whole_pipeline() {
    let provider = SyntheticProvider::new(NaiveDate::from_ymd_opt(2024, 6, 28).unwrap());
    let view = build_dashboard(
        &provider,
        &request(&["TSLA", "GOOGL", "AAPL", "AMZN"], Some(25_000.0)),
        &DashboardSettings::default(),
    )
    .unwrap();

    assert_eq!(view.returns.tickers.len(), 4);
    assert_eq!(view.long.len(), 4 * view.returns.dates.len());
    for column in &view.returns.columns {
        assert_eq!(column[0], 0.0);
    }
    match view.plan {
        Some(PlanOutcome::Ready(plan)) => {
            assert!(plan.allocation.invested() <= 25_000.0 + 1e-6)
        }
        Some(PlanOutcome::Failed { message }) => assert_eq!(message, OPTIMIZE_FAILED_MESSAGE),
        None => panic!("investment was given"),
    }
}
