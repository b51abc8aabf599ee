//! Advisor CLI — cumulative returns, portfolio optimization and export.
//!
//! Commands:
//! - `returns` — print the final cumulative return of each ticker
//! - `optimize` — max-Sharpe weights and a whole-share purchase list
//! - `export` — write the long-form return rows to CSV or Parquet

use advisor_core::data::{
    fetch_prices, CircuitBreaker, DataProvider, PriceTable, SyntheticProvider, YahooProvider,
};
use advisor_core::optimize::DEFAULT_RISK_FREE_RATE;
use advisor_core::{
    melt, plan_portfolio, DashboardRequest, Period, PortfolioPlan, ReturnTable,
    OPTIMIZE_FAILED_MESSAGE,
};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "advisor", about = "Advisor CLI — returns, max-Sharpe portfolios, export")]
struct Cli {
    /// Use deterministic synthetic prices instead of Yahoo Finance.
    #[arg(long, global = true, default_value_t = false)]
    synthetic: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the final cumulative return per ticker.
    Returns {
        /// Look-back window: 6mo, 1y, 2y, 5y, 10y, ytd, max.
        #[arg(long, default_value = "6mo")]
        period: Period,

        /// Tickers (e.g., TSLA AAPL). Defaults to TSLA.
        tickers: Vec<String>,
    },
    /// Compute max-Sharpe weights and allocate an amount in whole shares.
    Optimize {
        #[arg(long, default_value = "6mo")]
        period: Period,

        /// Amount to invest.
        #[arg(long)]
        investment: f64,

        /// Annual risk-free rate.
        #[arg(long, default_value_t = DEFAULT_RISK_FREE_RATE)]
        risk_free_rate: f64,

        /// Print the plan as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,

        tickers: Vec<String>,
    },
    /// Write long-form (Stock, Date, Value) rows to a .csv or .parquet file.
    Export {
        #[arg(long, default_value = "6mo")]
        period: Period,

        /// Output file; the extension picks the format.
        #[arg(long)]
        out: PathBuf,

        tickers: Vec<String>,
    },
}

/// `RUST_LOG` directives when they parse, otherwise `info`.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    let provider = build_provider(cli.synthetic)?;

    match cli.command {
        Commands::Returns { period, tickers } => run_returns(provider.as_ref(), period, tickers),
        Commands::Optimize {
            period,
            investment,
            risk_free_rate,
            json,
            tickers,
        } => run_optimize(
            provider.as_ref(),
            period,
            investment,
            risk_free_rate,
            json,
            tickers,
        ),
        Commands::Export {
            period,
            out,
            tickers,
        } => run_export(provider.as_ref(), period, &out, tickers),
    }
}

fn build_provider(synthetic: bool) -> Result<Arc<dyn DataProvider>> {
    if synthetic {
        return Ok(Arc::new(SyntheticProvider::new(
            chrono::Local::now().date_naive(),
        )));
    }
    let circuit_breaker = Arc::new(CircuitBreaker::default_provider());
    Ok(Arc::new(YahooProvider::new(circuit_breaker)?))
}

/// Validate and normalize the ticker list the same way the dashboard does, then fetch prices.
fn load_prices(
    provider: &dyn DataProvider,
    period: Period,
    tickers: Vec<String>,
) -> Result<(Vec<String>, PriceTable)> {
    let request = DashboardRequest {
        period,
        tickers,
        investment: None,
    }
    .normalized(advisor_core::dashboard::DEFAULT_TICKER)?;
    let prices = fetch_prices(provider, &request.tickers, period)
        .with_context(|| format!("failed to fetch {}", request.tickers.join(", ")))?;
    if prices.is_empty() {
        bail!("no prices returned for {}", request.tickers.join(", "));
    }
    Ok((request.tickers, prices))
}

fn run_returns(provider: &dyn DataProvider, period: Period, tickers: Vec<String>) -> Result<()> {
    let (_, prices) = load_prices(provider, period, tickers)?;
    let returns = ReturnTable::from_prices(&prices);

    let first = returns.dates.first().map(|d| d.to_string()).unwrap_or_default();
    let last = returns.dates.last().map(|d| d.to_string()).unwrap_or_default();
    println!();
    println!("=== Cumulative Returns ({period}) ===");
    println!("Range:  {first} to {last} ({} days)", returns.dates.len());
    println!();
    println!("{:<8} {:>10}", "Ticker", "Return");
    println!("{}", "-".repeat(19));
    for (ticker, value) in returns.final_returns() {
        println!("{:<8} {:>9.2}%", ticker, value * 100.0);
    }
    println!();
    Ok(())
}

fn run_optimize(
    provider: &dyn DataProvider,
    period: Period,
    investment: f64,
    risk_free_rate: f64,
    json: bool,
    tickers: Vec<String>,
) -> Result<()> {
    if !investment.is_finite() || investment <= 0.0 {
        bail!("--investment must be a positive amount (got {investment})");
    }
    let (_, prices) = load_prices(provider, period, tickers)?;

    let plan = match plan_portfolio(&prices, investment, risk_free_rate) {
        Ok(plan) => plan,
        Err(e) => {
            tracing::warn!(error = %e, "portfolio optimization failed");
            bail!(OPTIMIZE_FAILED_MESSAGE);
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan, period);
    }
    Ok(())
}

fn run_export(
    provider: &dyn DataProvider,
    period: Period,
    out: &std::path::Path,
    tickers: Vec<String>,
) -> Result<()> {
    let (tickers, prices) = load_prices(provider, period, tickers)?;
    let long = melt(&ReturnTable::from_prices(&prices));
    long.export(out)
        .with_context(|| format!("failed to export to {}", out.display()))?;
    println!(
        "Wrote {} rows for {} to {}",
        long.len(),
        tickers.join(", "),
        out.display()
    );
    Ok(())
}

fn print_plan(plan: &PortfolioPlan, period: Period) {
    println!();
    println!("=== Max Sharpe Portfolio ({period}) ===");
    println!("{:<8} {:>8}", "Ticker", "Weight");
    println!("{}", "-".repeat(17));
    for w in &plan.weights {
        println!("{:<8} {:>7.2}%", w.ticker, w.weight * 100.0);
    }
    println!();
    println!("--- Performance ---");
    println!(
        "Expected Return: {:.2}%",
        plan.performance.expected_return * 100.0
    );
    println!("Volatility:      {:.2}%", plan.performance.volatility * 100.0);
    println!("Sharpe:          {:.3}", plan.performance.sharpe_ratio);
    println!();
    println!("--- Allocation of ${:.2} ---", plan.investment);
    println!("{:<8} {:>8} {:>12} {:>12}", "Ticker", "Shares", "Price", "Cost");
    println!("{}", "-".repeat(43));
    for s in &plan.allocation.shares {
        println!(
            "{:<8} {:>8} {:>12.2} {:>12.2}",
            s.ticker,
            s.shares,
            s.price,
            s.shares as f64 * s.price
        );
    }
    println!();
    println!("Invested:        ${:.2}", plan.allocation.invested());
    println!("Funds remaining: ${:.2}", plan.allocation.leftover);
    println!();
}
