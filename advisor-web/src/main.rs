//! Advisor Web server.
//!
//! # Usage
//! ```sh
//! advisor-web --config advisor.toml --bind 0.0.0.0:8050
//! RUST_LOG=debug advisor-web --synthetic
//! ```

use advisor_core::data::{DataProvider, SyntheticProvider, YahooProvider};
use advisor_web::{router, AppState, ServerConfig};
use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "advisor-web", about = "Financial Advisor dashboard server")]
struct Args {
    /// TOML config file. Missing file means defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address, overrides the config file.
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Serve deterministic synthetic prices instead of Yahoo Finance.
    #[arg(long, default_value_t = false)]
    synthetic: bool,
}

/// `RUST_LOG` directives when they parse, otherwise `info`.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn main() -> Result<()> {
    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with(stdout_layer)
        .init();

    let args = Args::parse();

    let mut config = ServerConfig::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.bind = bind.to_string();
    }
    if args.synthetic {
        config.synthetic = true;
    }
    let addr = config.bind_addr()?;

    // The blocking HTTP client must be created and dropped outside the runtime
    let provider: Arc<dyn DataProvider> = if config.synthetic {
        Arc::new(SyntheticProvider::new(chrono::Local::now().date_naive()))
    } else {
        Arc::new(YahooProvider::new(Arc::new(config.circuit_breaker()))?)
    };
    info!(
        provider = provider.name(),
        tickers = ?config.ticker_choices(),
        "Advisor Web {} starting",
        env!("CARGO_PKG_VERSION")
    );

    let state = AppState::new(Arc::clone(&provider), &config);
    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    runtime.block_on(serve(addr, state))?;
    drop(runtime);
    drop(provider);
    Ok(())
}

async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("listening on http://{addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_filter_honours_rust_log() {
        assert_eq!(log_filter(Some("debug")).to_string().to_lowercase(), "debug");
        assert_eq!(
            log_filter(Some("tower_http=debug")).to_string().to_lowercase(),
            "tower_http=debug"
        );
        assert_eq!(log_filter(Some("")).to_string().to_lowercase(), "info");
        assert_eq!(log_filter(None).to_string().to_lowercase(), "info");
    }
}
