//! Server configuration.
//!
//! Read from an optional TOML file; every field has a default so an empty file
//! (or no file) gives a working local dashboard on port 8050.
//!
//! ```toml
//! bind = "127.0.0.1:8050"
//! synthetic = false
//! risk_free_rate = 0.02
//! default_ticker = "TSLA"
//! tickers = ["TSLA", "GOOGL", "AAPL", "AMZN"]
//! breaker_failures = 3
//! breaker_cooldown_secs = 900
//! ```

use advisor_core::dashboard::{DashboardSettings, DEFAULT_TICKER, DEFAULT_TICKER_CHOICES};
use advisor_core::data::CircuitBreaker;
use advisor_core::validate_ticker;
use advisor_core::optimize::DEFAULT_RISK_FREE_RATE;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Listen address.
    pub bind: String,
    /// Serve deterministic synthetic prices instead of calling Yahoo.
    pub synthetic: bool,
    /// Annual risk-free rate for the Sharpe ratio.
    pub risk_free_rate: f64,
    /// Ticker charted when the selection is empty.
    pub default_ticker: String,
    /// Choices offered in the ticker list.
    pub tickers: Vec<String>,
    /// Page heading.
    pub title: String,
    /// Consecutive Yahoo failures (429 or 5xx) before requests pause.
    pub breaker_failures: u32,
    /// How long requests stay paused once the breaker opens.
    pub breaker_cooldown_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8050".into(),
            synthetic: false,
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            default_ticker: DEFAULT_TICKER.into(),
            tickers: DEFAULT_TICKER_CHOICES.iter().map(|t| t.to_string()).collect(),
            title: "Financial Advisor".into(),
            breaker_failures: 3,
            breaker_cooldown_secs: 15 * 60,
        }
    }
}

impl ServerConfig {
    /// Defaults when no path is given or the file does not exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) if path.exists() => Self::from_file(path),
            Some(path) => {
                tracing::warn!(path = %path.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if !self.risk_free_rate.is_finite() {
            return Err(ConfigError::Invalid("risk_free_rate must be finite".into()));
        }
        for ticker in std::iter::once(&self.default_ticker).chain(&self.tickers) {
            validate_ticker(ticker).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        if self.breaker_failures == 0 {
            return Err(ConfigError::Invalid("breaker_failures must be at least 1".into()));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("bind '{}': {e}", self.bind)))
    }

    /// Choices with the default ticker first if it is not already offered.
    pub fn ticker_choices(&self) -> Vec<String> {
        let mut choices: Vec<String> = self
            .tickers
            .iter()
            .map(|t| t.trim().to_ascii_uppercase())
            .collect();
        let default = self.default_ticker.trim().to_ascii_uppercase();
        if !choices.contains(&default) {
            choices.insert(0, default);
        }
        choices
    }

    pub fn circuit_breaker(&self) -> CircuitBreaker {
        CircuitBreaker::new(Duration::from_secs(self.breaker_cooldown_secs))
            .with_threshold(self.breaker_failures)
    }

    pub fn dashboard_settings(&self) -> DashboardSettings {
        DashboardSettings {
            risk_free_rate: self.risk_free_rate,
            default_ticker: self.default_ticker.trim().to_ascii_uppercase(),
        }
    }
}
