//! Advisor Web — browser front end for the dashboard.
//!
//! - `GET /` renders the period/investment/ticker form, the returns chart and,
//!   when an amount is given, the max-Sharpe plan
//! - `GET /api/returns` and `GET /api/optimize` expose the same data as JSON
//! - `GET /health` answers `ok`

pub mod config;
pub mod error;
pub mod query;
pub mod render;
pub mod routes;

pub use config::{ConfigError, ServerConfig};
pub use error::ApiError;
pub use routes::{router, AppState};
