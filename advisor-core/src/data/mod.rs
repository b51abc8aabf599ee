//! Market data: providers and the aligned price table.

pub mod align;
pub mod circuit_breaker;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use align::{fetch_prices, PriceTable};
pub use circuit_breaker::CircuitBreaker;
pub use provider::{DataError, DataProvider, DataSource, FetchResult, PriceBar};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;
