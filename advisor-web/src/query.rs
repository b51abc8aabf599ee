//! Query-string parsing for the form and JSON endpoints.
//!
//! The form submits `period`, `investment` and one `stocks` pair per selected
//! ticker. `stocks=AAPL,TSLA` is accepted as well.

use advisor_core::period::PeriodError;
use advisor_core::{validate_ticker, DashboardRequest, InvalidTicker, Period};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error(transparent)]
    Period(#[from] PeriodError),

    #[error("investment amount '{0}' is not a number")]
    Investment(String),

    #[error(transparent)]
    Ticker(#[from] InvalidTicker),
}

/// Parse a raw query string. Absent fields take their defaults; an absent
/// `stocks` list is left empty for the pipeline to fill in.
pub fn parse_query(raw: Option<&str>) -> Result<DashboardRequest, QueryError> {
    let mut request = DashboardRequest {
        tickers: Vec::new(),
        ..DashboardRequest::default()
    };

    let Some(raw) = raw else {
        return Ok(request);
    };

    for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        let value = value.trim();
        match key.as_ref() {
            "period" if !value.is_empty() => request.period = value.parse::<Period>()?,
            "investment" if !value.is_empty() => {
                let amount: f64 = value
                    .parse()
                    .map_err(|_| QueryError::Investment(value.to_string()))?;
                if !amount.is_finite() {
                    return Err(QueryError::Investment(value.to_string()));
                }
                request.investment = Some(amount);
            }
            "stocks" => {
                for ticker in value.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                    request.tickers.push(validate_ticker(ticker)?);
                }
            }
            _ => {}
        }
    }

    Ok(request)
}
