//! Historical look-back windows offered by the dashboard.
//!
//! The labels double as the Yahoo chart API `range` parameter, so a
//! `Period` can be passed straight through to the provider.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A look-back window ending today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Period {
    #[default]
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "10y")]
    TenYears,
    #[serde(rename = "ytd")]
    YearToDate,
    #[serde(rename = "max")]
    Max,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown period '{0}' (expected one of 6mo, 1y, 2y, 5y, 10y, ytd, max)")]
pub struct PeriodError(pub String);

impl Period {
    /// All choices, in the order they are shown to the user.
    pub const ALL: [Period; 7] = [
        Period::SixMonths,
        Period::OneYear,
        Period::TwoYears,
        Period::FiveYears,
        Period::TenYears,
        Period::YearToDate,
        Period::Max,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
            Period::TenYears => "10y",
            Period::YearToDate => "ytd",
            Period::Max => "max",
        }
    }

    /// First calendar date covered by this window when it ends on `today`.
    pub fn start_date(&self, today: NaiveDate) -> NaiveDate {
        let back = |months: u32| {
            today
                .checked_sub_months(Months::new(months))
                .unwrap_or(NaiveDate::MIN)
        };
        match self {
            Period::SixMonths => back(6),
            Period::OneYear => back(12),
            Period::TwoYears => back(24),
            Period::FiveYears => back(60),
            Period::TenYears => back(120),
            Period::YearToDate => NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
            Period::Max => NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Period::ALL
            .into_iter()
            .find(|p| p.as_str() == needle)
            .ok_or_else(|| PeriodError(s.to_string()))
    }
}
