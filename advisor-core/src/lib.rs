//! Advisor Core — the price pipeline behind the dashboard.
//!
//! - Look-back periods and market-data providers (Yahoo Finance, synthetic)
//! - Multi-ticker price alignment
//! - Cumulative return normalization and long-form reshaping
//! - Mean-variance estimation and the long-only max-Sharpe portfolio
//! - Greedy whole-share allocation under a budget
//! - SVG rendering of the return curves

pub mod allocation;
pub mod chart;
pub mod dashboard;
pub mod data;
pub mod frame;
pub mod optimize;
pub mod period;
pub mod returns;

pub use allocation::{greedy_allocation, Allocation, AllocationError, ShareCount};
pub use dashboard::{
    build_dashboard, plan_portfolio, validate_ticker, DashboardError, DashboardRequest,
    DashboardSettings, DashboardView, InvalidTicker, PlanOutcome, PortfolioPlan,
    OPTIMIZE_FAILED_MESSAGE,
};
pub use frame::{melt, LongFrame, LongRow};
pub use optimize::{optimize_max_sharpe, OptimizeError, OptimizedPortfolio, Performance};
pub use period::Period;
pub use returns::{cumulative_returns, ReturnTable};
