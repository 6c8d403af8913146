pub mod summary;
pub mod timeseries;

pub use summary::{SummaryMetrics, TRADING_DAYS_PER_YEAR};
pub use timeseries::{calculate_drawdown, calculate_equity_curve, EquityPoint};
