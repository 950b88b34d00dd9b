pub mod benchmark;
pub mod summary;
pub mod timeseries;

pub use benchmark::benchmark_nav;
pub use summary::SummaryMetrics;
pub use timeseries::{calculate_equity_curve, calculate_returns, max_drawdown, EquityPoint, NavSeries};
