//a Rust-based momentum rotation backtesting engine for exchange-traded funds

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod factors;
pub mod metrics;
pub mod output;
pub mod portfolio;
pub mod strategy;

//prelude module for convenient imports
pub mod prelude {
    pub use crate::config::BacktestConfiguration;
    pub use crate::data::{
        filter_by_symbol, load_csv, load_price_panel, Bar, CsvPriceProvider, FactorTable, Panel,
        PriceProvider, PricePanel, SignalMask,
    };
    pub use crate::engine::{
        backtest_from_weights, rank_by_sharpe, run_backtest, run_sweep, sweep_table,
        BacktestEngine, BacktestResult, CostModel, Simulation, SweepGrid, SweepResult, Trade,
    };
    pub use crate::error::BacktestError;
    pub use crate::factors::{compute_momentum, compute_volatility};
    pub use crate::metrics::{benchmark_nav, calculate_equity_curve, EquityPoint, NavSeries, SummaryMetrics};
    pub use crate::output::{save_equity_csv, save_holdings_csv, save_metrics_json, save_trades_csv};
    pub use crate::portfolio::{compute_positions, Account, AllocationPolicy, WeightTable};
    pub use crate::strategy::{generate_signals, RebalanceRule};
}
