pub mod backtest;
pub mod execution;
pub mod sweep;

pub use backtest::{backtest_from_weights, run_backtest, BacktestEngine, BacktestResult, Simulation};
pub use execution::{execute_rebalance, CostModel, RebalanceFill, Trade, TradeSide};
pub use sweep::{rank_by_sharpe, run_sweep, sweep_table, SweepGrid, SweepResult};
