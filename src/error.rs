use thiserror::Error;

//errors raised by the backtest pipeline stages
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BacktestError {
    #[error("No price data for instrument {0}")]
    MissingData(String),
    #[error("Unknown allocation policy: {0} (expected equal or risk_parity)")]
    UnknownPolicy(String),
    #[error("Unknown rebalance rule: {0}")]
    UnknownRebalanceRule(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Table shape mismatch: {0}")]
    ShapeMismatch(String),
}

pub type Result<T> = std::result::Result<T, BacktestError>;
