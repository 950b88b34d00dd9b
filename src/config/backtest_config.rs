use crate::error::BacktestError;
use crate::strategy::RebalanceRule;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

//complete backtest configuration, passed explicitly into every stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfiguration {
    //data
    pub data_path: PathBuf,
    pub symbols: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,

    //signal settings
    pub rebalance_freq: String,
    pub momentum_window: usize,
    pub top_k: usize,

    //allocation settings ("equal" or "risk_parity")
    pub allocation: String,
    pub vol_window: usize,

    //account settings
    pub initial_capital: f64,
    pub fee_rate: f64,
    pub slippage_rate: f64,

    //annualisation
    pub trading_days_per_year: u32,
    pub risk_free_rate: f64,

    //optional output paths
    pub output_nav_csv: Option<PathBuf>,
    pub output_holdings_csv: Option<PathBuf>,
    pub output_trades_csv: Option<PathBuf>,
    pub output_metrics_json: Option<PathBuf>,
}

impl Default for BacktestConfiguration {
    fn default() -> Self {
        BacktestConfiguration {
            data_path: PathBuf::from("data.csv"),
            symbols: ["588750", "588080", "518800", "159205", "159622", "159550"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            start_date: NaiveDate::from_ymd_opt(2018, 1, 1),
            end_date: None,
            rebalance_freq: "W-FRI".to_string(),
            momentum_window: 60,
            top_k: 1,
            allocation: "equal".to_string(),
            vol_window: 60,
            initial_capital: 100000.0,
            fee_rate: 0.0003,
            slippage_rate: 0.0005,
            trading_days_per_year: 252,
            risk_free_rate: 0.03,
            output_nav_csv: None,
            output_holdings_csv: None,
            output_trades_csv: None,
            output_metrics_json: None,
        }
    }
}

impl BacktestConfiguration {
    //load configuration from a JSON file
    pub fn from_json_file(path: &PathBuf) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: BacktestConfiguration = serde_json::from_str(&contents)?;
        Ok(config)
    }

    //save configuration to a JSON file
    pub fn to_json_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    //parsed rebalance rule
    pub fn rebalance_rule(&self) -> Result<RebalanceRule, BacktestError> {
        self.rebalance_freq.parse()
    }

    //checks structural constraints; the allocation name is checked when allocating
    pub fn validate(&self) -> Result<(), BacktestError> {
        let invalid = |reason: String| Err(BacktestError::InvalidConfig(reason));

        if self.symbols.is_empty() {
            return invalid("at least one symbol is required".to_string());
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.symbols.iter().find(|s| !seen.insert(s.as_str())) {
            return invalid(format!("symbol {} is listed more than once", dup));
        }
        if self.top_k == 0 || self.top_k > self.symbols.len() {
            return invalid(format!(
                "top_k must be between 1 and {} (got {})",
                self.symbols.len(),
                self.top_k
            ));
        }
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return invalid(format!(
                "initial_capital must be positive (got {})",
                self.initial_capital
            ));
        }
        if !(self.fee_rate >= 0.0 && self.slippage_rate >= 0.0) {
            return invalid("fee_rate and slippage_rate must be non-negative".to_string());
        }
        if self.momentum_window == 0 {
            return invalid("momentum_window must be at least 1".to_string());
        }
        if self.vol_window < 2 {
            return invalid("vol_window must be at least 2".to_string());
        }
        if self.trading_days_per_year == 0 {
            return invalid("trading_days_per_year must be positive".to_string());
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return invalid(format!("start_date {} is after end_date {}", start, end));
            }
        }
        self.rebalance_rule()?;

        Ok(())
    }
}
