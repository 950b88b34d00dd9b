//converts the holding mask into daily target weights (equal or inverse volatility)
//the weight table carries one rebalance flag per day

use crate::data::{Panel, PricePanel, SignalMask};
use crate::error::{BacktestError, Result};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

//absolute per-instrument difference above which a weight row counts as changed
pub const WEIGHT_TOLERANCE: f64 = 1e-9;

//weights are normalised, so the annualisation factor cancels out
const ANNUALISATION_DAYS: u32 = 252;

//allocation policy applied among the selected instruments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationPolicy {
    Equal,      //1 / n for each selected instrument
    RiskParity, //proportional to 1 / trailing volatility
}

impl FromStr for AllocationPolicy {
    type Err = BacktestError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "equal" => Ok(AllocationPolicy::Equal),
            "risk_parity" => Ok(AllocationPolicy::RiskParity),
            _ => Err(BacktestError::UnknownPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for AllocationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationPolicy::Equal => write!(f, "equal"),
            AllocationPolicy::RiskParity => write!(f, "risk_parity"),
        }
    }
}

//daily target weights plus the per-day rebalance flag
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightTable {
    weights: Panel<f64>,
    rebalance: Vec<bool>,
}

impl WeightTable {
    //flags each day whose row differs from the previous one
    //the first day is compared with an all-cash row
    pub fn new(weights: Panel<f64>) -> Self {
        let zero = vec![0.0; weights.width()];
        let rebalance = (0..weights.len())
            .map(|t| {
                let prev = if t == 0 { &zero[..] } else { weights.row(t - 1) };
                weights
                    .row(t)
                    .iter()
                    .zip(prev)
                    .any(|(w, p)| (w - p).abs() > WEIGHT_TOLERANCE)
            })
            .collect();

        WeightTable { weights, rebalance }
    }

    pub fn weights(&self) -> &Panel<f64> {
        &self.weights
    }

    pub fn row(&self, t: usize) -> &[f64] {
        self.weights.row(t)
    }

    pub fn is_rebalance_day(&self, t: usize) -> bool {
        self.rebalance[t]
    }

    pub fn rebalance_flags(&self) -> &[bool] {
        &self.rebalance
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

//equal weights over the selected columns
fn equal_weights(selected: &[bool]) -> Vec<f64> {
    let active = selected.iter().filter(|&&s| s).count();
    if active == 0 {
        return vec![0.0; selected.len()];
    }
    let weight = 1.0 / active as f64;
    selected
        .iter()
        .map(|&s| if s { weight } else { 0.0 })
        .collect()
}

//inverse-volatility weights over the selected columns
//a missing or zero volatility takes the mean of the usable ones among the
//selected instruments, with none usable the row is equally weighted
fn inverse_volatility_weights(selected: &[bool], vols: &[Option<f64>]) -> Vec<f64> {
    let usable: Vec<f64> = selected
        .iter()
        .zip(vols)
        .filter_map(|(&s, v)| if s { *v } else { None })
        .filter(|v| *v > 0.0)
        .collect();

    if usable.is_empty() {
        return equal_weights(selected);
    }

    let mean_vol = usable.iter().sum::<f64>() / usable.len() as f64;

    let inverse: Vec<f64> = selected
        .iter()
        .zip(vols)
        .map(|(&s, v)| match (s, v) {
            (false, _) => 0.0,
            (true, Some(vol)) if *vol > 0.0 => 1.0 / vol,
            (true, _) => 1.0 / mean_vol,
        })
        .collect();

    let total: f64 = inverse.iter().sum();
    inverse.iter().map(|iv| iv / total).collect()
}

//trailing annualised std of simple returns known on day t, over the last
//min(vol_window, t) returns; undefined with fewer than 2 returns
fn trailing_volatility(prices: &PricePanel, vol_window: usize) -> Vec<Vec<Option<f64>>> {
    let annualise = (ANNUALISATION_DAYS as f64).sqrt();

    (0..prices.len())
        .map(|t| {
            let count = vol_window.min(t);
            (0..prices.width())
                .map(|i| {
                    if count < 2 {
                        return None;
                    }
                    let returns: Vec<f64> = (t + 1 - count..=t)
                        .map(|s| prices.get(s, i) / prices.get(s - 1, i) - 1.0)
                        .collect();
                    let vol = returns.std_dev() * annualise;
                    vol.is_finite().then_some(vol)
                })
                .collect()
        })
        .collect()
}

//target weights for every day of the price panel
//fails with UnknownPolicy for any name other than equal / risk_parity
pub fn compute_positions(
    signals: &SignalMask,
    prices: &PricePanel,
    policy: &str,
    vol_window: usize,
) -> Result<WeightTable> {
    let policy: AllocationPolicy = policy.parse()?;
    prices.ensure_same_axes(signals, "signal mask")?;

    let rows: Vec<Vec<f64>> = match policy {
        AllocationPolicy::Equal => signals.rows().iter().map(|row| equal_weights(row)).collect(),
        AllocationPolicy::RiskParity => {
            let vols = trailing_volatility(prices, vol_window);
            signals
                .rows()
                .iter()
                .zip(&vols)
                .map(|(row, vol_row)| inverse_volatility_weights(row, vol_row))
                .collect()
        }
    };

    let table = WeightTable::new(prices.with_rows(rows)?);
    let rebalances = table.rebalance_flags().iter().filter(|&&r| r).count();
    info!(%policy, rebalances, "computed target weights");
    debug!(vol_window, days = table.len(), "weight table shape");

    Ok(table)
}
