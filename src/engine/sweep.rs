//parameter sweeps over independent pipeline runs

use crate::config::BacktestConfiguration;
use crate::data::PricePanel;
use crate::engine::backtest::run_backtest;
use crate::error::Result;
use crate::metrics::SummaryMetrics;
use prettytable::{Cell, Row, Table};
use rayon::prelude::*;
use std::cmp::Ordering;
use tracing::info;

//every combination of the listed values is run against a base configuration
#[derive(Debug, Clone)]
pub struct SweepGrid {
    pub momentum_windows: Vec<usize>,
    pub top_ks: Vec<usize>,
    pub allocations: Vec<String>, //policy names, parsed per run
}

impl SweepGrid {
    //total number of configurations
    pub fn size(&self) -> usize {
        self.momentum_windows.len() * self.top_ks.len() * self.allocations.len()
    }

    //windows outermost
    pub fn generate_configs(&self, base: &BacktestConfiguration) -> Vec<BacktestConfiguration> {
        let mut configs = Vec::with_capacity(self.size());

        for &window in &self.momentum_windows {
            for &top_k in &self.top_ks {
                for allocation in &self.allocations {
                    let mut config = base.clone();
                    config.momentum_window = window;
                    config.top_k = top_k;
                    config.allocation = allocation.clone();
                    configs.push(config);
                }
            }
        }

        configs
    }
}

//one evaluated grid point
#[derive(Debug, Clone)]
pub struct SweepResult {
    pub momentum_window: usize,
    pub top_k: usize,
    pub allocation: String,
    pub summary: SummaryMetrics,
}

//runs every configuration in parallel; results keep grid order and the
//first failing configuration aborts the sweep
pub fn run_sweep(
    prices: &PricePanel,
    base: &BacktestConfiguration,
    grid: &SweepGrid,
) -> Result<Vec<SweepResult>> {
    let configs = grid.generate_configs(base);
    info!(configurations = configs.len(), "starting parameter sweep");

    configs
        .par_iter()
        .map(|config| -> Result<SweepResult> {
            let result = run_backtest(prices, config)?;
            Ok(SweepResult {
                momentum_window: config.momentum_window,
                top_k: config.top_k,
                allocation: config.allocation.clone(),
                summary: result.summary,
            })
        })
        .collect()
}

//best sharpe first, undefined sharpe last
pub fn rank_by_sharpe(results: &mut [SweepResult]) {
    results.sort_by(|a, b| match (a.summary.sharpe_ratio, b.summary.sharpe_ratio) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

pub fn sweep_table(results: &[SweepResult]) -> Table {
    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Window"),
        Cell::new("Top K"),
        Cell::new("Allocation"),
        Cell::new("Total Return"),
        Cell::new("CAGR"),
        Cell::new("Sharpe"),
        Cell::new("Max Drawdown"),
    ]));

    let fmt_opt = |v: Option<f64>, scale: f64, digits: usize| match v {
        Some(x) if x.is_finite() => format!("{:.*}", digits, x * scale),
        _ => "n/a".to_string(),
    };

    for r in results {
        table.add_row(Row::new(vec![
            Cell::new(&r.momentum_window.to_string()),
            Cell::new(&r.top_k.to_string()),
            Cell::new(&r.allocation),
            Cell::new(&fmt_opt(Some(r.summary.total_return), 100.0, 2)),
            Cell::new(&fmt_opt(r.summary.annualized_return, 100.0, 2)),
            Cell::new(&fmt_opt(r.summary.sharpe_ratio, 1.0, 3)),
            Cell::new(&fmt_opt(Some(r.summary.max_drawdown), 100.0, 2)),
        ]));
    }

    table
}
