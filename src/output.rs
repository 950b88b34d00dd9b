//csv and json writers for backtest outputs

use crate::engine::{Simulation, Trade};
use crate::metrics::{EquityPoint, SummaryMetrics};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

//writes the equity curve: date,nav,drawdown,returns
pub fn save_equity_csv(equity_curve: &[EquityPoint], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .context(format!("Failed to create {:?}", path))?;

    for point in equity_curve {
        writer.serialize(point)?;
    }

    writer.flush()?;
    Ok(())
}

//writes shares per instrument per day plus the cash column
pub fn save_holdings_csv(simulation: &Simulation, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .context(format!("Failed to create {:?}", path))?;

    let holdings = &simulation.holdings;
    let mut header = vec!["date".to_string()];
    header.extend(holdings.symbols().iter().cloned());
    header.push("cash".to_string());
    writer.write_record(&header)?;

    for (t, date) in holdings.dates().iter().enumerate() {
        let mut record = vec![date.to_string()];
        record.extend(holdings.row(t).iter().map(|s| s.to_string()));
        record.push(simulation.cash[t].to_string());
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

//writes the trade log
pub fn save_trades_csv(trades: &[Trade], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .context(format!("Failed to create {:?}", path))?;

    for trade in trades {
        writer.serialize(trade)?;
    }

    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct MetricsReport<'a> {
    strategy: &'a SummaryMetrics,
    benchmark: Option<&'a SummaryMetrics>,
}

//writes the metrics record(s) as pretty json; undefined values become null
pub fn save_metrics_json(
    strategy: &SummaryMetrics,
    benchmark: Option<&SummaryMetrics>,
    path: &Path,
) -> Result<()> {
    let report = MetricsReport {
        strategy,
        benchmark,
    };
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(path, json).context(format!("Failed to write {:?}", path))?;
    Ok(())
}
