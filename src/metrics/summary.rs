use crate::metrics::timeseries::{calculate_equity_curve, calculate_returns, max_drawdown, NavSeries};
use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

//summary metrics for a nav series; None marks a value that is undefined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub start_value: f64,
    pub end_value: f64,
    pub total_return: f64,
    pub annualized_return: Option<f64>,
    pub annualized_volatility: Option<f64>,
    pub sharpe_ratio: Option<f64>,
    pub max_drawdown: f64,
    pub num_rebalances: usize,
    pub total_costs: f64,
}

impl SummaryMetrics {
    //reduces a nav series to summary statistics
    pub fn from_nav(nav: &NavSeries, trading_days_per_year: u32, risk_free_rate: f64) -> Self {
        let (Some((start_date, start_value)), Some((end_date, end_value))) =
            (nav.first(), nav.last())
        else {
            return SummaryMetrics::empty();
        };

        let growth = if start_value > 0.0 {
            end_value / start_value
        } else {
            f64::NAN
        };
        let total_return = growth - 1.0;

        //cagr over calendar time
        let calendar_days = (end_date - start_date).num_days();
        let annualized_return = if calendar_days > 0 && growth.is_finite() {
            Some(growth.powf(365.25 / calendar_days as f64) - 1.0)
        } else {
            None
        };

        //daily returns include the leading zero of the first day
        let returns = calculate_returns(&nav.values);
        let annualized_volatility = if returns.len() >= 2 {
            Some(returns.std_dev() * (trading_days_per_year as f64).sqrt())
        } else {
            None
        };

        let sharpe_ratio = match (annualized_return, annualized_volatility) {
            (Some(ret), Some(vol)) if vol > 0.0 => Some((ret - risk_free_rate) / vol),
            _ => None,
        };

        let max_dd = max_drawdown(&calculate_equity_curve(nav));

        SummaryMetrics {
            start_value,
            end_value,
            total_return,
            annualized_return,
            annualized_volatility,
            sharpe_ratio,
            max_drawdown: max_dd,
            num_rebalances: 0,
            total_costs: 0.0,
        }
    }

    fn empty() -> Self {
        SummaryMetrics {
            start_value: 0.0,
            end_value: 0.0,
            total_return: 0.0,
            annualized_return: None,
            annualized_volatility: None,
            sharpe_ratio: None,
            max_drawdown: 0.0,
            num_rebalances: 0,
            total_costs: 0.0,
        }
    }

    //labelled, formatted values in display order
    fn formatted(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Start Value", format!("{:.2}", self.start_value)),
            ("End Value", format!("{:.2}", self.end_value)),
            ("Total Return", pct(Some(self.total_return))),
            ("CAGR", pct(self.annualized_return)),
            ("Annualized Volatility", pct(self.annualized_volatility)),
            ("Sharpe Ratio", ratio(self.sharpe_ratio)),
            ("Max Drawdown", pct(Some(self.max_drawdown))),
            ("Rebalances", format!("{}", self.num_rebalances)),
            ("Transaction Costs", format!("{:.2}", self.total_costs)),
        ]
    }

    //attaches trading activity from a simulation
    pub fn with_activity(mut self, num_rebalances: usize, total_costs: f64) -> Self {
        self.num_rebalances = num_rebalances;
        self.total_costs = total_costs;
        self
    }

    //builds a metrics table, with a benchmark column when given
    pub fn to_table(&self, benchmark: Option<&SummaryMetrics>) -> Table {
        let mut table = Table::new();

        let mut header = vec![Cell::new("Metric"), Cell::new("Strategy")];
        if benchmark.is_some() {
            header.push(Cell::new("Benchmark"));
        }
        table.add_row(Row::new(header));

        let bench_values = benchmark.map(|b| b.formatted());

        for (n, (label, value)) in self.formatted().into_iter().enumerate() {
            let mut cells = vec![Cell::new(label), Cell::new(&value)];
            if let Some(values) = &bench_values {
                cells.push(Cell::new(&values[n].1));
            }
            table.add_row(Row::new(cells));
        }

        table
    }

    //prints metrics in a formatted table
    pub fn pretty_print_table(&self, benchmark: Option<&SummaryMetrics>) {
        self.to_table(benchmark).printstd();
    }
}

fn pct(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.2}%", v * 100.0),
        _ => "n/a".to_string(),
    }
}

fn ratio(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.3}", v),
        _ => "n/a".to_string(),
    }
}
