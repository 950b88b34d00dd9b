//trailing factors computed from the price panel

use crate::data::{FactorTable, PricePanel};
use statrs::statistics::Statistics;

//trailing total return over `window` rows: p[t] / p[t - window] - 1
//the first `window` rows are undefined
pub fn compute_momentum(prices: &PricePanel, window: usize) -> FactorTable {
    prices.map_cells(|t, i| {
        if t < window {
            return None;
        }
        let base = *prices.get(t - window, i);
        let value = *prices.get(t, i) / base - 1.0;
        value.is_finite().then_some(value)
    })
}

//annualised rolling standard deviation of daily log returns
//the first `window` rows are undefined
pub fn compute_volatility(
    prices: &PricePanel,
    window: usize,
    trading_days_per_year: u32,
) -> FactorTable {
    let annualise = (trading_days_per_year as f64).sqrt();
    let log_returns = log_returns(prices);

    prices.map_cells(|t, i| {
        if window < 2 || t < window {
            return None;
        }
        let trailing: Vec<f64> = (t + 1 - window..=t)
            .map(|s| log_returns[s][i])
            .collect();
        let vol = trailing.std_dev() * annualise;
        vol.is_finite().then_some(vol)
    })
}

//ln(p[t] / p[t-1]) per cell, 0 on the first row (never read by the rolling window)
fn log_returns(prices: &PricePanel) -> Vec<Vec<f64>> {
    prices
        .rows()
        .iter()
        .enumerate()
        .map(|(t, row)| {
            row.iter()
                .enumerate()
                .map(|(i, &p)| if t == 0 { 0.0 } else { (p / prices.get(t - 1, i)).ln() })
                .collect()
        })
        .collect()
}
