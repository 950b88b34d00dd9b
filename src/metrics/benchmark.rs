use crate::data::PricePanel;
use crate::metrics::timeseries::NavSeries;

//equal-weight buy-and-hold reference: capital scaled by the cross-sectional
//mean close relative to the first day's mean close
pub fn benchmark_nav(prices: &PricePanel, initial_capital: f64) -> NavSeries {
    let means: Vec<f64> = prices
        .rows()
        .iter()
        .map(|row| row.iter().sum::<f64>() / row.len().max(1) as f64)
        .collect();

    let base = means.first().copied().unwrap_or(0.0);
    let values = means
        .iter()
        .map(|m| {
            if base > 0.0 {
                initial_capital * m / base
            } else {
                initial_capital
            }
        })
        .collect();

    NavSeries::new(prices.dates().to_vec(), values)
}
