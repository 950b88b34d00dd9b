use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

//portfolio value per trading day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavSeries {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl NavSeries {
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Self {
        debug_assert_eq!(dates.len(), values.len());
        NavSeries { dates, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first(&self) -> Option<(NaiveDate, f64)> {
        Some((*self.dates.first()?, *self.values.first()?))
    }

    pub fn last(&self) -> Option<(NaiveDate, f64)> {
        Some((*self.dates.last()?, *self.values.last()?))
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }
}

//a point in the equity curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub nav: f64,
    pub drawdown: f64, //(nav - running peak) / running peak, always <= 0
    pub returns: f64,
}

impl EquityPoint {
    pub fn new(date: NaiveDate, nav: f64, drawdown: f64, returns: f64) -> Self {
        EquityPoint {
            date,
            nav,
            drawdown,
            returns,
        }
    }
}

//calculates the equity curve with drawdowns against the running peak
pub fn calculate_equity_curve(nav: &NavSeries) -> Vec<EquityPoint> {
    let mut curve = Vec::with_capacity(nav.len());
    let mut peak = f64::NEG_INFINITY;
    let returns = calculate_returns(&nav.values);

    for (i, (date, value)) in nav.iter().enumerate() {
        peak = peak.max(value);

        let drawdown = if peak > 0.0 {
            (value - peak) / peak
        } else {
            0.0
        };

        curve.push(EquityPoint::new(date, value, drawdown, returns[i]));
    }

    curve
}

//calculates maximum drawdown (the most negative drawdown) from the equity curve
pub fn max_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    equity_curve
        .iter()
        .map(|point| point.drawdown)
        .fold(0.0, f64::min)
}

//daily percentage changes, one per value; the first is 0
//a change from a zero value is taken as 0
pub fn calculate_returns(values: &[f64]) -> Vec<f64> {
    let mut returns = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        let ret = if i == 0 || values[i - 1] == 0.0 {
            0.0
        } else {
            values[i] / values[i - 1] - 1.0
        };
        returns.push(ret);
    }
    returns
}
