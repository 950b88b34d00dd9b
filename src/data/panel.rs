use crate::error::{BacktestError, Result};
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

//a dates x symbols table; every stage of the pipeline produces one
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel<T> {
    dates: Vec<NaiveDate>,
    symbols: Vec<String>,
    rows: Vec<Vec<T>>,
}

//closing prices, forward-filled, positive everywhere
pub type PricePanel = Panel<f64>;

//momentum or volatility values, None where the trailing window is incomplete
pub type FactorTable = Panel<Option<f64>>;

//true where an instrument is a designated holding
pub type SignalMask = Panel<bool>;

impl<T> Panel<T> {
    //creates a panel, checking the calendar is strictly increasing and every row is full width
    pub fn new(dates: Vec<NaiveDate>, symbols: Vec<String>, rows: Vec<Vec<T>>) -> Result<Self> {
        if dates.len() != rows.len() {
            return Err(BacktestError::ShapeMismatch(format!(
                "{} dates but {} rows",
                dates.len(),
                rows.len()
            )));
        }

        if let Some(pos) = dates.windows(2).position(|w| w[0] >= w[1]) {
            return Err(BacktestError::ShapeMismatch(format!(
                "calendar not strictly increasing at {}",
                dates[pos + 1]
            )));
        }

        if let Some(row) = rows.iter().position(|r| r.len() != symbols.len()) {
            return Err(BacktestError::ShapeMismatch(format!(
                "row {} has {} values, expected {}",
                row,
                rows[row].len(),
                symbols.len()
            )));
        }

        Ok(Panel {
            dates,
            symbols,
            rows,
        })
    }

    //builds a panel on the same axes from a per-cell function
    pub fn map_cells<U>(&self, mut f: impl FnMut(usize, usize) -> U) -> Panel<U> {
        let rows = (0..self.len())
            .map(|t| (0..self.width()).map(|i| f(t, i)).collect())
            .collect();

        Panel {
            dates: self.dates.clone(),
            symbols: self.symbols.clone(),
            rows,
        }
    }

    //builds a panel on the same axes from whole rows
    pub fn with_rows<U>(&self, rows: Vec<Vec<U>>) -> Result<Panel<U>> {
        Panel::new(self.dates.clone(), self.symbols.clone(), rows)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn rows(&self) -> &[Vec<T>] {
        &self.rows
    }

    pub fn row(&self, t: usize) -> &[T] {
        &self.rows[t]
    }

    pub fn get(&self, t: usize, i: usize) -> &T {
        &self.rows[t][i]
    }

    //number of trading days
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    //number of instruments
    pub fn width(&self) -> usize {
        self.symbols.len()
    }

    //true when both panels share the calendar and the symbol order
    pub fn same_axes<U>(&self, other: &Panel<U>) -> bool {
        self.dates == other.dates && self.symbols == other.symbols
    }

    //errors unless other lives on the same axes
    pub fn ensure_same_axes<U>(&self, other: &Panel<U>, what: &str) -> Result<()> {
        if self.same_axes(other) {
            Ok(())
        } else {
            Err(BacktestError::ShapeMismatch(format!(
                "{} is not aligned with the price panel ({}x{} vs {}x{})",
                what,
                other.len(),
                other.width(),
                self.len(),
                self.width()
            )))
        }
    }
}

impl PricePanel {
    //builds a price panel from per-symbol close columns on a shared calendar
    pub fn from_columns(
        dates: Vec<NaiveDate>,
        symbols: Vec<String>,
        columns: Vec<Vec<f64>>,
    ) -> Result<Self> {
        if columns.len() != symbols.len() {
            return Err(BacktestError::ShapeMismatch(format!(
                "{} symbols but {} columns",
                symbols.len(),
                columns.len()
            )));
        }

        for (symbol, column) in symbols.iter().zip(&columns) {
            if column.len() != dates.len() {
                return Err(BacktestError::ShapeMismatch(format!(
                    "column {} has {} values for {} dates",
                    symbol,
                    column.len(),
                    dates.len()
                )));
            }
            if let Some(bad) = column.iter().find(|p| !(p.is_finite() && **p > 0.0)) {
                return Err(BacktestError::InvalidConfig(format!(
                    "price {} for {} is not a positive number",
                    bad, symbol
                )));
            }
        }

        let rows = (0..dates.len())
            .map(|t| columns.iter().map(|c| c[t]).collect())
            .collect();

        Panel::new(dates, symbols, rows)
    }

    //aligns per-symbol close series into a panel
    //the calendar is the union of all dates; gaps are forward-filled and
    //leading days on which some instrument has no price yet are dropped
    pub fn align(series: IndexMap<String, BTreeMap<NaiveDate, f64>>) -> Result<Self> {
        if series.is_empty() {
            return Err(BacktestError::InvalidConfig("no instruments".to_string()));
        }

        for (symbol, closes) in &series {
            if closes.is_empty() {
                return Err(BacktestError::MissingData(symbol.clone()));
            }
        }

        let calendar: BTreeSet<NaiveDate> = series
            .values()
            .flat_map(|closes| closes.keys().copied())
            .collect();

        let symbols: Vec<String> = series.keys().cloned().collect();
        let mut last_seen: Vec<Option<f64>> = vec![None; symbols.len()];
        let mut dates = Vec::with_capacity(calendar.len());
        let mut rows = Vec::with_capacity(calendar.len());
        let mut trimmed = 0usize;

        for date in calendar {
            for (i, closes) in series.values().enumerate() {
                if let Some(&close) = closes.get(&date) {
                    last_seen[i] = Some(close);
                }
            }

            //every column has a value once all instruments have started trading
            match last_seen.iter().copied().collect::<Option<Vec<f64>>>() {
                Some(row) => {
                    dates.push(date);
                    rows.push(row);
                }
                None => trimmed += 1,
            }
        }

        if trimmed > 0 {
            warn!(
                trimmed,
                "dropped leading days before every instrument had a price"
            );
        }

        if rows.is_empty() {
            return Err(BacktestError::InvalidConfig(
                "instruments share no common trading history".to_string(),
            ));
        }

        debug!(days = dates.len(), instruments = symbols.len(), "aligned price panel");
        Panel::new(dates, symbols, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn test_align_forward_fills_gaps() {
        let mut series = IndexMap::new();
        series.insert(
            "A".to_string(),
            BTreeMap::from([(d(2), 10.0), (d(3), 11.0), (d(4), 12.0)]),
        );
        series.insert("B".to_string(), BTreeMap::from([(d(2), 20.0), (d(4), 22.0)]));

        let panel = PricePanel::align(series).unwrap();
        assert_eq!(panel.dates(), &[d(2), d(3), d(4)]);
        assert_eq!(panel.row(1), &[11.0, 20.0]);
        assert_eq!(panel.row(2), &[12.0, 22.0]);
    }

    #[test]
    fn test_align_trims_leading_partial_rows() {
        let mut series = IndexMap::new();
        series.insert("A".to_string(), BTreeMap::from([(d(2), 10.0), (d(3), 11.0)]));
        series.insert("B".to_string(), BTreeMap::from([(d(3), 5.0)]));

        let panel = PricePanel::align(series).unwrap();
        assert_eq!(panel.dates(), &[d(3)]);
        assert_eq!(panel.symbols(), &["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_align_rejects_empty_series() {
        let mut series = IndexMap::new();
        series.insert("A".to_string(), BTreeMap::from([(d(2), 10.0)]));
        series.insert("B".to_string(), BTreeMap::new());

        assert_eq!(
            PricePanel::align(series).unwrap_err(),
            BacktestError::MissingData("B".to_string())
        );
    }

    #[test]
    fn test_new_rejects_unordered_calendar() {
        let result = Panel::new(vec![d(3), d(2)], vec!["A".into()], vec![vec![1.0], vec![1.0]]);
        assert!(matches!(result, Err(BacktestError::ShapeMismatch(_))));
    }

    #[test]
    fn test_from_columns_rejects_non_positive_price() {
        let result = PricePanel::from_columns(vec![d(2)], vec!["A".into()], vec![vec![0.0]]);
        assert!(result.is_err());
    }
}
