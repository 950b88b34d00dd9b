use crate::data::bar::Bar;
use crate::data::panel::PricePanel;
use crate::error::BacktestError;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate};
use csv::ReaderBuilder;
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize)]
struct CsvRecord {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    symbol: String,
}

//source of daily bars for one instrument over an inclusive date range
pub trait PriceProvider {
    fn daily_bars(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Bar>>;
}

//parses yyyy-mm-dd or an rfc3339 timestamp (date part kept)
fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    let timestamp = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("unrecognised date '{}'", raw))?;
    Ok(timestamp.date_naive())
}

//loads bars from a csv file with columns date,open,high,low,close,volume,symbol
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Bar>> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .context(format!("Failed to open CSV file: {:?}", path))?;

    let mut bars = Vec::new();

    for (index, result) in reader.deserialize().enumerate() {
        let record: CsvRecord =
            result.context(format!("Failed to parse CSV record at line {}", index + 2))?;

        let date = parse_date(&record.date)
            .context(format!("Failed to parse date at line {}", index + 2))?;

        let bar = Bar::new(
            date,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
            record.symbol,
        )
        .context(format!("Invalid bar at line {}", index + 2))?;

        bars.push(bar);
    }

    //sort by date to ensure chronological order
    bars.sort_by(|a, b| a.date.cmp(&b.date));

    Ok(bars)
}

//filters bars by symbol
pub fn filter_by_symbol(bars: &[Bar], symbol: &str) -> Vec<Bar> {
    bars.iter()
        .filter(|bar| bar.symbol == symbol)
        .cloned()
        .collect()
}

//serves bars out of a single multi-symbol csv file
#[derive(Debug, Clone)]
pub struct CsvPriceProvider {
    bars: Vec<Bar>,
}

impl CsvPriceProvider {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(CsvPriceProvider {
            bars: load_csv(path)?,
        })
    }

    pub fn from_bars(mut bars: Vec<Bar>) -> Self {
        bars.sort_by(|a, b| a.date.cmp(&b.date));
        CsvPriceProvider { bars }
    }
}

impl PriceProvider for CsvPriceProvider {
    fn daily_bars(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Bar>> {
        Ok(filter_by_symbol(&self.bars, symbol)
            .into_iter()
            .filter(|bar| start.map_or(true, |s| bar.date >= s))
            .filter(|bar| end.map_or(true, |e| bar.date <= e))
            .collect())
    }
}

//fetches every configured instrument and aligns the closes into a price panel
//an instrument without data aborts the run before anything is computed
pub fn load_price_panel(
    provider: &dyn PriceProvider,
    symbols: &[String],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<PricePanel> {
    let mut series: IndexMap<String, BTreeMap<NaiveDate, f64>> = IndexMap::new();

    for symbol in symbols {
        info!(%symbol, "fetching daily bars");
        let bars = provider
            .daily_bars(symbol, start, end)
            .context(format!("Failed to fetch bars for {}", symbol))?;

        if bars.is_empty() {
            return Err(BacktestError::MissingData(symbol.clone()).into());
        }

        let closes = bars.into_iter().map(|bar| (bar.date, bar.close)).collect();
        series.insert(symbol.clone(), closes);
    }

    let panel = PricePanel::align(series)?;
    info!(
        days = panel.len(),
        instruments = panel.width(),
        "price panel ready"
    );
    Ok(panel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_csv_sorts_and_parses_both_date_forms() {
        let file = write_csv(
            "date,open,high,low,close,volume,symbol\n\
             2024-01-03,1,1,1,1,10,A\n\
             2024-01-02T00:00:00Z,2,2,2,2,10,A\n",
        );

        let bars = load_csv(file.path()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(bars[0].close, 2.0);
    }

    #[test]
    fn test_load_csv_reports_bad_line() {
        let file = write_csv("date,open,high,low,close,volume,symbol\nnot-a-date,1,1,1,1,1,A\n");
        let err = load_csv(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[test]
    fn test_provider_filters_symbol_and_range() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        let provider = CsvPriceProvider::from_bars(vec![
            Bar::from_close(day(2), 1.0, "A"),
            Bar::from_close(day(3), 2.0, "A"),
            Bar::from_close(day(4), 3.0, "A"),
            Bar::from_close(day(3), 9.0, "B"),
        ]);

        let bars = provider.daily_bars("A", Some(day(3)), Some(day(4))).unwrap();
        assert_eq!(bars.len(), 2);
        assert!(bars.iter().all(|b| b.symbol == "A"));
    }

    #[test]
    fn test_load_price_panel_fails_on_missing_instrument() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let provider = CsvPriceProvider::from_bars(vec![Bar::from_close(day, 1.0, "A")]);
        let symbols = vec!["A".to_string(), "B".to_string()];

        let err = load_price_panel(&provider, &symbols, None, None).unwrap_err();
        assert_eq!(
            err.downcast_ref::<BacktestError>(),
            Some(&BacktestError::MissingData("B".to_string()))
        );
    }
}
