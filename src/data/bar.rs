use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BarError {
    #[error("Invalid OHLC values: high ({high}) < low ({low})")]
    InvalidHighLow { high: f64, low: f64 },
    #[error("Invalid OHLC values: close ({close}) outside high-low range [{low}, {high}]")]
    InvalidClose { close: f64, high: f64, low: f64 },
    #[error("Invalid OHLC values: open ({open}) outside high-low range [{low}, {high}]")]
    InvalidOpen { open: f64, high: f64, low: f64 },
    #[error("Non-positive close: {0}")]
    NonPositiveClose(f64),
    #[error("Negative volume: {0}")]
    NegativeVolume(f64),
}

//represents one daily ohlcv bar of an exchange-traded instrument
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub symbol: String,
}

impl Bar {
    //creates a new Bar with validation
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        symbol: String,
    ) -> Result<Self, BarError> {
        if high < low {
            return Err(BarError::InvalidHighLow { high, low });
        }

        if close < low || close > high {
            return Err(BarError::InvalidClose { close, high, low });
        }

        if open < low || open > high {
            return Err(BarError::InvalidOpen { open, high, low });
        }

        //momentum and share counts divide by the close
        if close <= 0.0 {
            return Err(BarError::NonPositiveClose(close));
        }

        if volume < 0.0 {
            return Err(BarError::NegativeVolume(volume));
        }

        Ok(Bar {
            date,
            open,
            high,
            low,
            close,
            volume,
            symbol,
        })
    }

    //creates a bar carrying only a close price (open = high = low = close)
    #[cfg(test)]
    pub fn from_close(date: NaiveDate, close: f64, symbol: &str) -> Self {
        Bar {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
            symbol: symbol.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_valid_bar() {
        let bar = Bar::new(day(), 10.0, 11.0, 9.5, 10.5, 1000.0, "588080".into()).unwrap();
        assert_eq!(bar.close, 10.5);
    }

    #[test]
    fn test_rejects_inverted_range() {
        let err = Bar::new(day(), 10.0, 9.0, 11.0, 10.0, 0.0, "X".into()).unwrap_err();
        assert!(matches!(err, BarError::InvalidHighLow { .. }));
    }

    #[test]
    fn test_rejects_close_outside_range() {
        let err = Bar::new(day(), 10.0, 11.0, 9.0, 12.0, 0.0, "X".into()).unwrap_err();
        assert!(matches!(err, BarError::InvalidClose { .. }));
    }

    #[test]
    fn test_rejects_zero_close() {
        let err = Bar::new(day(), 0.0, 0.0, 0.0, 0.0, 0.0, "X".into()).unwrap_err();
        assert!(matches!(err, BarError::NonPositiveClose(_)));
    }

    #[test]
    fn test_rejects_negative_volume() {
        let err = Bar::new(day(), 10.0, 10.0, 10.0, 10.0, -1.0, "X".into()).unwrap_err();
        assert!(matches!(err, BarError::NegativeVolume(_)));
    }
}
