//calendar rebalance rules and rebalance-date detection

use crate::error::BacktestError;
use chrono::{Datelike, Days, NaiveDate, Weekday};
use std::fmt;
use std::str::FromStr;

//calendar resampling rule; a period rebalances on its last trading day, so a
//period end that is not a trading day resolves to the prior trading day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebalanceRule {
    Daily,
    Weekly(Weekday), //weeks ending on the given weekday
    MonthEnd,
    QuarterEnd,
    YearEnd,
}

impl Default for RebalanceRule {
    fn default() -> Self {
        RebalanceRule::Weekly(Weekday::Fri)
    }
}

fn parse_weekday(s: &str) -> Option<Weekday> {
    match s {
        "MON" => Some(Weekday::Mon),
        "TUE" => Some(Weekday::Tue),
        "WED" => Some(Weekday::Wed),
        "THU" => Some(Weekday::Thu),
        "FRI" => Some(Weekday::Fri),
        "SAT" => Some(Weekday::Sat),
        "SUN" => Some(Weekday::Sun),
        _ => None,
    }
}

impl FromStr for RebalanceRule {
    type Err = BacktestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rule = s.trim().to_uppercase();
        match rule.as_str() {
            "D" | "B" => Ok(RebalanceRule::Daily),
            "W" => Ok(RebalanceRule::Weekly(Weekday::Sun)),
            "M" | "ME" | "BM" | "BME" => Ok(RebalanceRule::MonthEnd),
            "Q" | "QE" | "BQ" | "BQE" => Ok(RebalanceRule::QuarterEnd),
            "A" | "Y" | "YE" | "BA" | "BY" => Ok(RebalanceRule::YearEnd),
            _ => rule
                .strip_prefix("W-")
                .and_then(parse_weekday)
                .map(RebalanceRule::Weekly)
                .ok_or_else(|| BacktestError::UnknownRebalanceRule(s.to_string())),
        }
    }
}

impl fmt::Display for RebalanceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RebalanceRule::Daily => write!(f, "D"),
            RebalanceRule::Weekly(day) => write!(f, "W-{}", day.to_string().to_uppercase()),
            RebalanceRule::MonthEnd => write!(f, "M"),
            RebalanceRule::QuarterEnd => write!(f, "Q"),
            RebalanceRule::YearEnd => write!(f, "A"),
        }
    }
}

//last calendar day of the month
fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

impl RebalanceRule {
    //nominal end date of the period containing the date
    pub fn period_end(&self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            RebalanceRule::Daily => Some(date),
            RebalanceRule::Weekly(anchor) => {
                let today = date.weekday().num_days_from_monday();
                let target = anchor.num_days_from_monday();
                let ahead = (target + 7 - today) % 7;
                date.checked_add_days(Days::new(ahead as u64))
            }
            RebalanceRule::MonthEnd => month_end(date.year(), date.month()),
            RebalanceRule::QuarterEnd => {
                let quarter_last_month = ((date.month() - 1) / 3 + 1) * 3;
                month_end(date.year(), quarter_last_month)
            }
            RebalanceRule::YearEnd => NaiveDate::from_ymd_opt(date.year(), 12, 31),
        }
    }
}

//index of the last trading day in each period, increasing
pub fn find_rebalance_indices(dates: &[NaiveDate], rule: RebalanceRule) -> Vec<usize> {
    let mut indices = Vec::new();

    for (i, date) in dates.iter().enumerate() {
        let closes_period = match dates.get(i + 1) {
            Some(next) => rule.period_end(*next) != rule.period_end(*date),
            None => true,
        };
        if closes_period {
            indices.push(i);
        }
    }

    indices
}
