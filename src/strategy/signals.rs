use crate::data::{FactorTable, PricePanel, SignalMask};
use crate::error::{BacktestError, Result};
use crate::strategy::rebalance::{find_rebalance_indices, RebalanceRule};
use tracing::debug;

//rebalance day indices: the last trading day of each period whose momentum row
//has at least one defined value
pub fn rebalance_days(momentum: &FactorTable, rule: RebalanceRule) -> Vec<usize> {
    find_rebalance_indices(momentum.dates(), rule)
        .into_iter()
        .filter(|&t| momentum.row(t).iter().any(Option::is_some))
        .collect()
}

//ranks defined momentum values descending and keeps the first top_k columns
//equal values keep column order so the selection is reproducible
pub fn select_top_k(momentum_row: &[Option<f64>], top_k: usize) -> Vec<usize> {
    let mut ranked: Vec<(usize, f64)> = momentum_row
        .iter()
        .enumerate()
        .filter_map(|(i, value)| value.map(|v| (i, v)))
        .collect();

    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(top_k);
    ranked.into_iter().map(|(i, _)| i).collect()
}

//builds the holding mask: the selection made on each rebalance day holds until
//the day before the next one, the last one through the end of the history
pub fn generate_signals(
    prices: &PricePanel,
    momentum: &FactorTable,
    top_k: usize,
    rule: RebalanceRule,
) -> Result<SignalMask> {
    prices.ensure_same_axes(momentum, "momentum table")?;
    if top_k == 0 {
        return Err(BacktestError::InvalidConfig(
            "top_k must be at least 1".to_string(),
        ));
    }

    let days = rebalance_days(momentum, rule);
    let mut rows = vec![vec![false; prices.width()]; prices.len()];

    for (n, &start) in days.iter().enumerate() {
        let end = days.get(n + 1).copied().unwrap_or(prices.len());
        let selected = select_top_k(momentum.row(start), top_k);

        debug!(
            date = %prices.dates()[start],
            selected = ?selected.iter().map(|&i| &prices.symbols()[i]).collect::<Vec<_>>(),
            "rebalance selection"
        );

        for row in &mut rows[start..end] {
            for &i in &selected {
                row[i] = true;
            }
        }
    }

    prices.with_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factors::compute_momentum;
    use chrono::{Days, NaiveDate};

    fn panel(columns: Vec<Vec<f64>>) -> PricePanel {
        let n = columns[0].len();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = (0..n).map(|k| start + Days::new(k as u64)).collect();
        let symbols = (0..columns.len()).map(|i| format!("S{}", i)).collect();
        PricePanel::from_columns(dates, symbols, columns).unwrap()
    }

    #[test]
    fn test_select_top_k_breaks_ties_by_column_order() {
        let row = [Some(0.1), None, Some(0.3), Some(0.1), Some(0.3)];
        assert_eq!(select_top_k(&row, 3), vec![2, 4, 0]);
    }

    #[test]
    fn test_select_top_k_with_fewer_defined_than_k() {
        let row = [None, Some(-0.2), None];
        assert_eq!(select_top_k(&row, 2), vec![1]);
    }

    #[test]
    fn test_daily_signals_follow_momentum() {
        let prices = panel(vec![
            vec![10.0, 11.0, 12.0, 13.0],
            vec![20.0, 19.0, 18.0, 17.0],
        ]);
        let momentum = compute_momentum(&prices, 1);
        let mask = generate_signals(&prices, &momentum, 1, RebalanceRule::Daily).unwrap();

        assert_eq!(mask.row(0), &[false, false]);
        for t in 1..4 {
            assert_eq!(mask.row(t), &[true, false]);
        }
    }

    #[test]
    fn test_selection_held_between_rebalance_days() {
        // 2024-01-01 is a Monday: weekly Friday rebalances land on index 4 and 11
        let a: Vec<f64> = (0..14).map(|k| 100.0 + k as f64).collect();
        let b: Vec<f64> = (0..14)
            .map(|k| if k < 6 { 100.0 - k as f64 } else { 100.0 + 10.0 * k as f64 })
            .collect();
        let prices = panel(vec![a, b]);
        let momentum = compute_momentum(&prices, 2);
        let mask =
            generate_signals(&prices, &momentum, 1, "W-FRI".parse().unwrap()).unwrap();

        for t in 0..4 {
            assert_eq!(mask.row(t), &[false, false]);
        }
        for t in 4..11 {
            assert_eq!(mask.row(t), &[true, false], "day {}", t);
        }
        for t in 11..14 {
            assert_eq!(mask.row(t), &[false, true], "day {}", t);
        }
    }

    #[test]
    fn test_undefined_momentum_selects_nothing() {
        let prices = panel(vec![vec![10.0, 11.0, 12.0], vec![5.0, 5.0, 5.0]]);
        let momentum = compute_momentum(&prices, 10);
        let mask = generate_signals(&prices, &momentum, 1, RebalanceRule::Daily).unwrap();
        assert!(mask.rows().iter().flatten().all(|held| !held));
    }
}
