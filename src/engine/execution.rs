use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

//trade side, derived from the sign of the share delta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

//proportional transaction costs charged on traded notional
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    pub fee_rate: f64,
    pub slippage_rate: f64,
}

impl CostModel {
    pub fn new(fee_rate: f64, slippage_rate: f64) -> Self {
        CostModel {
            fee_rate,
            slippage_rate,
        }
    }

    //fees plus slippage on a traded dollar volume
    pub fn cost(&self, traded_notional: f64) -> f64 {
        self.fee_rate * traded_notional + self.slippage_rate * traded_notional
    }
}

//one instrument's share change on a rebalance day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub date: NaiveDate,
    pub symbol: String,
    pub side: TradeSide,
    pub shares: f64, //signed: positive for buys, negative for sells
    pub price: f64,
    pub costs: f64, //share of the day's fees + slippage, pro rata to planned notional
}

//result of moving a book to target weights at one day's closes
#[derive(Debug, Clone, PartialEq)]
pub struct RebalanceFill {
    pub shares: Vec<f64>,
    pub cash: f64,
    pub costs: f64,
    pub traded_notional: f64,
    pub trades: Vec<Trade>,
    //costs consumed the whole portfolio value
    pub wiped_out: bool,
}

//moves a book (shares + cash) to target weights at today's prices
//1. value the book at today's prices
//2. target dollars = weight * value, target shares = dollars / price
//3. costs are charged on the notional of (target - previous) shares
//4. targets are scaled by (value - costs) / value, floored at zero
//whatever is not allocated to instruments stays in cash
pub fn execute_rebalance(
    date: NaiveDate,
    symbols: &[String],
    prev_shares: &[f64],
    cash: f64,
    prices: &[f64],
    target_weights: &[f64],
    cost_model: &CostModel,
) -> RebalanceFill {
    let value = cash
        + prev_shares
            .iter()
            .zip(prices)
            .map(|(s, p)| s * p)
            .sum::<f64>();

    let target_shares: Vec<f64> = target_weights
        .iter()
        .zip(prices)
        .map(|(w, p)| w * value / p)
        .collect();

    let planned_notional: Vec<f64> = target_shares
        .iter()
        .zip(prev_shares)
        .zip(prices)
        .map(|((target, prev), p)| (target - prev).abs() * p)
        .collect();
    let traded_notional: f64 = planned_notional.iter().sum();
    let costs = cost_model.cost(traded_notional);

    let after_costs = (value - costs).max(0.0);
    let scale = if value > 0.0 { after_costs / value } else { 0.0 };

    let shares: Vec<f64> = target_shares.iter().map(|s| s * scale).collect();
    let invested: f64 = shares.iter().zip(prices).map(|(s, p)| s * p).sum();
    let cash = (after_costs - invested).max(0.0);

    let trades = shares
        .iter()
        .zip(prev_shares)
        .enumerate()
        .filter(|(_, (new, prev))| new != prev)
        .map(|(i, (new, prev))| {
            let delta = new - prev;
            Trade {
                date,
                symbol: symbols[i].clone(),
                side: if delta > 0.0 {
                    TradeSide::Buy
                } else {
                    TradeSide::Sell
                },
                shares: delta,
                price: prices[i],
                costs: if traded_notional > 0.0 {
                    costs * planned_notional[i] / traded_notional
                } else {
                    0.0
                },
            }
        })
        .collect();

    RebalanceFill {
        shares,
        cash,
        costs,
        traded_notional,
        trades,
        wiped_out: value > 0.0 && after_costs == 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
    }

    fn symbols(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("S{}", i)).collect()
    }

    #[test]
    fn test_cash_to_single_instrument_with_fee() {
        let fill = execute_rebalance(
            date(),
            &symbols(1),
            &[0.0],
            1000.0,
            &[100.0],
            &[1.0],
            &CostModel::new(0.01, 0.0),
        );

        assert_relative_eq!(fill.costs, 10.0);
        assert_relative_eq!(fill.shares[0], 9.9);
        assert_relative_eq!(fill.cash, 0.0, epsilon = 1e-9);
        assert_eq!(fill.trades.len(), 1);
        assert_eq!(fill.trades[0].side, TradeSide::Buy);
    }

    #[test]
    fn test_switch_between_instruments_charges_both_legs() {
        // 10 shares of S0 at 50 -> all into S1 at 25, value 500
        let fill = execute_rebalance(
            date(),
            &symbols(2),
            &[10.0, 0.0],
            0.0,
            &[50.0, 25.0],
            &[0.0, 1.0],
            &CostModel::new(0.001, 0.001),
        );

        assert_relative_eq!(fill.traded_notional, 1000.0);
        assert_relative_eq!(fill.costs, 2.0);
        assert_eq!(fill.shares[0], 0.0);
        assert_relative_eq!(fill.shares[1], 498.0 / 25.0);
        assert_eq!(fill.trades.len(), 2);
        assert_relative_eq!(fill.trades.iter().map(|t| t.costs).sum::<f64>(), 2.0);
    }

    #[test]
    fn test_exit_to_cash_keeps_value_net_of_costs() {
        let fill = execute_rebalance(
            date(),
            &symbols(1),
            &[4.0],
            0.0,
            &[25.0],
            &[0.0],
            &CostModel::new(0.01, 0.0),
        );

        assert_eq!(fill.shares, vec![0.0]);
        assert_relative_eq!(fill.cash, 99.0);
    }

    #[test]
    fn test_costs_exceeding_value_clamp_to_zero() {
        let fill = execute_rebalance(
            date(),
            &symbols(1),
            &[0.0],
            100.0,
            &[10.0],
            &[1.0],
            &CostModel::new(0.8, 0.5),
        );

        assert!(fill.wiped_out);
        assert_eq!(fill.shares, vec![0.0]);
        assert_eq!(fill.cash, 0.0);
    }
}
