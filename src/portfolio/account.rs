use crate::engine::execution::{execute_rebalance, CostModel, RebalanceFill, Trade};
use chrono::NaiveDate;

//represents the simulated book: cash plus a share count per instrument
#[derive(Debug, Clone)]
pub struct Account {
    //initial account capital
    pub initial_capital: f64,

    //cash not allocated to any instrument
    pub cash: f64,

    //share count per instrument, in price panel column order
    pub shares: Vec<f64>,

    //fee and slippage rates
    pub cost_model: CostModel,

    //cumulative transaction costs
    pub total_costs: f64,

    //complete trade log
    pub trade_log: Vec<Trade>,
}

impl Account {
    //creates an all-cash account
    pub fn new(initial_capital: f64, instruments: usize, cost_model: CostModel) -> Self {
        Account {
            initial_capital,
            cash: initial_capital,
            shares: vec![0.0; instruments],
            cost_model,
            total_costs: 0.0,
            trade_log: Vec::new(),
        }
    }

    //value of the holdings at the given prices
    pub fn market_value(&self, prices: &[f64]) -> f64 {
        self.shares.iter().zip(prices).map(|(s, p)| s * p).sum()
    }

    //cash plus mark-to-market holdings
    pub fn equity(&self, prices: &[f64]) -> f64 {
        self.cash + self.market_value(prices)
    }

    //moves the book to target weights at the given prices and returns the fill
    pub fn rebalance(
        &mut self,
        date: NaiveDate,
        symbols: &[String],
        prices: &[f64],
        target_weights: &[f64],
    ) -> RebalanceFill {
        let fill = execute_rebalance(
            date,
            symbols,
            &self.shares,
            self.cash,
            prices,
            target_weights,
            &self.cost_model,
        );

        self.shares = fill.shares.clone();
        self.cash = fill.cash;
        self.total_costs += fill.costs;
        self.trade_log.extend(fill.trades.iter().cloned());

        fill
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_account_is_all_cash() {
        let account = Account::new(1000.0, 2, CostModel::new(0.0, 0.0));
        assert_eq!(account.equity(&[10.0, 20.0]), 1000.0);
        assert_eq!(account.market_value(&[10.0, 20.0]), 0.0);
    }

    #[test]
    fn test_rebalance_updates_book_and_costs() {
        let mut account = Account::new(1000.0, 2, CostModel::new(0.001, 0.0));
        let symbols = vec!["A".to_string(), "B".to_string()];
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();

        account.rebalance(date, &symbols, &[10.0, 20.0], &[0.5, 0.5]);

        assert_relative_eq!(account.total_costs, 1.0);
        assert_relative_eq!(account.equity(&[10.0, 20.0]), 999.0, epsilon = 1e-9);
        assert_eq!(account.trade_log.len(), 2);
    }
}
