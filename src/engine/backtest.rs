use crate::config::BacktestConfiguration;
use crate::data::{FactorTable, Panel, PricePanel, SignalMask};
use crate::engine::execution::{CostModel, Trade};
use crate::error::{BacktestError, Result};
use crate::factors::{compute_momentum, compute_volatility};
use crate::metrics::{benchmark_nav, calculate_equity_curve, EquityPoint, NavSeries, SummaryMetrics};
use crate::portfolio::{compute_positions, Account, WeightTable};
use crate::strategy::{generate_signals, rebalance_days};
use tracing::{debug, info, warn};

//day-by-day output of the portfolio simulator
#[derive(Debug, Clone, PartialEq)]
pub struct Simulation {
    pub nav: NavSeries,
    //shares held per instrument at each day's close
    pub holdings: Panel<f64>,
    pub cash: Vec<f64>,
    //transaction costs charged per day (zero off rebalance days)
    pub costs: Vec<f64>,
    pub trades: Vec<Trade>,
}

impl Simulation {
    pub fn total_costs(&self) -> f64 {
        self.costs.iter().sum()
    }
}

//walks the calendar from an all-cash book, trading to the target weights on
//every flagged rebalance day and marking holdings to market otherwise
pub fn backtest_from_weights(
    weights: &WeightTable,
    prices: &PricePanel,
    initial_capital: f64,
    fee_rate: f64,
    slippage_rate: f64,
) -> Result<Simulation> {
    prices.ensure_same_axes(weights.weights(), "weight table")?;
    if !(initial_capital.is_finite() && initial_capital > 0.0) {
        return Err(BacktestError::InvalidConfig(format!(
            "initial capital must be positive (got {})",
            initial_capital
        )));
    }
    if !(fee_rate >= 0.0 && slippage_rate >= 0.0) {
        return Err(BacktestError::InvalidConfig(
            "fee and slippage rates must be non-negative".to_string(),
        ));
    }

    let mut account = Account::new(
        initial_capital,
        prices.width(),
        CostModel::new(fee_rate, slippage_rate),
    );

    let mut nav = Vec::with_capacity(prices.len());
    let mut holdings = Vec::with_capacity(prices.len());
    let mut cash = Vec::with_capacity(prices.len());
    let mut costs = Vec::with_capacity(prices.len());

    for t in 0..prices.len() {
        let date = prices.dates()[t];
        let price_row = prices.row(t);
        let mut day_cost = 0.0;

        if weights.is_rebalance_day(t) {
            let fill = account.rebalance(date, prices.symbols(), price_row, weights.row(t));
            day_cost = fill.costs;

            if fill.wiped_out {
                warn!(%date, costs = fill.costs, "transaction costs exceeded portfolio value");
            }
            debug!(
                %date,
                traded = fill.traded_notional,
                costs = fill.costs,
                "rebalanced"
            );
        }

        //forward-fill if a value is ever undefined, initial capital at the start
        let value = account.equity(price_row);
        let value = if value.is_finite() {
            value
        } else {
            warn!(%date, "undefined portfolio value, carrying previous");
            nav.last().copied().unwrap_or(initial_capital)
        };

        nav.push(value);
        holdings.push(account.shares.clone());
        cash.push(account.cash);
        costs.push(day_cost);
    }

    info!(
        days = nav.len(),
        trades = account.trade_log.len(),
        total_costs = account.total_costs,
        final_nav = nav.last().copied().unwrap_or(initial_capital),
        "simulation complete"
    );

    Ok(Simulation {
        nav: NavSeries::new(prices.dates().to_vec(), nav),
        holdings: prices.with_rows(holdings)?,
        cash,
        costs,
        trades: account.trade_log,
    })
}

//result of a full pipeline run, keeping every intermediate table
#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub momentum: FactorTable,
    pub volatility: FactorTable,
    pub signals: SignalMask,
    pub weights: WeightTable,
    pub simulation: Simulation,
    pub equity_curve: Vec<EquityPoint>,
    pub summary: SummaryMetrics,
    pub benchmark: NavSeries,
    pub benchmark_summary: SummaryMetrics,
}

//runs the momentum rotation pipeline over a price panel
pub struct BacktestEngine {
    config: BacktestConfiguration,
    prices: PricePanel,
}

impl BacktestEngine {
    //creates a new backtest engine
    pub fn new(config: BacktestConfiguration, prices: PricePanel) -> Self {
        BacktestEngine { config, prices }
    }

    //factors -> signals -> weights -> simulation -> metrics
    pub fn run(&self) -> Result<BacktestResult> {
        let config = &self.config;
        config.validate()?;
        let rule = config.rebalance_rule()?;
        let prices = &self.prices;

        if prices.is_empty() {
            return Err(BacktestError::InvalidConfig(
                "price panel has no trading days".to_string(),
            ));
        }

        let momentum = compute_momentum(prices, config.momentum_window);
        let volatility =
            compute_volatility(prices, config.vol_window, config.trading_days_per_year);

        let rebalance_dates = rebalance_days(&momentum, rule);
        info!(
            %rule,
            rebalance_dates = rebalance_dates.len(),
            window = config.momentum_window,
            top_k = config.top_k,
            "generating signals"
        );
        let signals = generate_signals(prices, &momentum, config.top_k, rule)?;

        let weights = compute_positions(&signals, prices, &config.allocation, config.vol_window)?;

        let simulation = backtest_from_weights(
            &weights,
            prices,
            config.initial_capital,
            config.fee_rate,
            config.slippage_rate,
        )?;

        let equity_curve = calculate_equity_curve(&simulation.nav);
        let rebalances = weights.rebalance_flags().iter().filter(|&&r| r).count();
        let summary = SummaryMetrics::from_nav(
            &simulation.nav,
            config.trading_days_per_year,
            config.risk_free_rate,
        )
        .with_activity(rebalances, simulation.total_costs());

        let benchmark = benchmark_nav(prices, config.initial_capital);
        let benchmark_summary = SummaryMetrics::from_nav(
            &benchmark,
            config.trading_days_per_year,
            config.risk_free_rate,
        );

        Ok(BacktestResult {
            momentum,
            volatility,
            signals,
            weights,
            simulation,
            equity_curve,
            summary,
            benchmark,
            benchmark_summary,
        })
    }
}

//runs the full pipeline once
pub fn run_backtest(prices: &PricePanel, config: &BacktestConfiguration) -> Result<BacktestResult> {
    BacktestEngine::new(config.clone(), prices.clone()).run()
}
