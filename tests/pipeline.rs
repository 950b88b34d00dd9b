use approx::assert_relative_eq;
use chrono::{Days, NaiveDate};
use momentum_rotation::prelude::*;
use std::io::Write;

fn dates(n: usize) -> Vec<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (0..n).map(|k| start + Days::new(k as u64)).collect()
}

fn config(symbols: &[&str]) -> BacktestConfiguration {
    BacktestConfiguration {
        symbols: symbols.iter().map(|s| s.to_string()).collect(),
        rebalance_freq: "D".to_string(),
        momentum_window: 1,
        top_k: 1,
        allocation: "equal".to_string(),
        vol_window: 2,
        initial_capital: 1000.0,
        fee_rate: 0.0,
        slippage_rate: 0.0,
        ..Default::default()
    }
}

fn rising_and_falling() -> PricePanel {
    PricePanel::from_columns(
        dates(4),
        vec!["A".into(), "B".into()],
        vec![vec![10.0, 11.0, 12.0, 13.0], vec![20.0, 19.0, 18.0, 17.0]],
    )
    .unwrap()
}

#[test]
fn test_daily_rotation_holds_the_rising_instrument() {
    let prices = rising_and_falling();
    let result = run_backtest(&prices, &config(&["A", "B"])).unwrap();

    //day 0 has no momentum so nothing is held
    assert_eq!(result.signals.row(0), &[false, false]);
    for t in 1..4 {
        assert_eq!(result.signals.row(t), &[true, false]);
        assert_eq!(result.weights.row(t), &[1.0, 0.0]);
    }

    let nav = &result.simulation.nav.values;
    assert_eq!(nav[0], 1000.0);
    assert_relative_eq!(nav[1], 1000.0, epsilon = 1e-9);
    assert_relative_eq!(nav[2], 1000.0 * 12.0 / 11.0, epsilon = 1e-9);
    assert_relative_eq!(nav[3], 1000.0 * 13.0 / 11.0, epsilon = 1e-9);

    //a single entry trade, no churn afterwards
    assert_eq!(result.summary.num_rebalances, 1);
    assert_eq!(result.simulation.trades.len(), 1);
    assert_eq!(result.simulation.trades[0].symbol, "A");
}

#[test]
fn test_entry_fee_reduces_invested_value() {
    let prices =
        PricePanel::from_columns(dates(3), vec!["X".into()], vec![vec![100.0, 100.0, 100.0]])
            .unwrap();
    let mut cfg = config(&["X"]);
    cfg.fee_rate = 0.01;

    let result = run_backtest(&prices, &cfg).unwrap();
    let sim = &result.simulation;

    assert_relative_eq!(sim.nav.values[1], 990.0, epsilon = 1e-9);
    assert_relative_eq!(*sim.holdings.get(1, 0), 9.9, epsilon = 1e-12);
    assert_relative_eq!(sim.total_costs(), 10.0, epsilon = 1e-9);
    assert_relative_eq!(result.summary.total_costs, 10.0, epsilon = 1e-9);
}

#[test]
fn test_flat_market_has_zero_volatility_and_no_sharpe() {
    let prices =
        PricePanel::from_columns(dates(30), vec!["X".into(), "Y".into()], vec![vec![50.0; 30], vec![25.0; 30]])
            .unwrap();
    let result = run_backtest(&prices, &config(&["X", "Y"])).unwrap();

    assert!(result.simulation.nav.values.iter().all(|&v| (v - 1000.0).abs() < 1e-9));
    assert_eq!(result.summary.annualized_volatility, Some(0.0));
    assert_eq!(result.summary.sharpe_ratio, None);
    assert_eq!(result.summary.max_drawdown, 0.0);
}

#[test]
fn test_window_longer_than_history_stays_in_cash() {
    let prices = rising_and_falling();
    let mut cfg = config(&["A", "B"]);
    cfg.momentum_window = 10;

    let result = run_backtest(&prices, &cfg).unwrap();

    assert!(result.momentum.rows().iter().flatten().all(Option::is_none));
    assert!(result.signals.rows().iter().flatten().all(|&s| !s));
    assert!(result.weights.weights().rows().iter().flatten().all(|&w| w == 0.0));
    assert_eq!(result.simulation.nav.values, vec![1000.0; 4]);
    assert!(result.simulation.trades.is_empty());
    assert_eq!(result.summary.num_rebalances, 0);
}

#[test]
fn test_runs_are_deterministic() {
    let n = 90;
    let a: Vec<f64> = (0..n).map(|k| 100.0 + (k as f64 * 0.3).sin() * 5.0 + k as f64 * 0.1).collect();
    let b: Vec<f64> = (0..n).map(|k| 80.0 + (k as f64 * 0.2).cos() * 4.0).collect();
    let c: Vec<f64> = (0..n).map(|k| 60.0 + k as f64 * 0.05).collect();
    let prices = PricePanel::from_columns(
        dates(n),
        vec!["A".into(), "B".into(), "C".into()],
        vec![a, b, c],
    )
    .unwrap();

    let cfg = BacktestConfiguration {
        rebalance_freq: "W-FRI".to_string(),
        momentum_window: 10,
        top_k: 2,
        allocation: "risk_parity".to_string(),
        vol_window: 10,
        fee_rate: 0.0003,
        slippage_rate: 0.0005,
        ..config(&["A", "B", "C"])
    };

    let first = run_backtest(&prices, &cfg).unwrap();
    let second = run_backtest(&prices, &cfg).unwrap();
    assert_eq!(first.simulation, second.simulation);
    assert_eq!(first.summary, second.summary);
}

#[test]
fn test_csv_to_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("prices.csv");
    {
        let mut file = std::fs::File::create(&data).unwrap();
        writeln!(file, "date,open,high,low,close,volume,symbol").unwrap();
        for (k, date) in dates(20).iter().enumerate() {
            let a = 10.0 + k as f64;
            let b = 30.0 - k as f64 * 0.5;
            writeln!(file, "{},{a},{a},{a},{a},1000,A", date).unwrap();
            writeln!(file, "{},{b},{b},{b},{b},1000,B", date).unwrap();
        }
    }

    let mut cfg = config(&["A", "B"]);
    cfg.data_path = data.clone();
    cfg.rebalance_freq = "W-FRI".to_string();
    cfg.momentum_window = 3;

    let provider = CsvPriceProvider::open(&cfg.data_path).unwrap();
    let prices = load_price_panel(&provider, &cfg.symbols, None, None).unwrap();
    assert_eq!(prices.len(), 20);
    assert_eq!(prices.symbols(), &["A".to_string(), "B".to_string()]);

    let result = BacktestEngine::new(cfg, prices).run().unwrap();
    assert!(result.summary.total_return > 0.0);
    assert_eq!(result.benchmark.len(), 20);

    let nav_path = dir.path().join("nav.csv");
    let metrics_path = dir.path().join("metrics.json");
    save_equity_csv(&result.equity_curve, &nav_path).unwrap();
    save_metrics_json(&result.summary, Some(&result.benchmark_summary), &metrics_path).unwrap();

    assert_eq!(std::fs::read_to_string(&nav_path).unwrap().lines().count(), 21);
    let metrics: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&metrics_path).unwrap()).unwrap();
    assert!(metrics["benchmark"]["total_return"].is_number());
}

#[test]
fn test_unknown_rebalance_rule_is_rejected() {
    let mut cfg = config(&["A", "B"]);
    cfg.rebalance_freq = "fortnightly".to_string();
    assert!(matches!(
        run_backtest(&rising_and_falling(), &cfg),
        Err(BacktestError::UnknownRebalanceRule(_))
    ));
}
