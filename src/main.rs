use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use momentum_rotation::prelude::*;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "momrot")]
#[command(about = "A Rust-based momentum rotation backtesting engine for ETFs", long_about = None)]
struct Cli {
    //log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

//options shared by run and sweep; anything given overrides the config file
#[derive(Args, Debug, Default)]
struct Overrides {
    //path to a json configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    //path to csv data file (date,open,high,low,close,volume,symbol)
    #[arg(long)]
    data: Option<PathBuf>,

    //comma-separated instrument identifiers
    #[arg(long, value_delimiter = ',')]
    symbols: Option<Vec<String>>,

    //first date to load (yyyy-mm-dd)
    #[arg(long)]
    start: Option<NaiveDate>,

    //last date to load (yyyy-mm-dd)
    #[arg(long)]
    end: Option<NaiveDate>,

    //rebalance rule (eg W-FRI, M, D)
    #[arg(long)]
    rebalance: Option<String>,

    //momentum lookback in trading days
    #[arg(long)]
    window: Option<usize>,

    //number of instruments held
    #[arg(long)]
    top_k: Option<usize>,

    //allocation policy (equal, risk_parity)
    #[arg(long)]
    allocation: Option<String>,

    //volatility lookback for risk parity
    #[arg(long)]
    vol_window: Option<usize>,

    //initial capital
    #[arg(long)]
    capital: Option<f64>,

    //fee rate as a fraction of traded notional
    #[arg(long)]
    fee: Option<f64>,

    //slippage rate as a fraction of traded notional
    #[arg(long)]
    slippage: Option<f64>,

    //annual risk-free rate for the sharpe ratio
    #[arg(long)]
    risk_free: Option<f64>,

    //trading days per year for annualisation
    #[arg(long)]
    trading_days: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    //run a backtest
    Run {
        #[command(flatten)]
        overrides: Overrides,

        //output path for nav / equity curve csv
        #[arg(long)]
        output_nav_csv: Option<PathBuf>,

        //output path for holdings csv
        #[arg(long)]
        output_holdings_csv: Option<PathBuf>,

        //output path for trades csv
        #[arg(long)]
        output_trades_csv: Option<PathBuf>,

        //output path for metrics json
        #[arg(long)]
        output_metrics_json: Option<PathBuf>,
    },

    //run a parameter sweep
    Sweep {
        #[command(flatten)]
        overrides: Overrides,

        //comma-separated momentum windows
        #[arg(long, value_delimiter = ',', default_value = "20,60,120")]
        windows: Vec<usize>,

        //comma-separated holding counts
        #[arg(long, value_delimiter = ',', default_value = "1,2")]
        top_ks: Vec<usize>,

        //comma-separated allocation policies
        #[arg(long, value_delimiter = ',', default_value = "equal,risk_parity")]
        allocations: Vec<String>,
    },

    //write the default configuration to a json file
    InitConfig {
        #[arg(long, default_value = "backtest.json")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    //setup logging
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run {
            overrides,
            output_nav_csv,
            output_holdings_csv,
            output_trades_csv,
            output_metrics_json,
        } => {
            let mut config = build_config(&overrides)?;
            config.output_nav_csv = output_nav_csv.or(config.output_nav_csv);
            config.output_holdings_csv = output_holdings_csv.or(config.output_holdings_csv);
            config.output_trades_csv = output_trades_csv.or(config.output_trades_csv);
            config.output_metrics_json = output_metrics_json.or(config.output_metrics_json);
            run(config)?;
        }
        Commands::Sweep {
            overrides,
            windows,
            top_ks,
            allocations,
        } => {
            let config = build_config(&overrides)?;
            let grid = SweepGrid {
                momentum_windows: windows,
                top_ks,
                allocations,
            };
            sweep(config, grid)?;
        }
        Commands::InitConfig { output } => {
            BacktestConfiguration::default().to_json_file(&output)?;
            println!("Default configuration written to {:?}", output);
        }
    }

    Ok(())
}

//config file (or defaults) with command-line overrides applied
fn build_config(o: &Overrides) -> Result<BacktestConfiguration> {
    let mut config = match &o.config {
        Some(path) => BacktestConfiguration::from_json_file(path)
            .context(format!("Failed to load configuration from {:?}", path))?,
        None => BacktestConfiguration::default(),
    };

    if let Some(data) = &o.data {
        config.data_path = data.clone();
    }
    if let Some(symbols) = &o.symbols {
        config.symbols = symbols.clone();
    }
    if o.start.is_some() {
        config.start_date = o.start;
    }
    if o.end.is_some() {
        config.end_date = o.end;
    }
    if let Some(rule) = &o.rebalance {
        config.rebalance_freq = rule.clone();
    }
    if let Some(allocation) = &o.allocation {
        config.allocation = allocation.clone();
    }
    config.momentum_window = o.window.unwrap_or(config.momentum_window);
    config.top_k = o.top_k.unwrap_or(config.top_k);
    config.vol_window = o.vol_window.unwrap_or(config.vol_window);
    config.initial_capital = o.capital.unwrap_or(config.initial_capital);
    config.fee_rate = o.fee.unwrap_or(config.fee_rate);
    config.slippage_rate = o.slippage.unwrap_or(config.slippage_rate);
    config.risk_free_rate = o.risk_free.unwrap_or(config.risk_free_rate);
    config.trading_days_per_year = o.trading_days.unwrap_or(config.trading_days_per_year);

    config.validate()?;
    Ok(config)
}

fn load_prices(config: &BacktestConfiguration) -> Result<PricePanel> {
    info!(path = ?config.data_path, "loading data");
    let provider = CsvPriceProvider::open(&config.data_path)
        .context(format!("Failed to load data from {:?}", config.data_path))?;
    load_price_panel(&provider, &config.symbols, config.start_date, config.end_date)
}

fn run(config: BacktestConfiguration) -> Result<()> {
    println!("Momentum Rotation Backtesting Engine");
    println!("====================================\n");

    let prices = load_prices(&config)?;
    if let (Some(first), Some(last)) = (prices.dates().first(), prices.dates().last()) {
        println!("Loaded {} days for {} instruments", prices.len(), prices.width());
        println!("Date range: {} to {}\n", first, last);
    }

    println!(
        "Rebalance: {} | window: {} | top_k: {} | allocation: {}",
        config.rebalance_freq, config.momentum_window, config.top_k, config.allocation
    );
    println!(
        "Capital: {:.2} | fee: {} | slippage: {}\n",
        config.initial_capital, config.fee_rate, config.slippage_rate
    );

    let result = BacktestEngine::new(config.clone(), prices).run()?;

    println!("Backtest Results");
    println!("================\n");
    result
        .summary
        .pretty_print_table(Some(&result.benchmark_summary));

    //save outputs if requested
    if let Some(path) = &config.output_nav_csv {
        save_equity_csv(&result.equity_curve, path)?;
        println!("\nNAV series saved to {:?}", path);
    }

    if let Some(path) = &config.output_holdings_csv {
        save_holdings_csv(&result.simulation, path)?;
        println!("Holdings saved to {:?}", path);
    }

    if let Some(path) = &config.output_trades_csv {
        save_trades_csv(&result.simulation.trades, path)?;
        println!("Trades saved to {:?}", path);
    }

    if let Some(path) = &config.output_metrics_json {
        save_metrics_json(&result.summary, Some(&result.benchmark_summary), path)?;
        println!("Metrics saved to {:?}", path);
    }

    Ok(())
}

fn sweep(config: BacktestConfiguration, grid: SweepGrid) -> Result<()> {
    let prices = load_prices(&config)?;

    println!("Running {} configurations...\n", grid.size());
    let mut results = run_sweep(&prices, &config, &grid)?;
    rank_by_sharpe(&mut results);
    sweep_table(&results).printstd();

    Ok(())
}
