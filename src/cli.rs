//! CLI definition and dispatch.
//!
//! Settings resolve in three layers: built-in defaults, then the optional
//! INI file given with `--config`, then command-line flags.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::adapters::csv_adapter::CsvPriceAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::validate_backtest_config;
use crate::domain::error::RebalancerError;
use crate::domain::metrics::BacktestMetrics;
use crate::domain::schedule::RebalanceFrequency;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceDataPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_DATA_DIR: &str = "data";

#[derive(Parser, Debug)]
#[command(
    name = "rebalancer",
    about = "Backtest a two-asset portfolio with periodic rebalancing"
)]
pub struct Cli {
    /// Verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest(BacktestArgs),
    /// Show the date range of a symbol's price file
    Info {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Default, Clone)]
pub struct BacktestArgs {
    /// INI file with a [backtest] section
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Start date YYYY-MM-DD (default: 2015-01-01)
    #[arg(long = "start")]
    pub start_date: Option<NaiveDate>,
    /// End date YYYY-MM-DD (default: today)
    #[arg(long = "end")]
    pub end_date: Option<NaiveDate>,
    /// Stable asset symbol (default: SPY)
    #[arg(long = "stable")]
    pub stable_symbol: Option<String>,
    /// Volatile asset symbol (default: BTC-USD)
    #[arg(long = "volatile")]
    pub volatile_symbol: Option<String>,
    /// Initial capital (default: 10000)
    #[arg(long = "initial")]
    pub initial_capital: Option<f64>,
    /// Stable asset weight (default: 0.75)
    #[arg(long)]
    pub stable_weight: Option<f64>,
    /// Volatile asset weight (default: 0.25)
    #[arg(long)]
    pub volatile_weight: Option<f64>,
    /// Rebalance frequency: W=weekly, M=monthly, Q=quarterly, A=annual
    #[arg(long = "rebalance")]
    pub rebalance_frequency: Option<RebalanceFrequency>,
    /// Transaction cost in basis points of traded notional (default: 10)
    #[arg(long)]
    pub fee_bps: Option<f64>,
    /// Save the equity curve to this CSV path
    #[arg(long = "csv")]
    pub csv_path: Option<PathBuf>,
    /// Directory holding <SYMBOL>.csv price files
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    /// Validate and print the resolved configuration without running
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(cli: Cli) -> ExitCode {
    init_logging(cli.verbose);

    let outcome = match cli.command {
        Command::Backtest(args) => run_backtest(&args),
        Command::Info {
            symbol,
            data_dir,
            config,
        } => run_info(&symbol, data_dir.as_deref(), config.as_deref()),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("warning: logging already initialized");
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, RebalancerError> {
    FileConfigAdapter::from_file(path).map_err(|e| RebalancerError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn parse_date(value: &str, key: &str) -> Result<NaiveDate, RebalancerError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        RebalancerError::invalid(
            "backtest",
            key,
            "invalid date format (expected YYYY-MM-DD)",
        )
    })
}

/// Reads the `[backtest]` section, falling back to defaults for absent keys.
pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, RebalancerError> {
    let defaults = BacktestConfig::default();

    let start_date = match adapter.get_string("backtest", "start_date") {
        Some(s) => parse_date(&s, "start_date")?,
        None => defaults.start_date,
    };
    let end_date = match adapter.get_string("backtest", "end_date") {
        Some(s) => Some(parse_date(&s, "end_date")?),
        None => None,
    };
    let rebalance_frequency = match adapter.get_string("backtest", "rebalance_frequency") {
        Some(s) => s
            .parse::<RebalanceFrequency>()
            .map_err(|reason: String| RebalancerError::invalid("backtest", "rebalance_frequency", reason))?,
        None => defaults.rebalance_frequency,
    };

    Ok(BacktestConfig {
        start_date,
        end_date,
        stable_symbol: adapter
            .get_string("backtest", "stable_symbol")
            .unwrap_or(defaults.stable_symbol),
        volatile_symbol: adapter
            .get_string("backtest", "volatile_symbol")
            .unwrap_or(defaults.volatile_symbol),
        initial_capital: adapter
            .get_double("backtest", "initial_capital")?
            .unwrap_or(defaults.initial_capital),
        stable_weight: adapter
            .get_double("backtest", "stable_weight")?
            .unwrap_or(defaults.stable_weight),
        volatile_weight: adapter
            .get_double("backtest", "volatile_weight")?
            .unwrap_or(defaults.volatile_weight),
        rebalance_frequency,
        fee_bps: adapter
            .get_double("backtest", "fee_bps")?
            .unwrap_or(defaults.fee_bps),
    })
}

/// Command-line flags win over whatever the config file set.
pub fn apply_overrides(config: BacktestConfig, args: &BacktestArgs) -> BacktestConfig {
    BacktestConfig {
        start_date: args.start_date.unwrap_or(config.start_date),
        end_date: args.end_date.or(config.end_date),
        stable_symbol: args.stable_symbol.clone().unwrap_or(config.stable_symbol),
        volatile_symbol: args
            .volatile_symbol
            .clone()
            .unwrap_or(config.volatile_symbol),
        initial_capital: args.initial_capital.unwrap_or(config.initial_capital),
        stable_weight: args.stable_weight.unwrap_or(config.stable_weight),
        volatile_weight: args.volatile_weight.unwrap_or(config.volatile_weight),
        rebalance_frequency: args
            .rebalance_frequency
            .unwrap_or(config.rebalance_frequency),
        fee_bps: args.fee_bps.unwrap_or(config.fee_bps),
    }
}

/// Resolves the backtest config and price directory from all three layers.
pub fn resolve_settings(
    args: &BacktestArgs,
) -> Result<(BacktestConfig, PathBuf), RebalancerError> {
    let (file_config, file_data_dir) = match &args.config {
        Some(path) => {
            info!("Loading config from {}", path.display());
            let adapter = load_config(path)?;
            (
                build_backtest_config(&adapter)?,
                adapter.get_string("data", "dir").map(PathBuf::from),
            )
        }
        None => (BacktestConfig::default(), None),
    };

    let config = apply_overrides(file_config, args);
    let data_dir = args
        .data_dir
        .clone()
        .or(file_data_dir)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
    Ok((config, data_dir))
}

/// Runs the backtest for `args`. Returns `None` for a dry run.
pub fn execute_backtest(args: &BacktestArgs) -> Result<Option<BacktestResult>, RebalancerError> {
    let (config, data_dir) = resolve_settings(args)?;

    if args.dry_run {
        validate_backtest_config(&config)?;
        eprintln!("{}", format_config(&config, &data_dir));
        eprintln!("\nDry run complete: configuration is valid");
        return Ok(None);
    }

    let data_port = CsvPriceAdapter::new(data_dir);
    let result = backtest_engine::run_backtest(&data_port, &config)?;

    if let Some(path) = &args.csv_path {
        CsvReportAdapter.write(&result, path)?;
    }
    Ok(Some(result))
}

fn run_backtest(args: &BacktestArgs) -> Result<(), RebalancerError> {
    if let Some(result) = execute_backtest(args)? {
        println!("{}", format_summary(&result.metrics, result.total_fees));
        if let Some(path) = &args.csv_path {
            println!("Saved equity curve to {}", path.display());
        }
    }
    Ok(())
}

fn run_info(
    symbol: &str,
    data_dir: Option<&Path>,
    config_path: Option<&Path>,
) -> Result<(), RebalancerError> {
    let config_dir = match config_path {
        Some(path) => load_config(path)?.get_string("data", "dir").map(PathBuf::from),
        None => None,
    };
    let dir = data_dir
        .map(Path::to_path_buf)
        .or(config_dir)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

    let adapter = CsvPriceAdapter::new(dir);
    match adapter.get_data_range(symbol)? {
        Some((min_date, max_date, count)) => {
            println!("{}: {} prices, {} to {}", symbol, count, min_date, max_date);
        }
        None => eprintln!("{}: no data found", symbol),
    }
    Ok(())
}

fn format_config(config: &BacktestConfig, data_dir: &Path) -> String {
    let end = config
        .end_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "today".to_string());
    [
        "Resolved configuration:".to_string(),
        format!("  period:     {} to {}", config.start_date, end),
        format!(
            "  assets:     {} ({:.2}) / {} ({:.2})",
            config.stable_symbol,
            config.stable_weight,
            config.volatile_symbol,
            config.volatile_weight
        ),
        format!("  capital:    {}", format_currency(config.initial_capital)),
        format!("  rebalance:  {}", config.rebalance_frequency),
        format!("  fee:        {} bps", config.fee_bps),
        format!("  data dir:   {}", data_dir.display()),
    ]
    .join("\n")
}

fn pct(x: f64) -> String {
    format!("{:.2}%", x * 100.0)
}

/// `$12,345.67` style formatting.
pub fn format_currency(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (whole, frac) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{frac}")
}

pub fn format_summary(metrics: &BacktestMetrics, total_fees: f64) -> String {
    [
        format!("Final Value: {}", format_currency(metrics.final_value)),
        format!("Total Return: {}", pct(metrics.total_return)),
        format!("CAGR: {}", pct(metrics.cagr)),
        format!("Annual Volatility: {}", pct(metrics.annual_volatility)),
        format!("Sharpe (rf=0): {:.2}", metrics.sharpe_ratio),
        format!("Max Drawdown: {}", pct(metrics.max_drawdown)),
        format!(
            "Max DD Period: {} → {}",
            metrics.max_drawdown_start, metrics.max_drawdown_end
        ),
        format!("Rebalances: {}", metrics.num_rebalances),
        format!("Fees Paid: {}", format_currency(total_fees)),
    ]
    .join("\n")
}
