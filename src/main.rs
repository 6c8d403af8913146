use anyhow::{Context, Result};
use aurum::data::loader::parse_timestamp;
use aurum::prelude::*;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "aurum")]
#[command(about = "A Rust-based long/cash strategy backtester for daily prices", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    //run a single backtest
    Run {
        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        strategy: StrategyArgs,

        //output path for equity curve csv
        #[arg(long)]
        output_equity_csv: Option<PathBuf>,
    },

    //sweep sma crossover windows
    Sweep {
        #[command(flatten)]
        common: CommonArgs,

        //short window candidates (comma separated)
        #[arg(long, value_delimiter = ',')]
        short_windows: Vec<usize>,

        //long window candidates (comma separated)
        #[arg(long, value_delimiter = ',')]
        long_windows: Vec<usize>,

        //output path for sweep table csv
        #[arg(long)]
        output_sweep_csv: Option<PathBuf>,
    },

    //train/test split at a cutoff date
    WalkForward {
        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        strategy: StrategyArgs,

        //last date of the training segment
        #[arg(long, value_parser = parse_date)]
        cutoff: Option<DateTime<Utc>>,
    },
}

#[derive(Args)]
struct CommonArgs {
    //json configuration file, flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    //path to csv data file
    #[arg(long)]
    data: Option<PathBuf>,

    //first date to include
    #[arg(long, value_parser = parse_date)]
    start: Option<DateTime<Utc>>,

    //last date to include
    #[arg(long, value_parser = parse_date)]
    end: Option<DateTime<Utc>>,

    //transaction cost in basis points per unit of turnover
    #[arg(long)]
    cost_bps: Option<f64>,

    //slippage in basis points per unit of turnover
    #[arg(long)]
    slippage_bps: Option<f64>,

    //starting capital
    #[arg(long)]
    initial_capital: Option<f64>,

    //annual risk free rate used by the sharpe ratio
    #[arg(long)]
    risk_free_rate: Option<f64>,
}

#[derive(Args)]
struct StrategyArgs {
    //strategy type (sma, rsi)
    #[arg(long)]
    strategy: Option<String>,

    //short sma window (for sma strategy)
    #[arg(long)]
    short: Option<usize>,

    //long sma window (for sma strategy)
    #[arg(long)]
    long: Option<usize>,

    //rsi window (for rsi strategy)
    #[arg(long)]
    rsi_window: Option<usize>,

    //rsi oversold threshold (for rsi strategy)
    #[arg(long)]
    oversold: Option<f64>,

    //rsi overbought threshold (for rsi strategy)
    #[arg(long)]
    overbought: Option<f64>,
}

fn parse_date(raw: &str) -> std::result::Result<DateTime<Utc>, String> {
    parse_timestamp(raw).ok_or_else(|| format!("invalid date '{}'", raw))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            common,
            strategy,
            output_equity_csv,
        } => {
            let mut config = common.resolve()?;
            strategy.apply(&mut config)?;
            if output_equity_csv.is_some() {
                config.output_equity_csv = output_equity_csv;
            }
            run_single(&config)
        }
        Commands::Sweep {
            common,
            short_windows,
            long_windows,
            output_sweep_csv,
        } => {
            let mut config = common.resolve()?;
            if !short_windows.is_empty() || !long_windows.is_empty() {
                config.sweep = Some(SweepSettings {
                    short_windows,
                    long_windows,
                });
            }
            if output_sweep_csv.is_some() {
                config.output_sweep_csv = output_sweep_csv;
            }
            run_sweep(&config)
        }
        Commands::WalkForward {
            common,
            strategy,
            cutoff,
        } => {
            let mut config = common.resolve()?;
            strategy.apply(&mut config)?;
            if cutoff.is_some() {
                config.walk_forward_cutoff = cutoff;
            }
            run_walk_forward_split(&config)
        }
    }
}

impl CommonArgs {
    //starts from the config file (or defaults) and applies flag overrides
    fn resolve(&self) -> Result<BacktestConfiguration> {
        let mut config = match &self.config {
            Some(path) => BacktestConfiguration::from_json_file(path)
                .context(format!("Failed to load config from {:?}", path))?,
            None => BacktestConfiguration::default(),
        };

        if let Some(data) = &self.data {
            config.data_path = data.clone();
        } else if self.config.is_none() {
            anyhow::bail!("--data or --config is required");
        }
        if self.start.is_some() {
            config.start = self.start;
        }
        if self.end.is_some() {
            config.end = self.end;
        }
        if let Some(cost) = self.cost_bps {
            config.transaction_cost_bps = cost;
        }
        if let Some(slippage) = self.slippage_bps {
            config.slippage_bps = slippage;
        }
        if let Some(capital) = self.initial_capital {
            config.initial_capital = capital;
        }
        if let Some(rf) = self.risk_free_rate {
            config.risk_free_rate = rf;
        }

        Ok(config)
    }
}

impl StrategyArgs {
    fn apply(&self, config: &mut BacktestConfiguration) -> Result<()> {
        let strategy_type = match &self.strategy {
            Some(name) => StrategyType::parse(name)
                .ok_or_else(|| anyhow::anyhow!("Unknown strategy: {}", name))?,
            None => config.strategy_params.strategy_type(),
        };

        config.strategy_params = match (strategy_type, config.strategy_params) {
            (StrategyType::SmaCrossover, current) => {
                let base = match current {
                    StrategyParams::Sma(p) => p,
                    StrategyParams::Rsi(_) => SmaParams::default(),
                };
                StrategyParams::Sma(SmaParams {
                    short_window: self.short.unwrap_or(base.short_window),
                    long_window: self.long.unwrap_or(base.long_window),
                })
            }
            (StrategyType::RsiReversion, current) => {
                let base = match current {
                    StrategyParams::Rsi(p) => p,
                    StrategyParams::Sma(_) => RsiParams::default(),
                };
                StrategyParams::Rsi(RsiParams {
                    window: self.rsi_window.unwrap_or(base.window),
                    oversold: self.oversold.unwrap_or(base.oversold),
                    overbought: self.overbought.unwrap_or(base.overbought),
                })
            }
        };

        Ok(())
    }
}

//loads and date-filters the configured price file
fn load_prices(config: &BacktestConfiguration) -> Result<Vec<Bar>> {
    info!(path = ?config.data_path, "loading price data");
    let all_bars = load_csv(&config.data_path)
        .context(format!("Failed to load data from {:?}", config.data_path))?;

    let bars = filter_by_date_range(&all_bars, config.start, config.end);
    if bars.is_empty() {
        anyhow::bail!("No price data in the selected date range");
    }

    info!(
        bars = bars.len(),
        first = %bars[0].timestamp,
        last = %bars[bars.len() - 1].timestamp,
        "loaded price data"
    );
    Ok(bars)
}

fn run_single(config: &BacktestConfiguration) -> Result<()> {
    let bars = load_prices(config)?;
    let features = build_feature_frame(&bars);

    let strategy = config.strategy_params.build();
    let engine = BacktestEngine::new(config.engine_config())?;

    info!(strategy = %strategy.name(), "running backtest");
    let result = engine.run_strategy(&bars, &features, strategy.as_ref())?;

    println!("Backtest Results: {}", strategy.name());
    println!("================\n");
    result.metrics.pretty_print_table();
    println!(
        "\nTrades: {}  Exposure: {:.2}%",
        result.num_trades(),
        result.exposure() * 100.0
    );

    if let Some(equity_path) = &config.output_equity_csv {
        save_equity_csv(&result.equity_points(), equity_path)?;
        println!("\nEquity curve saved to {:?}", equity_path);
    }

    Ok(())
}

fn run_sweep(config: &BacktestConfiguration) -> Result<()> {
    let settings = config
        .sweep
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("--short-windows and --long-windows are required"))?;

    let bars = load_prices(config)?;
    let features = build_feature_frame(&bars);

    let table = run_sma_parameter_sweep(
        &bars,
        &features,
        settings.short_windows.iter().copied(),
        settings.long_windows.iter().copied(),
        &config.engine_config(),
    )?;

    println!("Parameter Sweep ({} pairs)", table.len());
    println!("================\n");
    if table.is_empty() {
        println!("No (short, long) pair with short < long.");
        return Ok(());
    }
    table.pretty_print_table();

    if let Some(best) = table.best_by("sharpe") {
        println!(
            "\nBest Sharpe: short={} long={} ({:.3})",
            best.short_window, best.long_window, best.metrics.sharpe
        );
    }

    if let Some(sweep_path) = &config.output_sweep_csv {
        save_sweep_csv(&table, sweep_path)?;
        println!("Sweep table saved to {:?}", sweep_path);
    }

    Ok(())
}

fn run_walk_forward_split(config: &BacktestConfiguration) -> Result<()> {
    let cutoff = config
        .walk_forward_cutoff
        .ok_or_else(|| anyhow::anyhow!("--cutoff is required for walk-forward"))?;

    let bars = load_prices(config)?;
    let features = build_feature_frame(&bars);

    let result = run_walk_forward(
        &features,
        &config.strategy_params,
        cutoff,
        &config.engine_config(),
    )?;

    println!("Walk-Forward Results (cutoff {})", cutoff.date_naive());
    println!("================\n");
    result
        .train
        .metrics
        .pretty_print_comparison("Train", &result.test.metrics, "Test");

    Ok(())
}

fn save_equity_csv(equity_curve: &[EquityPoint], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .context(format!("Failed to create {:?}", path))?;

    for point in equity_curve {
        writer.serialize(point)?;
    }
    writer.flush()?;

    Ok(())
}

fn save_sweep_csv(table: &SweepTable, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .context(format!("Failed to create {:?}", path))?;

    let mut header = vec!["short_window", "long_window"];
    header.extend(SummaryMetrics::default().entries().iter().map(|(name, _)| *name));
    writer.write_record(&header)?;

    for row in &table.rows {
        let mut record = vec![row.short_window.to_string(), row.long_window.to_string()];
        record.extend(row.metrics.entries().iter().map(|(_, v)| v.to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;

    Ok(())
}
