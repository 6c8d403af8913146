//a Rust-based long/cash strategy backtester for daily price series

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod metrics;
pub mod strategy;

//prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{
        BacktestConfiguration, RsiParams, SmaParams, StrategyParams, StrategyType, SweepSettings,
    };
    pub use crate::data::{
        build_feature_frame, filter_by_date_range, load_csv, Bar, FeatureFrame, SignalSeries,
        TimeSeries,
    };
    pub use crate::engine::{
        run_backtest, run_sma_parameter_sweep, run_walk_forward, BacktestConfig, BacktestEngine,
        BacktestResult, SweepRow, SweepTable, WalkForwardResult, WalkForwardSplit,
    };
    pub use crate::error::BacktestError;
    pub use crate::indicators::{relative_strength_oscillator, simple_moving_average};
    pub use crate::metrics::{EquityPoint, SummaryMetrics};
    pub use crate::strategy::{
        rsi_reversion::{generate_rsi_mean_reversion_signals, RsiReversionStrategy},
        sma_crossover::{generate_sma_crossover_signals, SmaCrossoverStrategy},
        Strategy,
    };
}
