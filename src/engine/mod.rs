pub mod backtest;
pub mod sweep;
pub mod walk_forward;

pub use backtest::{run_backtest, BacktestConfig, BacktestEngine, BacktestResult};
pub use sweep::{run_sma_parameter_sweep, sweep_grid, SweepRow, SweepTable};
pub use walk_forward::{run_walk_forward, WalkForwardResult, WalkForwardSplit};
