use crate::engine::BacktestConfig;
use crate::strategy::{
    rsi_reversion::RsiReversionStrategy, sma_crossover::SmaCrossoverStrategy, Strategy,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

//strategy type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyType {
    SmaCrossover,
    RsiReversion,
}

impl StrategyType {
    //parse strategy type from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sma" | "sma_crossover" | "crossover" => Some(StrategyType::SmaCrossover),
            "rsi" | "rsi_reversion" | "mean_reversion" => Some(StrategyType::RsiReversion),
            _ => None,
        }
    }
}

//sma crossover strategy parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmaParams {
    pub short_window: usize,
    pub long_window: usize,
}

impl Default for SmaParams {
    fn default() -> Self {
        SmaParams {
            short_window: 20,
            long_window: 50,
        }
    }
}

//rsi mean reversion strategy parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RsiParams {
    pub window: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for RsiParams {
    fn default() -> Self {
        RsiParams {
            window: 14,
            oversold: 30.0,
            overbought: 70.0,
        }
    }
}

//strategy-specific parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum StrategyParams {
    Sma(SmaParams),
    Rsi(RsiParams),
}

impl StrategyParams {
    pub fn strategy_type(&self) -> StrategyType {
        match self {
            StrategyParams::Sma(_) => StrategyType::SmaCrossover,
            StrategyParams::Rsi(_) => StrategyType::RsiReversion,
        }
    }

    //builds the signal generator for these parameters
    pub fn build(&self) -> Box<dyn Strategy> {
        match *self {
            StrategyParams::Sma(p) => {
                Box::new(SmaCrossoverStrategy::new(p.short_window, p.long_window))
            }
            StrategyParams::Rsi(p) => Box::new(RsiReversionStrategy::new(
                p.window,
                p.oversold,
                p.overbought,
            )),
        }
    }
}

impl Default for StrategyParams {
    fn default() -> Self {
        StrategyParams::Sma(SmaParams::default())
    }
}

//candidate windows for a crossover parameter sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepSettings {
    pub short_windows: Vec<usize>,
    pub long_windows: Vec<usize>,
}

//complete backtest configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfiguration {
    //data
    pub data_path: PathBuf,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,

    //strategy
    pub strategy_params: StrategyParams,

    //costs and capital
    #[serde(default)]
    pub transaction_cost_bps: f64,
    #[serde(default)]
    pub slippage_bps: f64,
    #[serde(default = "default_initial_capital")]
    pub initial_capital: f64,
    #[serde(default)]
    pub risk_free_rate: f64,

    //evaluators
    #[serde(default)]
    pub sweep: Option<SweepSettings>,
    #[serde(default)]
    pub walk_forward_cutoff: Option<DateTime<Utc>>,

    //optional output paths
    #[serde(default)]
    pub output_equity_csv: Option<PathBuf>,
    #[serde(default)]
    pub output_sweep_csv: Option<PathBuf>,
}

fn default_initial_capital() -> f64 {
    1.0
}

impl Default for BacktestConfiguration {
    fn default() -> Self {
        BacktestConfiguration {
            data_path: PathBuf::from("data/prices.csv"),
            start: None,
            end: None,
            strategy_params: StrategyParams::default(),
            transaction_cost_bps: 0.0,
            slippage_bps: 0.0,
            initial_capital: default_initial_capital(),
            risk_free_rate: 0.0,
            sweep: None,
            walk_forward_cutoff: None,
            output_equity_csv: None,
            output_sweep_csv: None,
        }
    }
}

impl BacktestConfiguration {
    //load configuration from a JSON file
    pub fn from_json_file(path: &PathBuf) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: BacktestConfiguration = serde_json::from_str(&contents)?;
        Ok(config)
    }

    //save configuration to a JSON file
    pub fn to_json_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    //engine settings shared by every run of this configuration
    pub fn engine_config(&self) -> BacktestConfig {
        BacktestConfig {
            transaction_cost_bps: self.transaction_cost_bps,
            slippage_bps: self.slippage_bps,
            initial_capital: self.initial_capital,
            risk_free_rate: self.risk_free_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_strategy_aliases() {
        assert_eq!(StrategyType::parse("SMA"), Some(StrategyType::SmaCrossover));
        assert_eq!(
            StrategyType::parse("mean_reversion"),
            Some(StrategyType::RsiReversion)
        );
        assert_eq!(StrategyType::parse("momentum"), None);
    }

    #[test]
    fn json_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = BacktestConfiguration {
            strategy_params: StrategyParams::Rsi(RsiParams::default()),
            transaction_cost_bps: 5.0,
            sweep: Some(SweepSettings {
                short_windows: vec![5, 10],
                long_windows: vec![20, 50],
            }),
            ..Default::default()
        };
        config.to_json_file(&path).unwrap();

        let loaded = BacktestConfiguration::from_json_file(&path).unwrap();
        assert_eq!(loaded.strategy_params, config.strategy_params);
        assert_eq!(loaded.transaction_cost_bps, 5.0);
        assert_eq!(loaded.sweep, config.sweep);
    }

    #[test]
    fn minimal_json_uses_defaults() {
        let json = r#"{
            "data_path": "gold.csv",
            "strategy_params": {"strategy": "sma", "short_window": 10, "long_window": 30}
        }"#;
        let config: BacktestConfiguration = serde_json::from_str(json).unwrap();

        assert_eq!(config.initial_capital, 1.0);
        assert_eq!(config.slippage_bps, 0.0);
        assert_eq!(
            config.strategy_params,
            StrategyParams::Sma(SmaParams {
                short_window: 10,
                long_window: 30
            })
        );
        assert_eq!(
            config.strategy_params.strategy_type(),
            StrategyType::SmaCrossover
        );
    }
}
