use crate::data::{Bar, FeatureFrame, SignalSeries, TimeSeries};
use crate::error::{BacktestError, Result};
use crate::metrics::{calculate_drawdown, calculate_equity_curve, EquityPoint, SummaryMetrics};
use crate::strategy::Strategy;
use serde::{Deserialize, Serialize};
use tracing::debug;

const BPS: f64 = 10_000.0;

//result of a backtest
#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub prices: Vec<Bar>,
    pub features: FeatureFrame,
    //signal aligned onto the price index
    pub signals: SignalSeries,
    pub positions: TimeSeries,
    pub turnover: TimeSeries,
    pub strategy_returns: TimeSeries,
    pub equity_curve: TimeSeries,
    pub drawdown: TimeSeries,
    pub metrics: SummaryMetrics,
}

impl BacktestResult {
    //per-period rows for export
    pub fn equity_points(&self) -> Vec<EquityPoint> {
        (0..self.prices.len())
            .map(|i| EquityPoint {
                timestamp: self.prices[i].timestamp,
                signal: self.signals.values[i],
                position: self.positions.values[i],
                turnover: self.turnover.values[i],
                strategy_return: self.strategy_returns.values[i],
                equity: self.equity_curve.values[i],
                drawdown: self.drawdown.values[i],
            })
            .collect()
    }

    //number of periods in which exposure changed
    pub fn num_trades(&self) -> usize {
        self.turnover.values.iter().filter(|&&t| t > 0.0).count()
    }

    //fraction of periods holding the asset
    pub fn exposure(&self) -> f64 {
        if self.positions.is_empty() {
            return 0.0;
        }
        self.positions.values.iter().sum::<f64>() / self.positions.len() as f64
    }
}

//configuration for a backtest
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub transaction_cost_bps: f64,
    pub slippage_bps: f64,
    pub initial_capital: f64,
    pub risk_free_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            transaction_cost_bps: 0.0,
            slippage_bps: 0.0,
            initial_capital: 1.0,
            risk_free_rate: 0.0,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(BacktestError::invalid(format!(
                "initial_capital must be positive, got {}",
                self.initial_capital
            )));
        }
        for (name, value) in [
            ("transaction_cost_bps", self.transaction_cost_bps),
            ("slippage_bps", self.slippage_bps),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(BacktestError::invalid(format!(
                    "{} must be non-negative, got {}",
                    name, value
                )));
            }
        }
        if !self.risk_free_rate.is_finite() {
            return Err(BacktestError::invalid("risk_free_rate must be finite"));
        }
        Ok(())
    }

    //combined cost rate charged per unit of turnover
    pub fn cost_rate(&self) -> f64 {
        (self.transaction_cost_bps + self.slippage_bps) / BPS
    }
}

//main backtest engine
//positions are the signal lagged one period, costs are charged on turnover only
#[derive(Debug, Clone, Copy, Default)]
pub struct BacktestEngine {
    config: BacktestConfig,
}

impl BacktestEngine {
    //creates a new backtest engine, rejecting malformed settings up front
    pub fn new(config: BacktestConfig) -> Result<Self> {
        config.validate()?;
        Ok(BacktestEngine { config })
    }

    //runs the backtest for a precomputed signal
    pub fn run(
        &self,
        prices: &[Bar],
        features: &FeatureFrame,
        signals: &SignalSeries,
    ) -> BacktestResult {
        let mut prices = prices.to_vec();
        prices.sort_by_key(|bar| bar.timestamp);
        let index: Vec<_> = prices.iter().map(|bar| bar.timestamp).collect();

        //timestamps without a signal are flat
        let aligned = signals.reindex(&index, 0.0);

        //position during t is the decision made at the close of t-1
        let positions = aligned.shift(0.0);

        let period_returns = close_to_close_returns(&prices);

        let mut prev_position = 0.0;
        let turnover: Vec<f64> = positions
            .values
            .iter()
            .map(|&position| {
                let change = (position - prev_position).abs();
                prev_position = position;
                change
            })
            .collect();

        let cost_rate = self.config.cost_rate();
        let strategy_returns: Vec<f64> = positions
            .values
            .iter()
            .zip(&period_returns)
            .zip(&turnover)
            .map(|((position, ret), traded)| position * ret - traded * cost_rate)
            .collect();

        let initial_capital = self.config.initial_capital;
        let equity = calculate_equity_curve(&strategy_returns, initial_capital);
        let normalized: Vec<f64> = equity.iter().map(|e| e / initial_capital).collect();
        let drawdown = calculate_drawdown(&normalized);

        let metrics = SummaryMetrics::from_series(
            &strategy_returns,
            &normalized,
            &drawdown,
            self.config.risk_free_rate,
        );

        debug!(
            periods = prices.len(),
            trades = turnover.iter().filter(|&&t| t > 0.0).count(),
            total_return = metrics.total_return,
            "backtest complete"
        );

        BacktestResult {
            prices,
            features: features.clone(),
            signals: aligned,
            positions,
            turnover: TimeSeries::new(index.clone(), turnover),
            strategy_returns: TimeSeries::new(index.clone(), strategy_returns),
            equity_curve: TimeSeries::new(index.clone(), equity),
            drawdown: TimeSeries::new(index, drawdown),
            metrics,
        }
    }

    //generates the strategy's signals from `features` and backtests them
    pub fn run_strategy(
        &self,
        prices: &[Bar],
        features: &FeatureFrame,
        strategy: &dyn Strategy,
    ) -> Result<BacktestResult> {
        let (enriched, signals) = strategy.generate(features)?;
        Ok(self.run(prices, &enriched, &signals))
    }
}

//close(t) / close(t-1) - 1, with the first period at 0
fn close_to_close_returns(prices: &[Bar]) -> Vec<f64> {
    let closes: Vec<f64> = prices.iter().map(|bar| bar.close).collect();
    crate::data::pct_change(&closes)
}

//runs a single backtest of `signals` against `prices`
pub fn run_backtest(
    prices: &[Bar],
    features: &FeatureFrame,
    signals: &SignalSeries,
    config: &BacktestConfig,
) -> Result<BacktestResult> {
    Ok(BacktestEngine::new(*config)?.run(prices, features, signals))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::build_feature_frame;
    use chrono::{DateTime, TimeZone, Utc};

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, d, 0, 0, 0).unwrap()
    }

    fn prices(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::from_close(day(1 + i as u32), c))
            .collect()
    }

    fn signal(values: &[f64]) -> SignalSeries {
        let index = (0..values.len()).map(|i| day(1 + i as u32)).collect();
        SignalSeries::new(index, values.to_vec())
    }

    fn config(cost_bps: f64) -> BacktestConfig {
        BacktestConfig {
            transaction_cost_bps: cost_bps,
            ..Default::default()
        }
    }

    #[test]
    fn positions_shift_and_costs_on_trades() {
        let prices = prices(&[100.0, 102.0, 101.0, 103.0, 104.0]);
        let features = build_feature_frame(&prices);
        let signals = signal(&[0.0, 1.0, 1.0, 0.0, 0.0]);

        let result = run_backtest(&prices, &features, &signals, &config(10.0)).unwrap();

        assert_eq!(result.positions.values, vec![0.0, 0.0, 1.0, 1.0, 0.0]);
        assert_eq!(result.turnover.values, vec![0.0, 0.0, 1.0, 0.0, 1.0]);

        let expected_day2 = 101.0 / 102.0 - 1.0 - 0.001;
        assert!((result.strategy_returns.values[2] - expected_day2).abs() < 1e-12);
        assert!((result.strategy_returns.values[2] + 0.01081).abs() < 1e-5);

        //held through day 3 with no cost, flat with an exit charge on day 4
        let expected_day3 = 103.0 / 101.0 - 1.0;
        assert!((result.strategy_returns.values[3] - expected_day3).abs() < 1e-12);
        assert!((result.strategy_returns.values[4] + 0.001).abs() < 1e-12);

        assert_eq!(result.equity_curve.values[0], 1.0);
        assert_eq!(result.num_trades(), 2);
    }

    #[test]
    fn missing_signal_timestamps_are_flat() {
        let prices = prices(&[1.0, 2.0, 3.0, 4.0]);
        let features = build_feature_frame(&prices);
        let sparse = SignalSeries::new(vec![day(2)], vec![1.0]);

        let result = run_backtest(&prices, &features, &sparse, &config(0.0)).unwrap();

        assert_eq!(result.signals.values, vec![0.0, 1.0, 0.0, 0.0]);
        assert_eq!(result.positions.values, vec![0.0, 0.0, 1.0, 0.0]);
        assert!((result.strategy_returns.values[2] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn drawdown_never_positive() {
        let prices = prices(&[10.0, 12.0, 9.0, 8.0, 11.0, 13.0, 7.0]);
        let features = build_feature_frame(&prices);
        let signals = signal(&[1.0; 7]);

        let result = run_backtest(&prices, &features, &signals, &config(25.0)).unwrap();

        let mut peak = f64::NEG_INFINITY;
        for (&dd, &equity) in result.drawdown.values.iter().zip(&result.equity_curve.values) {
            assert!(dd <= 0.0);
            if equity >= peak {
                peak = equity;
                assert_eq!(dd, 0.0);
            }
        }
        assert!(result.metrics.max_drawdown < 0.0);
    }

    #[test]
    fn equity_scales_with_initial_capital() {
        let prices = prices(&[100.0, 110.0, 121.0]);
        let features = build_feature_frame(&prices);
        let signals = signal(&[1.0, 1.0, 1.0]);
        let config = BacktestConfig {
            initial_capital: 1000.0,
            ..Default::default()
        };

        let result = run_backtest(&prices, &features, &signals, &config).unwrap();

        assert_eq!(result.equity_curve.values[0], 1000.0);
        assert!((result.equity_curve.values[2] - 1210.0).abs() < 1e-9);
        assert!((result.metrics.total_return - 0.21).abs() < 1e-12);
        assert!((result.exposure() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn flat_strategy_has_zero_sharpe_with_risk_free_rate() {
        let closes: Vec<f64> = (0..300).map(|i| 100.0 + (i % 7) as f64).collect();
        let prices: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::from_close(day(1) + chrono::Duration::days(i as i64), c))
            .collect();
        let features = build_feature_frame(&prices);
        let flat = SignalSeries::new(
            prices.iter().map(|bar| bar.timestamp).collect(),
            vec![0.0; 300],
        );

        for risk_free_rate in [0.02, 0.03] {
            let config = BacktestConfig {
                risk_free_rate,
                ..Default::default()
            };
            let result = run_backtest(&prices, &features, &flat, &config).unwrap();

            assert_eq!(result.metrics.volatility, 0.0);
            assert_eq!(result.metrics.sharpe, 0.0);
        }
    }

    #[test]
    fn empty_prices_give_empty_result() {
        let result =
            run_backtest(&[], &FeatureFrame::default(), &SignalSeries::empty(), &config(5.0))
                .unwrap();

        assert!(result.equity_curve.is_empty());
        assert!(result.drawdown.is_empty());
        assert_eq!(result.metrics, SummaryMetrics::default());
        assert!(result.equity_points().is_empty());
    }

    #[test]
    fn malformed_config_rejected() {
        let prices = prices(&[1.0, 2.0]);
        let features = build_feature_frame(&prices);
        let signals = signal(&[1.0, 1.0]);

        for bad in [
            BacktestConfig {
                initial_capital: 0.0,
                ..Default::default()
            },
            BacktestConfig {
                slippage_bps: -1.0,
                ..Default::default()
            },
            BacktestConfig {
                transaction_cost_bps: f64::NAN,
                ..Default::default()
            },
        ] {
            assert!(matches!(
                run_backtest(&prices, &features, &signals, &bad),
                Err(BacktestError::InvalidParameter(_))
            ));
        }
    }
}
