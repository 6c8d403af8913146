use crate::data::{FeatureFrame, SignalSeries};
use crate::error::{BacktestError, Result};
use crate::indicators::simple_moving_average;
use crate::strategy::{finish_signals, Strategy};

//sma crossover strategy
//long while the short sma is above the long sma, flat otherwise
//flat until both averages have a value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmaCrossoverStrategy {
    short_window: usize,
    long_window: usize,
}

impl SmaCrossoverStrategy {
    pub fn new(short_window: usize, long_window: usize) -> Self {
        SmaCrossoverStrategy {
            short_window,
            long_window,
        }
    }

    pub fn short_column(&self) -> String {
        format!("sma_{}", self.short_window)
    }

    pub fn long_column(&self) -> String {
        format!("sma_{}", self.long_window)
    }
}

//exposure from a single pair of averages
fn crossover_signal(short: Option<f64>, long: Option<f64>) -> f64 {
    match (short, long) {
        (Some(s), Some(l)) if s > l => 1.0,
        _ => 0.0,
    }
}

impl Strategy for SmaCrossoverStrategy {
    fn validate(&self) -> Result<()> {
        if self.short_window == 0 || self.long_window == 0 {
            return Err(BacktestError::invalid("window must be positive"));
        }
        if self.short_window >= self.long_window {
            return Err(BacktestError::invalid(format!(
                "short_window ({}) must be less than long_window ({})",
                self.short_window, self.long_window
            )));
        }
        Ok(())
    }

    fn generate(&self, features: &FeatureFrame) -> Result<(FeatureFrame, SignalSeries)> {
        self.validate()?;

        let closes = features.closes();
        let short_sma = simple_moving_average(&closes, self.short_window)?;
        let long_sma = simple_moving_average(&closes, self.long_window)?;

        let signals = short_sma
            .iter()
            .zip(long_sma.iter())
            .map(|(&s, &l)| crossover_signal(s, l))
            .collect();

        let enriched = features
            .with_column(self.short_column(), short_sma)
            .with_column(self.long_column(), long_sma);

        Ok(finish_signals(enriched, signals))
    }

    fn name(&self) -> String {
        format!(
            "SMA Crossover ({}/{})",
            self.short_window, self.long_window
        )
    }
}

//crossover signals for the given windows
pub fn generate_sma_crossover_signals(
    features: &FeatureFrame,
    short_window: usize,
    long_window: usize,
) -> Result<(FeatureFrame, SignalSeries)> {
    SmaCrossoverStrategy::new(short_window, long_window).generate(features)
}
