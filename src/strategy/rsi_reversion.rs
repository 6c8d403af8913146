use crate::data::{FeatureFrame, SignalSeries};
use crate::error::{BacktestError, Result};
use crate::indicators::relative_strength_oscillator;
use crate::strategy::{finish_signals, Strategy};

//rsi mean reversion strategy
//goes long when rsi reaches the oversold threshold
//goes flat when rsi reaches the overbought threshold
//holds the previous state in between
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RsiReversionStrategy {
    window: usize,
    oversold: f64,
    overbought: f64,
}

//exposure state carried from one bar to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exposure {
    Flat,
    Long,
}

impl Exposure {
    pub fn signal(self) -> f64 {
        match self {
            Exposure::Flat => 0.0,
            Exposure::Long => 1.0,
        }
    }
}

impl RsiReversionStrategy {
    pub fn new(window: usize, oversold: f64, overbought: f64) -> Self {
        RsiReversionStrategy {
            window,
            oversold,
            overbought,
        }
    }

    pub fn rsi_column(&self) -> String {
        format!("rsi_{}", self.window)
    }

    //next state given the current one and today's oscillator reading
    pub fn transition(&self, state: Exposure, rsi: f64) -> Exposure {
        if rsi <= self.oversold {
            Exposure::Long
        } else if rsi >= self.overbought {
            Exposure::Flat
        } else {
            state
        }
    }

    //walks the oscillator in order, starting flat on every call
    pub fn signals(&self, rsi: &[f64]) -> Vec<f64> {
        rsi.iter()
            .scan(Exposure::Flat, |state, &value| {
                *state = self.transition(*state, value);
                Some(state.signal())
            })
            .collect()
    }
}

impl Default for RsiReversionStrategy {
    fn default() -> Self {
        Self::new(14, 30.0, 70.0)
    }
}

impl Strategy for RsiReversionStrategy {
    fn validate(&self) -> Result<()> {
        if self.window <= 1 {
            return Err(BacktestError::invalid("window must be > 1"));
        }
        if self.oversold >= self.overbought {
            return Err(BacktestError::invalid(format!(
                "oversold threshold ({}) must be below overbought ({})",
                self.oversold, self.overbought
            )));
        }
        Ok(())
    }

    fn generate(&self, features: &FeatureFrame) -> Result<(FeatureFrame, SignalSeries)> {
        self.validate()?;

        let rsi = relative_strength_oscillator(&features.closes(), self.window)?;
        let signals = self.signals(&rsi);
        let enriched = features.with_dense_column(self.rsi_column(), &rsi);

        Ok(finish_signals(enriched, signals))
    }

    fn name(&self) -> String {
        format!(
            "RSI Reversion ({}, {}/{})",
            self.window, self.oversold, self.overbought
        )
    }
}

//mean reversion signals for the given window and thresholds
pub fn generate_rsi_mean_reversion_signals(
    features: &FeatureFrame,
    window: usize,
    oversold: f64,
    overbought: f64,
) -> Result<(FeatureFrame, SignalSeries)> {
    RsiReversionStrategy::new(window, oversold, overbought).generate(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{build_feature_frame, Bar};
    use chrono::{TimeZone, Utc};

    fn frame(closes: &[f64]) -> FeatureFrame {
        let bars: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                Bar::from_close(
                    Utc.with_ymd_and_hms(2020, 1, 1 + i as u32, 0, 0, 0).unwrap(),
                    c,
                )
            })
            .collect();
        build_feature_frame(&bars)
    }

    #[test]
    fn toggles_on_thresholds() {
        //rsi_2 here is [0, 0, 100, 50, 25, 62.5]
        let features = frame(&[1.0, 2.0, 3.0, 2.0, 1.0, 2.0]);
        let (enriched, signals) =
            generate_rsi_mean_reversion_signals(&features, 2, 30.0, 70.0).unwrap();

        assert!(enriched.has_column("rsi_2"));
        assert!(enriched.has_column("signal"));
        assert_eq!(signals.values, vec![1.0, 1.0, 0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn state_persists_between_thresholds() {
        let strategy = RsiReversionStrategy::new(14, 30.0, 70.0);
        let signals = strategy.signals(&[50.0, 25.0, 50.0, 69.9, 70.0, 40.0, 30.0]);
        assert_eq!(signals, vec![0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn every_call_starts_flat() {
        let strategy = RsiReversionStrategy::default();
        assert_eq!(strategy.signals(&[10.0]), vec![1.0]);
        assert_eq!(strategy.signals(&[50.0]), vec![0.0]);
    }

    #[test]
    fn inverted_thresholds_rejected() {
        let features = frame(&[1.0, 2.0, 3.0]);
        assert!(matches!(
            generate_rsi_mean_reversion_signals(&features, 14, 70.0, 30.0),
            Err(BacktestError::InvalidParameter(_))
        ));
        assert!(generate_rsi_mean_reversion_signals(&features, 14, 50.0, 50.0).is_err());
        assert!(generate_rsi_mean_reversion_signals(&features, 1, 30.0, 70.0).is_err());
    }
}
