//Relative strength oscillator with Wilder-style exponential smoothing.
//
//Gains and losses are smoothed recursively with `alpha = 1 / window`,
//seeded by the first available price change:
//
//`avg = (1 - alpha) * prev_avg + alpha * current`
//
//A value is only produced once `window` price changes have been seen.
//Rows before that, and rows where both averages are zero, report `0.0`
//rather than "no value"; the mean reversion signal reads that warm-up
//value as oversold.

use crate::error::{BacktestError, Result};

//value reported while the oscillator is undefined
pub const WARMUP_VALUE: f64 = 0.0;

//recursive exponential average, seeded with the first observation
#[derive(Debug, Clone, Copy)]
struct Smoothed {
    alpha: f64,
    value: Option<f64>,
}

impl Smoothed {
    fn new(alpha: f64) -> Self {
        Smoothed { alpha, value: None }
    }

    fn update(&mut self, observation: f64) -> f64 {
        let next = match self.value {
            Some(prev) => (1.0 - self.alpha) * prev + self.alpha * observation,
            None => observation,
        };
        self.value = Some(next);
        next
    }
}

fn oscillator(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        //no losses: saturated unless there were no gains either
        return if avg_gain > 0.0 { 100.0 } else { WARMUP_VALUE };
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

pub fn relative_strength_oscillator(series: &[f64], window: usize) -> Result<Vec<f64>> {
    if window <= 1 {
        return Err(BacktestError::invalid("window must be > 1"));
    }

    let alpha = 1.0 / window as f64;
    let mut avg_gain = Smoothed::new(alpha);
    let mut avg_loss = Smoothed::new(alpha);

    let mut values = Vec::with_capacity(series.len());
    if series.is_empty() {
        return Ok(values);
    }
    values.push(WARMUP_VALUE);

    for (i, pair) in series.windows(2).enumerate() {
        let delta = pair[1] - pair[0];
        let gain = avg_gain.update(delta.max(0.0));
        let loss = avg_loss.update((-delta).max(0.0));

        //i + 1 price changes observed so far
        if i + 1 < window {
            values.push(WARMUP_VALUE);
        } else {
            let value = oscillator(gain, loss);
            values.push(if value.is_finite() { value } else { WARMUP_VALUE });
        }
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_matches_hand_computed_values() {
        let rsi = relative_strength_oscillator(&[1.0, 2.0, 3.0, 2.0, 1.0, 2.0], 2).unwrap();
        let expected = [0.0, 0.0, 100.0, 50.0, 25.0, 62.5];

        assert_eq!(rsi.len(), expected.len());
        for (got, want) in rsi.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-9, "got {got}, want {want}");
        }
    }

    #[test]
    fn rsi_stays_within_bounds() {
        let rsi =
            relative_strength_oscillator(&[1.0, 2.0, 3.0, 2.0, 1.0, 2.0, 3.0, 4.0], 3).unwrap();
        assert!(rsi.iter().all(|v| (0.0..=100.0).contains(v)));
    }

    #[test]
    fn rsi_warmup_is_zero() {
        let rsi = relative_strength_oscillator(&[5.0, 6.0, 7.0, 8.0], 14).unwrap();
        assert_eq!(rsi, vec![0.0; 4]);
    }

    #[test]
    fn rsi_saturates_on_monotonic_rise() {
        let rsi = relative_strength_oscillator(&[1.0, 2.0, 3.0, 4.0, 5.0], 3).unwrap();
        assert_eq!(rsi[3], 100.0);
        assert_eq!(rsi[4], 100.0);
    }

    #[test]
    fn rsi_flat_prices_report_zero() {
        let rsi = relative_strength_oscillator(&[2.0; 6], 2).unwrap();
        assert!(rsi.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn rsi_rejects_short_window() {
        assert!(relative_strength_oscillator(&[1.0, 2.0], 1).is_err());
        assert!(relative_strength_oscillator(&[1.0, 2.0], 0).is_err());
    }

    #[test]
    fn rsi_empty_series() {
        assert!(relative_strength_oscillator(&[], 14).unwrap().is_empty());
    }
}
