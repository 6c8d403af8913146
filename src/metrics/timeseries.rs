use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

//one row of a backtest, as exported to csv
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub signal: f64,
    pub position: f64,
    pub turnover: f64,
    pub strategy_return: f64,
    pub equity: f64,
    pub drawdown: f64,
}

//compounds per-period returns into an equity curve
//the first entry already includes the first period's return
pub fn calculate_equity_curve(returns: &[f64], initial_capital: f64) -> Vec<f64> {
    returns
        .iter()
        .scan(1.0, |growth, &r| {
            *growth *= 1.0 + r;
            Some(*growth * initial_capital)
        })
        .collect()
}

//drawdown of a normalized equity curve from its running peak
//always <= 0, and exactly 0 on new highs
pub fn calculate_drawdown(normalized_equity: &[f64]) -> Vec<f64> {
    normalized_equity
        .iter()
        .scan(f64::NEG_INFINITY, |peak, &equity| {
            *peak = peak.max(equity);
            Some(equity / *peak - 1.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equity_compounds_from_first_period() {
        let equity = calculate_equity_curve(&[0.1, -0.5, 0.0], 100.0);
        assert!((equity[0] - 110.0).abs() < 1e-9);
        assert!((equity[1] - 55.0).abs() < 1e-9);
        assert!((equity[2] - 55.0).abs() < 1e-9);
    }

    #[test]
    fn drawdown_tracks_running_peak() {
        let drawdown = calculate_drawdown(&[1.0, 1.2, 0.9, 1.3]);
        assert_eq!(drawdown[0], 0.0);
        assert_eq!(drawdown[1], 0.0);
        assert!((drawdown[2] - (0.9 / 1.2 - 1.0)).abs() < 1e-12);
        assert_eq!(drawdown[3], 0.0);
    }

    #[test]
    fn first_period_loss_is_its_own_peak() {
        let drawdown = calculate_drawdown(&[0.9, 0.8]);
        assert_eq!(drawdown[0], 0.0);
        assert!(drawdown[1] < 0.0);
    }
}
