use crate::error::{BacktestError, Result};

//mean of a window of prices
pub fn sma(prices: &[f64]) -> Option<f64> {
    if prices.is_empty() {
        return None;
    }
    Some(prices.iter().sum::<f64>() / prices.len() as f64)
}

//trailing simple moving average, `None` until `window` observations exist
pub fn simple_moving_average(series: &[f64], window: usize) -> Result<Vec<Option<f64>>> {
    if window == 0 {
        return Err(BacktestError::invalid("window must be positive"));
    }

    let mut values = vec![None; window.saturating_sub(1).min(series.len())];
    values.extend(series.windows(window).map(sma));
    Ok(values)
}
