use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

//represents a single daily ohlcv bar of market data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    //bar with every price field set to close, used for close-only fixtures
    pub fn from_close(timestamp: DateTime<Utc>, close: f64) -> Self {
        Bar::new(timestamp, close, close, close, close, 0.0)
    }
}

//extracts the close column
pub fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|bar| bar.close).collect()
}

//extracts the timestamp index
pub fn timestamps(bars: &[Bar]) -> Vec<DateTime<Utc>> {
    bars.iter().map(|bar| bar.timestamp).collect()
}
