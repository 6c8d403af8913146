use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

//a timestamp-indexed column of values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub index: Vec<DateTime<Utc>>,
    pub values: Vec<f64>,
}

//exposure per timestamp, 0.0 flat or 1.0 long
pub type SignalSeries = TimeSeries;

impl TimeSeries {
    pub fn new(index: Vec<DateTime<Utc>>, values: Vec<f64>) -> Self {
        debug_assert_eq!(index.len(), values.len());
        TimeSeries { index, values }
    }

    pub fn empty() -> Self {
        TimeSeries {
            index: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    //value at the given timestamp, if present
    pub fn get(&self, timestamp: &DateTime<Utc>) -> Option<f64> {
        self.index
            .iter()
            .position(|t| t == timestamp)
            .map(|i| self.values[i])
    }

    //reindexes onto `index`, filling timestamps absent from self (and
    //non-finite values) with `fill`
    pub fn reindex(&self, index: &[DateTime<Utc>], fill: f64) -> TimeSeries {
        let lookup: HashMap<&DateTime<Utc>, f64> =
            self.index.iter().zip(self.values.iter().copied()).collect();

        let values = index
            .iter()
            .map(|t| match lookup.get(t) {
                Some(&v) if v.is_finite() => v,
                _ => fill,
            })
            .collect();

        TimeSeries::new(index.to_vec(), values)
    }

    //shifts values forward by one period; the first slot takes `fill`
    pub fn shift(&self, fill: f64) -> TimeSeries {
        let mut values = Vec::with_capacity(self.values.len());
        if !self.values.is_empty() {
            values.push(fill);
            values.extend_from_slice(&self.values[..self.values.len() - 1]);
        }
        TimeSeries::new(self.index.clone(), values)
    }
}
