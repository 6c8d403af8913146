use crate::data::bar::{closes, timestamps, Bar};
use crate::data::series::TimeSeries;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;

//price rows plus derived numeric columns, in insertion order
//a `None` cell means the column has no value at that row
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureFrame {
    bars: Vec<Bar>,
    columns: IndexMap<String, Vec<Option<f64>>>,
}

impl FeatureFrame {
    //creates a frame over the given bars with no derived columns
    pub fn new(bars: Vec<Bar>) -> Self {
        FeatureFrame {
            bars,
            columns: IndexMap::new(),
        }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        timestamps(&self.bars)
    }

    pub fn closes(&self) -> Vec<f64> {
        closes(&self.bars)
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns.get(name).map(|c| c.as_slice())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|k| k.as_str())
    }

    //returns a copy of this frame with `name` set to `values`
    pub(crate) fn with_column(&self, name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        assert_eq!(
            values.len(),
            self.bars.len(),
            "column length must match row count"
        );
        let mut frame = self.clone();
        frame.columns.insert(name.into(), values);
        frame
    }

    //same as `with_column` for a column defined on every row
    pub(crate) fn with_dense_column(&self, name: impl Into<String>, values: &[f64]) -> Self {
        self.with_column(name, values.iter().copied().map(Some).collect())
    }

    //column as a timestamp-indexed series, missing cells become `fill`
    pub fn series(&self, name: &str, fill: f64) -> Option<TimeSeries> {
        self.column(name).map(|values| {
            TimeSeries::new(
                self.timestamps(),
                values.iter().map(|v| v.unwrap_or(fill)).collect(),
            )
        })
    }

    //keeps the rows matching `keep`, carrying every derived column along
    pub fn filter_rows(&self, keep: impl Fn(&Bar) -> bool) -> Self {
        let mask: Vec<bool> = self.bars.iter().map(&keep).collect();

        let bars = self
            .bars
            .iter()
            .zip(&mask)
            .filter(|(_, m)| **m)
            .map(|(bar, _)| bar.clone())
            .collect();

        let columns = self
            .columns
            .iter()
            .map(|(name, values)| {
                let kept = values
                    .iter()
                    .zip(&mask)
                    .filter(|(_, m)| **m)
                    .map(|(v, _)| *v)
                    .collect();
                (name.clone(), kept)
            })
            .collect();

        FeatureFrame { bars, columns }
    }
}

//period-over-period percentage change, first value 0.0
pub fn pct_change(values: &[f64]) -> Vec<f64> {
    let mut changes = Vec::with_capacity(values.len());
    if values.is_empty() {
        return changes;
    }

    changes.push(0.0);
    for window in values.windows(2) {
        changes.push(window[1] / window[0] - 1.0);
    }
    changes
}

//copies prices into a frame with a `daily_return` column
pub fn build_feature_frame(prices: &[Bar]) -> FeatureFrame {
    let frame = FeatureFrame::new(prices.to_vec());
    let returns = pct_change(&frame.closes());
    frame.with_dense_column("daily_return", &returns)
}
