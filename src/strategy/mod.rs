pub mod rsi_reversion;
pub mod sma_crossover;

use crate::data::{FeatureFrame, SignalSeries};
use crate::error::Result;

//column every generator writes its exposure into
pub const SIGNAL_COLUMN: &str = "signal";

//signal generator interface that all strategies must implement
//
//generators never mutate their input: they return an enriched copy of the
//frame and the exposure signal indexed by the frame's timestamps
pub trait Strategy: Send + Sync {
    //checks parameters before any computation
    fn validate(&self) -> Result<()>;

    //computes indicators and the 0.0 / 1.0 exposure signal
    fn generate(&self, features: &FeatureFrame) -> Result<(FeatureFrame, SignalSeries)>;

    //returns the strategy name
    fn name(&self) -> String;
}

//attaches the signal column and builds the matching series
pub(crate) fn finish_signals(
    enriched: FeatureFrame,
    signals: Vec<f64>,
) -> (FeatureFrame, SignalSeries) {
    let enriched = enriched.with_dense_column(SIGNAL_COLUMN, &signals);
    let series = SignalSeries::new(enriched.timestamps(), signals);
    (enriched, series)
}
