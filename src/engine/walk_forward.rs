use crate::config::StrategyParams;
use crate::data::FeatureFrame;
use crate::engine::backtest::{BacktestConfig, BacktestEngine, BacktestResult};
use crate::error::{BacktestError, Result};
use chrono::{DateTime, Utc};
use tracing::info;

//rows at or before the cutoff train, rows after it test
#[derive(Debug, Clone)]
pub struct WalkForwardSplit {
    pub cutoff: DateTime<Utc>,
    pub train: FeatureFrame,
    pub test: FeatureFrame,
}

impl WalkForwardSplit {
    //fails with `EmptySegment` unless both sides have rows
    pub fn new(features: &FeatureFrame, cutoff: DateTime<Utc>) -> Result<Self> {
        let train = features.filter_rows(|bar| bar.timestamp <= cutoff);
        let test = features.filter_rows(|bar| bar.timestamp > cutoff);

        if train.is_empty() || test.is_empty() {
            return Err(BacktestError::EmptySegment {
                cutoff,
                train_rows: train.len(),
                test_rows: test.len(),
            });
        }

        Ok(WalkForwardSplit {
            cutoff,
            train,
            test,
        })
    }
}

//in-sample and out-of-sample results for one cutoff
#[derive(Debug, Clone)]
pub struct WalkForwardResult {
    pub train: BacktestResult,
    pub test: BacktestResult,
}

//runs the strategy separately on each side of `cutoff`
//indicators on the test side only see test rows, and each side is priced
//from the bars of its own feature partition
pub fn run_walk_forward(
    features: &FeatureFrame,
    params: &StrategyParams,
    cutoff: DateTime<Utc>,
    config: &BacktestConfig,
) -> Result<WalkForwardResult> {
    let strategy = params.build();
    strategy.validate()?;
    let engine = BacktestEngine::new(*config)?;

    let split = WalkForwardSplit::new(features, cutoff)?;

    info!(
        strategy = %strategy.name(),
        %cutoff,
        train_rows = split.train.len(),
        test_rows = split.test.len(),
        "running walk-forward evaluation"
    );

    let (train, test) = rayon::join(
        || engine.run_strategy(split.train.bars(), &split.train, strategy.as_ref()),
        || engine.run_strategy(split.test.bars(), &split.test, strategy.as_ref()),
    );

    Ok(WalkForwardResult {
        train: train?,
        test: test?,
    })
}
