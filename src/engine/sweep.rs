use crate::data::{Bar, FeatureFrame};
use crate::engine::backtest::{BacktestConfig, BacktestEngine};
use crate::error::Result;
use crate::metrics::SummaryMetrics;
use crate::strategy::sma_crossover::SmaCrossoverStrategy;
use prettytable::{Cell, Row, Table};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{info, warn};

//one evaluated (short, long) pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepRow {
    pub short_window: usize,
    pub long_window: usize,
    #[serde(flatten)]
    pub metrics: SummaryMetrics,
}

//metrics for every valid pair, ordered by (short, long)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepTable {
    pub rows: Vec<SweepRow>,
}

impl SweepTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, short_window: usize, long_window: usize) -> Option<&SweepRow> {
        self.rows
            .iter()
            .find(|r| r.short_window == short_window && r.long_window == long_window)
    }

    //row with the highest value of `metric`, ignoring nan
    pub fn best_by(&self, metric: &str) -> Option<&SweepRow> {
        self.rows
            .iter()
            .filter_map(|row| row.metrics.get(metric).map(|v| (row, v)))
            .filter(|(_, v)| !v.is_nan())
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(row, _)| row)
    }

    //prints the table, one row per pair
    pub fn pretty_print_table(&self) {
        let mut table = Table::new();
        table.add_row(Row::new(
            ["Short", "Long", "Total Return", "CAGR", "Volatility", "Max DD", "Sharpe"]
                .iter()
                .map(|h| Cell::new(h))
                .collect(),
        ));

        for row in &self.rows {
            let m = &row.metrics;
            table.add_row(Row::new(vec![
                Cell::new(&row.short_window.to_string()),
                Cell::new(&row.long_window.to_string()),
                Cell::new(&format!("{:.2}%", m.total_return * 100.0)),
                Cell::new(&format!("{:.2}%", m.cagr * 100.0)),
                Cell::new(&format!("{:.2}%", m.volatility * 100.0)),
                Cell::new(&format!("{:.2}%", m.max_drawdown * 100.0)),
                Cell::new(&format!("{:.3}", m.sharpe)),
            ]));
        }

        table.printstd();
    }
}

//deduplicated, ascending, positive candidates
fn unique_sorted(values: impl IntoIterator<Item = usize>) -> Vec<usize> {
    values
        .into_iter()
        .filter(|&v| v > 0)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

//valid (short, long) pairs of the cartesian product, in grid order
pub fn sweep_grid(
    short_windows: impl IntoIterator<Item = usize>,
    long_windows: impl IntoIterator<Item = usize>,
) -> Vec<(usize, usize)> {
    let shorts = unique_sorted(short_windows);
    let longs = unique_sorted(long_windows);

    shorts
        .iter()
        .flat_map(|&short| longs.iter().map(move |&long| (short, long)))
        .filter(|(short, long)| short < long)
        .collect()
}

//evaluates the sma crossover strategy over a parameter grid
//each cell is an independent backtest, run on the rayon pool
pub fn run_sma_parameter_sweep(
    prices: &[Bar],
    features: &FeatureFrame,
    short_windows: impl IntoIterator<Item = usize>,
    long_windows: impl IntoIterator<Item = usize>,
    config: &BacktestConfig,
) -> Result<SweepTable> {
    let engine = BacktestEngine::new(*config)?;
    let grid = sweep_grid(short_windows, long_windows);

    if grid.is_empty() {
        warn!("parameter sweep has no pairs with short < long");
        return Ok(SweepTable::default());
    }

    info!(cells = grid.len(), "running parameter sweep");

    let rows = grid
        .par_iter()
        .map(|&(short_window, long_window)| -> Result<SweepRow> {
            let strategy = SmaCrossoverStrategy::new(short_window, long_window);
            let result = engine.run_strategy(prices, features, &strategy)?;
            Ok(SweepRow {
                short_window,
                long_window,
                metrics: result.metrics,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SweepTable { rows })
}
