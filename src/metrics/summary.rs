use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

//summary metrics for a backtest
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub total_return: f64,
    pub cagr: f64,
    pub volatility: f64,
    pub max_drawdown: f64,
    pub sharpe: f64,
}

impl SummaryMetrics {
    //calculate summary metrics from per-period returns, the equity curve
    //normalized to start capital, and the drawdown series
    pub fn from_series(
        strategy_returns: &[f64],
        normalized_equity: &[f64],
        drawdown: &[f64],
        risk_free_rate: f64,
    ) -> Self {
        SummaryMetrics {
            total_return: total_return(normalized_equity),
            cagr: cagr(normalized_equity, TRADING_DAYS_PER_YEAR),
            volatility: annualized_volatility(strategy_returns, TRADING_DAYS_PER_YEAR),
            max_drawdown: max_drawdown(drawdown),
            sharpe: sharpe_ratio(strategy_returns, risk_free_rate, TRADING_DAYS_PER_YEAR),
        }
    }

    //metric names paired with values, in display order
    pub fn entries(&self) -> [(&'static str, f64); 5] {
        [
            ("total_return", self.total_return),
            ("cagr", self.cagr),
            ("volatility", self.volatility),
            ("max_drawdown", self.max_drawdown),
            ("sharpe", self.sharpe),
        ]
    }

    //looks a metric up by its name
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries()
            .into_iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    //prints metrics in a formatted table
    pub fn pretty_print_table(&self) {
        let mut table = Table::new();
        table.add_row(Row::new(vec![Cell::new("Metric"), Cell::new("Value")]));
        for row in metric_rows(&[self]) {
            table.add_row(row);
        }
        table.printstd();
    }

    //prints two runs side by side, eg a walk-forward train and test split
    pub fn pretty_print_comparison(&self, label: &str, other: &SummaryMetrics, other_label: &str) {
        let mut table = Table::new();
        table.add_row(Row::new(vec![
            Cell::new("Metric"),
            Cell::new(label),
            Cell::new(other_label),
        ]));
        for row in metric_rows(&[self, other]) {
            table.add_row(row);
        }
        table.printstd();
    }
}

fn metric_rows(columns: &[&SummaryMetrics]) -> Vec<Row> {
    let row = |name: &str, format: &dyn Fn(&SummaryMetrics) -> String| {
        let mut cells = vec![Cell::new(name)];
        cells.extend(columns.iter().map(|m| Cell::new(&format(m))));
        Row::new(cells)
    };

    vec![
        row("Total Return", &|m: &SummaryMetrics| format!("{:.2}%", m.total_return * 100.0)),
        row("CAGR", &|m: &SummaryMetrics| format!("{:.2}%", m.cagr * 100.0)),
        row("Volatility", &|m: &SummaryMetrics| format!("{:.2}%", m.volatility * 100.0)),
        row("Max Drawdown", &|m: &SummaryMetrics| format!("{:.2}%", m.max_drawdown * 100.0)),
        row("Sharpe Ratio", &|m: &SummaryMetrics| format!("{:.3}", m.sharpe)),
    ]
}

//final normalized equity minus one
pub fn total_return(normalized_equity: &[f64]) -> f64 {
    match normalized_equity.last() {
        Some(&last) => last - 1.0,
        None => 0.0,
    }
}

//compound annual growth rate, one equity entry per period
pub fn cagr(normalized_equity: &[f64], periods_per_year: f64) -> f64 {
    let total_periods = normalized_equity.len();
    let ending_value = match normalized_equity.last() {
        Some(&v) => v,
        None => return 0.0,
    };

    //compounding is undefined once equity is wiped out
    if ending_value <= 0.0 {
        return 0.0;
    }

    let years = total_periods as f64 / periods_per_year;
    ending_value.powf(1.0 / years) - 1.0
}

//statrs' streaming variance is not exactly zero for every constant series
fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

//population standard deviation of returns, annualized
pub fn annualized_volatility(returns: &[f64], periods_per_year: f64) -> f64 {
    if is_constant(returns) {
        return 0.0;
    }
    returns.population_std_dev() * periods_per_year.sqrt()
}

//zero whenever volatility is zero
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64, periods_per_year: f64) -> f64 {
    if is_constant(returns) {
        return 0.0;
    }

    let per_period_rf = risk_free_rate / periods_per_year;
    let excess: Vec<f64> = returns.iter().map(|r| r - per_period_rf).collect();

    let std_dev = excess.iter().population_std_dev();
    if std_dev == 0.0 {
        return 0.0;
    }

    excess.iter().mean() / std_dev * periods_per_year.sqrt()
}

//most negative drawdown
pub fn max_drawdown(drawdown: &[f64]) -> f64 {
    if drawdown.is_empty() {
        return 0.0;
    }
    drawdown.iter().copied().fold(f64::INFINITY, f64::min)
}
