pub mod bar;
pub mod features;
pub mod loader;
pub mod series;

pub use bar::Bar;
pub use features::{build_feature_frame, pct_change, FeatureFrame};
pub use loader::{filter_by_date_range, load_csv};
pub use series::{SignalSeries, TimeSeries};
