pub mod rsi;
pub mod sma;

pub use rsi::relative_strength_oscillator;
pub use sma::simple_moving_average;
