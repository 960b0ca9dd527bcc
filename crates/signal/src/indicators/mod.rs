pub mod fib;
pub mod ma;
pub mod rsi;

pub use ma::MovingAverage;
pub use rsi::RsiIndicator;
