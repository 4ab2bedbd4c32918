pub mod logging;
pub mod units;
