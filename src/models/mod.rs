pub mod account;
pub mod kline;
pub mod portfolio;

pub use account::*;
pub use kline::*;
pub use portfolio::*;
