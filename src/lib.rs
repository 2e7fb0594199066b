//! Personal dashboard backend.
//!
//! Aggregates the data behind a single-user dashboard: exchange accounts
//! and candle history, a spreadsheet-tracked portfolio and budget, task
//! lists, repository activity and fitness exports. Everything is served
//! over one authenticated HTTP API; candle history is cached on disk and a
//! background poller keeps slow-moving data fresh.
//!
//! The crate splits into upstream clients ([`exchange`], [`services`]),
//! local state ([`db`], [`store`], [`klines`], [`trades`]), pure domain
//! logic ([`portfolio`], [`klines::range`]) and the HTTP surface
//! ([`server`]).

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod exchange;
pub mod klines;
pub mod models;
pub mod poller;
pub mod portfolio;
pub mod server;
pub mod services;
pub mod store;
pub mod trades;

pub use config::Settings;
pub use error::{Error, Result};
pub use server::{router, AppContext, AppState};
