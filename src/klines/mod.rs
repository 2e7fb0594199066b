//! Kline retrieval with a CSV file cache.
//!
//! [`cache::KlineCache`] sits between the HTTP surface and the exchange
//! adapters: it serves candles from per-symbol CSV files when they cover the
//! requested range and fetches only the uncovered gaps otherwise, as decided
//! by [`range::reconcile`].

pub mod cache;
pub mod range;

pub use cache::{CacheEntry, KlineCache};
pub use range::{reconcile, FetchPlan};
