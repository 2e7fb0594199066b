//! Cache behavior: what gets fetched, what gets served from disk, and how
//! the backing files evolve as requests widen.

mod common;

use common::{MemoryStore, MockExchange};
use homeboard::klines::{CacheEntry, KlineCache};
use homeboard::models::{DateRange, Interval};

const DAY: i64 = 86_400;

fn days(start: i64, end: i64) -> DateRange {
    DateRange::new(start * DAY, end * DAY).unwrap()
}

#[tokio::test]
async fn first_request_fetches_everything_and_writes_one_file() {
    let exchange = MockExchange::new();
    let cache = KlineCache::new(MemoryStore::new());

    let requested = days(100, 102);
    let klines = cache
        .get(&exchange, "BTC-USDT", Interval::OneHour, requested)
        .await
        .unwrap();

    assert_eq!(exchange.requested_ranges(), vec![requested]);
    // Inclusive two-day hourly range.
    assert_eq!(klines.len(), 49);
    assert!(klines.windows(2).all(|w| w[0].time < w[1].time));
}

#[tokio::test]
async fn covered_request_is_served_without_fetching() {
    let exchange = MockExchange::new();
    let store = MemoryStore::new();
    let cache = KlineCache::new(store);

    cache
        .get(&exchange, "BTC-USDT", Interval::OneHour, days(100, 110))
        .await
        .unwrap();
    let requested = days(103, 104);
    let klines = cache
        .get(&exchange, "BTC-USDT", Interval::OneHour, requested)
        .await
        .unwrap();

    // Only the initial fill hit the exchange.
    assert_eq!(exchange.requested_ranges().len(), 1);
    assert_eq!(klines.len(), 25);
    assert!(klines.iter().all(|k| requested.contains(k.time)));
}

#[tokio::test]
async fn tail_extension_fetches_only_the_gap() {
    let exchange = MockExchange::new();
    let cache = KlineCache::new(MemoryStore::new());

    cache
        .get(&exchange, "BTC-USDT", Interval::OneHour, days(100, 102))
        .await
        .unwrap();
    let klines = cache
        .get(&exchange, "BTC-USDT", Interval::OneHour, days(101, 105))
        .await
        .unwrap();

    let ranges = exchange.requested_ranges();
    assert_eq!(ranges.len(), 2);
    // The second fetch starts where the cache ended.
    assert_eq!(ranges[1], days(102, 105));
    assert_eq!(klines.len(), 97);
}

#[tokio::test]
async fn rewritten_file_replaces_the_old_range() {
    let exchange = MockExchange::new();
    let cache = KlineCache::new(MemoryStore::new());

    cache
        .get(&exchange, "BTC-USDT", Interval::OneHour, days(100, 102))
        .await
        .unwrap();
    cache
        .get(&exchange, "BTC-USDT", Interval::OneHour, days(101, 105))
        .await
        .unwrap();

    let names = cache.store().file_names();
    assert_eq!(names.len(), 1);
    let entry = CacheEntry::parse(&names[0]).unwrap();
    assert_eq!(entry.range, days(100, 105));
}

#[tokio::test]
async fn disjoint_request_replaces_the_cache() {
    let exchange = MockExchange::new();
    let cache = KlineCache::new(MemoryStore::new());

    cache
        .get(&exchange, "BTC-USDT", Interval::OneHour, days(100, 102))
        .await
        .unwrap();
    let klines = cache
        .get(&exchange, "BTC-USDT", Interval::OneHour, days(200, 201))
        .await
        .unwrap();

    assert_eq!(exchange.requested_ranges()[1], days(200, 201));
    assert_eq!(klines.len(), 25);
    let names = cache.store().file_names();
    assert_eq!(names.len(), 1);
    assert_eq!(CacheEntry::parse(&names[0]).unwrap().range, days(200, 201));
}

#[tokio::test]
async fn head_extension_fetches_only_the_gap() {
    let exchange = MockExchange::new();
    let cache = KlineCache::new(MemoryStore::new());

    cache
        .get(&exchange, "BTC-USDT", Interval::OneHour, days(103, 105))
        .await
        .unwrap();
    cache
        .get(&exchange, "BTC-USDT", Interval::OneHour, days(100, 104))
        .await
        .unwrap();

    let ranges = exchange.requested_ranges();
    assert_eq!(ranges[1], days(100, 103));
    let names = cache.store().file_names();
    assert_eq!(CacheEntry::parse(&names[0]).unwrap().range, days(100, 105));
}

#[tokio::test]
async fn failed_fetch_is_not_recorded_as_coverage() {
    let exchange = MockExchange::new();
    let cache = KlineCache::new(MemoryStore::new());

    exchange.set_down(true);
    let klines = cache
        .get(&exchange, "BTC-USDT", Interval::OneHour, days(100, 102))
        .await
        .unwrap();
    assert!(klines.is_empty());
    // No file may claim a range nothing was fetched for.
    assert!(cache.store().file_names().is_empty());

    exchange.set_down(false);
    let klines = cache
        .get(&exchange, "BTC-USDT", Interval::OneHour, days(100, 102))
        .await
        .unwrap();
    assert_eq!(exchange.requested_ranges().len(), 2);
    assert_eq!(klines.len(), 49);
    assert_eq!(cache.store().file_names().len(), 1);
}

#[tokio::test]
async fn failed_gap_fetch_keeps_the_cached_range() {
    let exchange = MockExchange::new();
    let cache = KlineCache::new(MemoryStore::new());

    cache
        .get(&exchange, "BTC-USDT", Interval::OneHour, days(100, 102))
        .await
        .unwrap();

    exchange.set_down(true);
    let klines = cache
        .get(&exchange, "BTC-USDT", Interval::OneHour, days(101, 105))
        .await
        .unwrap();
    // The cached slice is still served, but the recorded range must not
    // grow past what was actually obtained.
    assert_eq!(klines.len(), 25);
    let names = cache.store().file_names();
    assert_eq!(CacheEntry::parse(&names[0]).unwrap().range, days(100, 102));

    exchange.set_down(false);
    let klines = cache
        .get(&exchange, "BTC-USDT", Interval::OneHour, days(101, 105))
        .await
        .unwrap();
    // The recovered exchange is asked for the gap again.
    assert_eq!(exchange.requested_ranges().len(), 3);
    assert_eq!(exchange.requested_ranges()[2], days(102, 105));
    assert_eq!(klines.len(), 97);
    let names = cache.store().file_names();
    assert_eq!(CacheEntry::parse(&names[0]).unwrap().range, days(100, 105));
}

#[tokio::test]
async fn unaligned_range_is_rejected() {
    let exchange = MockExchange::new();
    let cache = KlineCache::new(MemoryStore::new());

    let requested = DateRange::new(100 * DAY + 3600, 101 * DAY).unwrap();
    let result = cache
        .get(&exchange, "BTC-USDT", Interval::OneHour, requested)
        .await;
    assert!(matches!(result, Err(homeboard::Error::InvalidRange(_))));
    // Rejected before any fetch or write.
    assert!(exchange.requested_ranges().is_empty());
    assert!(cache.store().file_names().is_empty());
}

#[tokio::test]
async fn symbols_cache_independently() {
    let exchange = MockExchange::new();
    let cache = KlineCache::new(MemoryStore::new());

    cache
        .get(&exchange, "BTC-USDT", Interval::OneHour, days(100, 101))
        .await
        .unwrap();
    cache
        .get(&exchange, "ETH-USDT", Interval::OneHour, days(100, 101))
        .await
        .unwrap();

    assert_eq!(exchange.requested_ranges().len(), 2);
    assert_eq!(cache.store().file_names().len(), 2);
}
