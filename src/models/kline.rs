use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

// ---------------------------------------------------------------------------
// Kline: one OHLCV price candle
// ---------------------------------------------------------------------------

/// One OHLCV candle for a fixed time bucket.
///
/// `time` is the bucket open time in unix seconds. `quote_volume` is only
/// reported by some exchanges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kline {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_volume: Option<f64>,
}

// ---------------------------------------------------------------------------
// Interval: normalized kline granularity
// ---------------------------------------------------------------------------

/// Normalized kline granularity. Each exchange adapter maps these to its own
/// wire token (e.g. `60m` on MEXC, `1hour` on KuCoin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interval {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    FourHours,
    OneDay,
    OneWeek,
    OneMonth,
}

impl Interval {
    pub const ALL: [Interval; 9] = [
        Interval::OneMinute,
        Interval::FiveMinutes,
        Interval::FifteenMinutes,
        Interval::ThirtyMinutes,
        Interval::OneHour,
        Interval::FourHours,
        Interval::OneDay,
        Interval::OneWeek,
        Interval::OneMonth,
    ];

    /// Bucket size in seconds. OneMonth uses 30 days, matching how the
    /// exchanges bucket monthly candles for pagination purposes.
    pub fn seconds(self) -> i64 {
        match self {
            Interval::OneMinute => 60,
            Interval::FiveMinutes => 300,
            Interval::FifteenMinutes => 900,
            Interval::ThirtyMinutes => 1800,
            Interval::OneHour => 3600,
            Interval::FourHours => 14_400,
            Interval::OneDay => 86_400,
            Interval::OneWeek => 604_800,
            Interval::OneMonth => 2_592_000,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Interval::OneMinute => "one_minute",
            Interval::FiveMinutes => "five_minutes",
            Interval::FifteenMinutes => "fifteen_minutes",
            Interval::ThirtyMinutes => "thirty_minutes",
            Interval::OneHour => "one_hour",
            Interval::FourHours => "four_hours",
            Interval::OneDay => "one_day",
            Interval::OneWeek => "one_week",
            Interval::OneMonth => "one_month",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Interval::ALL
            .into_iter()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| Error::InvalidInterval(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// DateRange: inclusive unix-second range
// ---------------------------------------------------------------------------

/// Inclusive `[start, end]` range in unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: i64,
    pub end: i64,
}

impl DateRange {
    pub fn new(start: i64, end: i64) -> Result<Self, Error> {
        if start > end {
            return Err(Error::InvalidRange(format!(
                "start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, time: i64) -> bool {
        self.start <= time && time <= self.end
    }

    /// Range span in seconds.
    pub fn span(&self) -> i64 {
        self.end - self.start
    }
}
