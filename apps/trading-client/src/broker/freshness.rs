//! Market-data freshness validation.
//!
//! Every market-data payload carries data timestamps. Before handing a
//! response to strategy code the client computes the age of the newest
//! data point and rejects anything older than the applicable threshold:
//! a short one while the market is open, a long one overnight and on
//! weekends. Account, order, and position calls are never validated.
//!
//! A data point aged exactly at the threshold is still fresh; the check
//! is a strict `age > threshold`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::api_types::{BarsResponse, LatestQuotesResponse, LatestTradesResponse};
use super::config::FreshnessPolicy;

/// Whether a call validates data age before returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FreshnessCheck {
    /// Reject stale data (default).
    #[default]
    Enforce,
    /// Return data regardless of age; metadata is still attached.
    Skip,
}

/// Freshness metadata attached to validated market-data responses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FreshnessReport {
    /// Timestamp of the newest data point in the payload.
    pub timestamp: DateTime<Utc>,
    /// Age of that data point in whole minutes.
    pub age_minutes: i64,
    /// Whether the market was open at validation time.
    pub market_open: bool,
    /// Threshold applied, in minutes.
    pub threshold_minutes: i64,
    /// Whether the data point exceeded the threshold.
    pub is_stale: bool,
}

/// A market-data payload together with its freshness metadata.
///
/// `freshness` is `None` only when no data timestamp could be extracted
/// from the payload (e.g. an empty bar set).
#[derive(Debug, Clone)]
pub struct MarketData<T> {
    /// The deserialized payload.
    pub payload: T,
    /// Freshness metadata, when a timestamp was available.
    pub freshness: Option<FreshnessReport>,
}

/// Extract the newest data timestamp from a market-data payload.
pub trait LatestTimestamp {
    /// Newest data-point timestamp, or `None` for an empty payload.
    fn latest_timestamp(&self) -> Option<DateTime<Utc>>;
}

impl LatestTimestamp for BarsResponse {
    fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.bars
            .values()
            .filter_map(|bars| bars.iter().map(|b| b.timestamp).max())
            .max()
    }
}

impl LatestTimestamp for LatestQuotesResponse {
    fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.quotes.values().map(|q| q.timestamp).max()
    }
}

impl LatestTimestamp for LatestTradesResponse {
    fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.trades.values().map(|t| t.timestamp).max()
    }
}

/// Build a freshness report for a data timestamp.
#[must_use]
pub fn assess(
    data_timestamp: DateTime<Utc>,
    now: DateTime<Utc>,
    market_open: bool,
    policy: &FreshnessPolicy,
) -> FreshnessReport {
    let threshold = policy.threshold(market_open);
    let age_seconds = (now - data_timestamp).num_seconds().max(0);
    #[allow(clippy::cast_possible_wrap)]
    let threshold_seconds = threshold.as_secs() as i64;

    FreshnessReport {
        timestamp: data_timestamp,
        age_minutes: age_seconds / 60,
        market_open,
        threshold_minutes: threshold_seconds / 60,
        is_stale: age_seconds > threshold_seconds,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration as StdDuration;

    use chrono::Duration;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    use super::*;
    use crate::broker::api_types::Bar;

    fn policy() -> FreshnessPolicy {
        FreshnessPolicy::default()
    }

    #[test_case(120, true, false; "two minutes old while open is fresh")]
    #[test_case(600, true, true; "ten minutes old while open is stale")]
    #[test_case(1800, false, false; "thirty minutes old while closed is fresh")]
    #[test_case(7200, false, true; "two hours old while closed is stale")]
    fn staleness_by_market_state(age_secs: i64, market_open: bool, expect_stale: bool) {
        let now = Utc::now();
        let report = assess(now - Duration::seconds(age_secs), now, market_open, &policy());
        assert_eq!(report.is_stale, expect_stale);
    }

    #[test]
    fn threshold_is_an_exclusive_upper_bound() {
        let now = Utc::now();

        // Exactly at the 5-minute threshold: not stale.
        let at_threshold = assess(now - Duration::seconds(300), now, true, &policy());
        assert!(!at_threshold.is_stale);
        assert_eq!(at_threshold.age_minutes, 5);

        // One second past it: stale.
        let past_threshold = assess(now - Duration::seconds(301), now, true, &policy());
        assert!(past_threshold.is_stale);
    }

    #[test]
    fn future_timestamps_clamp_to_zero_age() {
        let now = Utc::now();
        let report = assess(now + Duration::seconds(30), now, true, &policy());
        assert_eq!(report.age_minutes, 0);
        assert!(!report.is_stale);
    }

    #[test]
    fn report_carries_threshold_used() {
        let custom = FreshnessPolicy {
            market_hours_threshold: StdDuration::from_secs(120),
            off_hours_threshold: StdDuration::from_secs(600),
        };
        let now = Utc::now();

        let open = assess(now, now, true, &custom);
        assert_eq!(open.threshold_minutes, 2);

        let closed = assess(now, now, false, &custom);
        assert_eq!(closed.threshold_minutes, 10);
    }

    #[test]
    fn bars_latest_timestamp_spans_symbols() {
        let older = Utc::now() - Duration::minutes(10);
        let newer = Utc::now() - Duration::minutes(1);

        let bar = |timestamp| Bar {
            timestamp,
            open: dec!(1),
            high: dec!(1),
            low: dec!(1),
            close: dec!(1),
            volume: 1,
        };

        let mut bars = HashMap::new();
        bars.insert("AAPL".to_string(), vec![bar(older), bar(newer)]);
        bars.insert("MSFT".to_string(), vec![bar(older)]);

        let response = BarsResponse {
            bars,
            next_page_token: None,
        };
        assert_eq!(response.latest_timestamp(), Some(newer));
    }

    #[test]
    fn empty_bars_have_no_timestamp() {
        let response = BarsResponse {
            bars: HashMap::new(),
            next_page_token: None,
        };
        assert_eq!(response.latest_timestamp(), None);
    }
}
