//! Interaction analytics: grouped counts, trend buckets, top-N rankings and
//! per-subject timelines.
//!
//! Grouped maps keep first-encountered key order. Top-N ranking sorts by
//! count only (stable), so ties keep that encounter order — callers rely on
//! this for reproducible reports.

use crate::domain::entities::InteractionRecord;
use chrono::{DateTime, Datelike, Duration, FixedOffset, Offset, TimeZone, Timelike, Utc};
use serde::Serialize;
use std::fmt;

/// Days of history included in the trend buckets.
const TREND_WINDOW_DAYS: i64 = 30;

/// Insertion-ordered counter. Linear key scan; key cardinality here is
/// small (kinds, hours, days of a month).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CountMap {
    entries: Vec<(String, u64)>,
}

impl CountMap {
    pub fn bump(&mut self, key: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((key.to_string(), 1)),
        }
    }

    pub fn get(&self, key: &str) -> u64 {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, c)| *c)
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(k, c)| (k.as_str(), *c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    /// Top `n` entries by count, descending. Stable sort: equal counts keep
    /// insertion order.
    pub fn top_n(&self, n: usize) -> Vec<(String, u64)> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);
        ranked
    }
}

/// Calendar bucket granularity shared by trends and timelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBucket {
    Hour,
    Day,
    Week,
    Month,
}

impl TimeBucket {
    /// Bucket key for a timestamp in whatever zone the caller resolved it
    /// to. Week keys use week-of-month: `{year}-W{(day - 1) / 7 + 1}`.
    pub fn key<Tz: TimeZone>(self, ts: DateTime<Tz>) -> String
    where
        Tz::Offset: fmt::Display,
    {
        match self {
            TimeBucket::Hour => ts.format("%Y-%m-%d %H:00").to_string(),
            TimeBucket::Day => ts.format("%Y-%m-%d").to_string(),
            TimeBucket::Week => format!("{}-W{}", ts.year(), (ts.day() - 1) / 7 + 1),
            TimeBucket::Month => ts.format("%Y-%m").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    pub total: u64,
    pub by_kind: CountMap,
    /// Only records that carry an outcome contribute here.
    pub by_outcome: CountMap,
    pub by_day: CountMap,
    /// Hour of day, "0".."23".
    pub by_hour: CountMap,
    pub daily_trend: CountMap,
    pub weekly_trend: CountMap,
    pub monthly_trend: CountMap,
    pub top_hours: Vec<(String, u64)>,
    pub top_kinds: Vec<(String, u64)>,
}

/// Aggregate a filtered interaction set against a fixed `now` (trend window
/// cutoff), bucketing calendar keys in UTC.
pub fn analyze(records: &[InteractionRecord], now: DateTime<Utc>) -> AnalyticsReport {
    analyze_with_offset(records, now, Utc.fix())
}

/// Like [`analyze`], but calendar buckets (days, hours, trend keys) are
/// resolved in the given fixed offset. The trend cutoff stays an instant
/// comparison and does not shift with the offset. Single synchronous pass;
/// record order drives map key order.
pub fn analyze_with_offset(
    records: &[InteractionRecord],
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> AnalyticsReport {
    let trend_cutoff = now - Duration::days(TREND_WINDOW_DAYS);

    let mut by_kind = CountMap::default();
    let mut by_outcome = CountMap::default();
    let mut by_day = CountMap::default();
    let mut by_hour = CountMap::default();
    let mut daily_trend = CountMap::default();
    let mut weekly_trend = CountMap::default();
    let mut monthly_trend = CountMap::default();

    for record in records {
        by_kind.bump(record.kind.as_str());
        if let Some(outcome) = &record.outcome {
            by_outcome.bump(outcome);
        }
        let local = record.timestamp.with_timezone(&offset);
        by_day.bump(&TimeBucket::Day.key(local));
        by_hour.bump(&local.hour().to_string());

        if record.timestamp >= trend_cutoff {
            daily_trend.bump(&TimeBucket::Day.key(local));
            weekly_trend.bump(&TimeBucket::Week.key(local));
            monthly_trend.bump(&TimeBucket::Month.key(local));
        }
    }

    let top_hours = by_hour.top_n(5);
    let top_kinds = by_kind.top_n(5);

    AnalyticsReport {
        total: records.len() as u64,
        by_kind,
        by_outcome,
        by_day,
        by_hour,
        daily_trend,
        weekly_trend,
        monthly_trend,
        top_hours,
        top_kinds,
    }
}

/// A subject's most recent interactions grouped into calendar buckets.
#[derive(Debug, Clone, Serialize)]
pub struct Timeline {
    /// Insertion-ordered: buckets appear as encountered in the
    /// newest-first record list.
    pub groups: Vec<(String, Vec<InteractionRecord>)>,
    /// All interactions the subject has, before the limit.
    pub total: usize,
    /// Interactions actually included after the limit.
    pub included: usize,
}

/// Group the newest `limit` of `records` (expected sorted newest-first, as
/// the store returns them) into `bucket` groups, keyed in UTC.
pub fn timeline(records: &[InteractionRecord], bucket: TimeBucket, limit: usize) -> Timeline {
    timeline_with_offset(records, bucket, limit, Utc.fix())
}

/// Like [`timeline`], with bucket keys resolved in a fixed offset.
pub fn timeline_with_offset(
    records: &[InteractionRecord],
    bucket: TimeBucket,
    limit: usize,
    offset: FixedOffset,
) -> Timeline {
    let included = records.len().min(limit);
    let mut groups: Vec<(String, Vec<InteractionRecord>)> = Vec::new();

    for record in &records[..included] {
        let key = bucket.key(record.timestamp.with_timezone(&offset));
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, bucketed)) => bucketed.push(record.clone()),
            None => groups.push((key, vec![record.clone()])),
        }
    }

    Timeline {
        groups,
        total: records.len(),
        included,
    }
}
