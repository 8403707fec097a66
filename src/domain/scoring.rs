//! Engagement scoring: weighted, recency-decayed score over a subject's
//! interaction history.
//!
//! The recency term tops up the base weight rather than replacing it, so a
//! same-day interaction counts ~1.5x its base weight, decaying toward 1.05x
//! over a year (the multiplier floors at 0.1). Preserved as observed in the
//! production weighting, intentional or not.

use crate::domain::entities::{InteractionKind, InteractionRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;

const SECONDS_PER_DAY: f64 = 86_400.0;
const RECENCY_WINDOW_DAYS: f64 = 365.0;
const RECENCY_FLOOR: f64 = 0.1;
const RECENCY_SHARE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl EngagementLevel {
    pub fn from_score(score: i64) -> Self {
        if score >= 200 {
            EngagementLevel::VeryHigh
        } else if score >= 100 {
            EngagementLevel::High
        } else if score >= 50 {
            EngagementLevel::Medium
        } else {
            EngagementLevel::Low
        }
    }
}

/// Interaction counts for the kinds surfaced on contact cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    pub calls: usize,
    pub whatsapp: usize,
    pub emails: usize,
    pub meetings: usize,
    pub site_visits: usize,
}

/// Derived engagement snapshot. Never persisted; recomputed from the log.
#[derive(Debug, Clone, Serialize)]
pub struct EngagementScore {
    pub score: i64,
    pub level: EngagementLevel,
    pub total_interactions: usize,
    pub last_interaction_at: Option<DateTime<Utc>>,
    pub counts: KindCounts,
}

/// Base weight for one interaction. Unknown (kind, outcome) pairs and
/// missing outcomes on outcome-bearing kinds weigh zero.
pub fn weight_of(kind: InteractionKind, outcome: Option<&str>) -> i64 {
    match kind {
        InteractionKind::Call => match outcome {
            Some("answered") => 20,
            Some("not_answered") | Some("busy") => 5,
            Some("switched_off") => 3,
            Some("invalid_number") => -5,
            _ => 0,
        },
        InteractionKind::Whatsapp => match outcome {
            Some("sent") => 5,
            Some("delivered") => 8,
            Some("read") => 12,
            Some("replied") => 25,
            _ => 0,
        },
        InteractionKind::Email => match outcome {
            Some("sent") => 3,
            Some("opened") => 10,
            Some("clicked") => 15,
            Some("replied") => 20,
            Some("bounced") => -3,
            _ => 0,
        },
        InteractionKind::Meeting => match outcome {
            Some("completed") => 30,
            Some("no_show") => -5,
            Some("rescheduled") => 5,
            _ => 0,
        },
        InteractionKind::SiteVisit => match outcome {
            Some("completed") => 40,
            Some("no_show") => -10,
            Some("rescheduled") => 10,
            _ => 0,
        },
        InteractionKind::ManualNote => 5,
        InteractionKind::FormSubmission => 15,
        InteractionKind::WebsiteVisit => 2,
        InteractionKind::DocumentDownload => 8,
    }
}

/// Score a subject's interaction history against a fixed `now`.
/// Deterministic: same records + same now = same score.
pub fn compute(records: &[InteractionRecord], now: DateTime<Utc>) -> EngagementScore {
    let mut score = 0.0f64;
    let mut counts = KindCounts::default();
    let mut last_interaction_at: Option<DateTime<Utc>> = None;

    for record in records {
        let weight = weight_of(record.kind, record.outcome.as_deref()) as f64;
        score += weight;

        let days_since = (now - record.timestamp).num_seconds() as f64 / SECONDS_PER_DAY;
        let recency = (1.0 - days_since / RECENCY_WINDOW_DAYS).max(RECENCY_FLOOR);
        score += weight * recency * RECENCY_SHARE;

        match record.kind {
            InteractionKind::Call => counts.calls += 1,
            InteractionKind::Whatsapp => counts.whatsapp += 1,
            InteractionKind::Email => counts.emails += 1,
            InteractionKind::Meeting => counts.meetings += 1,
            InteractionKind::SiteVisit => counts.site_visits += 1,
            _ => {}
        }

        if last_interaction_at.is_none_or(|last| record.timestamp > last) {
            last_interaction_at = Some(record.timestamp);
        }
    }

    let score = score.round() as i64;
    EngagementScore {
        score,
        level: EngagementLevel::from_score(score),
        total_interactions: records.len(),
        last_interaction_at,
        counts,
    }
}
