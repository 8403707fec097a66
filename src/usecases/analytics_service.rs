//! Analytics use case: filtered aggregation and per-subject timelines over
//! a store snapshot. The computation itself is a synchronous single pass.

use crate::domain::analytics::{self, AnalyticsReport, TimeBucket, Timeline};
use crate::domain::{DomainError, InteractionFilter};
use crate::ports::InteractionStore;
use chrono::{DateTime, FixedOffset, Utc};
use std::sync::Arc;
use tracing::debug;

pub struct AnalyticsService {
    store: Arc<dyn InteractionStore>,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn InteractionStore>) -> Self {
        Self { store }
    }

    pub async fn analyze(&self, filter: &InteractionFilter) -> Result<AnalyticsReport, DomainError> {
        self.analyze_at(filter, Utc::now()).await
    }

    /// `now` fixes the 30-day trend window cutoff.
    pub async fn analyze_at(
        &self,
        filter: &InteractionFilter,
        now: DateTime<Utc>,
    ) -> Result<AnalyticsReport, DomainError> {
        let records = self.store.query(filter).await?;
        let report = analytics::analyze(&records, now);
        debug!(total = report.total, "analytics computed");
        Ok(report)
    }

    /// Variant with calendar buckets resolved in the caller's fixed offset,
    /// for readers whose working day is not UTC.
    pub async fn analyze_at_with_offset(
        &self,
        filter: &InteractionFilter,
        now: DateTime<Utc>,
        offset: FixedOffset,
    ) -> Result<AnalyticsReport, DomainError> {
        let records = self.store.query(filter).await?;
        let report = analytics::analyze_with_offset(&records, now, offset);
        debug!(total = report.total, offset = %offset, "analytics computed");
        Ok(report)
    }

    /// The most recent `limit` interactions for a subject, grouped into
    /// insertion-ordered calendar buckets.
    pub async fn timeline(
        &self,
        subject_id: &str,
        bucket: TimeBucket,
        limit: usize,
    ) -> Result<Timeline, DomainError> {
        let records = self
            .store
            .query(&InteractionFilter::for_subject(subject_id))
            .await?;
        Ok(analytics::timeline(&records, bucket, limit))
    }

    pub async fn timeline_with_offset(
        &self,
        subject_id: &str,
        bucket: TimeBucket,
        limit: usize,
        offset: FixedOffset,
    ) -> Result<Timeline, DomainError> {
        let records = self
            .store
            .query(&InteractionFilter::for_subject(subject_id))
            .await?;
        Ok(analytics::timeline_with_offset(&records, bucket, limit, offset))
    }
}
