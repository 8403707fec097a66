//! Engagement scoring use case: pull a subject's history from the store and
//! run the pure scoring pass over it.

use crate::domain::{DomainError, EngagementScore, InteractionFilter, scoring};
use crate::ports::InteractionStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

pub struct ScoringService {
    store: Arc<dyn InteractionStore>,
}

impl ScoringService {
    pub fn new(store: Arc<dyn InteractionStore>) -> Self {
        Self { store }
    }

    /// Score against the current time.
    pub async fn score(&self, subject_id: &str) -> Result<EngagementScore, DomainError> {
        self.score_at(subject_id, Utc::now()).await
    }

    /// Score against an explicit `now`. Same inputs, same score.
    pub async fn score_at(
        &self,
        subject_id: &str,
        now: DateTime<Utc>,
    ) -> Result<EngagementScore, DomainError> {
        let records = self
            .store
            .query(&InteractionFilter::for_subject(subject_id))
            .await?;
        let score = scoring::compute(&records, now);
        debug!(
            subject_id,
            score = score.score,
            level = ?score.level,
            interactions = score.total_interactions,
            "scored subject"
        );
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::persistence::MemoryStore;
    use crate::domain::{EngagementLevel, InteractionDraft, InteractionKind};
    use chrono::TimeZone;

    #[tokio::test]
    async fn scores_only_the_requested_subject() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let store = Arc::new(MemoryStore::new());
        store
            .append(
                InteractionDraft::new("lead-1", InteractionKind::Call)
                    .outcome("answered")
                    .timestamp(now),
            )
            .await
            .unwrap();
        store
            .append(
                InteractionDraft::new("lead-2", InteractionKind::SiteVisit)
                    .outcome("completed")
                    .notes("walked the property")
                    .timestamp(now),
            )
            .await
            .unwrap();

        let service = ScoringService::new(store);
        let score = service.score_at("lead-1", now).await.unwrap();
        assert_eq!(score.score, 30);
        assert_eq!(score.level, EngagementLevel::Low);
        assert_eq!(score.total_interactions, 1);
        assert_eq!(score.counts.calls, 1);
        assert_eq!(score.counts.site_visits, 0);
    }

    #[tokio::test]
    async fn subject_with_no_history_scores_zero() {
        let store = Arc::new(MemoryStore::new());
        let service = ScoringService::new(store);
        let score = service.score("ghost").await.unwrap();
        assert_eq!(score.score, 0);
        assert_eq!(score.level, EngagementLevel::Low);
        assert!(score.last_interaction_at.is_none());
    }
}
