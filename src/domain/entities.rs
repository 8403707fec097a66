//! Interaction entities. Pure data structures for the core business.
//!
//! No transport/persistence types here — adapters map into these.

use crate::domain::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Kind of customer touchpoint. Closed set: an unknown kind is not
/// representable, which makes weight/outcome lookups total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Call,
    Whatsapp,
    Email,
    Meeting,
    SiteVisit,
    ManualNote,
    FormSubmission,
    WebsiteVisit,
    DocumentDownload,
}

impl InteractionKind {
    pub const ALL: [InteractionKind; 9] = [
        InteractionKind::Call,
        InteractionKind::Whatsapp,
        InteractionKind::Email,
        InteractionKind::Meeting,
        InteractionKind::SiteVisit,
        InteractionKind::ManualNote,
        InteractionKind::FormSubmission,
        InteractionKind::WebsiteVisit,
        InteractionKind::DocumentDownload,
    ];

    /// Allowed outcome strings for this kind. Empty slice = outcome-less kind.
    pub fn allowed_outcomes(self) -> &'static [&'static str] {
        match self {
            InteractionKind::Call => {
                &["answered", "not_answered", "busy", "switched_off", "invalid_number"]
            }
            InteractionKind::Whatsapp => &["sent", "delivered", "read", "replied", "failed"],
            InteractionKind::Email => &["sent", "opened", "clicked", "replied", "bounced"],
            InteractionKind::Meeting | InteractionKind::SiteVisit => {
                &["completed", "no_show", "cancelled", "rescheduled"]
            }
            InteractionKind::ManualNote
            | InteractionKind::FormSubmission
            | InteractionKind::WebsiteVisit
            | InteractionKind::DocumentDownload => &[],
        }
    }

    /// Kinds whose records must carry non-empty notes.
    pub fn requires_notes(self) -> bool {
        matches!(
            self,
            InteractionKind::Meeting | InteractionKind::SiteVisit | InteractionKind::ManualNote
        )
    }

    /// Kinds for which `duration_secs` is meaningful.
    pub fn tracks_duration(self) -> bool {
        matches!(
            self,
            InteractionKind::Call
                | InteractionKind::Meeting
                | InteractionKind::SiteVisit
                | InteractionKind::WebsiteVisit
        )
    }

    /// Wire name, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            InteractionKind::Call => "call",
            InteractionKind::Whatsapp => "whatsapp",
            InteractionKind::Email => "email",
            InteractionKind::Meeting => "meeting",
            InteractionKind::SiteVisit => "site_visit",
            InteractionKind::ManualNote => "manual_note",
            InteractionKind::FormSubmission => "form_submission",
            InteractionKind::WebsiteVisit => "website_visit",
            InteractionKind::DocumentDownload => "document_download",
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who wrote the record: a person through the UI, or an automated
/// collaborator such as the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionSource {
    Manual,
    System,
}

/// One logged customer touchpoint. Append-only; mutated only through
/// explicit `update` patches keyed by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub id: Uuid,
    pub subject_id: String,
    pub kind: InteractionKind,
    pub outcome: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub duration_secs: Option<u32>,
    pub notes: Option<String>,
    pub source: InteractionSource,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Unvalidated candidate record. `build()` assigns the id and timestamp
/// and enforces the write-time invariants.
#[derive(Debug, Clone)]
pub struct InteractionDraft {
    pub subject_id: String,
    pub kind: InteractionKind,
    pub outcome: Option<String>,
    /// None = stamped with `Utc::now()` at build time (backdated manual
    /// entries supply their own).
    pub timestamp: Option<DateTime<Utc>>,
    pub duration_secs: Option<u32>,
    pub notes: Option<String>,
    pub source: InteractionSource,
    pub metadata: HashMap<String, String>,
}

impl InteractionDraft {
    pub fn new(subject_id: impl Into<String>, kind: InteractionKind) -> Self {
        Self {
            subject_id: subject_id.into(),
            kind,
            outcome: None,
            timestamp: None,
            duration_secs: None,
            notes: None,
            source: InteractionSource::Manual,
            metadata: HashMap::new(),
        }
    }

    pub fn outcome(mut self, outcome: impl Into<String>) -> Self {
        self.outcome = Some(outcome.into());
        self
    }

    pub fn timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at);
        self
    }

    pub fn duration_secs(mut self, secs: u32) -> Self {
        self.duration_secs = Some(secs);
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn source(mut self, source: InteractionSource) -> Self {
        self.source = source;
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Validate and promote to a stored record. Invalid drafts are rejected
    /// whole; nothing is coerced.
    pub fn build(self) -> Result<InteractionRecord, DomainError> {
        validate_outcome(self.kind, self.outcome.as_deref())?;
        validate_notes(self.kind, self.notes.as_deref())?;
        validate_duration(self.kind, self.duration_secs)?;

        Ok(InteractionRecord {
            id: Uuid::new_v4(),
            subject_id: self.subject_id,
            kind: self.kind,
            outcome: self.outcome,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            duration_secs: self.duration_secs,
            notes: self.notes,
            source: self.source,
            metadata: self.metadata,
        })
    }
}

/// Partial update for an existing record. Absent fields are left as-is;
/// clearing a field is not supported through patches.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InteractionPatch {
    pub outcome: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub duration_secs: Option<u32>,
    pub notes: Option<String>,
    pub metadata: Option<HashMap<String, String>>,
}

impl InteractionPatch {
    /// Apply to a record, re-running write-time validation on the result.
    /// The original is untouched on error.
    pub fn apply(&self, record: &InteractionRecord) -> Result<InteractionRecord, DomainError> {
        let mut updated = record.clone();
        if let Some(outcome) = &self.outcome {
            updated.outcome = Some(outcome.clone());
        }
        if let Some(ts) = self.timestamp {
            updated.timestamp = ts;
        }
        if let Some(secs) = self.duration_secs {
            updated.duration_secs = Some(secs);
        }
        if let Some(notes) = &self.notes {
            updated.notes = Some(notes.clone());
        }
        if let Some(metadata) = &self.metadata {
            updated.metadata.extend(metadata.clone());
        }

        validate_outcome(updated.kind, updated.outcome.as_deref())?;
        validate_notes(updated.kind, updated.notes.as_deref())?;
        validate_duration(updated.kind, updated.duration_secs)?;
        Ok(updated)
    }
}

fn validate_outcome(kind: InteractionKind, outcome: Option<&str>) -> Result<(), DomainError> {
    let Some(outcome) = outcome else {
        return Ok(());
    };
    let allowed = kind.allowed_outcomes();
    if allowed.contains(&outcome) {
        Ok(())
    } else if allowed.is_empty() {
        Err(DomainError::Validation(format!(
            "interaction kind '{kind}' does not take an outcome (got '{outcome}')"
        )))
    } else {
        Err(DomainError::Validation(format!(
            "outcome '{outcome}' is not valid for kind '{kind}' (allowed: {})",
            allowed.join(", ")
        )))
    }
}

fn validate_duration(kind: InteractionKind, duration: Option<u32>) -> Result<(), DomainError> {
    if duration.is_some() && !kind.tracks_duration() {
        return Err(DomainError::Validation(format!(
            "interaction kind '{kind}' does not track a duration"
        )));
    }
    Ok(())
}

fn validate_notes(kind: InteractionKind, notes: Option<&str>) -> Result<(), DomainError> {
    if kind.requires_notes() && notes.map_or(true, |n| n.trim().is_empty()) {
        return Err(DomainError::Validation(format!(
            "interaction kind '{kind}' requires notes"
        )));
    }
    Ok(())
}

/// Store query filter. All fields optional, combined with AND.
#[derive(Debug, Clone, Default)]
pub struct InteractionFilter {
    pub subject_id: Option<String>,
    pub kind: Option<InteractionKind>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

impl InteractionFilter {
    pub fn for_subject(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: Some(subject_id.into()),
            ..Self::default()
        }
    }

    pub fn kind(mut self, kind: InteractionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.date_from = Some(from);
        self.date_to = Some(to);
        self
    }

    pub fn matches(&self, record: &InteractionRecord) -> bool {
        if let Some(subject_id) = &self.subject_id {
            if &record.subject_id != subject_id {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if record.kind != kind {
                return false;
            }
        }
        if let Some(from) = self.date_from {
            if record.timestamp < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if record.timestamp > to {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn build_assigns_id_and_timestamp() {
        let record = InteractionDraft::new("lead-1", InteractionKind::Call)
            .outcome("answered")
            .duration_secs(90)
            .build()
            .unwrap();

        assert_eq!(record.subject_id, "lead-1");
        assert_eq!(record.outcome.as_deref(), Some("answered"));
        assert_eq!(record.source, InteractionSource::Manual);
        assert!(!record.id.is_nil());
    }

    #[test]
    fn build_rejects_outcome_outside_allowed_set() {
        let err = InteractionDraft::new("lead-1", InteractionKind::Call)
            .outcome("no_show")
            .build()
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn build_rejects_outcome_on_outcome_less_kind() {
        let err = InteractionDraft::new("lead-1", InteractionKind::WebsiteVisit)
            .outcome("answered")
            .build()
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn build_rejects_missing_notes_where_required() {
        for kind in [
            InteractionKind::Meeting,
            InteractionKind::SiteVisit,
            InteractionKind::ManualNote,
        ] {
            assert!(InteractionDraft::new("lead-1", kind).build().is_err());
            assert!(InteractionDraft::new("lead-1", kind).notes("  ").build().is_err());
        }
        let record = InteractionDraft::new("lead-1", InteractionKind::ManualNote)
            .notes("called back later")
            .build()
            .unwrap();
        assert_eq!(record.notes.as_deref(), Some("called back later"));
    }

    #[test]
    fn build_rejects_duration_on_non_tracking_kind() {
        let err = InteractionDraft::new("lead-1", InteractionKind::Email)
            .outcome("opened")
            .duration_secs(45)
            .build()
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let record = InteractionDraft::new("lead-1", InteractionKind::WebsiteVisit)
            .duration_secs(45)
            .build()
            .unwrap();
        assert_eq!(record.duration_secs, Some(45));
    }

    #[test]
    fn patch_rejects_duration_on_non_tracking_kind() {
        let record = InteractionDraft::new("lead-1", InteractionKind::Email)
            .outcome("opened")
            .build()
            .unwrap();

        let patch = InteractionPatch {
            duration_secs: Some(120),
            ..Default::default()
        };
        assert!(patch.apply(&record).is_err());
        assert_eq!(record.duration_secs, None);
    }

    #[test]
    fn backdated_timestamp_is_kept() {
        let at = Utc.with_ymd_and_hms(2024, 3, 10, 9, 30, 0).unwrap();
        let record = InteractionDraft::new("lead-1", InteractionKind::Email)
            .timestamp(at)
            .build()
            .unwrap();
        assert_eq!(record.timestamp, at);
    }

    #[test]
    fn patch_revalidates_outcome() {
        let record = InteractionDraft::new("lead-1", InteractionKind::Call)
            .outcome("busy")
            .build()
            .unwrap();

        let patch = InteractionPatch {
            outcome: Some("answered".into()),
            ..Default::default()
        };
        let updated = patch.apply(&record).unwrap();
        assert_eq!(updated.outcome.as_deref(), Some("answered"));
        assert_eq!(updated.id, record.id);

        let bad = InteractionPatch {
            outcome: Some("completed".into()),
            ..Default::default()
        };
        assert!(bad.apply(&record).is_err());
        // Original untouched on error.
        assert_eq!(record.outcome.as_deref(), Some("busy"));
    }

    #[test]
    fn filter_fields_combine_with_and() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let record = InteractionDraft::new("lead-1", InteractionKind::Call)
            .outcome("answered")
            .timestamp(at)
            .build()
            .unwrap();

        assert!(InteractionFilter::for_subject("lead-1").matches(&record));
        assert!(!InteractionFilter::for_subject("lead-2").matches(&record));
        assert!(
            InteractionFilter::for_subject("lead-1")
                .kind(InteractionKind::Call)
                .matches(&record)
        );
        assert!(
            !InteractionFilter::for_subject("lead-1")
                .kind(InteractionKind::Email)
                .matches(&record)
        );

        let before = at - chrono::Duration::days(1);
        let after = at + chrono::Duration::days(1);
        assert!(InteractionFilter::default().between(before, after).matches(&record));
        assert!(!InteractionFilter::default().between(after, after).matches(&record));
    }

    #[test]
    fn kind_serde_uses_snake_case() {
        let json = serde_json::to_string(&InteractionKind::SiteVisit).unwrap();
        assert_eq!(json, "\"site_visit\"");
        let kind: InteractionKind = serde_json::from_str("\"document_download\"").unwrap();
        assert_eq!(kind, InteractionKind::DocumentDownload);
    }
}
