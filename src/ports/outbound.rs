//! Outbound ports. Use cases call into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{
    DomainError, InteractionDraft, InteractionFilter, InteractionPatch, InteractionRecord,
    OutboundMessage, ProviderReceipt,
};
use uuid::Uuid;

/// Interaction log. Append-only in spirit: records change only through
/// explicit `update`/`delete` keyed by id. Implementations must serialize
/// writes so concurrent dispatcher appends interleave without loss.
#[async_trait::async_trait]
pub trait InteractionStore: Send + Sync {
    /// Validate and append. Invalid drafts are rejected whole, never
    /// partially written.
    async fn append(&self, draft: InteractionDraft) -> Result<InteractionRecord, DomainError>;

    /// Apply a patch to an existing record. The patched record re-validates
    /// before commit. Unknown id => `DomainError::NotFound`.
    async fn update(&self, id: Uuid, patch: InteractionPatch)
    -> Result<InteractionRecord, DomainError>;

    /// Remove a record. Unknown id => `DomainError::NotFound`.
    async fn delete(&self, id: Uuid) -> Result<(), DomainError>;

    /// Filtered retrieval, sorted by timestamp descending. Filter fields
    /// combine with AND.
    async fn query(&self, filter: &InteractionFilter)
    -> Result<Vec<InteractionRecord>, DomainError>;
}

/// Message-send gateway. One async call per recipient; the dispatcher is
/// agnostic to the wire protocol behind it. Implementations own their
/// timeout — a timed-out send must surface as an `Err` like any other
/// failure.
#[async_trait::async_trait]
pub trait MessageTransport: Send + Sync {
    async fn send(
        &self,
        address: &str,
        message: &OutboundMessage,
    ) -> Result<ProviderReceipt, DomainError>;
}
