//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod analytics;
pub mod dispatch;
pub mod entities;
pub mod errors;
pub mod scoring;
pub mod template;

pub use dispatch::{
    DispatchConfig, DispatchJob, DispatchOutcome, DispatchReport, DispatchSummary,
    OutboundContent, OutboundMessage, ProviderReceipt, Recipient, SendResult,
};
pub use entities::{
    InteractionDraft, InteractionFilter, InteractionKind, InteractionPatch, InteractionRecord,
    InteractionSource,
};
pub use errors::DomainError;
pub use scoring::{EngagementLevel, EngagementScore, KindCounts};
pub use template::{Button, HeaderContent, MediaFormat, MessageTemplate, TemplateComponent};
