//! Application use cases. Orchestrate domain logic via ports.

pub mod analytics_service;
pub mod dispatch_service;
pub mod export_service;
pub mod scoring_service;

pub use analytics_service::AnalyticsService;
pub use dispatch_service::{CancelFlag, DispatchService};
pub use export_service::{ExportDocument, ExportFormat, ExportService};
pub use scoring_service::ScoringService;
