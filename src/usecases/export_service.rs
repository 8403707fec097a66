//! Interaction export for download actions: pretty JSON or quoted CSV.
//!
//! Uses the `csv` crate for safe quoting/escaping.

use crate::domain::{DomainError, InteractionFilter, InteractionRecord};
use crate::ports::InteractionStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

/// A ready-to-download document.
#[derive(Debug, Clone)]
pub struct ExportDocument {
    pub filename: String,
    pub content: String,
}

pub struct ExportService {
    store: Arc<dyn InteractionStore>,
}

impl ExportService {
    pub fn new(store: Arc<dyn InteractionStore>) -> Self {
        Self { store }
    }

    /// Export the filtered interaction list. Filename pattern:
    /// `interactions_{subject}_{YYYY-MM-DD}.{ext}` ("all" when the filter
    /// has no subject).
    pub async fn export(
        &self,
        filter: &InteractionFilter,
        format: ExportFormat,
    ) -> Result<ExportDocument, DomainError> {
        let records = self.store.query(filter).await?;
        let content = match format {
            ExportFormat::Json => to_json(&records)?,
            ExportFormat::Csv => to_csv(&records)?,
        };

        let subject = filter.subject_id.as_deref().unwrap_or("all");
        let filename = format!(
            "interactions_{}_{}.{}",
            subject,
            Utc::now().format("%Y-%m-%d"),
            format.extension()
        );
        info!(%filename, records = records.len(), "export generated");
        Ok(ExportDocument { filename, content })
    }
}

fn to_json(records: &[InteractionRecord]) -> Result<String, DomainError> {
    serde_json::to_string_pretty(records).map_err(|e| DomainError::Export(e.to_string()))
}

fn to_csv(records: &[InteractionRecord]) -> Result<String, DomainError> {
    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());

    wtr.write_record(["Date", "Type", "Outcome", "Notes", "Duration"])
        .map_err(|e| DomainError::Export(e.to_string()))?;

    for record in records {
        let duration = record
            .duration_secs
            .map(|s| s.to_string())
            .unwrap_or_default();
        wtr.write_record([
            record.timestamp.format("%Y-%m-%d %H:%M").to_string().as_str(),
            record.kind.as_str(),
            record.outcome.as_deref().unwrap_or(""),
            record.notes.as_deref().unwrap_or(""),
            duration.as_str(),
        ])
        .map_err(|e| DomainError::Export(e.to_string()))?;
    }

    wtr.flush().map_err(|e| DomainError::Export(e.to_string()))?;
    let bytes = wtr
        .into_inner()
        .map_err(|e| DomainError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| DomainError::Export(e.to_string()))
}
