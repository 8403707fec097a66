//! Dispatch job and outcome types. Jobs are ephemeral; only the resulting
//! interaction records are persisted.

use crate::domain::entities::InteractionKind;
use crate::domain::template::MessageTemplate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_INTER_BATCH_DELAY: Duration = Duration::from_millis(1000);

/// What a job sends: a structured template personalized per recipient, or a
/// plain text message run through the same `{{name}}` substitution.
#[derive(Debug, Clone)]
pub enum OutboundContent {
    Template(MessageTemplate),
    Text(String),
}

/// One recipient of a dispatch job.
#[derive(Debug, Clone)]
pub struct Recipient {
    pub address: String,
    /// Contact/lead id for the logged interaction. Falls back to `address`.
    pub subject_id: Option<String>,
    pub values: HashMap<String, String>,
}

impl Recipient {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            subject_id: None,
            values: HashMap::new(),
        }
    }

    pub fn subject(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }

    pub fn value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn subject_id(&self) -> &str {
        self.subject_id.as_deref().unwrap_or(&self.address)
    }
}

/// Batching knobs. The sequential inter-batch delay is the rate-limiting
/// mechanism; tune both together to stay under a provider limit.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub batch_size: usize,
    pub inter_batch_delay: Duration,
    /// Channel logged for successful sends (must be a messaging kind whose
    /// outcome set contains "sent").
    pub channel: InteractionKind,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            inter_batch_delay: DEFAULT_INTER_BATCH_DELAY,
            channel: InteractionKind::Whatsapp,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DispatchJob {
    pub content: OutboundContent,
    pub recipients: Vec<Recipient>,
    pub config: DispatchConfig,
}

impl DispatchJob {
    pub fn new(content: OutboundContent, recipients: Vec<Recipient>) -> Self {
        Self {
            content,
            recipients,
            config: DispatchConfig::default(),
        }
    }

    pub fn config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }
}

/// Fully personalized payload handed to the transport. No placeholders left
/// to resolve (unresolved names stay literal by contract).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    Template(MessageTemplate),
    Text { text: String },
}

impl OutboundMessage {
    /// Primary text of the payload, for providers that take a flat body.
    pub fn body_text(&self) -> &str {
        match self {
            OutboundMessage::Template(t) => t.body_text(),
            OutboundMessage::Text { text } => text,
        }
    }
}

/// Provider acknowledgement for a single accepted send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderReceipt {
    pub provider_message_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SendResult {
    Sent { provider_message_id: String },
    Failed { reason: String },
}

/// Per-recipient result. One of these per recipient, always, however the
/// send went.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub address: String,
    #[serde(flatten)]
    pub result: SendResult,
}

impl DispatchOutcome {
    pub fn sent(address: impl Into<String>, provider_message_id: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            result: SendResult::Sent {
                provider_message_id: provider_message_id.into(),
            },
        }
    }

    pub fn failed(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            result: SendResult::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self.result, SendResult::Sent { .. })
    }

    pub fn provider_message_id(&self) -> Option<&str> {
        match &self.result {
            SendResult::Sent {
                provider_message_id,
            } => Some(provider_message_id),
            SendResult::Failed { .. } => None,
        }
    }

    pub fn error_reason(&self) -> Option<&str> {
        match &self.result {
            SendResult::Failed { reason } => Some(reason),
            SendResult::Sent { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Complete report for one dispatch invocation: every recipient accounted
/// for, plus the aggregate summary.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    pub outcomes: Vec<DispatchOutcome>,
    pub summary: DispatchSummary,
}

impl DispatchReport {
    pub fn from_outcomes(outcomes: Vec<DispatchOutcome>) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_sent()).count();
        let summary = DispatchSummary {
            total: outcomes.len(),
            succeeded,
            failed: outcomes.len() - succeeded,
        };
        Self { outcomes, summary }
    }

    pub fn empty() -> Self {
        Self::from_outcomes(Vec::new())
    }
}
