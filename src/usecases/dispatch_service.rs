//! Batch dispatch: personalize -> fan out per batch -> join -> delay -> next.
//!
//! - Within a batch, every send runs as its own task; the batch completes
//!   only when all of them have settled.
//! - Batches run strictly sequentially with a delay gate between them; that
//!   gate is the rate-limiting mechanism.
//! - A single recipient's failure never aborts the batch or later batches.
//! - Successful sends are logged to the interaction store after all batches
//!   finish; the report always covers every recipient.

use crate::domain::{
    DispatchJob, DispatchOutcome, DispatchReport, InteractionDraft, InteractionSource,
    OutboundContent, OutboundMessage, Recipient, template,
};
use crate::ports::{InteractionStore, MessageTransport};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Cooperative cancellation handle. Checked between batches only; in-flight
/// sends always run to completion.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Dispatch service. Sends through an injected transport and logs results
/// into the interaction store.
pub struct DispatchService {
    transport: Arc<dyn MessageTransport>,
    store: Arc<dyn InteractionStore>,
}

impl DispatchService {
    pub fn new(transport: Arc<dyn MessageTransport>, store: Arc<dyn InteractionStore>) -> Self {
        Self { transport, store }
    }

    /// Run a job to completion. Returns once every batch has settled; the
    /// report holds exactly one outcome per recipient.
    pub async fn dispatch(&self, job: DispatchJob) -> DispatchReport {
        self.dispatch_with_cancel(job, &CancelFlag::new()).await
    }

    /// Like `dispatch`, but stops launching new batches once `cancel` is
    /// set. Recipients that never got a send attempt are reported as failed.
    pub async fn dispatch_with_cancel(&self, job: DispatchJob, cancel: &CancelFlag) -> DispatchReport {
        if job.recipients.is_empty() {
            debug!("dispatch called with no recipients");
            return DispatchReport::empty();
        }

        let batch_size = job.config.batch_size.max(1);
        let batch_count = job.recipients.len().div_ceil(batch_size);
        info!(
            recipients = job.recipients.len(),
            batch_size,
            batches = batch_count,
            "starting dispatch"
        );

        let mut outcomes: Vec<DispatchOutcome> = Vec::with_capacity(job.recipients.len());

        for (batch_index, batch) in job.recipients.chunks(batch_size).enumerate() {
            // Delay gate between batches, not after the last.
            if batch_index > 0 {
                tokio::time::sleep(job.config.inter_batch_delay).await;
            }

            if cancel.is_cancelled() {
                warn!(
                    batch = batch_index,
                    remaining = job.recipients.len() - outcomes.len(),
                    "dispatch cancelled; remaining recipients reported as failed"
                );
                for recipient in &job.recipients[outcomes.len()..] {
                    outcomes.push(DispatchOutcome::failed(
                        &recipient.address,
                        "cancelled before send",
                    ));
                }
                break;
            }

            outcomes.extend(self.run_batch(batch, &job.content).await);
            debug!(batch = batch_index, done = outcomes.len(), "batch settled");
        }

        let report = DispatchReport::from_outcomes(outcomes);
        self.log_successes(&job, &report).await;

        info!(
            total = report.summary.total,
            succeeded = report.summary.succeeded,
            failed = report.summary.failed,
            "dispatch complete"
        );
        report
    }

    /// Fan out one batch and join every task. Outcome order matches
    /// recipient order within the batch.
    async fn run_batch(&self, batch: &[Recipient], content: &OutboundContent) -> Vec<DispatchOutcome> {
        let mut handles = Vec::with_capacity(batch.len());
        for recipient in batch {
            let message = personalize_for(content, recipient);
            let transport = Arc::clone(&self.transport);
            let address = recipient.address.clone();
            handles.push((
                recipient.address.clone(),
                tokio::spawn(async move {
                    match transport.send(&address, &message).await {
                        Ok(receipt) => {
                            DispatchOutcome::sent(address, receipt.provider_message_id)
                        }
                        Err(e) => DispatchOutcome::failed(address, e.to_string()),
                    }
                }),
            ));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (address, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                // Task panic: treated like any other per-recipient failure.
                Err(e) => DispatchOutcome::failed(address, format!("send task failed: {e}")),
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    /// One system-sourced interaction per successful send. Failures stay in
    /// the report only; a store error downgrades to a warning because the
    /// messages are already out.
    async fn log_successes(&self, job: &DispatchJob, report: &DispatchReport) {
        let recipients_by_address: std::collections::HashMap<&str, &Recipient> = job
            .recipients
            .iter()
            .map(|r| (r.address.as_str(), r))
            .collect();

        for outcome in report.outcomes.iter().filter(|o| o.is_sent()) {
            let subject_id = recipients_by_address
                .get(outcome.address.as_str())
                .map(|r| r.subject_id())
                .unwrap_or(outcome.address.as_str());

            let mut draft = InteractionDraft::new(subject_id, job.config.channel)
                .outcome("sent")
                .source(InteractionSource::System)
                .metadata("address", &outcome.address);
            if let Some(id) = outcome.provider_message_id() {
                draft = draft.metadata("provider_message_id", id);
            }
            if let OutboundContent::Template(t) = &job.content {
                draft = draft.metadata("template", &t.name);
            }

            if let Err(e) = self.store.append(draft).await {
                warn!(address = %outcome.address, error = %e, "failed to log sent interaction");
            }
        }
    }
}

/// Build the personalized payload for one recipient.
fn personalize_for(content: &OutboundContent, recipient: &Recipient) -> OutboundMessage {
    match content {
        OutboundContent::Template(t) => OutboundMessage::Template(t.personalize(&recipient.values)),
        OutboundContent::Text(text) => OutboundMessage::Text {
            text: template::substitute(text, &recipient.values),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::persistence::MemoryStore;
    use crate::adapters::transport::MockTransport;
    use crate::domain::{DispatchConfig, InteractionFilter, InteractionKind, MessageTemplate};
    use std::time::Duration;
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    // Tracing output from dispatch runs under `cargo test -- --nocapture`;
    // only the first caller installs the subscriber.
    fn init_tracing() {
        let _ = tracing_subscriber::registry()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    }

    fn job(recipients: Vec<Recipient>) -> DispatchJob {
        DispatchJob::new(
            OutboundContent::Template(MessageTemplate::body_only(
                "launch_update",
                "Hi {{name}}, {{project}} is now ready",
            )),
            recipients,
        )
        .config(DispatchConfig {
            batch_size: 10,
            inter_batch_delay: Duration::from_millis(5),
            channel: InteractionKind::Whatsapp,
        })
    }

    fn recipients(n: usize) -> Vec<Recipient> {
        (0..n)
            .map(|i| {
                Recipient::new(format!("+7701000{i:04}"))
                    .subject(format!("lead-{i}"))
                    .value("name", "Asha")
                    .value("project", "Skyline")
            })
            .collect()
    }

    fn service(transport: Arc<MockTransport>) -> (DispatchService, Arc<MemoryStore>) {
        init_tracing();
        let store = Arc::new(MemoryStore::new());
        let service = DispatchService::new(transport, Arc::clone(&store) as Arc<dyn InteractionStore>);
        (service, store)
    }

    #[tokio::test]
    async fn empty_recipient_list_never_touches_transport() {
        let transport = Arc::new(MockTransport::new());
        let (service, _store) = service(Arc::clone(&transport));

        let report = service.dispatch(job(vec![])).await;
        assert_eq!(report.summary.total, 0);
        assert!(report.outcomes.is_empty());
        assert!(transport.sent_addresses().is_empty());
    }

    #[tokio::test]
    async fn every_recipient_gets_exactly_one_outcome() {
        let transport = Arc::new(MockTransport::new());
        let (service, _store) = service(Arc::clone(&transport));

        let report = service.dispatch(job(recipients(23))).await;
        assert_eq!(report.outcomes.len(), 23);
        assert_eq!(report.summary.total, 23);
        assert_eq!(report.summary.succeeded, 23);
        // Outcomes keep recipient order across batches.
        for (i, outcome) in report.outcomes.iter().enumerate() {
            assert_eq!(outcome.address, format!("+7701000{i:04}"));
        }
        // Batch fan-out never exceeds the batch size.
        assert!(transport.max_in_flight() <= 10);
        assert_eq!(transport.sent_addresses().len(), 23);
    }

    #[tokio::test]
    async fn fifteen_recipients_make_two_batches_and_fifteen_records() {
        let transport = Arc::new(MockTransport::new());
        let (service, store) = service(Arc::clone(&transport));

        let report = service.dispatch(job(recipients(15))).await;
        assert_eq!(report.summary.succeeded, 15);
        assert_eq!(report.summary.failed, 0);

        let logged = store.query(&InteractionFilter::default()).await.unwrap();
        assert_eq!(logged.len(), 15);
        for record in &logged {
            assert_eq!(record.kind, InteractionKind::Whatsapp);
            assert_eq!(record.outcome.as_deref(), Some("sent"));
            assert_eq!(record.source, InteractionSource::System);
            assert_eq!(record.metadata.get("template").unwrap(), "launch_update");
            assert!(record.metadata.contains_key("provider_message_id"));
        }
    }

    #[tokio::test]
    async fn one_failure_does_not_disturb_the_rest() {
        let transport = Arc::new(MockTransport::new().failing_for(["+77010000003"]));
        let (service, store) = service(Arc::clone(&transport));

        let report = service.dispatch(job(recipients(8))).await;
        assert_eq!(report.summary.total, 8);
        assert_eq!(report.summary.succeeded, 7);
        assert_eq!(report.summary.failed, 1);

        let failed: Vec<_> = report.outcomes.iter().filter(|o| !o.is_sent()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].address, "+77010000003");
        assert!(failed[0].error_reason().unwrap().contains("rejected"));

        // Failures are not logged as interactions.
        let logged = store.query(&InteractionFilter::default()).await.unwrap();
        assert_eq!(logged.len(), 7);
        assert!(logged.iter().all(|r| r.subject_id != "lead-3"));
    }

    #[tokio::test]
    async fn logged_record_uses_recipient_subject_id() {
        let transport = Arc::new(MockTransport::new());
        let (service, store) = service(Arc::clone(&transport));

        service.dispatch(job(recipients(1))).await;
        let logged = store.query(&InteractionFilter::for_subject("lead-0")).await.unwrap();
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].metadata.get("address").unwrap(), "+77010000000");
    }

    #[tokio::test]
    async fn plain_text_jobs_substitute_the_same_syntax() {
        let transport = Arc::new(MockTransport::new());
        let (service, _store) = service(Arc::clone(&transport));

        let mut job = job(recipients(1));
        job.content = OutboundContent::Text("Hello {{name}}, see {{project}}".into());
        let report = service.dispatch(job).await;
        assert_eq!(report.summary.succeeded, 1);
        assert_eq!(
            transport.sent_bodies()[0],
            "Hello Asha, see Skyline"
        );
    }

    #[tokio::test]
    async fn cancellation_is_checked_between_batches_only() {
        let transport = Arc::new(MockTransport::new());
        let (service, store) = service(Arc::clone(&transport));

        let cancel = CancelFlag::new();
        cancel.cancel();
        let mut job = job(recipients(25));
        job.config.batch_size = 10;

        // Pre-cancelled: nothing is sent at all, but every recipient is
        // still accounted for.
        let report = service.dispatch_with_cancel(job, &cancel).await;
        assert_eq!(report.summary.total, 25);
        assert_eq!(report.summary.succeeded, 0);
        assert_eq!(report.summary.failed, 25);
        assert!(
            report
                .outcomes
                .iter()
                .all(|o| o.error_reason() == Some("cancelled before send"))
        );
        assert!(transport.sent_addresses().is_empty());
        let logged = store.query(&InteractionFilter::default()).await.unwrap();
        assert!(logged.is_empty());
    }

    #[tokio::test]
    async fn mid_dispatch_cancellation_lets_current_batch_settle() {
        let transport = Arc::new(MockTransport::new().with_delay(20));
        let (service, _store) = service(Arc::clone(&transport));

        let cancel = CancelFlag::new();
        let mut job = job(recipients(30));
        job.config.batch_size = 10;
        job.config.inter_batch_delay = Duration::from_millis(50);

        let canceller = cancel.clone();
        tokio::spawn(async move {
            // Cancel while the first batch is in flight.
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let report = service.dispatch_with_cancel(job, &cancel).await;
        assert_eq!(report.summary.total, 30);
        // First batch ran to completion; later batches never launched.
        assert_eq!(report.summary.succeeded, 10);
        assert_eq!(report.summary.failed, 20);
    }

    #[tokio::test]
    async fn unresolved_variables_go_out_literally() {
        let transport = Arc::new(MockTransport::new());
        let (service, _store) = service(Arc::clone(&transport));

        let mut job = job(vec![Recipient::new("+77010009999").value("name", "Asha")]);
        job.content = OutboundContent::Template(MessageTemplate::body_only(
            "launch_update",
            "Hi {{name}}, {{project}} is now ready",
        ));
        service.dispatch(job).await;
        assert_eq!(
            transport.sent_bodies()[0],
            "Hi Asha, {{project}} is now ready"
        );
    }
}
