//! Mock transport for testing without a provider.
//!
//! Simulates network latency with a configurable delay, fails scripted
//! addresses, and records what was sent plus the peak fan-out.

use crate::domain::{DomainError, OutboundMessage, ProviderReceipt};
use crate::ports::MessageTransport;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

pub struct MockTransport {
    delay_ms: u64,
    fail_addresses: HashSet<String>,
    counter: AtomicU64,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    sent: Mutex<Vec<(String, String)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            delay_ms: 0,
            fail_addresses: HashSet::new(),
            counter: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Simulated per-send latency.
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Addresses whose sends are rejected.
    pub fn failing_for<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fail_addresses = addresses.into_iter().map(Into::into).collect();
        self
    }

    /// Addresses successfully sent to, in completion order.
    pub fn sent_addresses(&self) -> Vec<String> {
        self.sent
            .lock()
            .expect("mock transport lock poisoned")
            .iter()
            .map(|(address, _)| address.clone())
            .collect()
    }

    /// Bodies successfully sent, in completion order.
    pub fn sent_bodies(&self) -> Vec<String> {
        self.sent
            .lock()
            .expect("mock transport lock poisoned")
            .iter()
            .map(|(_, body)| body.clone())
            .collect()
    }

    /// Highest number of sends observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MessageTransport for MockTransport {
    async fn send(
        &self,
        address: &str,
        message: &OutboundMessage,
    ) -> Result<ProviderReceipt, DomainError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }

        let result = if self.fail_addresses.contains(address) {
            Err(DomainError::Transport(format!(
                "provider rejected send to {address}"
            )))
        } else {
            let n = self.counter.fetch_add(1, Ordering::SeqCst);
            self.sent
                .lock()
                .expect("mock transport lock poisoned")
                .push((address.to_string(), message.body_text().to_string()));
            debug!(address, "[MOCK] message sent");
            Ok(ProviderReceipt {
                provider_message_id: format!("mock-{n}"),
            })
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn assigns_sequential_receipts_and_records_sends() {
        let transport = MockTransport::new();
        let message = OutboundMessage::Text {
            text: "hello".into(),
        };
        let first = transport.send("+1", &message).await.unwrap();
        let second = transport.send("+2", &message).await.unwrap();
        assert_eq!(first.provider_message_id, "mock-0");
        assert_eq!(second.provider_message_id, "mock-1");
        assert_eq!(transport.sent_addresses(), vec!["+1", "+2"]);
    }

    #[tokio::test]
    async fn scripted_addresses_fail() {
        let transport = MockTransport::new().failing_for(["+1"]);
        let message = OutboundMessage::Text {
            text: "hello".into(),
        };
        let err = transport.send("+1", &message).await.unwrap_err();
        assert!(matches!(err, DomainError::Transport(_)));
        assert!(transport.sent_addresses().is_empty());
    }
}
