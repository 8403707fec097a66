//! Message transport adapters: mock (tests/dry runs) and HTTP webhook.

pub mod http;
pub mod mock;

pub use http::HttpTransport;
pub use mock::MockTransport;
