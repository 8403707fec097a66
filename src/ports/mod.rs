//! Port traits. API boundaries for the hexagon.
//!
//! Outbound: called by use cases into infrastructure.

pub mod outbound;

pub use outbound::{InteractionStore, MessageTransport};
