//! Infrastructure adapters. Implement outbound ports.
//!
//! Persistence and message transports. Map errors to DomainError.

pub mod persistence;
pub mod transport;
