//! Interaction store adapters: in-memory and JSONL-backed.

pub mod jsonl_store;
pub mod memory_store;

pub use jsonl_store::JsonlStore;
pub use memory_store::MemoryStore;
