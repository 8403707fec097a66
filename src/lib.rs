//! crm-engage: customer interaction log, engagement scoring and batch messaging core.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
