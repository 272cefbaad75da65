//! Modules layer - Infrastructure components for external integrations
//!
//! Contains clients and adapters for external services like blob storage and
//! webhook endpoints.

pub mod storage;
pub mod webhook;
