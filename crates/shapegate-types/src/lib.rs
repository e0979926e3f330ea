//! Shared domain types for shapegate.
//!
//! Webhook payloads, action results, service configuration and the error
//! types shared by the core, infra and api crates.
//!
//! Zero infrastructure dependencies -- only serde, secrecy, thiserror.

pub mod action;
pub mod config;
pub mod error;
pub mod event;
