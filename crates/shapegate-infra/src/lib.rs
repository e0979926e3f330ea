//! Infrastructure layer for shapegate.
//!
//! Contains the SSH implementation of the `RemoteExecutor` port defined in
//! `shapegate-core`, config file loading with environment overrides, and
//! webhook token verification.

pub mod auth;
pub mod config;
pub mod ssh;
