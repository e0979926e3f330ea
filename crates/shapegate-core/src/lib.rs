//! Business logic for shapegate.
//!
//! Defines the `RemoteExecutor` port that the infrastructure layer
//! implements, the action gate that serializes every external action, and
//! the event handling built on top of it (decision table, delayed disable,
//! inactivity watchdog). Depends only on `shapegate-types` -- never on
//! `shapegate-infra` or any network crate.

pub mod activity;
pub mod command;
pub mod decision;
pub mod executor;
pub mod gate;
pub mod scheduler;
pub mod service;
pub mod watchdog;
