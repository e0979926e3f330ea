//! Logging and tracing setup shared by the shapegate binary.

pub mod tracing_setup;
