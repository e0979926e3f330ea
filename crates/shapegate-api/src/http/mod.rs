//! HTTP layer: the webhook endpoint, a health probe, the JSON envelope and
//! error mapping.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
