//! Service plumbing shared across ConciergeSync binaries.
//!
//! Health endpoints, tracing setup, and the request-id middleware.
//! Domain logic never lives here.

pub mod health;
pub mod middleware;
pub mod tracing;
