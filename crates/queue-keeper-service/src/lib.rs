//! # Queue-Keeper Service
//!
//! Support modules for the `queue-keeper-service` binary. The HTTP service
//! itself — application state, the webhook-ingestion router, the RPC/HTTP
//! gateway, and server startup — lives in `queue-keeper-api`, which this
//! binary depends on directly; this crate holds only the pieces that are
//! specific to this deployment target rather than shared across every
//! consumer of that API crate.

pub mod circuit_breaker;
pub mod signature_validator;
