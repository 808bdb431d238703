//! Sync transport against the local dev server
//!
//! # Architecture
//!
//! - One `POST /sync` per poll cycle, JSON in both directions
//! - Every request carries the client identification headers
//! - A hard timeout on each call; no retries here, the sync loop's circuit
//!   breaker owns failure handling

pub mod errors;
pub mod transport;

pub use errors::{TransportError, TransportErrorCategory};
pub use transport::HttpSyncTransport;
