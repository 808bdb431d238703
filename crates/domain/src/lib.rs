//! # Gasoline Domain
//!
//! Wire and data types for the extension/dev-server sync protocol.
//!
//! This crate contains:
//! - Sync payloads (`SyncRequest`, `SyncResponse`) and command types
//! - The `CommandKind` routing table
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Protocol constants
//!
//! ## Architecture
//! - No dependencies on other Gasoline crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
