//! # Gasoline Agent
//!
//! Background-process layer - wiring and main entry point.
//!
//! This crate contains:
//! - Application context (dependency injection)
//! - The headless page context stand-in
//! - Logging setup and the main entry point
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture

pub mod context;
pub mod page;
pub mod utils;

pub use context::*;
