//! Utility modules for the agent binary

pub mod logging;
