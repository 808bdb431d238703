//! Sync loop collaborators

pub mod ports;
