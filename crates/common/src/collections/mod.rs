//! Specialized data structures
//!
//! - **[`ring_buffer`]**: bounded FIFO that evicts the oldest entry when full,
//!   used to cap buffered telemetry between sync cycles.

pub mod ring_buffer;

pub use ring_buffer::RingBuffer;
