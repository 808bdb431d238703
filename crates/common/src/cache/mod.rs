//! Asynchronously initialised values
//!
//! An [`InitGate`] wraps a value that is populated by a background read (for
//! example a feature flag loaded from persistent storage). Readers either peek
//! at the current value or wait for the first load with a bounded timeout; a
//! timeout is reported as [`GateRead::Unknown`] and never replaced by a guessed
//! default.
//!
//! Writes go through the single [`GateWriter`] returned by [`init_gate`].
//! There is no way to obtain a second writer, so whoever holds it is the only
//! component able to change the value.
//!
//! ```
//! use std::time::Duration;
//!
//! use gasoline_common::cache::{init_gate, GateRead};
//!
//! # async fn example() {
//! let (writer, gate) = init_gate::<bool>();
//! assert_eq!(gate.wait_ready(Duration::from_millis(5)).await, GateRead::Unknown);
//!
//! writer.set(true);
//! assert_eq!(gate.wait_ready(Duration::from_millis(5)).await, GateRead::Ready(true));
//! # }
//! ```

pub mod init_gate;

pub use init_gate::{init_gate, GateRead, GateWriter, InitGate};
