//! In-process cross-context messaging

pub mod channel;

pub use channel::{context_channel, ChannelMessenger, ContextEndpoint, ContextRequest};
