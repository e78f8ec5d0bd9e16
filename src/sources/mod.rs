//! [`MessageSource`](crate::source::MessageSource) implementations

pub mod channel;
pub mod replay;

pub use channel::{ChannelSource, MessageSender};
pub use replay::ReplaySource;
