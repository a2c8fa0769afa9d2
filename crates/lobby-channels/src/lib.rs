pub mod channel;
pub mod error;
pub mod manager;
pub mod types;
pub mod webchat;

pub use channel::Channel;
pub use error::ChannelError;
pub use manager::ChannelManager;
pub use types::{ChannelStatus, EventKind, InboundMessage, OutboundEvent};
pub use webchat::WebchatChannel;
