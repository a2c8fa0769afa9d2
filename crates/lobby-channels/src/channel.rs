use async_trait::async_trait;

use crate::{error::ChannelError, types::{ChannelStatus, OutboundEvent}};

/// Common interface implemented by every transport adapter (webchat, voice,
/// messaging gateways, …). This crate owns the contract and one in-process
/// reference adapter (§4.13); concrete telephony/messaging integrations are
/// separate crates that depend on it.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Stable lowercase identifier, unique across adapters registered in a
    /// [`ChannelManager`](crate::manager::ChannelManager).
    fn name(&self) -> &str;

    async fn connect(&mut self) -> Result<(), ChannelError>;

    async fn disconnect(&mut self) -> Result<(), ChannelError>;

    /// Deliver a single outbound event. `&self` so a connected adapter can
    /// send concurrently without a mutable borrow.
    async fn send(&self, event: &OutboundEvent) -> Result<(), ChannelError>;

    fn status(&self) -> ChannelStatus;
}
