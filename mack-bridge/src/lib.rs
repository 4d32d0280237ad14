pub mod bridge;
pub mod protocol;
pub mod view;

pub use bridge::{
    bridge, HostBridge, HostInput, InboundPump, InboundSender, PendingRequest, ViewBridge,
};
pub use protocol::{InboundChannel, InboundMessage, Operation, OutboundChannel, OutboundMessage};
