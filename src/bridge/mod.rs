//! Relay dispatch between Discord and IRC.
//!
//! Each configured channel pairing gets one [`MessageRelay`], which
//! receives normalized inbound events from both networks and emits
//! outbound sends through the [`gateway`] traits implemented by the
//! network clients.

pub mod gateway;
pub mod relay;

pub use gateway::{DiscordGateway, IrcGateway};
pub use relay::MessageRelay;
