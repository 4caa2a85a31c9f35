//! Outbound capability traits implemented by the network clients.
//!
//! The relay core never touches a socket; the Discord and IRC clients
//! implement these traits and hand them to [`super::MessageRelay::load`].

use async_trait::async_trait;

use crate::common::error::SendError;
use crate::common::messages::{ChannelHandle, MemberProfile};

/// Send capability into the IRC network.
#[async_trait]
pub trait IrcGateway: Send + Sync {
    /// Send one PRIVMSG line to a channel.
    async fn send_privmsg(&self, channel: &str, text: &str) -> Result<(), SendError>;
}

/// Send and lookup capability into Discord.
#[async_trait]
pub trait DiscordGateway: Send + Sync {
    /// Resolve a configured channel id to a handle, if the channel exists.
    ///
    /// Resolution is idempotent and side-effect free; the relay may call
    /// it redundantly if two events race before the first result lands.
    async fn resolve_channel(&self, channel_id: u64) -> Option<ChannelHandle>;

    /// Send a plain message to a resolved channel.
    async fn send_message(&self, channel: &ChannelHandle, content: &str)
        -> Result<(), SendError>;

    /// Send a message through a webhook, authored with an arbitrary
    /// username and avatar.
    async fn send_webhook(
        &self,
        webhook_url: &str,
        username: &str,
        avatar_url: Option<&str>,
        content: &str,
    ) -> Result<(), SendError>;

    /// Find a guild member whose recognizable name matches `name`.
    async fn resolve_member_by_name(
        &self,
        channel: &ChannelHandle,
        name: &str,
    ) -> Option<MemberProfile>;
}
