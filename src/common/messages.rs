//! Canonical message types for bridge communication.
//!
//! These are the normalized inbound event records handed to a relay by
//! the network clients, plus the handle/profile types returned by the
//! Discord gateway lookups.

/// A Discord author, flattened into a single identity.
///
/// Guild members carry an optional per-guild nickname; bare users do not.
/// Both arrive as the same type so the relay never needs a subtype check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscordUser {
    /// Account username (unique and stable).
    pub username: String,
    /// Global display name, if set.
    pub global_name: Option<String>,
    /// Per-guild nickname, if the author resolved to a guild member.
    pub nickname: Option<String>,
    /// Whether the account is a bot.
    pub is_bot: bool,
}

impl DiscordUser {
    /// Create a plain user with no display name overrides.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            global_name: None,
            nickname: None,
            is_bot: false,
        }
    }

    /// Preferred display name.
    ///
    /// Prioritizes in order: guild nickname, global display name, account
    /// username.
    pub fn display_name(&self) -> &str {
        self.nickname
            .as_deref()
            .or(self.global_name.as_deref())
            .unwrap_or(&self.username)
    }
}

/// A sticker attached to a Discord message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sticker {
    pub name: String,
    pub url: String,
}

/// Normalized inbound Discord message event.
#[derive(Debug, Clone)]
pub struct DiscordMessage {
    /// Message author.
    pub author: DiscordUser,
    /// Discord channel ID the message was posted in.
    pub channel_id: u64,
    /// Raw markdown body.
    pub content: String,
    /// Attachment URLs, in upload order.
    pub attachments: Vec<String>,
    /// Attached stickers, in order.
    pub stickers: Vec<Sticker>,
    /// Author of the message this one replies to, when resolvable.
    pub reply_to: Option<DiscordUser>,
}

impl DiscordMessage {
    /// Create a bare message event with no attachments, stickers or reply.
    pub fn new(author: DiscordUser, channel_id: u64, content: impl Into<String>) -> Self {
        Self {
            author,
            channel_id,
            content: content.into(),
            attachments: Vec::new(),
            stickers: Vec::new(),
            reply_to: None,
        }
    }
}

/// Normalized inbound IRC message event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcMessage {
    /// Sender nickname (case-insensitive on the network).
    pub sender: String,
    /// Channel the message was seen in.
    pub channel: String,
    /// Message text.
    pub content: String,
}

impl IrcMessage {
    pub fn new(
        sender: impl Into<String>,
        channel: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            channel: channel.into(),
            content: content.into(),
        }
    }
}

/// Handle to a resolved Discord channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelHandle {
    pub channel_id: u64,
    /// Whether messages can be sent to this channel.
    pub messageable: bool,
}

/// Guild member profile resolved from a display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberProfile {
    pub display_name: String,
    pub avatar_url: Option<String>,
}
