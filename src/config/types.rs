//! Configuration type definitions.

use serde::Deserialize;

use crate::irc::nicknames::NicknameStyle;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub irc: IrcConfig,
    pub discord: DiscordConfig,
    /// Channel pairings, one `[[relay]]` table each.
    #[serde(default, rename = "relay")]
    pub relays: Vec<RelayConfig>,
}

/// IRC server connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IrcConfig {
    pub server: String,
    pub port: u16,
    pub ssl: bool,
    pub nickname: String,
    pub username: Option<String>,
    pub realname: Option<String>,
    pub password: Option<String>,
}

impl IrcConfig {
    /// Username, defaulting to the nickname.
    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.nickname)
    }

    /// Realname, defaulting to the nickname.
    pub fn realname(&self) -> &str {
        self.realname.as_deref().unwrap_or(&self.nickname)
    }
}

/// Discord bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    pub token: String,
}

/// One Discord/IRC channel pairing.
///
/// Feature flags default to enabled when omitted from the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// IRC channel name (matched case-insensitively).
    pub irc_channel: String,
    /// Discord channel ID.
    pub discord_channel_id: u64,
    /// Webhook for IRC -> Discord delivery; plain bot messages are used
    /// when unset.
    #[serde(default)]
    pub discord_webhook_url: Option<String>,
    /// Color relayed nicknames deterministically per author.
    #[serde(default = "default_true")]
    pub colorize_irc_nicknames: bool,
    /// Prefer guild nicknames over account usernames.
    #[serde(default = "default_true")]
    pub use_discord_nicknames: bool,
    /// Show the username next to a differing nickname.
    #[serde(default = "default_true")]
    pub use_discord_usernames_with_nicknames: bool,
    /// Insert a zero-width joiner so relayed names do not ping.
    #[serde(default = "default_true")]
    pub prevent_self_pinging: bool,
    /// Expand emoji-only messages into a dedicated name + image URL line.
    #[serde(default = "default_true")]
    pub expand_emotes_as_text: bool,
    /// Relay sticker messages.
    #[serde(default = "default_true")]
    pub relay_stickers: bool,
}

impl RelayConfig {
    /// Nickname formatting options derived from the feature flags.
    pub fn nickname_style(&self) -> NicknameStyle {
        NicknameStyle {
            colorize: self.colorize_irc_nicknames,
            use_nickname: self.use_discord_nicknames,
            use_username: self.use_discord_usernames_with_nicknames,
            prevent_pinging: self.prevent_self_pinging,
        }
    }
}

fn default_true() -> bool {
    true
}
