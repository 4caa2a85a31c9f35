//! IRC-visible display names for Discord authors.
//!
//! Derives one name tag per author: resolved through the nickname
//! precedence chain, sanitized so it cannot ping a same-named IRC user,
//! and colorized deterministically so an author keeps their color across
//! messages.

use crate::common::messages::DiscordUser;

use super::formatting::{color, Color};

/// Palette used for nickname colorization.
pub const NICK_COLORS: [Color; 12] = [
    Color::LightBlue,
    Color::Blue,
    Color::LightRed,
    Color::Brown,
    Color::LightGreen,
    Color::Green,
    Color::Purple,
    Color::Pink,
    Color::Orange,
    Color::Yellow,
    Color::Cyan,
    Color::LightCyan,
];

/// Invisible character inserted to defeat nickname ping matching.
const ZERO_WIDTH_JOINER: char = '\u{200d}';

/// Nickname formatting options, taken from the relay configuration.
#[derive(Debug, Clone, Copy)]
pub struct NicknameStyle {
    /// Apply deterministic colorization.
    pub colorize: bool,
    /// Resolve through nicknames instead of going straight to the
    /// account username.
    pub use_nickname: bool,
    /// Append the username when it differs from the resolved name.
    pub use_username: bool,
    /// Insert a zero-width joiner into each name piece.
    pub prevent_pinging: bool,
}

impl Default for NicknameStyle {
    fn default() -> Self {
        Self {
            colorize: true,
            use_nickname: true,
            use_username: true,
            prevent_pinging: true,
        }
    }
}

/// Insert a zero-width joiner after the first character so the name no
/// longer matches a recognized IRC nickname, while staying visually
/// identical.
pub fn sanitize_nickname(nickname: &str) -> String {
    let mut chars = nickname.chars();
    match chars.next() {
        Some(first) => {
            let mut out = String::with_capacity(nickname.len() + ZERO_WIDTH_JOINER.len_utf8());
            out.push(first);
            out.push(ZERO_WIDTH_JOINER);
            out.push_str(chars.as_str());
            out
        }
        None => String::new(),
    }
}

/// Select a stable palette color for a username.
///
/// Seeded from the first character and length of the raw username, so the
/// same account always gets the same color no matter which nickname or
/// sanitization applies.
pub fn select_color(username: &str) -> Color {
    let first = username.chars().next().map(|c| c as usize).unwrap_or(0);
    let index = (first + username.chars().count()) / NICK_COLORS.len() % NICK_COLORS.len();
    NICK_COLORS[index]
}

/// Return an IRC-formatted name tag for a Discord author.
pub fn format_discord_user(user: &DiscordUser, style: &NicknameStyle) -> String {
    let sanitize = |name: &str| {
        if style.prevent_pinging {
            sanitize_nickname(name)
        } else {
            name.to_string()
        }
    };

    let resolved = if style.use_nickname {
        user.display_name()
    } else {
        user.username.as_str()
    };

    let name = if style.use_username && resolved.to_lowercase() != user.username.to_lowercase() {
        format!("{} ({})", sanitize(resolved), sanitize(&user.username))
    } else {
        sanitize(resolved)
    };

    if style.colorize {
        let selected = select_color(&user.username);
        color(&name, selected, None).unwrap_or(name)
    } else {
        name
    }
}
