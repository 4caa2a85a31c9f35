//! IRC text handling: control-code formatting, RFC 1459 casemapping,
//! markdown rendering and nickname derivation.

pub mod casemap;
pub mod formatting;
pub mod nicknames;
pub mod renderer;

pub use formatting::{
    bold, color, italic, strikethrough, strip_formatting, underline, Color, ColorSpec,
};
pub use nicknames::{format_discord_user, NicknameStyle};
pub use renderer::{collapse_newlines, IrcRenderer};
