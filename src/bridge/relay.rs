//! Per-pairing message dispatch between one IRC channel and one Discord
//! channel.
//!
//! A [`MessageRelay`] receives normalized inbound events from both
//! networks, filters them down to its own channel pairing, translates
//! Discord content into IRC lines (or forwards IRC text to Discord), and
//! emits sends through the gateway traits. Sends are best effort: a
//! failed line is logged and the rest of the event continues.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::common::error::{RelayError, RelayResult};
use crate::common::messages::{ChannelHandle, DiscordMessage, IrcMessage};
use crate::config::RelayConfig;
use crate::irc::casemap::irc_eq;
use crate::irc::nicknames::{format_discord_user, NicknameStyle};
use crate::irc::renderer::{collapse_newlines, IrcRenderer};
use crate::markdown::{emoji_only, emoji_url};

use super::gateway::{DiscordGateway, IrcGateway};

/// Network connections attached by [`MessageRelay::load`].
struct Gateways {
    irc: Arc<dyn IrcGateway>,
    discord: Arc<dyn DiscordGateway>,
}

/// Relays messages for one configured channel pairing.
pub struct MessageRelay {
    config: RelayConfig,
    renderer: IrcRenderer,
    gateways: Option<Gateways>,
    /// Discord channel handle, resolved lazily on first use.
    channel: OnceCell<ChannelHandle>,
}

impl MessageRelay {
    /// Create a relay from its configuration.
    pub fn new(config: RelayConfig) -> Self {
        Self {
            config,
            renderer: IrcRenderer::new(),
            gateways: None,
            channel: OnceCell::new(),
        }
    }

    /// The relay's configuration.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Attach the relay to its network connections.
    ///
    /// Must be called before any events are handled.
    pub fn load(&mut self, irc: Arc<dyn IrcGateway>, discord: Arc<dyn DiscordGateway>) {
        self.gateways = Some(Gateways { irc, discord });
    }

    fn gateways(&self) -> RelayResult<&Gateways> {
        self.gateways.as_ref().ok_or(RelayError::NotLoaded)
    }

    /// Handle one inbound Discord message.
    pub async fn handle_discord_message(&self, message: &DiscordMessage) -> RelayResult<()> {
        let gateways = self.gateways()?;

        if message.author.is_bot {
            return Ok(());
        }
        if message.channel_id != self.config.discord_channel_id {
            return Ok(());
        }

        let nickname = format_discord_user(&message.author, &self.config.nickname_style());

        // Stickers short-circuit all other content. The API allows several
        // per message but clients only show one, so only the first is
        // relayed.
        if self.config.relay_stickers {
            if let Some(sticker) = message.stickers.first() {
                self.send_irc_line(
                    gateways,
                    format!("<{nickname}> Sticker: {} ({})", sticker.name, sticker.url),
                )
                .await;
                return Ok(());
            }
        }

        // Messages that are exactly one custom emoji get the same
        // treatment as stickers; the image URL comes straight from the
        // emoji id, no lookup needed.
        let emoji = if self.config.expand_emotes_as_text {
            emoji_only(&message.content)
        } else {
            None
        };
        match emoji {
            Some(emoji) => {
                let url = emoji_url(emoji.id, emoji.animated);
                self.send_irc_line(gateways, format!("<{nickname}> Emoji: {} ({url})", emoji.name))
                    .await;
            }
            None => {
                let reply_prefix = match &message.reply_to {
                    Some(author) => {
                        let style = NicknameStyle {
                            colorize: false,
                            ..self.config.nickname_style()
                        };
                        format!("[Replying to {}] ", format_discord_user(author, &style))
                    }
                    None => String::new(),
                };

                let rendered =
                    collapse_newlines(&self.renderer.render_message(&message.content));
                for part in rendered.lines() {
                    self.send_irc_line(gateways, format!("<{nickname}> {reply_prefix}{part}"))
                        .await;
                }
            }
        }

        // Each attachment goes out as its own line with the URL.
        for attachment in &message.attachments {
            self.send_irc_line(gateways, format!("<{nickname}> {attachment}"))
                .await;
        }

        Ok(())
    }

    /// Handle one inbound IRC message.
    pub async fn handle_irc_message(&self, message: &IrcMessage) -> RelayResult<()> {
        let gateways = self.gateways()?;

        if !irc_eq(&message.channel, &self.config.irc_channel) {
            return Ok(());
        }

        let channel = self.resolve_channel(gateways).await?;

        // Prefer webhook delivery so the message carries the IRC sender's
        // own name and, when one matches a guild member, their avatar.
        if let Some(webhook_url) = &self.config.discord_webhook_url {
            let member = gateways
                .discord
                .resolve_member_by_name(channel, &message.sender)
                .await;
            let avatar_url = member.and_then(|member| member.avatar_url);
            if let Err(e) = gateways
                .discord
                .send_webhook(
                    webhook_url,
                    &message.sender,
                    avatar_url.as_deref(),
                    &message.content,
                )
                .await
            {
                warn!("Failed to relay message via webhook: {}", e);
            }
            return Ok(());
        }

        let content = format!("<{}> {}", message.sender, message.content);
        if let Err(e) = gateways.discord.send_message(channel, &content).await {
            warn!("Failed to relay message to Discord: {}", e);
        }

        Ok(())
    }

    /// Resolve and cache the Discord channel handle.
    async fn resolve_channel(&self, gateways: &Gateways) -> RelayResult<&ChannelHandle> {
        let channel_id = self.config.discord_channel_id;
        self.channel
            .get_or_try_init(|| async {
                let handle = gateways
                    .discord
                    .resolve_channel(channel_id)
                    .await
                    .ok_or(RelayError::ChannelNotFound { channel_id })?;
                if !handle.messageable {
                    return Err(RelayError::ChannelNotMessageable { channel_id });
                }
                info!(
                    "Resolved Discord channel {} for {}",
                    channel_id, self.config.irc_channel
                );
                Ok(handle)
            })
            .await
    }

    /// Send one line to the paired IRC channel, best effort.
    async fn send_irc_line(&self, gateways: &Gateways, line: String) {
        if let Err(e) = gateways
            .irc
            .send_privmsg(&self.config.irc_channel, &line)
            .await
        {
            warn!("Failed to relay line to {}: {}", self.config.irc_channel, e);
            debug!("Dropped line: {}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::SendError;
    use crate::common::messages::{DiscordUser, MemberProfile, Sticker};
    use crate::irc::formatting::strip_formatting;

    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingIrc {
        lines: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl IrcGateway for RecordingIrc {
        async fn send_privmsg(&self, channel: &str, text: &str) -> Result<(), SendError> {
            self.lines
                .lock()
                .unwrap()
                .push((channel.to_string(), text.to_string()));
            if self.fail {
                return Err(SendError::Closed);
            }
            Ok(())
        }
    }

    enum WebhookMode {
        None,
        WithMember,
        WithoutMember,
    }

    struct RecordingDiscord {
        messages: Mutex<Vec<String>>,
        webhooks: Mutex<Vec<(String, String, Option<String>, String)>>,
        resolutions: Mutex<u32>,
        channel: Option<ChannelHandle>,
        webhook_mode: WebhookMode,
    }

    impl RecordingDiscord {
        fn new(channel: Option<ChannelHandle>) -> Self {
            Self {
                messages: Mutex::new(Vec::new()),
                webhooks: Mutex::new(Vec::new()),
                resolutions: Mutex::new(0),
                channel,
                webhook_mode: WebhookMode::None,
            }
        }
    }

    #[async_trait]
    impl DiscordGateway for RecordingDiscord {
        async fn resolve_channel(&self, _channel_id: u64) -> Option<ChannelHandle> {
            *self.resolutions.lock().unwrap() += 1;
            self.channel.clone()
        }

        async fn send_message(
            &self,
            _channel: &ChannelHandle,
            content: &str,
        ) -> Result<(), SendError> {
            self.messages.lock().unwrap().push(content.to_string());
            Ok(())
        }

        async fn send_webhook(
            &self,
            webhook_url: &str,
            username: &str,
            avatar_url: Option<&str>,
            content: &str,
        ) -> Result<(), SendError> {
            self.webhooks.lock().unwrap().push((
                webhook_url.to_string(),
                username.to_string(),
                avatar_url.map(str::to_string),
                content.to_string(),
            ));
            Ok(())
        }

        async fn resolve_member_by_name(
            &self,
            _channel: &ChannelHandle,
            name: &str,
        ) -> Option<MemberProfile> {
            match self.webhook_mode {
                WebhookMode::WithMember => Some(MemberProfile {
                    display_name: name.to_string(),
                    avatar_url: Some(format!("https://cdn.example/avatars/{name}.png")),
                }),
                _ => None,
            }
        }
    }

    fn test_config() -> RelayConfig {
        RelayConfig {
            irc_channel: "#bridge".to_string(),
            discord_channel_id: 42,
            discord_webhook_url: None,
            colorize_irc_nicknames: false,
            use_discord_nicknames: true,
            use_discord_usernames_with_nicknames: false,
            prevent_self_pinging: false,
            expand_emotes_as_text: true,
            relay_stickers: true,
        }
    }

    fn loaded_relay(
        config: RelayConfig,
        discord: RecordingDiscord,
    ) -> (MessageRelay, Arc<RecordingIrc>, Arc<RecordingDiscord>) {
        let irc = Arc::new(RecordingIrc::default());
        let discord = Arc::new(discord);
        let mut relay = MessageRelay::new(config);
        relay.load(irc.clone(), discord.clone());
        (relay, irc, discord)
    }

    fn discord_event(content: &str) -> DiscordMessage {
        DiscordMessage::new(DiscordUser::new("alice"), 42, content)
    }

    fn sent_lines(irc: &RecordingIrc) -> Vec<String> {
        irc.lines
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    #[test]
    fn test_not_loaded_errors() {
        tokio_test::block_on(async {
            let relay = MessageRelay::new(test_config());
            let result = relay.handle_discord_message(&discord_event("hi")).await;
            assert_eq!(result.unwrap_err(), RelayError::NotLoaded);

            let result = relay
                .handle_irc_message(&IrcMessage::new("bob", "#bridge", "hi"))
                .await;
            assert_eq!(result.unwrap_err(), RelayError::NotLoaded);
        });
    }

    #[test]
    fn test_discord_channel_mismatch_dropped() {
        tokio_test::block_on(async {
            let (relay, irc, _) = loaded_relay(test_config(), RecordingDiscord::new(None));
            let mut event = discord_event("hello");
            event.channel_id = 999;
            relay.handle_discord_message(&event).await.unwrap();
            assert!(sent_lines(&irc).is_empty());
        });
    }

    #[test]
    fn test_bot_author_dropped() {
        tokio_test::block_on(async {
            let (relay, irc, _) = loaded_relay(test_config(), RecordingDiscord::new(None));
            let mut event = discord_event("hello");
            event.author.is_bot = true;
            relay.handle_discord_message(&event).await.unwrap();
            assert!(sent_lines(&irc).is_empty());
        });
    }

    #[test]
    fn test_plain_message_relayed_with_nickname() {
        tokio_test::block_on(async {
            let (relay, irc, _) = loaded_relay(test_config(), RecordingDiscord::new(None));
            relay
                .handle_discord_message(&discord_event("hello world"))
                .await
                .unwrap();
            assert_eq!(sent_lines(&irc), vec!["<alice> hello world"]);
            let channels: Vec<_> = irc
                .lines
                .lock()
                .unwrap()
                .iter()
                .map(|(channel, _)| channel.clone())
                .collect();
            assert_eq!(channels, vec!["#bridge"]);
        });
    }

    #[test]
    fn test_multiline_message_one_line_each() {
        tokio_test::block_on(async {
            let (relay, irc, _) = loaded_relay(test_config(), RecordingDiscord::new(None));
            relay
                .handle_discord_message(&discord_event("one\ntwo\nthree"))
                .await
                .unwrap();
            assert_eq!(
                sent_lines(&irc),
                vec!["<alice> one", "<alice> two", "<alice> three"]
            );
        });
    }

    #[test]
    fn test_long_message_collapsed_to_single_line() {
        tokio_test::block_on(async {
            let (relay, irc, _) = loaded_relay(test_config(), RecordingDiscord::new(None));
            relay
                .handle_discord_message(&discord_event("a\nb\nc\nd\ne\nf"))
                .await
                .unwrap();
            assert_eq!(sent_lines(&irc), vec!["<alice> a b c d e f"]);
        });
    }

    #[test]
    fn test_sticker_short_circuits_everything() {
        tokio_test::block_on(async {
            let (relay, irc, _) = loaded_relay(test_config(), RecordingDiscord::new(None));
            let mut event = discord_event("ignored body");
            event.stickers = vec![
                Sticker {
                    name: "cat".to_string(),
                    url: "https://cdn.example/cat.png".to_string(),
                },
                Sticker {
                    name: "dog".to_string(),
                    url: "https://cdn.example/dog.png".to_string(),
                },
            ];
            event.attachments = vec!["https://cdn.example/file.png".to_string()];
            relay.handle_discord_message(&event).await.unwrap();
            // only the first sticker, and nothing else
            assert_eq!(
                sent_lines(&irc),
                vec!["<alice> Sticker: cat (https://cdn.example/cat.png)"]
            );
        });
    }

    #[test]
    fn test_sticker_flag_disabled_falls_through() {
        tokio_test::block_on(async {
            let mut config = test_config();
            config.relay_stickers = false;
            let (relay, irc, _) = loaded_relay(config, RecordingDiscord::new(None));
            let mut event = discord_event("body");
            event.stickers = vec![Sticker {
                name: "cat".to_string(),
                url: "https://cdn.example/cat.png".to_string(),
            }];
            relay.handle_discord_message(&event).await.unwrap();
            assert_eq!(sent_lines(&irc), vec!["<alice> body"]);
        });
    }

    #[test]
    fn test_emoji_only_message_short_circuits() {
        tokio_test::block_on(async {
            let (relay, irc, _) = loaded_relay(test_config(), RecordingDiscord::new(None));
            relay
                .handle_discord_message(&discord_event("<a:wave:123456789012345678>"))
                .await
                .unwrap();
            let lines = sent_lines(&irc);
            assert_eq!(lines.len(), 1);
            assert!(lines[0].contains("Emoji: wave"));
            assert!(lines[0].contains("123456789012345678"));
            assert!(lines[0].contains(".gif"));
        });
    }

    #[test]
    fn test_emoji_with_trailing_text_renders_inline() {
        tokio_test::block_on(async {
            let (relay, irc, _) = loaded_relay(test_config(), RecordingDiscord::new(None));
            relay
                .handle_discord_message(&discord_event("<:wave:123456789012345678> hi"))
                .await
                .unwrap();
            assert_eq!(sent_lines(&irc), vec!["<alice> :wave: hi"]);
        });
    }

    #[test]
    fn test_attachments_follow_rendered_body() {
        tokio_test::block_on(async {
            let (relay, irc, _) = loaded_relay(test_config(), RecordingDiscord::new(None));
            let mut event = discord_event("look at this");
            event.attachments = vec![
                "https://cdn.example/a.png".to_string(),
                "https://cdn.example/b.png".to_string(),
            ];
            relay.handle_discord_message(&event).await.unwrap();
            assert_eq!(
                sent_lines(&irc),
                vec![
                    "<alice> look at this",
                    "<alice> https://cdn.example/a.png",
                    "<alice> https://cdn.example/b.png",
                ]
            );
        });
    }

    #[test]
    fn test_reply_prefix_on_each_line() {
        tokio_test::block_on(async {
            let (relay, irc, _) = loaded_relay(test_config(), RecordingDiscord::new(None));
            let mut event = discord_event("yes\nagreed");
            event.reply_to = Some(DiscordUser::new("bob"));
            relay.handle_discord_message(&event).await.unwrap();
            assert_eq!(
                sent_lines(&irc),
                vec![
                    "<alice> [Replying to bob] yes",
                    "<alice> [Replying to bob] agreed",
                ]
            );
        });
    }

    #[test]
    fn test_reply_prefix_never_colorized() {
        tokio_test::block_on(async {
            let mut config = test_config();
            config.colorize_irc_nicknames = true;
            let (relay, irc, _) = loaded_relay(config, RecordingDiscord::new(None));
            let mut event = discord_event("ok");
            event.reply_to = Some(DiscordUser::new("bob"));
            relay.handle_discord_message(&event).await.unwrap();
            let lines = sent_lines(&irc);
            let prefix_start = lines[0].find("[Replying to ").unwrap();
            // author tag is colorized, the replied-to name is not
            assert!(lines[0].starts_with('<'));
            assert!(!lines[0][prefix_start..].contains('\x03'));
            assert_eq!(strip_formatting(&lines[0]), "<alice> [Replying to bob] ok");
        });
    }

    #[test]
    fn test_send_failure_does_not_stop_event() {
        tokio_test::block_on(async {
            let irc = Arc::new(RecordingIrc {
                lines: Mutex::new(Vec::new()),
                fail: true,
            });
            let discord = Arc::new(RecordingDiscord::new(None));
            let mut relay = MessageRelay::new(test_config());
            relay.load(irc.clone(), discord);
            relay
                .handle_discord_message(&discord_event("one\ntwo"))
                .await
                .unwrap();
            // both lines were attempted despite the first failing
            assert_eq!(irc.lines.lock().unwrap().len(), 2);
        });
    }

    #[test]
    fn test_irc_channel_mismatch_dropped() {
        tokio_test::block_on(async {
            let discord = RecordingDiscord::new(Some(ChannelHandle {
                channel_id: 42,
                messageable: true,
            }));
            let (relay, _, discord) = loaded_relay(test_config(), discord);
            relay
                .handle_irc_message(&IrcMessage::new("bob", "#other", "hi"))
                .await
                .unwrap();
            assert!(discord.messages.lock().unwrap().is_empty());
            assert_eq!(*discord.resolutions.lock().unwrap(), 0);
        });
    }

    #[test]
    fn test_irc_channel_match_is_case_insensitive() {
        tokio_test::block_on(async {
            let discord = RecordingDiscord::new(Some(ChannelHandle {
                channel_id: 42,
                messageable: true,
            }));
            let (relay, _, discord) = loaded_relay(test_config(), discord);
            relay
                .handle_irc_message(&IrcMessage::new("bob", "#BRIDGE", "hello"))
                .await
                .unwrap();
            assert_eq!(
                *discord.messages.lock().unwrap(),
                vec!["<bob> hello".to_string()]
            );
        });
    }

    #[test]
    fn test_channel_handle_resolved_once() {
        tokio_test::block_on(async {
            let discord = RecordingDiscord::new(Some(ChannelHandle {
                channel_id: 42,
                messageable: true,
            }));
            let (relay, _, discord) = loaded_relay(test_config(), discord);
            for _ in 0..3 {
                relay
                    .handle_irc_message(&IrcMessage::new("bob", "#bridge", "hi"))
                    .await
                    .unwrap();
            }
            assert_eq!(*discord.resolutions.lock().unwrap(), 1);
            assert_eq!(discord.messages.lock().unwrap().len(), 3);
        });
    }

    #[test]
    fn test_unresolvable_channel_errors() {
        tokio_test::block_on(async {
            let (relay, _, _) = loaded_relay(test_config(), RecordingDiscord::new(None));
            let result = relay
                .handle_irc_message(&IrcMessage::new("bob", "#bridge", "hi"))
                .await;
            assert_eq!(
                result.unwrap_err(),
                RelayError::ChannelNotFound { channel_id: 42 }
            );
        });
    }

    #[test]
    fn test_non_messageable_channel_errors() {
        tokio_test::block_on(async {
            let discord = RecordingDiscord::new(Some(ChannelHandle {
                channel_id: 42,
                messageable: false,
            }));
            let (relay, _, _) = loaded_relay(test_config(), discord);
            let result = relay
                .handle_irc_message(&IrcMessage::new("bob", "#bridge", "hi"))
                .await;
            assert_eq!(
                result.unwrap_err(),
                RelayError::ChannelNotMessageable { channel_id: 42 }
            );
        });
    }

    #[test]
    fn test_webhook_preferred_with_member_avatar() {
        tokio_test::block_on(async {
            let mut config = test_config();
            config.discord_webhook_url = Some("https://hooks.example/1".to_string());
            let mut discord = RecordingDiscord::new(Some(ChannelHandle {
                channel_id: 42,
                messageable: true,
            }));
            discord.webhook_mode = WebhookMode::WithMember;
            let (relay, _, discord) = loaded_relay(config, discord);
            relay
                .handle_irc_message(&IrcMessage::new("bob", "#bridge", "\x02hello\x02"))
                .await
                .unwrap();
            // nothing goes through the plain path
            assert!(discord.messages.lock().unwrap().is_empty());
            let webhooks = discord.webhooks.lock().unwrap();
            assert_eq!(webhooks.len(), 1);
            let (url, username, avatar, content) = &webhooks[0];
            assert_eq!(url, "https://hooks.example/1");
            assert_eq!(username, "bob");
            assert_eq!(
                avatar.as_deref(),
                Some("https://cdn.example/avatars/bob.png")
            );
            // control codes are forwarded untouched
            assert_eq!(content, "\x02hello\x02");
        });
    }

    #[test]
    fn test_webhook_without_member_has_no_avatar() {
        tokio_test::block_on(async {
            let mut config = test_config();
            config.discord_webhook_url = Some("https://hooks.example/1".to_string());
            let mut discord = RecordingDiscord::new(Some(ChannelHandle {
                channel_id: 42,
                messageable: true,
            }));
            discord.webhook_mode = WebhookMode::WithoutMember;
            let (relay, _, discord) = loaded_relay(config, discord);
            relay
                .handle_irc_message(&IrcMessage::new("eve", "#bridge", "hi"))
                .await
                .unwrap();
            let webhooks = discord.webhooks.lock().unwrap();
            assert_eq!(webhooks.len(), 1);
            assert_eq!(webhooks[0].1, "eve");
            assert_eq!(webhooks[0].2, None);
        });
    }
}
