//! Markdown parsing for Discord message bodies.
//!
//! Builds a small node tree on top of `pulldown-cmark` and applies the
//! Discord-specific inline extensions (spoiler spans, custom emoji). The
//! tree is transient: one is produced per message render and discarded
//! afterwards.

pub mod extensions;

pub use extensions::{emoji_only, emoji_url, EmojiRef};

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};

/// One node of a parsed message tree.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkdownNode {
    Text(String),
    Emphasis(Vec<MarkdownNode>),
    Strong(Vec<MarkdownNode>),
    Strikethrough(Vec<MarkdownNode>),
    Link {
        children: Vec<MarkdownNode>,
        url: String,
        title: Option<String>,
    },
    Image {
        children: Vec<MarkdownNode>,
        url: String,
        title: Option<String>,
    },
    BlockQuote(Vec<MarkdownNode>),
    Paragraph(Vec<MarkdownNode>),
    CodeSpan(String),
    CodeBlock {
        text: String,
        info: Option<String>,
    },
    /// Inline or block HTML. Dropped at render time.
    InlineHtml,
    /// Separator between block elements.
    BlankLine,
    SoftBreak,
    /// Discord spoiler span (`||...||`).
    Spoiler(Vec<MarkdownNode>),
    /// Discord custom emoji reference (`<:name:id>` / `<a:name:id>`).
    CustomEmoji {
        name: String,
        id: u64,
        animated: bool,
    },
}

/// Parse a Discord message body into a node tree.
///
/// Strikethrough is enabled in the generic grammar; the spoiler and
/// custom-emoji extensions are applied on top of the parsed tree.
pub fn parse(text: &str) -> Vec<MarkdownNode> {
    let mut builder = Builder::default();
    for event in Parser::new_ext(text, Options::ENABLE_STRIKETHROUGH) {
        match event {
            Event::Start(tag) => builder.start(tag),
            Event::End(_) => builder.end(),
            Event::Text(text) => builder.text(&text),
            Event::Code(code) => builder.push_node(MarkdownNode::CodeSpan(code.to_string())),
            Event::Html(_) | Event::InlineHtml(_) => builder.push_node(MarkdownNode::InlineHtml),
            Event::SoftBreak | Event::HardBreak => builder.push_node(MarkdownNode::SoftBreak),
            _ => {}
        }
    }
    extensions::apply(builder.finish())
}

/// Container being assembled while walking the event stream.
enum Frame {
    Emphasis,
    Strong,
    Strikethrough,
    Link { url: String, title: Option<String> },
    Image { url: String, title: Option<String> },
    BlockQuote,
    Paragraph,
    CodeBlock { text: String, info: Option<String> },
    /// HTML block; its contents are discarded.
    Html,
    List,
    Item,
    /// Unsupported container whose children splice into the parent.
    Transparent,
}

/// Whether a tag opens a new block element (as opposed to inline content
/// or list/table structure).
fn starts_new_block(tag: &Tag<'_>) -> bool {
    matches!(
        tag,
        Tag::Paragraph
            | Tag::BlockQuote(_)
            | Tag::CodeBlock(_)
            | Tag::HtmlBlock
            | Tag::List(_)
            | Tag::Heading { .. }
    )
}

#[derive(Default)]
struct Builder {
    root: Vec<MarkdownNode>,
    stack: Vec<(Frame, Vec<MarkdownNode>)>,
}

impl Builder {
    fn start(&mut self, tag: Tag<'_>) {
        // Keep a separator between consecutive block elements, at the top
        // level and inside block containers alike.
        if starts_new_block(&tag) && self.target_has_children() {
            self.push_node(MarkdownNode::BlankLine);
        }

        let frame = match tag {
            Tag::Paragraph => Frame::Paragraph,
            Tag::Emphasis => Frame::Emphasis,
            Tag::Strong => Frame::Strong,
            Tag::Strikethrough => Frame::Strikethrough,
            Tag::Link {
                dest_url, title, ..
            } => Frame::Link {
                url: dest_url.to_string(),
                title: (!title.is_empty()).then(|| title.to_string()),
            },
            Tag::Image {
                dest_url, title, ..
            } => Frame::Image {
                url: dest_url.to_string(),
                title: (!title.is_empty()).then(|| title.to_string()),
            },
            Tag::BlockQuote(_) => Frame::BlockQuote,
            Tag::CodeBlock(kind) => Frame::CodeBlock {
                text: String::new(),
                info: match kind {
                    CodeBlockKind::Fenced(info) if !info.is_empty() => Some(info.to_string()),
                    _ => None,
                },
            },
            Tag::HtmlBlock => Frame::Html,
            Tag::List(_) => Frame::List,
            Tag::Item => Frame::Item,
            _ => Frame::Transparent,
        };
        self.stack.push((frame, Vec::new()));
    }

    fn end(&mut self) {
        let Some((frame, mut children)) = self.stack.pop() else {
            return;
        };
        match frame {
            Frame::Paragraph => self.push_node(MarkdownNode::Paragraph(children)),
            Frame::Emphasis => self.push_node(MarkdownNode::Emphasis(children)),
            Frame::Strong => self.push_node(MarkdownNode::Strong(children)),
            Frame::Strikethrough => self.push_node(MarkdownNode::Strikethrough(children)),
            Frame::Link { url, title } => self.push_node(MarkdownNode::Link {
                children,
                url,
                title,
            }),
            Frame::Image { url, title } => self.push_node(MarkdownNode::Image {
                children,
                url,
                title,
            }),
            Frame::BlockQuote => self.push_node(MarkdownNode::BlockQuote(children)),
            Frame::CodeBlock { text, info } => self.push_node(MarkdownNode::CodeBlock {
                text: text.trim_end_matches('\n').to_string(),
                info,
            }),
            Frame::Html => self.push_node(MarkdownNode::InlineHtml),
            Frame::Item => {
                // Items become plain lines, one per item.
                for child in children {
                    self.push_node(child);
                }
                self.push_node(MarkdownNode::SoftBreak);
            }
            Frame::List => {
                if matches!(children.last(), Some(MarkdownNode::SoftBreak)) {
                    children.pop();
                }
                for child in children {
                    self.push_node(child);
                }
            }
            Frame::Transparent => {
                for child in children {
                    self.push_node(child);
                }
            }
        }
    }

    fn text(&mut self, text: &str) {
        if let Some((Frame::CodeBlock { text: buffer, .. }, _)) = self.stack.last_mut() {
            buffer.push_str(text);
            return;
        }
        self.push_node(MarkdownNode::Text(text.to_string()));
    }

    fn target_has_children(&self) -> bool {
        match self.stack.last() {
            Some((_, children)) => !children.is_empty(),
            None => !self.root.is_empty(),
        }
    }

    fn push_node(&mut self, node: MarkdownNode) {
        let target = match self.stack.last_mut() {
            Some((_, children)) => children,
            None => &mut self.root,
        };
        // pulldown-cmark splits text runs at escapes; keep runs merged so
        // the inline extensions see whole delimiters.
        if let MarkdownNode::Text(text) = &node {
            if let Some(MarkdownNode::Text(previous)) = target.last_mut() {
                previous.push_str(text);
                return;
            }
        }
        target.push(node);
    }

    fn finish(mut self) -> Vec<MarkdownNode> {
        while !self.stack.is_empty() {
            self.end();
        }
        self.root
    }
}
