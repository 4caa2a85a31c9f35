//! Markdown-to-IRC rendering.
//!
//! Walks a parsed message tree bottom-up and maps every node kind to IRC
//! control-code text. The output may contain embedded newlines from soft
//! breaks and block quotes; [`collapse_newlines`] caps how many lines one
//! body may produce before the dispatcher splits it into PRIVMSG lines.

use crate::markdown::{self, MarkdownNode};

use super::formatting::{bold, color, italic, strikethrough, Color};

/// Renders parsed markdown as IRC-formatted text.
///
/// Stateless and reentrant; one instance can be shared across relays or
/// rebuilt per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct IrcRenderer;

impl IrcRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Parse and render a full message body.
    pub fn render_message(&self, content: &str) -> String {
        self.render(&markdown::parse(content))
    }

    /// Render a node sequence, children before parents.
    pub fn render(&self, nodes: &[MarkdownNode]) -> String {
        nodes.iter().map(|node| self.render_node(node)).collect()
    }

    fn render_node(&self, node: &MarkdownNode) -> String {
        match node {
            MarkdownNode::Text(text) => text.clone(),
            MarkdownNode::Paragraph(children) => self.render(children),
            MarkdownNode::Strong(children) => bold(&self.render(children)),
            MarkdownNode::Emphasis(children) => italic(&self.render(children)),
            MarkdownNode::Strikethrough(children) => strikethrough(&self.render(children)),
            MarkdownNode::Link {
                children,
                url,
                title,
            } => render_link(&self.render(children), url, title.as_deref()),
            MarkdownNode::Image {
                children,
                url,
                title,
            } => render_link(&self.render(children), url, title.as_deref()),
            MarkdownNode::BlockQuote(children) => {
                let inner = self.render(children);
                inner
                    .lines()
                    .map(|line| format!("> {line}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            MarkdownNode::CodeSpan(text) => format!("[CODE] {text}"),
            MarkdownNode::CodeBlock { text, info } => match info {
                Some(info) => format!("[CODE | {info}] {text}"),
                None => format!("[CODE] {text}"),
            },
            MarkdownNode::InlineHtml => String::new(),
            MarkdownNode::BlankLine => " ".to_string(),
            MarkdownNode::SoftBreak => "\n".to_string(),
            MarkdownNode::Spoiler(children) => {
                // Black on black, hidden until selected, like the source
                // platform hides it until clicked.
                let inner = self.render(children);
                color(&inner, Color::Black, Some(Color::Black.into())).unwrap_or(inner)
            }
            MarkdownNode::CustomEmoji { name, .. } => format!(":{name}:"),
        }
    }
}

fn render_link(text: &str, url: &str, title: Option<&str>) -> String {
    let mut output = if text == url {
        text.to_string()
    } else {
        format!("{url} ({text})")
    };
    if let Some(title) = title {
        if title != text && title != url {
            output = format!("{output} ({title})");
        }
    }
    output
}

/// Cap the number of lines one rendered body may produce.
///
/// Bodies with more than 3 line breaks have every newline replaced by a
/// space; shorter bodies keep their line structure.
pub fn collapse_newlines(text: &str) -> String {
    if text.matches('\n').count() > 3 {
        text.replace('\n', " ")
    } else {
        text.to_string()
    }
}
