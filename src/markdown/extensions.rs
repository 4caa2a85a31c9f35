//! Discord-specific inline grammar extensions.
//!
//! Spoiler spans (`||...||`) and custom emoji references (`<:name:id>`,
//! `<a:name:id>`) are not CommonMark. Their delimiters survive generic
//! parsing as literal text, so both extensions run as a rewrite pass over
//! the parsed tree: emoji references are split out of text runs, and
//! spoiler delimiters are matched up (possibly across sibling inline
//! nodes) and their span wrapped in a spoiler node. This gives the same
//! result as registering the rules ahead of emphasis resolution.

use fancy_regex::Regex;
use once_cell::sync::Lazy;

use super::MarkdownNode;

/// One custom emoji reference anywhere in a text run.
static EMOJI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(?P<animated>a?):(?P<name>[a-zA-Z0-9_]{2,32}):(?P<id>[0-9]{18,22})>").unwrap()
});

/// A body that is exactly one custom emoji reference and nothing else.
static EMOJI_ONLY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\A<(?P<animated>a?):(?P<name>[a-zA-Z0-9_]{2,32}):(?P<id>[0-9]{18,22})>\z")
        .unwrap()
});

/// Base URL for Discord emoji image assets.
const EMOJI_CDN: &str = "https://cdn.discordapp.com/emojis";

/// A custom emoji reference extracted from a message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmojiRef {
    pub name: String,
    pub id: u64,
    pub animated: bool,
}

/// Image URL for a custom emoji, derived from its id alone.
pub fn emoji_url(id: u64, animated: bool) -> String {
    let ext = if animated { "gif" } else { "png" };
    format!("{EMOJI_CDN}/{id}.{ext}")
}

/// Return the emoji reference if `text` is exactly one emoji reference.
pub fn emoji_only(text: &str) -> Option<EmojiRef> {
    let caps = EMOJI_ONLY.captures(text).ok().flatten()?;
    Some(EmojiRef {
        name: caps.name("name")?.as_str().to_string(),
        id: caps.name("id")?.as_str().parse().ok()?,
        animated: caps.name("animated").is_some_and(|m| !m.as_str().is_empty()),
    })
}

/// Apply both extensions to a node sequence, recursing into containers.
pub(super) fn apply(nodes: Vec<MarkdownNode>) -> Vec<MarkdownNode> {
    let nodes = nodes.into_iter().map(apply_node).collect();
    wrap_spoilers(split_emojis(nodes))
}

fn apply_node(node: MarkdownNode) -> MarkdownNode {
    match node {
        MarkdownNode::Emphasis(children) => MarkdownNode::Emphasis(apply(children)),
        MarkdownNode::Strong(children) => MarkdownNode::Strong(apply(children)),
        MarkdownNode::Strikethrough(children) => MarkdownNode::Strikethrough(apply(children)),
        MarkdownNode::Link {
            children,
            url,
            title,
        } => MarkdownNode::Link {
            children: apply(children),
            url,
            title,
        },
        MarkdownNode::Image {
            children,
            url,
            title,
        } => MarkdownNode::Image {
            children: apply(children),
            url,
            title,
        },
        MarkdownNode::BlockQuote(children) => MarkdownNode::BlockQuote(apply(children)),
        MarkdownNode::Paragraph(children) => MarkdownNode::Paragraph(apply(children)),
        MarkdownNode::Spoiler(children) => MarkdownNode::Spoiler(apply(children)),
        other => other,
    }
}

/// Split custom emoji references out of text nodes.
fn split_emojis(nodes: Vec<MarkdownNode>) -> Vec<MarkdownNode> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            MarkdownNode::Text(text) => split_emoji_text(&text, &mut out),
            other => out.push(other),
        }
    }
    out
}

fn split_emoji_text(text: &str, out: &mut Vec<MarkdownNode>) {
    let mut consumed = 0;
    for caps in EMOJI.captures_iter(text) {
        let Ok(caps) = caps else { break };
        let Some(m) = caps.get(0) else { break };
        // ids that overflow u64 stay literal text
        let Some(id) = caps.name("id").and_then(|g| g.as_str().parse::<u64>().ok()) else {
            continue;
        };
        push_text(out, &text[consumed..m.start()]);
        out.push(MarkdownNode::CustomEmoji {
            name: caps.name("name").map(|g| g.as_str()).unwrap_or_default().to_string(),
            id,
            animated: caps.name("animated").is_some_and(|g| !g.as_str().is_empty()),
        });
        consumed = m.end();
    }
    push_text(out, &text[consumed..]);
}

fn push_text(out: &mut Vec<MarkdownNode>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(MarkdownNode::Text(previous)) = out.last_mut() {
        previous.push_str(text);
    } else {
        out.push(MarkdownNode::Text(text.to_string()));
    }
}

/// Match up `||` delimiters in a sibling list and wrap each span in a
/// spoiler node.
///
/// The opening delimiter must be followed by inline content that does not
/// begin with whitespace or `~`; the closing delimiter must be preceded by
/// such content and must not be followed by `~`. Either delimiter may sit
/// at a text-node boundary next to a non-text sibling (`||*secret*||`
/// parses as text, emphasis, text), in which case the intervening siblings
/// become the spoiler's children. An unmatched opener stays literal.
fn wrap_spoilers(mut nodes: Vec<MarkdownNode>) -> Vec<MarkdownNode> {
    let mut node_idx = 0;
    let mut offset = 0;
    while node_idx < nodes.len() {
        let MarkdownNode::Text(text) = &nodes[node_idx] else {
            node_idx += 1;
            offset = 0;
            continue;
        };
        let Some(found) = text[offset..].find("||") else {
            node_idx += 1;
            offset = 0;
            continue;
        };
        let open_at = offset + found;
        if !is_opener(&nodes, node_idx, open_at) {
            offset = open_at + 2;
            continue;
        }
        match find_closer(&nodes, node_idx, open_at + 2) {
            Some((close_idx, close_at)) => {
                node_idx = splice_spoiler(&mut nodes, node_idx, open_at, close_idx, close_at) + 1;
                offset = 0;
            }
            None => offset = open_at + 2,
        }
    }
    nodes
}

fn node_text(nodes: &[MarkdownNode], idx: usize) -> Option<&str> {
    match nodes.get(idx) {
        Some(MarkdownNode::Text(text)) => Some(text),
        _ => None,
    }
}

fn is_opener(nodes: &[MarkdownNode], node_idx: usize, at: usize) -> bool {
    let Some(text) = node_text(nodes, node_idx) else {
        return false;
    };
    match text[at + 2..].chars().next() {
        Some(c) => !c.is_whitespace() && c != '~',
        // Delimiter at the end of the run: valid when followed by a
        // non-text sibling (emphasis, emoji, ...).
        None => match nodes.get(node_idx + 1) {
            Some(MarkdownNode::Text(_)) | None => false,
            Some(_) => true,
        },
    }
}

fn is_closer(nodes: &[MarkdownNode], node_idx: usize, at: usize) -> bool {
    let Some(text) = node_text(nodes, node_idx) else {
        return false;
    };
    if text[at + 2..].starts_with('~') {
        return false;
    }
    match text[..at].chars().last() {
        Some(c) => !c.is_whitespace() && c != '~',
        // Delimiter at the start of the run: valid when preceded by a
        // non-text sibling.
        None => match node_idx.checked_sub(1).and_then(|i| nodes.get(i)) {
            Some(MarkdownNode::Text(_)) | None => false,
            Some(_) => true,
        },
    }
}

fn find_closer(
    nodes: &[MarkdownNode],
    from_node: usize,
    from_offset: usize,
) -> Option<(usize, usize)> {
    for idx in from_node..nodes.len() {
        let Some(text) = node_text(nodes, idx) else {
            continue;
        };
        let mut offset = if idx == from_node { from_offset } else { 0 };
        while let Some(found) = text[offset..].find("||") {
            let at = offset + found;
            if is_closer(nodes, idx, at) {
                return Some((idx, at));
            }
            offset = at + 1;
        }
    }
    None
}

/// Replace the delimiter span with a spoiler node, returning its index.
fn splice_spoiler(
    nodes: &mut Vec<MarkdownNode>,
    open_node: usize,
    open_at: usize,
    close_node: usize,
    close_at: usize,
) -> usize {
    let (pre, inner_head, inner_tail, post);
    if open_node == close_node {
        match node_text(nodes, open_node) {
            Some(text) => {
                pre = text[..open_at].to_string();
                inner_head = text[open_at + 2..close_at].to_string();
                inner_tail = String::new();
                post = text[close_at + 2..].to_string();
            }
            None => return open_node,
        }
    } else {
        match (node_text(nodes, open_node), node_text(nodes, close_node)) {
            (Some(open_text), Some(close_text)) => {
                pre = open_text[..open_at].to_string();
                inner_head = open_text[open_at + 2..].to_string();
                inner_tail = close_text[..close_at].to_string();
                post = close_text[close_at + 2..].to_string();
            }
            _ => return open_node,
        }
    }

    let mut inner: Vec<MarkdownNode> = Vec::new();
    push_text(&mut inner, &inner_head);
    if close_node > open_node {
        inner.extend(nodes.drain(open_node + 1..close_node));
    }
    push_text(&mut inner, &inner_tail);
    // Inner content may hold further spoiler spans.
    let inner = wrap_spoilers(inner);

    let mut replacement: Vec<MarkdownNode> = Vec::new();
    push_text(&mut replacement, &pre);
    let spoiler_idx = open_node + replacement.len();
    replacement.push(MarkdownNode::Spoiler(inner));
    push_text(&mut replacement, &post);

    let delimiter_nodes = if open_node == close_node { 1 } else { 2 };
    nodes.splice(open_node..open_node + delimiter_nodes, replacement);
    spoiler_idx
}
