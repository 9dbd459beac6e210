//! Markup: a logos-based HTML fragment parser and serializer.
//!
//! The parser is lenient the way browsers are: unknown end tags are
//! ignored, unclosed elements are closed at the end of input, and a stray
//! `<` is treated as text. Only an unterminated comment is an error.

use logos::{Lexer, Logos};

use super::mutation::MutationRecord;
use super::node::{NodeData, NodeId, NodeKind};
use super::tree::Dom;

/// Elements that never have children or an end tag.
pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Errors produced while parsing markup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarkupError {
    #[error("unterminated comment at byte {offset}")]
    UnterminatedComment { offset: usize },

    #[error("cannot insert markup into a node that does not exist")]
    MissingNode,
}

/// Top-level markup token.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum MarkupToken {
    /// `<!-- ... -->`; the callback consumes up to the closing `-->`.
    #[token("<!--", skip_comment)]
    Comment,

    /// `<!DOCTYPE html>` and similar declarations.
    #[regex(r"<![^-][^>]*>")]
    Declaration,

    /// `<tag attr="v">` or `<tag/>`.
    #[regex(r#"<[a-zA-Z][^\s/>]*([^>"']|"[^"]*"|'[^']*')*>"#)]
    StartTag,

    /// `</tag>`.
    #[regex(r"</[a-zA-Z][^\s>]*\s*>")]
    EndTag,

    /// Character data.
    #[regex(r"[^<]+")]
    Text,

    /// A `<` that does not open a tag.
    #[token("<")]
    Lt,
}

fn skip_comment(lex: &mut Lexer<MarkupToken>) -> bool {
    match lex.remainder().find("-->") {
        Some(end) => {
            lex.bump(end + 3);
            true
        }
        None => false,
    }
}

/// Token inside a start tag, after the tag name.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\n\r\f]+")]
enum AttrToken {
    #[token("=")]
    Eq,

    #[regex(r#""[^"]*""#)]
    DoubleQuoted,

    #[regex(r"'[^']*'")]
    SingleQuoted,

    #[regex(r#"[^\s"'=<>`/]+"#)]
    Word,

    #[token("/")]
    Slash,
}

/// A lexed piece of markup, owned so parsing can happen before any mutation.
#[derive(Debug)]
enum Piece {
    Open {
        tag: String,
        attributes: Vec<(String, String)>,
        self_closing: bool,
    },
    Close(String),
    Text(String),
}

fn lex(markup: &str) -> Result<Vec<Piece>, MarkupError> {
    let mut pieces = Vec::new();
    let mut offset = 0;
    'restart: while offset < markup.len() {
        let mut lexer = MarkupToken::lexer(&markup[offset..]);
        while let Some(token) = lexer.next() {
            let slice = lexer.slice();
            match token {
                Ok(MarkupToken::Comment | MarkupToken::Declaration) => {}
                Ok(MarkupToken::StartTag) => pieces.push(open_tag(slice)),
                Ok(MarkupToken::EndTag) => {
                    let name = slice[2..slice.len() - 1].trim().to_ascii_lowercase();
                    pieces.push(Piece::Close(name));
                }
                Ok(MarkupToken::Text | MarkupToken::Lt) => push_text(&mut pieces, slice),
                Err(()) if slice.starts_with("<!--") => {
                    return Err(MarkupError::UnterminatedComment {
                        offset: offset + lexer.span().start,
                    })
                }
                Err(()) => {
                    // A `<` that never becomes a tag is text; lex again after it.
                    push_text(&mut pieces, "<");
                    offset += lexer.span().start + 1;
                    continue 'restart;
                }
            }
        }
        break;
    }
    Ok(pieces)
}

fn push_text(pieces: &mut Vec<Piece>, slice: &str) {
    match pieces.last_mut() {
        Some(Piece::Text(text)) => text.push_str(&decode_entities(slice)),
        _ => pieces.push(Piece::Text(decode_entities(slice))),
    }
}

fn open_tag(slice: &str) -> Piece {
    let inner = &slice[1..slice.len() - 1];
    let name_end = inner
        .find(|c: char| c.is_whitespace() || c == '/')
        .unwrap_or(inner.len());
    let tag = inner[..name_end].to_ascii_lowercase();
    let rest = &inner[name_end..];
    let self_closing = rest.trim_end().ends_with('/');
    Piece::Open {
        tag,
        attributes: parse_attributes(rest),
        self_closing,
    }
}

fn parse_attributes(source: &str) -> Vec<(String, String)> {
    let tokens: Vec<_> = AttrToken::lexer(source)
        .spanned()
        .filter_map(|(t, span)| t.ok().map(|t| (t, span)))
        .collect();

    let mut attributes: Vec<(String, String)> = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let (token, span) = &tokens[i];
        i += 1;
        if *token != AttrToken::Word {
            continue;
        }
        let name = source[span.clone()].to_ascii_lowercase();
        let mut value = String::new();
        if matches!(tokens.get(i), Some((AttrToken::Eq, _))) {
            i += 1;
            match tokens.get(i) {
                Some((AttrToken::DoubleQuoted | AttrToken::SingleQuoted, span)) => {
                    value = decode_entities(&source[span.start + 1..span.end - 1]);
                    i += 1;
                }
                Some((AttrToken::Word, span)) => {
                    // Unquoted values run until whitespace, so glue adjacent tokens.
                    let start = span.start;
                    let mut end = span.end;
                    i += 1;
                    while let Some((AttrToken::Word | AttrToken::Slash | AttrToken::Eq, next)) =
                        tokens.get(i)
                    {
                        if next.start != end {
                            break;
                        }
                        end = next.end;
                        i += 1;
                    }
                    value = decode_entities(&source[start..end]);
                }
                _ => {}
            }
        }
        if !attributes.iter().any(|(n, _)| *n == name) {
            attributes.push((name, value));
        }
    }
    attributes
}

/// Decode the character references markup commonly carries.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_owned();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').filter(|&end| end <= 10).and_then(|end| {
            let entity = &rest[1..end];
            let c = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            c.map(|c| (c, end))
        });
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\u{a0}', "&nbsp;")
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('\u{a0}', "&nbsp;")
}

impl Dom {
    /// Build parsed pieces under `parent` without recording; returns the
    /// top-level nodes created.
    fn build(&mut self, parent: NodeId, pieces: Vec<Piece>) -> Vec<NodeId> {
        let mut top = Vec::new();
        // (node children attach to, tag that closes it)
        let mut stack: Vec<(NodeId, String)> = Vec::new();

        for piece in pieces {
            let container = stack.last().map(|(c, _)| *c).unwrap_or(parent);
            let id = match piece {
                Piece::Open {
                    tag,
                    attributes,
                    self_closing,
                } => {
                    let mut data = NodeData::element(tag.clone());
                    data.attributes.extend(attributes);
                    let id = self.create(data);
                    if !self_closing && !VOID_ELEMENTS.contains(&tag.as_str()) {
                        let children_go_to = self.content(id).unwrap_or(id);
                        stack.push((children_go_to, tag));
                    }
                    id
                }
                Piece::Close(tag) => {
                    if let Some(depth) = stack.iter().rposition(|(_, t)| *t == tag) {
                        stack.truncate(depth);
                    }
                    continue;
                }
                Piece::Text(text) => self.create(NodeData::text(text)),
            };
            self.attach(container, id, None);
            if container == parent {
                top.push(id);
            }
        }
        top
    }

    /// Parse markup into a new detached fragment and return the fragment.
    pub fn parse_fragment(&mut self, markup: &str) -> Result<NodeId, MarkupError> {
        let pieces = lex(markup)?;
        let fragment = self.create(NodeData::fragment());
        self.build(fragment, pieces);
        Ok(fragment)
    }

    /// Replace the children of `id` with parsed markup.
    ///
    /// For a `<template>` the template content is replaced instead.
    /// Produces one removal record and one addition record.
    pub fn set_inner_html(&mut self, id: NodeId, markup: &str) -> Result<(), MarkupError> {
        if !self.contains(id) {
            return Err(MarkupError::MissingNode);
        }
        let pieces = lex(markup)?;
        let target = self.content(id).unwrap_or(id);
        self.clear_children(target);
        let added = self.build(target, pieces);
        if !added.is_empty() {
            self.record(MutationRecord::ChildList {
                target,
                added,
                removed: Vec::new(),
            });
        }
        Ok(())
    }

    /// Parse markup and append the resulting nodes to `id`.
    pub fn append_html(&mut self, id: NodeId, markup: &str) -> Result<Vec<NodeId>, MarkupError> {
        if !self.contains(id) {
            return Err(MarkupError::MissingNode);
        }
        let pieces = lex(markup)?;
        let target = self.content(id).unwrap_or(id);
        let added = self.build(target, pieces);
        if !added.is_empty() {
            self.record(MutationRecord::ChildList {
                target,
                added: added.clone(),
                removed: Vec::new(),
            });
        }
        Ok(added)
    }

    /// Serialize the children of `id` (template content for a `<template>`).
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        let source = self.content(id).unwrap_or(id);
        for &child in self.children(source) {
            self.write_node(child, &mut out);
        }
        out
    }

    /// Serialize `id` including its own tag.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    /// The opening tag of an element, used to identify it in messages.
    pub fn describe(&self, id: NodeId) -> String {
        match self.get(id) {
            Some(data) if data.kind == NodeKind::Element => {
                let mut out = String::new();
                write_open_tag(data, &mut out);
                out
            }
            Some(data) => data.tag.clone(),
            None => "<removed>".into(),
        }
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let Some(data) = self.get(id) else {
            return;
        };
        match data.kind {
            NodeKind::Text => out.push_str(&escape_text(&data.text)),
            NodeKind::Fragment => {
                for &child in self.children(id) {
                    self.write_node(child, out);
                }
            }
            NodeKind::Element => {
                write_open_tag(data, out);
                if VOID_ELEMENTS.contains(&data.tag.as_str()) {
                    return;
                }
                out.push_str(&self.inner_html(id));
                out.push_str("</");
                out.push_str(&data.tag);
                out.push('>');
            }
        }
    }
}

fn write_open_tag(data: &NodeData, out: &mut String) {
    out.push('<');
    out.push_str(&data.tag);
    for (name, value) in &data.attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_attribute(value));
        out.push('"');
    }
    out.push('>');
}
