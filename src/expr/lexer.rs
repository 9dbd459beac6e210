//! logos-based lexer for binding expressions.
//!
//! Strings and template literals are lexed whole by callbacks so that
//! escapes and `${}` nesting are resolved before parsing. Regex literals
//! cannot be told apart from division at this level; the parser re-scans
//! them from the source when a `/` appears in operand position.

use logos::{Lexer, Logos};

/// Expression token produced by the lexer.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]
pub enum Token {
    // ── Literals ─────────────────────────────────────────────────────

    /// Decimal, fractional, exponent or hex number.
    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?", number)]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", number)]
    #[regex(r"0[xX][0-9a-fA-F]+", hex_number)]
    Number(f64),

    /// Single- or double-quoted string, escapes resolved.
    #[regex(r#""([^"\\\n]|\\.)*""#, string)]
    #[regex(r"'([^'\\\n]|\\.)*'", string)]
    Str(String),

    /// Raw body of a template literal (between the backticks).
    #[token("`", template)]
    Template(String),

    /// Identifier or keyword.
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*", |lex| lex.slice().to_owned())]
    Ident(String),

    // ── Multi-character operators (longer matches win) ───────────────

    #[token("===")]
    StrictEq,
    #[token("!==")]
    StrictNe,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("??")]
    Nullish,
    #[token("?.")]
    OptionalChain,

    // ── Single-character punctuation ─────────────────────────────────

    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,
    #[token("{")]
    BraceOpen,
    #[token("}")]
    BraceClose,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token("!")]
    Bang,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
}

fn number(lex: &mut Lexer<Token>) -> Option<f64> {
    lex.slice().parse().ok()
}

fn hex_number(lex: &mut Lexer<Token>) -> Option<f64> {
    u64::from_str_radix(&lex.slice()[2..], 16).ok().map(|n| n as f64)
}

fn string(lex: &mut Lexer<Token>) -> Option<String> {
    let slice = lex.slice();
    unescape(&slice[1..slice.len() - 1])
}

fn template(lex: &mut Lexer<Token>) -> Option<String> {
    let rest = lex.remainder();
    let end = scan_template(rest)?;
    let body = rest[..end].to_owned();
    lex.bump(end + 1);
    Some(body)
}

/// Given the text after an opening backtick, return the byte offset of the
/// closing backtick, skipping over `${ ... }` interpolations.
pub fn scan_template(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => return Some(i),
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                let close = scan_interpolation(&rest[i + 2..])?;
                i += 2 + close + 1;
            }
            _ => i += 1,
        }
    }
    None
}

/// Given the text after `${`, return the byte offset of the matching `}`.
pub fn scan_interpolation(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"') => {
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'`' => i += scan_template(&rest[i + 1..])? + 1,
            b'{' => depth += 1,
            b'}' => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return Some(i),
            },
            _ => {}
        }
        i += 1;
    }
    None
}

/// Resolve JS string escapes. Returns `None` for a malformed `\u`/`\x`.
pub fn unescape(raw: &str) -> Option<String> {
    if !raw.contains('\\') {
        return Some(raw.to_owned());
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            '\n' => {}
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                out.push(char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?);
            }
            'u' => {
                let rest = chars.as_str();
                let (hex, consumed) = match rest.strip_prefix('{') {
                    Some(braced) => {
                        let end = braced.find('}')?;
                        (&braced[..end], end + 2)
                    }
                    None => (rest.get(..4)?, 4),
                };
                out.push(char::from_u32(u32::from_str_radix(hex, 16).ok()?)?);
                chars = rest[consumed..].chars();
            }
            other => out.push(other),
        }
    }
    Some(out)
}
