//! Expression scope builder.
//!
//! A bind expression names store paths directly (`user.name + '!'`). Before
//! evaluation every dependency the expression mentions is rewritten to a
//! plain identifier (`user_name`) and bound in a [`Scope`] to a snapshot of
//! the store value. String, template and regex literal text is shielded so
//! that substitution never reaches inside a literal; `${}` code inside a
//! template literal stays visible.

use crate::expr::{Scope, Value};
use crate::store::{path, Store};

/// First code point used for literal placeholders (Supplementary Private
/// Use Area-A).
const PLACEHOLDER_BASE: u32 = 0xF0000;
const PLACEHOLDER_LIMIT: u32 = 0xFFFFD;

/// A rewritten expression and the scope it evaluates in.
#[derive(Debug, Clone, PartialEq)]
pub struct Scoped {
    pub expression: String,
    pub scope: Scope,
}

/// Rewrite `expression` against `dependencies`, snapshotting their values.
///
/// Longer dependency names are substituted first so `a.b` wins over `a`.
/// A dependency absent from the store reads as the empty string.
pub fn build(expression: &str, dependencies: &[String], store: &Store) -> Scoped {
    let mut deps: Vec<&String> = dependencies.iter().collect();
    deps.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
    deps.dedup();

    let (mut text, spans) = protect(expression);
    let mut scope = Scope::new();
    for dep in deps {
        let name = identifier(dep);
        let (replaced, hits) = replace_word(&text, dep, &name);
        if hits == 0 {
            continue;
        }
        text = replaced;
        let value = store.lookup(dep).map(|d| d.serialize()).unwrap_or_default();
        scope.insert(name, Value::Str(value));
    }
    Scoped {
        expression: restore(&text, &spans),
        scope,
    }
}

/// Replace whole-word occurrences of `name` (case-insensitive, outside
/// literals) with `replacement`.
pub fn replace_identifier(expression: &str, name: &str, replacement: &str) -> String {
    if name.is_empty() {
        return expression.to_owned();
    }
    let (text, spans) = protect(expression);
    let (replaced, hits) = replace_word(&text, name, replacement);
    if hits == 0 {
        return expression.to_owned();
    }
    restore(&replaced, &spans)
}

/// Whether `expression` mentions `name` outside literals.
pub fn references(expression: &str, name: &str) -> bool {
    let (text, _) = protect(expression);
    replace_word(&text, name, "").1 > 0
}

/// A valid identifier for a dependency path: `.` and `-` become `_`, a
/// leading digit gets a `_` prefix.
pub fn identifier(dependency: &str) -> String {
    let mut out: String = dependency
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '$' { c } else { '_' })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

// ---------------------------------------------------------------------------
// Word replacement
// ---------------------------------------------------------------------------

fn continues_before(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '.'
}

fn continues_after(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn same_letter(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// Replace occurrences of `word` bounded by non-identifier characters.
/// Returns the new text and the number of replacements.
fn replace_word(text: &str, word: &str, replacement: &str) -> (String, usize) {
    let chars: Vec<char> = text.chars().collect();
    let needle: Vec<char> = word.chars().collect();
    if needle.is_empty() || needle.len() > chars.len() {
        return (text.to_owned(), 0);
    }
    let mut out = String::with_capacity(text.len());
    let mut hits = 0;
    let mut i = 0;
    while i < chars.len() {
        let matches = i + needle.len() <= chars.len()
            && chars[i..i + needle.len()]
                .iter()
                .zip(&needle)
                .all(|(&a, &b)| same_letter(a, b))
            && (i == 0 || !continues_before(chars[i - 1]))
            && chars
                .get(i + needle.len())
                .map_or(true, |&c| !continues_after(c));
        if matches {
            out.push_str(replacement);
            hits += 1;
            i += needle.len();
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    (out, hits)
}

// ---------------------------------------------------------------------------
// Literal protection
// ---------------------------------------------------------------------------

/// Characters after which a `/` starts a regex literal rather than a division.
const REGEX_PRECEDERS: &str = "(,=:[!&|?{};+-*%<>~^";

/// Replace literal text with single placeholder characters. Returns the
/// shielded text and the original spans, indexed by placeholder.
pub fn protect(expression: &str) -> (String, Vec<String>) {
    let mut shield = Shield {
        chars: expression.chars().collect(),
        pos: 0,
        out: String::with_capacity(expression.len()),
        spans: Vec::new(),
        last: None,
    };
    shield.code(false);
    (shield.out, shield.spans)
}

/// Put shielded spans back.
pub fn restore(text: &str, spans: &[String]) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        let index = (c as u32)
            .checked_sub(PLACEHOLDER_BASE)
            .and_then(|i| spans.get(i as usize));
        match index {
            Some(span) => out.push_str(span),
            None => out.push(c),
        }
    }
    out
}

struct Shield {
    chars: Vec<char>,
    pos: usize,
    out: String,
    spans: Vec<String>,
    /// Last significant character emitted, for regex detection.
    last: Option<char>,
}

impl Shield {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn emit(&mut self, c: char) {
        self.out.push(c);
        if !c.is_whitespace() {
            self.last = Some(c);
        }
    }

    /// Emit a placeholder for `span`, or the span itself once the
    /// placeholder range is exhausted.
    fn hide(&mut self, span: String) {
        if span.is_empty() {
            return;
        }
        let code = PLACEHOLDER_BASE + self.spans.len() as u32;
        match char::from_u32(code).filter(|_| code <= PLACEHOLDER_LIMIT) {
            Some(placeholder) => {
                self.out.push(placeholder);
                self.spans.push(span);
            }
            None => self.out.push_str(&span),
        }
        // A literal is an operand: a following `/` divides.
        self.last = Some('a');
    }

    /// Scan code until the end, or until an unmatched `}` when inside a
    /// template interpolation (left unconsumed).
    fn code(&mut self, in_interpolation: bool) {
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            match c {
                '\'' | '"' => {
                    let span = self.quoted(c);
                    self.hide(span);
                }
                '`' => self.template(),
                '/' if self.last.map_or(true, |l| REGEX_PRECEDERS.contains(l)) => {
                    let span = self.regex();
                    self.hide(span);
                }
                '{' => {
                    depth += 1;
                    self.pos += 1;
                    self.emit(c);
                }
                '}' => {
                    if in_interpolation && depth == 0 {
                        return;
                    }
                    depth = depth.saturating_sub(1);
                    self.pos += 1;
                    self.emit(c);
                }
                _ => {
                    self.pos += 1;
                    self.emit(c);
                }
            }
        }
    }

    /// A quoted string including its quotes.
    fn quoted(&mut self, quote: char) -> String {
        let mut span = String::new();
        span.push(quote);
        self.pos += 1;
        while let Some(c) = self.peek() {
            self.pos += 1;
            span.push(c);
            if c == '\\' {
                if let Some(escaped) = self.peek() {
                    self.pos += 1;
                    span.push(escaped);
                }
            } else if c == quote {
                break;
            }
        }
        span
    }

    /// A template literal: text shielded, interpolated code scanned.
    fn template(&mut self) {
        self.pos += 1;
        self.emit('`');
        let mut text = String::new();
        while let Some(c) = self.peek() {
            match c {
                '\\' => {
                    text.push(c);
                    self.pos += 1;
                    if let Some(escaped) = self.peek() {
                        text.push(escaped);
                        self.pos += 1;
                    }
                }
                '`' => {
                    self.hide(std::mem::take(&mut text));
                    self.pos += 1;
                    self.emit('`');
                    return;
                }
                '$' if self.chars.get(self.pos + 1) == Some(&'{') => {
                    self.hide(std::mem::take(&mut text));
                    self.pos += 2;
                    self.emit('$');
                    self.emit('{');
                    self.last = Some('{');
                    self.code(true);
                    if self.peek() == Some('}') {
                        self.pos += 1;
                        self.emit('}');
                    }
                }
                _ => {
                    text.push(c);
                    self.pos += 1;
                }
            }
        }
        self.hide(text);
    }

    /// A regex literal including delimiters and flags.
    fn regex(&mut self) -> String {
        let mut span = String::from('/');
        self.pos += 1;
        let mut in_class = false;
        while let Some(c) = self.peek() {
            self.pos += 1;
            span.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = self.peek() {
                        self.pos += 1;
                        span.push(escaped);
                    }
                }
                '[' => in_class = true,
                ']' => in_class = false,
                '/' if !in_class => break,
                _ => {}
            }
        }
        while let Some(flag) = self.peek().filter(char::is_ascii_alphabetic) {
            self.pos += 1;
            span.push(flag);
        }
        span
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Data;

    fn deps(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn identifiers() {
        assert_eq!(identifier("user.name"), "user_name");
        assert_eq!(identifier("font-size"), "font_size");
        assert_eq!(identifier("0.a"), "_0_a");
        assert_eq!(identifier("$x"), "$x");
    }

    #[test]
    fn rewrites_dependencies_and_snapshots_values() {
        let mut store = Store::new();
        store.insert("arr.0", Data::text("1"));
        let scoped = build("'d' + arr.0", &deps(&["arr.0"]), &store);
        assert_eq!(scoped.expression, "'d' + arr_0");
        assert_eq!(scoped.scope.get("arr_0"), Some(&Value::str("1")));
    }

    #[test]
    fn unreferenced_dependencies_are_not_declared() {
        let scoped = build("a", &deps(&["a", "b"]), &Store::new());
        assert_eq!(scoped.scope.len(), 1);
        assert_eq!(scoped.scope.get("a"), Some(&Value::str("")));
    }

    #[test]
    fn longest_dependency_wins() {
        let scoped = build("a + a.b", &deps(&["a", "a.b"]), &Store::new());
        assert_eq!(scoped.expression, "a + a_b");
    }

    #[test]
    fn map_values_are_serialized() {
        let mut store = Store::new();
        store.insert("obj.x", Data::text("1"));
        let scoped = build("obj", &deps(&["obj"]), &store);
        assert_eq!(scoped.scope.get("obj"), Some(&Value::str(r#"{"x":"1"}"#)));
    }

    #[test]
    fn literals_are_shielded() {
        let scoped = build(
            r#"'color:' + color + "color" + `color ${color}` + /color/"#,
            &deps(&["color"]),
            &Store::new(),
        );
        assert_eq!(
            scoped.expression,
            r#"'color:' + color + "color" + `color ${color}` + /color/"#
        );
        let replaced = replace_identifier(r#"'color:' + color + `color ${color}`"#, "color", "c");
        assert_eq!(replaced, r#"'color:' + c + `color ${c}`"#);
    }

    #[test]
    fn division_is_not_a_regex() {
        assert_eq!(replace_identifier("a / b / a", "a", "x"), "x / b / x");
    }

    #[test]
    fn word_boundaries() {
        assert_eq!(replace_identifier("val + value + x.val", "val", "v"), "v + value + x.val");
        assert_eq!(replace_identifier("val.0 + val_1", "val", "arr.2"), "arr.2.0 + val_1");
        assert_eq!(replace_identifier("VAL", "val", "v"), "v");
    }

    #[test]
    fn references_ignores_literals() {
        assert!(references("!!flag", "flag"));
        assert!(!references("'flag'", "flag"));
        assert!(!references("flags", "flag"));
    }

    #[test]
    fn escaped_quotes_stay_inside_literals() {
        let (text, spans) = protect(r#"'it\'s a' + a"#);
        assert_eq!(spans, vec![r#"'it\'s a'"#.to_string()]);
        assert!(text.ends_with(" + a"));
        assert_eq!(restore(&text, &spans), r#"'it\'s a' + a"#);
    }
}
