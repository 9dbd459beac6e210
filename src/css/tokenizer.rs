//! logos-based tokenizer for inline style values.
//!
//! Token priority in logos is determined by:
//! 1. Longest match wins (e.g. `#fff` as HexColor beats `#` as Hash)
//! 2. For equal length matches, earlier-defined variants win
//!
//! Our ordering ensures:
//! - `#ff00aa` matches [`Token::HexColor`], not `Hash` + `Ident`
//! - `4px` matches [`Token::Dimension`], not `Number` + `Ident`
//! - `rgb(` matches [`Token::Function`], not `Ident` + `ParenOpen`

use logos::Logos;

/// CSS token produced by the lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\n\r\f]+")]
pub enum Token {
    // ── Compound tokens (longer matches, defined first) ──────────────

    /// `!important` flag.
    #[token("!important")]
    Important,

    /// CSS hex color: `#fff`, `#ff00aa`, `#ff00aa80` (3-8 hex digits).
    #[regex(r"#[0-9a-fA-F]{3,8}")]
    HexColor,

    /// Percentage: `50%`, `-12.5%`.
    #[regex(r"[+-]?([0-9]+(\.[0-9]+)?|\.[0-9]+)%")]
    Percentage,

    /// Dimension: number with a unit suffix like `4px`, `1.5em`, `10vw`.
    #[regex(r"[+-]?([0-9]+(\.[0-9]+)?|\.[0-9]+)[a-zA-Z]+")]
    Dimension,

    /// Function opening: `rgb(`, `calc(`, `var(`.
    #[regex(r"-?[a-zA-Z_][a-zA-Z0-9_-]*\(")]
    Function,

    /// Double-quoted string literal.
    #[regex(r#""[^"]*""#)]
    StringLiteral,

    /// Single-quoted string literal.
    #[regex(r"'[^']*'")]
    StringLiteralSingle,

    /// Number: integer or float, possibly signed.
    #[regex(r"[+-]?([0-9]+(\.[0-9]+)?|\.[0-9]+)")]
    Number,

    /// Identifier: keywords, color names, custom property names.
    #[regex(r"-{0,2}[a-zA-Z_][a-zA-Z0-9_-]*")]
    Ident,

    // ── Single-character punctuation ─────────────────────────────────

    /// `(`
    #[token("(")]
    ParenOpen,

    /// `)`
    #[token(")")]
    ParenClose,

    /// `:`
    #[token(":")]
    Colon,

    /// `;`
    #[token(";")]
    Semicolon,

    /// `,`
    #[token(",")]
    Comma,

    /// `/`
    #[token("/")]
    Slash,

    /// `#`
    #[token("#")]
    Hash,

    /// `*`
    #[token("*")]
    Star,

    /// `+`
    #[token("+")]
    Plus,

    /// `-`
    #[token("-")]
    Minus,
}

/// Tokenize a CSS string into a vector of `(Token, String)` pairs.
///
/// Characters that fail to lex are skipped.
pub fn tokenize(input: &str) -> Vec<(Token, String)> {
    let lexer = Token::lexer(input);
    lexer
        .spanned()
        .filter_map(|(result, span)| result.ok().map(|token| (token, input[span].to_string())))
        .collect()
}

/// Tokenize a CSS string, returning `None` if any character fails to lex.
pub fn tokenize_strict(input: &str) -> Option<Vec<(Token, String)>> {
    let lexer = Token::lexer(input);
    lexer
        .spanned()
        .map(|(result, span)| result.ok().map(|token| (token, input[span].to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: tokenize and return just the token variants.
    fn tokens(input: &str) -> Vec<Token> {
        tokenize(input).into_iter().map(|(t, _)| t).collect()
    }

    // ── Numbers and dimensions ───────────────────────────────────────

    #[test]
    fn test_numbers() {
        let result = tokenize("10 -5 3.14 .5");
        assert_eq!(result[0], (Token::Number, "10".into()));
        assert_eq!(result[1], (Token::Number, "-5".into()));
        assert_eq!(result[2], (Token::Number, "3.14".into()));
        assert_eq!(result[3], (Token::Number, ".5".into()));
    }

    #[test]
    fn test_dimensions() {
        let result = tokenize("4px 1.5em -10vw 50%");
        assert_eq!(result[0], (Token::Dimension, "4px".into()));
        assert_eq!(result[1], (Token::Dimension, "1.5em".into()));
        assert_eq!(result[2], (Token::Dimension, "-10vw".into()));
        assert_eq!(result[3], (Token::Percentage, "50%".into()));
    }

    #[test]
    fn test_not_a_number_is_an_ident() {
        assert_eq!(tokens("NaNpx"), vec![Token::Ident]);
        assert_eq!(tokens("undefinedpx"), vec![Token::Ident]);
    }

    // ── Colors ───────────────────────────────────────────────────────

    #[test]
    fn test_hex_colors() {
        let result = tokenize("#fff #ff00aa #ff00aa80");
        assert_eq!(result[0], (Token::HexColor, "#fff".into()));
        assert_eq!(result[1], (Token::HexColor, "#ff00aa".into()));
        assert_eq!(result[2], (Token::HexColor, "#ff00aa80".into()));
    }

    #[test]
    fn test_hash_without_hex() {
        assert_eq!(tokens("#zz"), vec![Token::Hash, Token::Ident]);
    }

    #[test]
    fn test_function_call() {
        assert_eq!(
            tokens("rgb(1, 2, 3)"),
            vec![
                Token::Function,
                Token::Number,
                Token::Comma,
                Token::Number,
                Token::Comma,
                Token::Number,
                Token::ParenClose,
            ]
        );
    }

    // ── Declarations ─────────────────────────────────────────────────

    #[test]
    fn test_declaration_with_important() {
        assert_eq!(
            tokens("color: red !important;"),
            vec![
                Token::Ident,
                Token::Colon,
                Token::Ident,
                Token::Important,
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_custom_property_name() {
        assert_eq!(tokenize("--accent")[0], (Token::Ident, "--accent".into()));
    }

    #[test]
    fn test_strings() {
        let result = tokenize(r#""hello" 'world'"#);
        assert_eq!(result[0].0, Token::StringLiteral);
        assert_eq!(result[1].0, Token::StringLiteralSingle);
    }

    #[test]
    fn test_strict_rejects_garbage() {
        assert!(tokenize_strict("red").is_some());
        assert!(tokenize_strict("red@").is_none());
        assert_eq!(tokens("red@"), vec![Token::Ident]);
    }

    #[test]
    fn test_whitespace_only() {
        assert!(tokens("   \t\n  ").is_empty());
    }
}
