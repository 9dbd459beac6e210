//! Recursive-descent expression parser.
//!
//! One function per precedence level, lowest first:
//! conditional, nullish, `||`, `&&`, equality, relational, additive,
//! multiplicative, prefix, call chain, primary.

use std::ops::Range;

use logos::{Lexer, Logos};

use super::ast::{BinaryOp, Expr, LogicalOp, TemplatePart, UnaryOp};
use super::lexer::{scan_interpolation, unescape, Token};
use super::ExprError;

/// Parse a complete expression.
pub fn parse(source: &str) -> Result<Expr, ExprError> {
    let mut parser = Parser::new(source);
    let expr = parser.parse_expression()?;
    match parser.peek()? {
        None => Ok(expr),
        Some(token) => Err(parser.error(format!("unexpected token {token:?}"))),
    }
}

struct Parser<'s> {
    source: &'s str,
    lexer: Lexer<'s, Token>,
    /// One token of lookahead; `Some(None)` means end of input.
    peeked: Option<Option<(Token, Range<usize>)>>,
}

impl<'s> Parser<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            lexer: Token::lexer(source),
            peeked: None,
        }
    }

    // -----------------------------------------------------------------------
    // Token plumbing
    // -----------------------------------------------------------------------

    fn fill(&mut self) -> Result<(), ExprError> {
        if self.peeked.is_none() {
            let next = match self.lexer.next() {
                Some(Ok(token)) => Some((token, self.lexer.span())),
                Some(Err(())) => {
                    return Err(ExprError::Lex {
                        offset: self.lexer.span().start,
                        found: self.lexer.slice().to_owned(),
                    })
                }
                None => None,
            };
            self.peeked = Some(next);
        }
        Ok(())
    }

    fn peek(&mut self) -> Result<Option<Token>, ExprError> {
        self.fill()?;
        Ok(self.peeked.as_ref().and_then(|p| p.as_ref()).map(|(t, _)| t.clone()))
    }

    fn advance(&mut self) -> Result<Option<(Token, Range<usize>)>, ExprError> {
        self.fill()?;
        Ok(self.peeked.take().flatten())
    }

    fn eat(&mut self, token: &Token) -> Result<bool, ExprError> {
        if self.peek()?.as_ref() == Some(token) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, token: &Token, what: &str) -> Result<(), ExprError> {
        if self.eat(token)? {
            Ok(())
        } else {
            Err(self.error(format!("expected {what}")))
        }
    }

    fn offset(&self) -> usize {
        match &self.peeked {
            Some(Some((_, span))) => span.start,
            Some(None) => self.source.len(),
            None => self.lexer.span().end,
        }
    }

    fn error(&self, message: String) -> ExprError {
        ExprError::Parse {
            offset: self.offset(),
            message,
        }
    }

    // -----------------------------------------------------------------------
    // Precedence levels
    // -----------------------------------------------------------------------

    fn parse_expression(&mut self) -> Result<Expr, ExprError> {
        self.parse_conditional()
    }

    fn parse_conditional(&mut self) -> Result<Expr, ExprError> {
        let test = self.parse_nullish()?;
        if !self.eat(&Token::Question)? {
            return Ok(test);
        }
        let consequent = self.parse_conditional()?;
        self.expect(&Token::Colon, "`:` in conditional")?;
        let alternate = self.parse_conditional()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn parse_nullish(&mut self) -> Result<Expr, ExprError> {
        self.logical_chain(Self::parse_logical_or, Token::Nullish, LogicalOp::Nullish)
    }

    fn parse_logical_or(&mut self) -> Result<Expr, ExprError> {
        self.logical_chain(Self::parse_logical_and, Token::OrOr, LogicalOp::Or)
    }

    fn parse_logical_and(&mut self) -> Result<Expr, ExprError> {
        self.logical_chain(Self::parse_equality, Token::AndAnd, LogicalOp::And)
    }

    fn parse_equality(&mut self) -> Result<Expr, ExprError> {
        self.binary_chain(Self::parse_relational, |t| match t {
            Token::EqEq => Some(BinaryOp::Eq),
            Token::NotEq => Some(BinaryOp::NotEq),
            Token::StrictEq => Some(BinaryOp::StrictEq),
            Token::StrictNe => Some(BinaryOp::StrictNe),
            _ => None,
        })
    }

    fn parse_relational(&mut self) -> Result<Expr, ExprError> {
        self.binary_chain(Self::parse_additive, |t| match t {
            Token::Lt => Some(BinaryOp::Lt),
            Token::LtEq => Some(BinaryOp::LtEq),
            Token::Gt => Some(BinaryOp::Gt),
            Token::GtEq => Some(BinaryOp::GtEq),
            _ => None,
        })
    }

    fn parse_additive(&mut self) -> Result<Expr, ExprError> {
        self.binary_chain(Self::parse_multiplicative, |t| match t {
            Token::Plus => Some(BinaryOp::Add),
            Token::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ExprError> {
        self.binary_chain(Self::parse_prefix, |t| match t {
            Token::Star => Some(BinaryOp::Mul),
            Token::Slash => Some(BinaryOp::Div),
            Token::Percent => Some(BinaryOp::Rem),
            _ => None,
        })
    }

    fn logical_chain(
        &mut self,
        next: fn(&mut Self) -> Result<Expr, ExprError>,
        token: Token,
        op: LogicalOp,
    ) -> Result<Expr, ExprError> {
        let mut left = next(self)?;
        while self.eat(&token)? {
            let right = next(self)?;
            left = Expr::Logical {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn binary_chain(
        &mut self,
        next: fn(&mut Self) -> Result<Expr, ExprError>,
        op_for: fn(&Token) -> Option<BinaryOp>,
    ) -> Result<Expr, ExprError> {
        let mut left = next(self)?;
        while let Some(op) = self.peek()?.as_ref().and_then(op_for) {
            self.advance()?;
            let right = next(self)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Expr, ExprError> {
        let op = match self.peek()? {
            Some(Token::Bang) => UnaryOp::Not,
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Plus) => UnaryOp::Plus,
            Some(Token::Ident(word)) if word == "typeof" => UnaryOp::TypeOf,
            _ => return self.parse_call_chain(),
        };
        self.advance()?;
        let operand = self.parse_prefix()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_call_chain(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek()? {
                Some(Token::Dot) => {
                    self.advance()?;
                    let property = self.parse_property_name()?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property,
                        optional: false,
                    };
                }
                Some(Token::OptionalChain) => {
                    self.advance()?;
                    expr = match self.peek()? {
                        Some(Token::ParenOpen) => {
                            self.advance()?;
                            Expr::Call {
                                callee: Box::new(expr),
                                args: self.parse_arguments()?,
                                optional: true,
                            }
                        }
                        Some(Token::BracketOpen) => {
                            self.advance()?;
                            let index = self.parse_expression()?;
                            self.expect(&Token::BracketClose, "`]`")?;
                            Expr::Index {
                                object: Box::new(expr),
                                index: Box::new(index),
                                optional: true,
                            }
                        }
                        _ => Expr::Member {
                            object: Box::new(expr),
                            property: self.parse_property_name()?,
                            optional: true,
                        },
                    };
                }
                Some(Token::BracketOpen) => {
                    self.advance()?;
                    let index = self.parse_expression()?;
                    self.expect(&Token::BracketClose, "`]`")?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                        optional: false,
                    };
                }
                Some(Token::ParenOpen) => {
                    self.advance()?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args: self.parse_arguments()?,
                        optional: false,
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_property_name(&mut self) -> Result<String, ExprError> {
        self.fill()?;
        let offset = self.offset();
        match self.advance()? {
            Some((Token::Ident(name), _)) => Ok(name),
            _ => Err(ExprError::Parse {
                offset,
                message: "expected property name".into(),
            }),
        }
    }

    /// Arguments after the opening `(`, through the closing `)`.
    fn parse_arguments(&mut self) -> Result<Vec<Expr>, ExprError> {
        let mut args = Vec::new();
        while !self.eat(&Token::ParenClose)? {
            args.push(self.parse_expression()?);
            if !self.eat(&Token::Comma)? {
                self.expect(&Token::ParenClose, "`)` after arguments")?;
                break;
            }
        }
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        let Some((token, span)) = self.advance()? else {
            return Err(ExprError::Parse {
                offset: self.source.len(),
                message: "unexpected end of expression".into(),
            });
        };
        match token {
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::Str(s) => Ok(Expr::Str(s)),
            Token::Template(body) => parse_template(&body, span.start + 1),
            Token::Ident(word) => Ok(match word.as_str() {
                "true" => Expr::Bool(true),
                "false" => Expr::Bool(false),
                "null" => Expr::Null,
                "undefined" => Expr::Undefined,
                _ => Expr::Ident(word),
            }),
            Token::ParenOpen => {
                let expr = self.parse_expression()?;
                self.expect(&Token::ParenClose, "`)`")?;
                Ok(expr)
            }
            Token::BracketOpen => self.parse_array(),
            Token::BraceOpen => self.parse_object(),
            Token::Slash => self.parse_regex(span.start),
            other => Err(ExprError::Parse {
                offset: span.start,
                message: format!("unexpected token {other:?}"),
            }),
        }
    }

    fn parse_array(&mut self) -> Result<Expr, ExprError> {
        let mut items = Vec::new();
        while !self.eat(&Token::BracketClose)? {
            items.push(self.parse_expression()?);
            if !self.eat(&Token::Comma)? {
                self.expect(&Token::BracketClose, "`]` after array items")?;
                break;
            }
        }
        Ok(Expr::Array(items))
    }

    fn parse_object(&mut self) -> Result<Expr, ExprError> {
        let mut entries = Vec::new();
        while !self.eat(&Token::BraceClose)? {
            self.fill()?;
            let offset = self.offset();
            let key = match self.advance()? {
                Some((Token::Ident(name), _)) => name,
                Some((Token::Str(s), _)) => s,
                Some((Token::Number(n), _)) => super::value::format_number(n),
                _ => {
                    return Err(ExprError::Parse {
                        offset,
                        message: "expected object key".into(),
                    })
                }
            };
            let value = if self.eat(&Token::Colon)? {
                self.parse_expression()?
            } else {
                Expr::Ident(key.clone())
            };
            entries.push((key, value));
            if !self.eat(&Token::Comma)? {
                self.expect(&Token::BraceClose, "`}` after object entries")?;
                break;
            }
        }
        Ok(Expr::Object(entries))
    }

    /// Scan a regex literal whose opening `/` is at `start` and skip the
    /// lexer past it.
    fn parse_regex(&mut self, start: usize) -> Result<Expr, ExprError> {
        let rest = &self.source[start + 1..];
        let bytes = rest.as_bytes();
        let mut in_class = false;
        let mut i = 0;
        let end = loop {
            match bytes.get(i) {
                None | Some(b'\n') => {
                    return Err(ExprError::Parse {
                        offset: start,
                        message: "unterminated regular expression".into(),
                    })
                }
                Some(b'\\') => i += 2,
                Some(b'[') => {
                    in_class = true;
                    i += 1;
                }
                Some(b']') => {
                    in_class = false;
                    i += 1;
                }
                Some(b'/') if !in_class => break i + 1,
                Some(_) => i += 1,
            }
        };
        let flags = rest[end..]
            .bytes()
            .take_while(u8::is_ascii_alphabetic)
            .count();
        let consumed = end + flags;
        // The lexer sits right after the opening `/`.
        self.lexer.bump(consumed);
        Ok(Expr::Regex(format!("/{}", &rest[..consumed])))
    }
}

/// Split a template body into text and `${}` parts. `base` is the byte
/// offset of the body in the source, for error positions.
fn parse_template(body: &str, base: usize) -> Result<Expr, ExprError> {
    let mut parts = Vec::new();
    let mut text = String::new();
    let bytes = body.as_bytes();
    let mut i = 0;
    let mut literal_start = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                text.push_str(&cook(&body[literal_start..i], base + literal_start)?);
                if !text.is_empty() {
                    parts.push(TemplatePart::Text(std::mem::take(&mut text)));
                }
                let inner_start = i + 2;
                let close = scan_interpolation(&body[inner_start..]).ok_or(ExprError::Parse {
                    offset: base + i,
                    message: "unterminated template interpolation".into(),
                })?;
                let inner = &body[inner_start..inner_start + close];
                let expr = parse(inner).map_err(|e| e.shifted(base + inner_start))?;
                parts.push(TemplatePart::Expr(expr));
                i = inner_start + close + 1;
                literal_start = i;
            }
            _ => i += 1,
        }
    }
    text.push_str(&cook(&body[literal_start.min(body.len())..], base + literal_start)?);
    if !text.is_empty() {
        parts.push(TemplatePart::Text(text));
    }
    Ok(Expr::Template(parts))
}

fn cook(raw: &str, offset: usize) -> Result<String, ExprError> {
    unescape(raw).ok_or(ExprError::Parse {
        offset,
        message: "invalid escape in template literal".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Box<Expr> {
        Box::new(Expr::Ident(name.into()))
    }

    #[test]
    fn precedence_of_arithmetic() {
        let expr = parse("a + b * 2").unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Add,
                left: ident("a"),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    left: ident("b"),
                    right: Box::new(Expr::Number(2.0)),
                }),
            }
        );
    }

    #[test]
    fn left_associative_subtraction() {
        let expr = parse("a - b - c").unwrap();
        match expr {
            Expr::Binary {
                op: BinaryOp::Sub,
                left,
                ..
            } => assert!(matches!(*left, Expr::Binary { op: BinaryOp::Sub, .. })),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn conditional_is_right_associative() {
        let expr = parse("a ? 1 : b ? 2 : 3").unwrap();
        match expr {
            Expr::Conditional { alternate, .. } => {
                assert!(matches!(*alternate, Expr::Conditional { .. }))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn member_call_chain() {
        let expr = parse("(input).toUpperCase()").unwrap();
        assert_eq!(
            expr,
            Expr::Call {
                callee: Box::new(Expr::Member {
                    object: ident("input"),
                    property: "toUpperCase".into(),
                    optional: false,
                }),
                args: vec![],
                optional: false,
            }
        );
    }

    #[test]
    fn object_literal_with_quoted_and_shorthand_keys() {
        let expr = parse("{'color': color, 'font-size': size + 'px', x}").unwrap();
        match expr {
            Expr::Object(entries) => {
                let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();
                assert_eq!(keys, vec!["color", "font-size", "x"]);
                assert_eq!(entries[2].1, Expr::Ident("x".into()));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn trailing_commas() {
        assert_eq!(parse("[1, 2,]").unwrap(), Expr::Array(vec![Expr::Number(1.0), Expr::Number(2.0)]));
        assert!(matches!(parse("{a: 1,}").unwrap(), Expr::Object(e) if e.len() == 1));
    }

    #[test]
    fn keywords() {
        assert_eq!(parse("true").unwrap(), Expr::Bool(true));
        assert_eq!(parse("null").unwrap(), Expr::Null);
        assert_eq!(parse("undefined").unwrap(), Expr::Undefined);
        assert!(matches!(
            parse("typeof x").unwrap(),
            Expr::Unary { op: UnaryOp::TypeOf, .. }
        ));
    }

    #[test]
    fn template_literal_parts() {
        let expr = parse("`a${x}b${`c${y}`}`").unwrap();
        match expr {
            Expr::Template(parts) => {
                assert_eq!(parts.len(), 4);
                assert_eq!(parts[0], TemplatePart::Text("a".into()));
                assert_eq!(parts[1], TemplatePart::Expr(Expr::Ident("x".into())));
                assert_eq!(parts[2], TemplatePart::Text("b".into()));
                assert!(matches!(&parts[3], TemplatePart::Expr(Expr::Template(_))));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn regex_in_operand_position() {
        assert_eq!(parse("/a[/]b/gi").unwrap(), Expr::Regex("/a[/]b/gi".into()));
        let expr = parse("x.replace(/\\d+/, '')").unwrap();
        match expr {
            Expr::Call { args, .. } => assert_eq!(args[0], Expr::Regex("/\\d+/".into())),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn division_is_not_a_regex() {
        assert!(matches!(
            parse("a / b / c").unwrap(),
            Expr::Binary { op: BinaryOp::Div, .. }
        ));
    }

    #[test]
    fn optional_chaining() {
        assert!(matches!(
            parse("a?.b").unwrap(),
            Expr::Member { optional: true, .. }
        ));
        assert!(matches!(
            parse("a?.[0]").unwrap(),
            Expr::Index { optional: true, .. }
        ));
    }

    #[test]
    fn errors_report_offsets() {
        assert_eq!(
            parse("a +").unwrap_err(),
            ExprError::Parse {
                offset: 3,
                message: "unexpected end of expression".into(),
            }
        );
        assert!(matches!(parse("a b"), Err(ExprError::Parse { offset: 2, .. })));
        assert!(matches!(parse("a # b"), Err(ExprError::Lex { offset: 2, .. })));
        assert!(matches!(parse("(a"), Err(ExprError::Parse { .. })));
    }
}
