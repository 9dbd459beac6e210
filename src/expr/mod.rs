//! Binding expression engine.
//!
//! Expressions are a small JavaScript subset: literals, template literals,
//! member and index access, calls into a fixed allow-list, unary, binary,
//! logical and conditional operators. Source text is lexed with logos,
//! parsed into an [`Expr`] tree and evaluated by a tree-walking interpreter
//! against a [`Scope`] of named [`Value`]s.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod value;

use std::collections::HashMap;

pub use ast::Expr;
pub use eval::evaluate;
pub use parser::parse;
pub use value::{format_number, Value};

/// Local names visible to an expression.
pub type Scope = HashMap<String, Value>;

/// Errors from lexing, parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExprError {
    #[error("unexpected character {found:?} at offset {offset}")]
    Lex { offset: usize, found: String },

    #[error("{message} at offset {offset}")]
    Parse { offset: usize, message: String },

    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl ExprError {
    /// Move the reported offset by `by` bytes, for errors raised while
    /// parsing an embedded `${}` interpolation.
    pub fn shifted(self, by: usize) -> Self {
        match self {
            Self::Lex { offset, found } => Self::Lex {
                offset: offset + by,
                found,
            },
            Self::Parse { offset, message } => Self::Parse {
                offset: offset + by,
                message,
            },
            other => other,
        }
    }
}

/// Runtime failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("{0} is not a function")]
    UnknownFunction(String),

    #[error("cannot read property {property:?} of {target}")]
    NullAccess { property: String, target: String },

    #[error("unsupported expression: {0}")]
    Unsupported(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(String),
}

/// Parse and evaluate `source` in one step.
pub fn evaluate_source(source: &str, scope: &Scope) -> Result<Value, ExprError> {
    let expr = parse(source)?;
    evaluate(&expr, scope)
}
