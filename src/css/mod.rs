//! Inline style engine: tokenizer, value validation, declaration blocks.

pub mod tokenizer;
pub mod value;
pub mod declaration;

pub use declaration::{Declaration, StyleDeclaration};
