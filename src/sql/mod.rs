//! SQL front-end for minidb.
//!
//! This module contains the lexer (tokenizer), abstract syntax tree (AST)
//! definitions, and a recursive-descent parser that transforms the text of
//! one SQL statement into a [`Statement`] ready for the execution engine.

pub mod lexer;
pub mod ast;
pub mod parser;

pub use ast::*;
pub use lexer::{Token, TokenKind};
pub use parser::Parser;
