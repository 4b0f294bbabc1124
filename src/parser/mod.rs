//! Nifty source code parser
//!
//! This module transforms Nifty source text into an Abstract Syntax Tree (AST):
//! - [`token`]: Token kinds, keyword table, and operator precedence
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`parse`]: Parser state, recovery, and the entry point (tokens → AST)
//! - [`ast`]: AST node definitions
//!
//! # Grammar covered
//!
//! - File scope: `namespace`, `fn`/`md` definitions, `extern fn` prototypes,
//!   variable bindings (`let`, `val`, `const`, `:=`, `::=`, `NAME: TYPE`)
//! - Statements: bindings, nested and named blocks, `return` with several
//!   values, expression statements
//! - Expressions: plain, wrapping (`%`) and saturating (`@`) arithmetic,
//!   comparison, bitwise, logical, `??`, every assignment form, prefix and
//!   postfix increments, calls
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with precedence climbing for binary
//! operators and panic-mode error recovery. No external parser generator
//! dependencies.

pub mod ast;
pub mod declarations;
pub mod expressions;
pub mod lexer;
pub mod parse;
pub mod statements;
pub mod token;

pub use lexer::Lexer;
pub use parse::{ParseError, ParseResult, Parser};
pub use token::{Token, TokenKind};
