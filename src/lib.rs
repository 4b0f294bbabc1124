//! # Introduction
//!
//! Nifty's compiler front end: it turns source text into a checked abstract
//! syntax tree that a code generator can consume.
//!
//! ## Pipeline
//!
//! ```text
//! Source → Lexer → Parser (+ Symbol Table) → AST + diagnostics
//! ```
//!
//! 1. [`source`] loads a file once and normalizes its newlines.
//! 2. [`parser::lexer`] produces tokens on demand, borrowing lexemes from the
//!    buffer.
//! 3. [`parser::parse`] builds the AST, recovering from syntax errors so that
//!    every independent error in a file is reported in one pass.
//! 4. [`symbols`] tracks the nested scopes used to catch redeclarations and
//!    resolve names while parsing.
//! 5. [`diagnostics`] renders errors and warnings with a source excerpt.
//!
//! A [`ParseResult`] with `error_count > 0` must not be handed to code
//! generation.

pub mod config;
pub mod diagnostics;
pub mod parser;
pub mod source;
pub mod symbols;

pub use config::{CompilerConfig, Verbosity};
pub use diagnostics::{Diagnostic, DiagnosticSink, Reporter, Severity};
pub use parser::{ParseResult, Parser};
pub use source::{SourceBuffer, SourceError};

use std::thread;

/// Parse one file, sending diagnostics to `sink` as they are found.
pub fn parse_source(source: &SourceBuffer, sink: &mut dyn DiagnosticSink) -> ParseResult {
    Parser::new(source, sink).parse()
}

/// Outcome of parsing one file with [`parse_sources`].
#[derive(Debug)]
pub struct FileReport {
    pub name: String,
    pub result: ParseResult,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse several files in parallel, one thread per file. Each file gets its
/// own lexer, parser, and symbol table. Reports come back in input order.
pub fn parse_sources(sources: &[SourceBuffer]) -> Vec<FileReport> {
    thread::scope(|scope| {
        let handles: Vec<_> = sources
            .iter()
            .map(|source| {
                scope.spawn(move || {
                    let mut diagnostics = Vec::new();
                    let result = parse_source(source, &mut diagnostics);
                    FileReport {
                        name: source.name().to_string(),
                        result,
                        diagnostics,
                    }
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
            })
            .collect()
    })
}
