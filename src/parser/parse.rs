//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including the error type, token helpers, diagnostics plumbing, and panic-mode
//! recovery.
//!
//! # Parser Architecture
//!
//! The Parser uses recursive descent for declarations and statements and
//! precedence climbing for expressions:
//! - This module: Parser struct, helper methods, recovery, and the entry point
//! - `declarations`: namespaces, functions, prototypes, and variable bindings
//! - `statements`: blocks, named blocks, `return`, and expression statements
//! - `expressions`: expressions with precedence climbing
//!
//! # Error recovery
//!
//! Grammar mismatches are [`ParseError`] values returned with `?` up to the
//! nearest statement loop. There the error is reported, the parser enters
//! panic mode, and [`Parser::synchronize`] skips to a statement boundary.
//! While in panic mode every further diagnostic is swallowed, so one mistake
//! produces one message. Errors that do not break the grammar (redeclarations,
//! `return` outside a function) are reported in place and parsing carries on.

use crate::diagnostics::{Diagnostic, DiagnosticSink, Severity};
use crate::parser::ast::*;
use crate::parser::lexer::Lexer;
use crate::parser::token::{Token, TokenKind};
use crate::source::SourceBuffer;
use crate::symbols::SymbolTable;
use std::fmt;
use std::sync::Arc;

/// Parser error type
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
    /// Columns covered by the offending token.
    pub length: usize,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Everything one file's parse produced.
#[derive(Debug, Default)]
pub struct ParseResult {
    pub nodes: Vec<AstNode>,
    pub error_count: u32,
    pub warning_count: u32,
    /// A file-scope `fn main` was declared.
    pub found_entrypoint: bool,
    pub namespace: Option<String>,
}

impl ParseResult {
    /// Code generation may only run when this holds.
    pub fn is_ok(&self) -> bool {
        self.error_count == 0
    }
}

/// Recursive descent parser for Nifty
pub struct Parser<'src, 'sink> {
    source: &'src SourceBuffer,
    pub(crate) file: Arc<str>,
    lexer: Lexer<'src>,
    pub(crate) previous: Token<'src>,
    pub(crate) current: Token<'src>,
    pub(crate) lookahead: Token<'src>,
    /// Tokens consumed so far, for detecting a production that made no progress.
    pub(crate) consumed: usize,
    sink: &'sink mut dyn DiagnosticSink,
    error_count: u32,
    warning_count: u32,
    panic_mode: bool,
    pub(crate) symbols: SymbolTable,
    /// Namespace name and the line it was set on.
    pub(crate) namespace: Option<(String, u32)>,
    pub(crate) in_function: bool,
    pub(crate) found_entrypoint: bool,
}

impl<'src, 'sink> Parser<'src, 'sink> {
    pub fn new(source: &'src SourceBuffer, sink: &'sink mut dyn DiagnosticSink) -> Self {
        Self::from_lexer(Lexer::new(source), source, sink)
    }

    /// Parse from an already positioned lexer. `source` supplies the file
    /// name and the excerpt lines for diagnostics; it should be the buffer
    /// the lexer reads.
    pub fn from_lexer(
        mut lexer: Lexer<'src>,
        source: &'src SourceBuffer,
        sink: &'sink mut dyn DiagnosticSink,
    ) -> Self {
        let start = Token::new(TokenKind::Eof, "", 1, 1);
        let lookahead = lexer.next_token();

        let mut parser = Self {
            source,
            file: source.shared_name(),
            lexer,
            previous: start,
            current: start,
            lookahead,
            consumed: 0,
            sink,
            error_count: 0,
            warning_count: 0,
            panic_mode: false,
            symbols: SymbolTable::new(),
            namespace: None,
            in_function: false,
            found_entrypoint: false,
        };
        parser.advance();
        parser.consumed = 0;
        parser
    }

    /// Parse the whole file. Never stops at the first error.
    pub fn parse(&mut self) -> ParseResult {
        let mut nodes = Vec::new();

        while !self.check(TokenKind::Eof) {
            self.exit_panic_mode();
            let before = self.consumed;
            match self.parse_declaration() {
                Ok(Some(node)) => nodes.push(node),
                Ok(None) => {}
                Err(err) => self.recover(err, before),
            }
        }

        ParseResult {
            nodes,
            error_count: self.error_count,
            warning_count: self.warning_count,
            found_entrypoint: self.found_entrypoint,
            namespace: self.namespace.as_ref().map(|(name, _)| name.clone()),
        }
    }

    // ===== Token helpers =====

    /// Shift the lookahead into `current` and pull a fresh lookahead.
    /// Lexer error tokens are reported here and never reach a production.
    pub(crate) fn advance(&mut self) {
        self.previous = self.current;
        self.current = self.lookahead;
        self.lookahead = self.lexer.next_token();
        self.consumed += 1;

        while self.current.is(TokenKind::Error) {
            let token = self.current;
            self.report(Severity::Error, self.location(&token), 1, token.lexeme.to_string());
            self.enter_panic_mode();
            self.current = self.lookahead;
            self.lookahead = self.lexer.next_token();
        }
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.current.is(kind)
    }

    pub(crate) fn check_next(&self, kind: TokenKind) -> bool {
        self.lookahead.is(kind)
    }

    pub(crate) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a token of `kind` or fail with
    /// "expected KIND CTX, got TOKEN instead".
    pub(crate) fn expect_token(
        &mut self,
        kind: TokenKind,
        ctx: &str,
    ) -> Result<Token<'src>, ParseError> {
        if self.check(kind) {
            let token = self.current;
            self.advance();
            Ok(token)
        } else {
            Err(self.error_at_current(format!(
                "expected {kind} {ctx}, got {} instead",
                self.current
            )))
        }
    }

    pub(crate) fn expect_identifier(&mut self, ctx: &str) -> Result<Token<'src>, ParseError> {
        self.expect_token(TokenKind::Ident, ctx)
    }

    pub(crate) fn location(&self, token: &Token<'_>) -> SourceLocation {
        SourceLocation::new(Arc::clone(&self.file), token.line, token.column)
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.location(&self.current)
    }

    // ===== Diagnostics =====

    pub(crate) fn error_at(&self, token: Token<'_>, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            location: self.location(&token),
            length: token.width(),
        }
    }

    pub(crate) fn error_at_current(&self, message: impl Into<String>) -> ParseError {
        self.error_at(self.current, message)
    }

    /// Report an error that leaves the grammar intact; parsing continues.
    pub(crate) fn report_error_at(&mut self, token: Token<'_>, message: impl Into<String>) {
        self.report(Severity::Error, self.location(&token), token.width(), message.into());
    }

    pub(crate) fn report_error_at_location(
        &mut self,
        location: SourceLocation,
        length: usize,
        message: impl Into<String>,
    ) {
        self.report(Severity::Error, location, length, message.into());
    }

    pub(crate) fn report_warning_at(&mut self, token: Token<'_>, message: impl Into<String>) {
        self.report(Severity::Warning, self.location(&token), token.width(), message.into());
    }

    fn report(&mut self, severity: Severity, location: SourceLocation, length: usize, message: String) {
        if self.panic_mode {
            return;
        }
        match severity {
            Severity::Error => self.error_count += 1,
            Severity::Warning => self.warning_count += 1,
        }
        let source_line = self.source.line(location.line).map(str::to_owned);
        self.sink.report(Diagnostic {
            severity,
            message,
            location,
            length,
            source_line,
        });
    }

    // ===== Recovery =====

    pub(crate) fn enter_panic_mode(&mut self) {
        self.panic_mode = true;
    }

    pub(crate) fn exit_panic_mode(&mut self) {
        self.panic_mode = false;
    }

    /// Report a failed statement and skip to the next statement boundary.
    /// `before` is the consumed-token count when the statement started; a
    /// statement that failed on its very first token has that token (or the
    /// whole `{ ... }` group it opens) skipped so the caller's loop always
    /// makes progress.
    pub(crate) fn recover(&mut self, err: ParseError, before: usize) {
        self.report(Severity::Error, err.location, err.length, err.message);
        self.enter_panic_mode();
        if self.consumed == before {
            // A group that cannot start a statement goes as one unit.
            if self.check(TokenKind::LBrace) {
                self.skip_braced_group();
                return;
            }
            self.advance();
        }
        self.synchronize();
    }

    /// Advance until just past a `;`, or until a `}`, a token that starts a
    /// declaration, or end of file. A `{ ... }` group met on the way is
    /// skipped whole and ends the resync.
    pub(crate) fn synchronize(&mut self) {
        while !self.check(TokenKind::Eof) {
            if self.previous.is(TokenKind::Semicolon) {
                return;
            }
            match self.current.kind {
                TokenKind::RBrace => return,
                TokenKind::LBrace => {
                    self.skip_braced_group();
                    return;
                }
                kind if starts_declaration(kind) => return,
                _ => self.advance(),
            }
        }
    }

    fn skip_braced_group(&mut self) {
        let mut depth = 0usize;
        while !self.check(TokenKind::Eof) {
            match self.current.kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                }
                _ => {}
            }
            self.advance();
        }
    }
}

fn starts_declaration(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Fn
            | TokenKind::Md
            | TokenKind::Extern
            | TokenKind::Namespace
            | TokenKind::Let
            | TokenKind::Val
            | TokenKind::Const
            | TokenKind::Return
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> (ParseResult, Vec<Diagnostic>) {
        let source = SourceBuffer::new("test.nif", src);
        let mut diagnostics = Vec::new();
        let result = Parser::new(&source, &mut diagnostics).parse();
        (result, diagnostics)
    }

    fn errors(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| d.message.as_str())
            .collect()
    }

    #[test]
    fn test_parse_simple_function() {
        let (result, diagnostics) = parse("fn main() { return 0; }");
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert!(result.is_ok());
        assert!(result.found_entrypoint);
        assert_eq!(result.nodes.len(), 1);
        match &result.nodes[0] {
            AstNode::Function {
                prototype, body, ..
            } => {
                assert_eq!(prototype.name, "main");
                assert!(prototype.params.is_empty());
                assert!(matches!(prototype.return_types[..], [AstNode::Void { .. }]));
                assert_eq!(body.statements.len(), 1);
            }
            other => panic!("Expected function, got {other:?}"),
        }
    }

    #[test]
    fn test_two_errors_two_diagnostics() {
        let src = "fn main() {\n    let a = 1;\n    let b = ;\n    let c = 3;\n    a + ) ;\n    let d = 4;\n}\n";
        let (result, diagnostics) = parse(src);
        let messages = errors(&diagnostics);
        assert_eq!(messages.len(), 2, "{messages:?}");
        assert_eq!(result.error_count, 2);
        assert_eq!(diagnostics[0].location.line, 3);
        assert_eq!(diagnostics[1].location.line, 5);

        let AstNode::Function { body, .. } = &result.nodes[0] else {
            panic!("Expected function");
        };
        let names: Vec<String> = body
            .statements
            .iter()
            .filter_map(|s| match s {
                AstNode::Var { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(names, ["a", "c", "d"]);
    }

    #[test]
    fn test_stray_tokens_at_file_scope() {
        let (result, diagnostics) = parse("} ) fn main() {}");
        assert_eq!(errors(&diagnostics).len(), 1);
        assert_eq!(result.nodes.len(), 1);
        assert!(result.found_entrypoint);
    }

    #[test]
    fn test_lex_error_is_reported_once() {
        let (result, diagnostics) = parse("let x = 1e;\nlet y = 2;");
        assert_eq!(errors(&diagnostics), ["Invalid exponent literal."]);
        assert_eq!(result.nodes.len(), 1);
    }

    #[test]
    fn test_unclosed_block_reports_eof() {
        let (_, diagnostics) = parse("fn main() {\n    let a = 1;\n");
        assert_eq!(
            errors(&diagnostics),
            ["expected '}' after block, got end of file instead"]
        );
    }

    #[test]
    fn test_stray_block_is_skipped_whole() {
        let (result, diagnostics) = parse("{ a; b; c; }\nfn main() {}\n");
        assert_eq!(
            errors(&diagnostics),
            ["expected declaration, got '{' instead"]
        );
        assert_eq!(result.error_count, 1);
        assert_eq!(result.nodes.len(), 1);
        assert!(result.found_entrypoint);
    }

    #[test]
    fn test_unclosed_body_after_failed_statement() {
        let (result, diagnostics) = parse("fn main() {\n  let a = ;\n  let b = 2;\n");
        assert_eq!(
            errors(&diagnostics),
            [
                "expected expression, got ';' instead",
                "expected '}' after block, got end of file instead"
            ]
        );
        assert_eq!(result.error_count, 2);
        assert_eq!(result.nodes.len(), 1);
        let AstNode::Function { body, .. } = &result.nodes[0] else {
            panic!("Expected function");
        };
        assert_eq!(body.statements.len(), 1);
    }

    #[test]
    fn test_parser_from_lexer() {
        let source = SourceBuffer::new("lexed.nif", "let x = 1;\nlet x = 2;");
        let mut diagnostics = Vec::new();
        let result = Parser::from_lexer(Lexer::new(&source), &source, &mut diagnostics).parse();
        assert_eq!(result.nodes.len(), 2);
        assert_eq!(errors(&diagnostics), ["redefinition of symbol 'x'"]);
        assert_eq!(diagnostics[0].source_line.as_deref(), Some("let x = 2;"));
    }

    #[test]
    fn test_error_message_shape() {
        let (_, diagnostics) = parse("fn (x: int) {}");
        assert_eq!(
            errors(&diagnostics),
            ["expected identifier after 'fn', got '(' instead"]
        );
        assert_eq!(diagnostics[0].location.column, 4);
    }
}
