// Statement parsing: blocks, named blocks, return, and expression statements

use crate::parser::ast::*;
use crate::parser::parse::{ParseError, Parser};
use crate::parser::token::{Token, TokenKind};
use crate::symbols::ScopeKind;

impl<'src> Parser<'src, '_> {
    /// Statements up to and including the closing `}`. The opening `{` must
    /// already be consumed. Each failed statement is reported and skipped. A
    /// missing `}` is reported too, and the statements read so far are kept.
    pub(crate) fn parse_statements(&mut self) -> Vec<AstNode> {
        let mut statements = Vec::new();

        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::Eof) {
            self.exit_panic_mode();
            let before = self.consumed;
            match self.parse_statement() {
                Ok(Some(statement)) => statements.push(statement),
                Ok(None) => {}
                Err(err) => self.recover(err, before),
            }
        }

        // The missing brace is its own mistake, not part of the last one.
        self.exit_panic_mode();
        if let Err(err) = self.expect_token(TokenKind::RBrace, "after block") {
            self.report_error_at_location(err.location, err.length, err.message);
            self.enter_panic_mode();
        }
        statements
    }

    /// `{ ... }` in its own scope.
    pub(crate) fn parse_block(&mut self) -> Result<Block, ParseError> {
        let open = self.expect_token(TokenKind::LBrace, "to open block")?;
        self.symbols.push_scope(ScopeKind::Block);
        let statements = self.parse_statements();
        self.symbols.pop_scope();

        Ok(Block {
            statements,
            location: self.location(&open),
        })
    }

    pub(crate) fn parse_statement(&mut self) -> Result<Option<AstNode>, ParseError> {
        match self.current.kind {
            TokenKind::Let | TokenKind::Val | TokenKind::Const => {
                self.parse_var_declaration().map(Some)
            }
            TokenKind::Ident if self.starts_binding() => self.parse_binding(),
            TokenKind::Return => self.parse_return().map(Some),
            TokenKind::LBrace => self.parse_block().map(|block| Some(AstNode::Block(block))),
            TokenKind::Semicolon => {
                self.advance();
                Ok(None)
            }
            TokenKind::Fn | TokenKind::Md | TokenKind::Extern | TokenKind::Namespace => {
                Err(self.error_at_current(format!(
                    "{} declarations are only allowed at file scope",
                    self.current.kind
                )))
            }
            _ => {
                let expr = self.parse_expression()?;
                self.expect_token(TokenKind::Semicolon, "after expression")?;
                Ok(Some(expr))
            }
        }
    }

    /// `NAME : { ... }`, with the name and colon already consumed.
    pub(crate) fn parse_named_block(&mut self, name: Token<'src>) -> Result<AstNode, ParseError> {
        if !self.in_function {
            self.report_error_at(name, "a named block must be within a function");
        }
        let block = self.parse_block()?;
        Ok(AstNode::NamedBlock {
            name: name.lexeme.to_string(),
            block,
            location: self.location(&name),
        })
    }

    /// `return [EXPR {, EXPR}] [;]`. Outside a function this is reported but
    /// still parsed, so the values do not cascade into more errors.
    pub(crate) fn parse_return(&mut self) -> Result<AstNode, ParseError> {
        let keyword = self.current;
        self.advance();
        if !self.in_function {
            self.report_error_at(keyword, "return statement must be within a function");
        }

        let mut values = Vec::new();
        if !matches!(
            self.current.kind,
            TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
        ) {
            values.push(self.parse_expression()?);
            while self.match_token(TokenKind::Comma) {
                values.push(self.parse_expression()?);
            }
        }
        self.match_token(TokenKind::Semicolon);

        Ok(AstNode::Return {
            values,
            location: self.location(&keyword),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::diagnostics::Diagnostic;
    use crate::parser::ast::*;
    use crate::parser::parse::{ParseResult, Parser};
    use crate::source::SourceBuffer;

    fn parse(src: &str) -> (ParseResult, Vec<Diagnostic>) {
        let source = SourceBuffer::new("stmt.nif", src);
        let mut diagnostics = Vec::new();
        let result = Parser::new(&source, &mut diagnostics).parse();
        (result, diagnostics)
    }

    fn messages(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics.iter().map(|d| d.message.as_str()).collect()
    }

    fn body(result: &ParseResult) -> &[AstNode] {
        match &result.nodes[0] {
            AstNode::Function { body, .. } => &body.statements,
            other => panic!("Expected function, got {other:?}"),
        }
    }

    #[test]
    fn test_return_outside_function() {
        let (result, diagnostics) = parse("return 1;\nfn main() { return; }");
        assert_eq!(
            messages(&diagnostics),
            ["return statement must be within a function"]
        );
        assert_eq!(result.nodes.len(), 2);
    }

    #[test]
    fn test_bare_return_before_brace() {
        let (result, diagnostics) = parse("fn main() { return }");
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert!(matches!(
            &body(&result)[0],
            AstNode::Return { values, .. } if values.is_empty()
        ));
    }

    #[test]
    fn test_shadowing_in_nested_block() {
        let (result, diagnostics) = parse("fn main() {\n  let x = 1;\n  {\n    let x = 2;\n  }\n}");
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert!(matches!(&body(&result)[1], AstNode::Block(block) if block.statements.len() == 1));
    }

    #[test]
    fn test_redeclaration_in_function_scope() {
        let (_, diagnostics) = parse("fn main() {\n  let x = 1;\n  let x = 2;\n}");
        assert_eq!(messages(&diagnostics), ["redefinition of symbol 'x'"]);
        assert_eq!(diagnostics[0].location.line, 3);
    }

    #[test]
    fn test_argument_redeclared_in_body() {
        let (_, diagnostics) = parse("fn f(n: int) { let n = 2; }");
        assert_eq!(messages(&diagnostics), ["redefinition of symbol 'n'"]);
    }

    #[test]
    fn test_block_names_do_not_leak() {
        let (_, diagnostics) = parse("fn main() {\n  { let inner = 1; }\n  inner;\n}");
        assert_eq!(
            messages(&diagnostics),
            ["use of undeclared identifier 'inner'"]
        );
        assert!(!diagnostics[0].is_error());
    }

    #[test]
    fn test_named_block() {
        let (result, diagnostics) = parse("fn main() { outer: { let a = 1; } }");
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert!(matches!(
            &body(&result)[0],
            AstNode::NamedBlock { name, block, .. } if name == "outer" && block.statements.len() == 1
        ));
    }

    #[test]
    fn test_named_block_at_file_scope() {
        let (_, diagnostics) = parse("outer: { }");
        assert_eq!(
            messages(&diagnostics),
            ["a named block must be within a function"]
        );
    }

    #[test]
    fn test_nested_function_is_rejected() {
        let (result, diagnostics) = parse("fn main() {\n  fn inner() { }\n  let a = 1;\n}");
        assert_eq!(
            messages(&diagnostics),
            ["'fn' declarations are only allowed at file scope"]
        );
        assert_eq!(body(&result).len(), 1);
    }

    #[test]
    fn test_expression_statement_needs_semicolon() {
        let (_, diagnostics) = parse("fn main() {\n  let x = 1;\n  x = 2\n  x = 3;\n}");
        assert_eq!(
            messages(&diagnostics),
            ["expected ';' after expression, got identifier 'x' instead"]
        );
        assert_eq!(diagnostics[0].location.line, 4);
    }
}
