//! Declaration parsing
//!
//! Handles everything that may appear at file scope: the `namespace` line,
//! `fn`/`md` definitions, `extern fn` prototypes, and variable bindings.
//! Binding forms are shared with statement parsing.

use crate::parser::ast::*;
use crate::parser::parse::{ParseError, Parser};
use crate::parser::token::{Token, TokenKind};
use crate::symbols::{ScopeKind, Symbol, SymbolKind};

/// Most arguments a single prototype may declare.
pub const MAX_ARGS: usize = 16;

impl<'src> Parser<'src, '_> {
    /// Parse one file-scope declaration. `Ok(None)` means the declaration was
    /// consumed but produced no node.
    pub(crate) fn parse_declaration(&mut self) -> Result<Option<AstNode>, ParseError> {
        match self.current.kind {
            TokenKind::Namespace => self.parse_namespace(),
            TokenKind::Fn | TokenKind::Md => self.parse_function().map(Some),
            TokenKind::Extern => self.parse_extern().map(Some),
            TokenKind::Let | TokenKind::Val | TokenKind::Const => {
                self.parse_var_declaration().map(Some)
            }
            TokenKind::Ident if self.starts_binding() => self.parse_binding(),
            TokenKind::Return => self.parse_return().map(Some),
            _ => Err(self.error_at_current(format!(
                "expected declaration, got {} instead",
                self.current
            ))),
        }
    }

    /// `NAME :=`, `NAME ::=`, or `NAME :` at the current position.
    pub(crate) fn starts_binding(&self) -> bool {
        self.check(TokenKind::Ident)
            && matches!(
                self.lookahead.kind,
                TokenKind::LetDecl | TokenKind::ConstDecl | TokenKind::Colon
            )
    }

    /// Only one namespace may be set per file. A second one is reported at
    /// its own site and dropped.
    fn parse_namespace(&mut self) -> Result<Option<AstNode>, ParseError> {
        let keyword = self.current;
        self.advance();
        let name = self.expect_identifier("after 'namespace'")?;
        self.match_token(TokenKind::Semicolon);

        if let Some(line) = self.namespace.as_ref().map(|(_, line)| *line) {
            self.report_error_at(name, format!("namespace already set on line {line}"));
            return Ok(None);
        }

        self.namespace = Some((name.lexeme.to_string(), keyword.line));
        self.symbols.push_scope(ScopeKind::Namespace);
        Ok(Some(AstNode::Namespace {
            name: name.lexeme.to_string(),
            location: self.location(&keyword),
        }))
    }

    /// Parse function definition: prototype followed by a body.
    fn parse_function(&mut self) -> Result<AstNode, ParseError> {
        let prototype = self.parse_prototype(false)?;

        let enclosing = self.in_function;
        self.in_function = true;
        self.symbols.push_scope(ScopeKind::Function);
        for param in &prototype.params {
            let symbol = Symbol::new(
                param.name.clone(),
                self.file.clone(),
                SymbolKind::Value,
                param.location.line,
                param.location.column,
            )
            .assigned(true);
            self.symbols.declare(symbol);
        }

        // Body statements share the function scope with the arguments.
        let body = self.parse_function_body();
        self.symbols.pop_scope();
        self.in_function = enclosing;

        Ok(AstNode::Function {
            location: prototype.location.clone(),
            prototype,
            body: body?,
        })
    }

    fn parse_function_body(&mut self) -> Result<Block, ParseError> {
        let open = self.expect_token(TokenKind::LBrace, "before function body")?;
        let statements = self.parse_statements();
        Ok(Block {
            statements,
            location: self.location(&open),
        })
    }

    /// `extern fn NAME(ARGS)[: TYPES] [;]`
    fn parse_extern(&mut self) -> Result<AstNode, ParseError> {
        self.advance();
        if !self.check(TokenKind::Fn) {
            return Err(self.error_at_current(format!(
                "expected 'fn' after 'extern', got {} instead",
                self.current
            )));
        }
        let prototype = self.parse_prototype(true)?;
        self.match_token(TokenKind::Semicolon);
        Ok(AstNode::Prototype(prototype))
    }

    /// Parse `fn|md NAME(ARG: TYPE, ...)` plus the return types.
    ///
    /// No written return type means a lone `void`, which is only allowed when
    /// a body follows directly or the prototype is `extern`. Otherwise `:`
    /// introduces one or more comma-separated return types.
    fn parse_prototype(&mut self, is_extern: bool) -> Result<Prototype, ParseError> {
        let keyword = self.current;
        self.advance();
        let kind = if keyword.is(TokenKind::Md) {
            FunctionKind::Method
        } else {
            FunctionKind::Function
        };

        let name = self.expect_identifier(&format!("after {}", keyword.kind))?;
        self.declare_function(name, is_extern);

        self.expect_token(TokenKind::LParen, "after function name")?;
        let mut params: Vec<Param> = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let arg = self.expect_identifier("in argument list")?;
                if params.iter().any(|p| p.name == arg.lexeme) {
                    self.report_error_at(arg, format!("redefinition of argument '{}'", arg.lexeme));
                }
                self.expect_token(TokenKind::Colon, "after argument name")?;
                let param_type = self.parse_type("for argument")?;
                if params.len() == MAX_ARGS {
                    self.report_error_at(
                        arg,
                        format!("a function can't have more than {MAX_ARGS} arguments"),
                    );
                }
                params.push(Param {
                    name: arg.lexeme.to_string(),
                    param_type: Box::new(param_type),
                    location: self.location(&arg),
                });
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect_token(TokenKind::RParen, "after argument list")?;

        let return_types = if self.match_token(TokenKind::Colon) {
            let mut types = vec![self.parse_type("after ':'")?];
            while self.match_token(TokenKind::Comma) {
                types.push(self.parse_type("after ','")?);
            }
            types
        } else if is_extern || self.check(TokenKind::LBrace) {
            vec![AstNode::Void {
                location: self.current_location(),
            }]
        } else {
            return Err(self.error_at_current(format!(
                "expected ':' or '{{' after argument list, got {} instead",
                self.current
            )));
        };

        Ok(Prototype {
            name: name.lexeme.to_string(),
            params,
            return_types,
            kind,
            is_extern,
            location: self.location(&name),
        })
    }

    fn declare_function(&mut self, name: Token<'src>, is_extern: bool) {
        let at_file_scope = matches!(
            self.symbols.current_kind(),
            ScopeKind::File | ScopeKind::Namespace
        );
        if name.lexeme == "main" && at_file_scope && !is_extern {
            self.found_entrypoint = true;
        }

        let symbol = Symbol::new(name.lexeme, self.file.clone(), SymbolKind::Function, name.line, name.column)
            .with_mutability(Mutability::Const)
            .assigned(true);
        if !self.symbols.declare(symbol) {
            self.report_error_at(name, format!("redefinition of symbol '{}'", name.lexeme));
        }
    }

    /// `let|val|const NAME [: TYPE] [= EXPR] [;]`
    pub(crate) fn parse_var_declaration(&mut self) -> Result<AstNode, ParseError> {
        let keyword = self.current;
        self.advance();
        let mutability = match keyword.kind {
            TokenKind::Val => Mutability::Immutable,
            TokenKind::Const => Mutability::Const,
            _ => Mutability::Mutable,
        };

        let name = self.expect_identifier(&format!("after {}", keyword.kind))?;
        let var_type = if self.match_token(TokenKind::Colon) {
            Some(self.parse_type("after ':'")?)
        } else {
            None
        };
        let init = if self.match_token(TokenKind::Assign) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.match_token(TokenKind::Semicolon);

        if mutability != Mutability::Mutable && init.is_none() {
            self.report_error_at(
                name,
                format!("immutable binding '{}' must be initialized", name.lexeme),
            );
        }
        Ok(self.finish_var(name, var_type, init, mutability))
    }

    /// Bindings introduced by a name: `NAME := EXPR`, `NAME ::= EXPR`,
    /// `NAME : TYPE [= EXPR]`, and the named block `NAME : { ... }`.
    pub(crate) fn parse_binding(&mut self) -> Result<Option<AstNode>, ParseError> {
        let name = self.current;
        self.advance();
        let operator = self.current;
        self.advance();

        let node = match operator.kind {
            TokenKind::LetDecl | TokenKind::ConstDecl => {
                let init = self.parse_expression()?;
                let mutability = if operator.is(TokenKind::ConstDecl) {
                    Mutability::Const
                } else {
                    Mutability::Mutable
                };
                self.finish_var(name, None, Some(init), mutability)
            }
            _ if self.check(TokenKind::LBrace) => return self.parse_named_block(name).map(Some),
            _ => {
                let var_type = self.parse_type("after ':'")?;
                let init = if self.match_token(TokenKind::Assign) {
                    Some(self.parse_expression()?)
                } else {
                    None
                };
                self.finish_var(name, Some(var_type), init, Mutability::Mutable)
            }
        };
        self.match_token(TokenKind::Semicolon);
        Ok(Some(node))
    }

    /// Declare the binding in the current scope and build its node. The
    /// initializer was parsed first, so `let x = x` still sees an outer `x`.
    fn finish_var(
        &mut self,
        name: Token<'src>,
        var_type: Option<AstNode>,
        init: Option<AstNode>,
        mutability: Mutability,
    ) -> AstNode {
        let symbol = Symbol::new(name.lexeme, self.file.clone(), SymbolKind::Value, name.line, name.column)
            .with_mutability(mutability)
            .assigned(init.is_some());
        if !self.symbols.declare(symbol) {
            self.report_error_at(name, format!("redefinition of symbol '{}'", name.lexeme));
        }

        AstNode::Var {
            name: name.lexeme.to_string(),
            var_type: var_type.map(Box::new),
            init: init.map(Box::new),
            mutability,
            location: self.location(&name),
        }
    }

    /// A builtin type keyword or a user type name.
    pub(crate) fn parse_type(&mut self, ctx: &str) -> Result<AstNode, ParseError> {
        let token = self.current;
        let location = self.location(&token);
        if token.is(TokenKind::Void) {
            self.advance();
            return Ok(AstNode::Void { location });
        }
        if token.kind.is_builtin_type() || token.is(TokenKind::Ident) {
            self.advance();
            return Ok(AstNode::Type {
                name: token.lexeme.to_string(),
                location,
            });
        }
        Err(self.error_at_current(format!("expected type {ctx}, got {token} instead")))
    }
}

#[cfg(test)]
mod tests {
    use crate::diagnostics::Diagnostic;
    use crate::parser::ast::*;
    use crate::parser::parse::{ParseResult, Parser};
    use crate::source::SourceBuffer;

    fn parse(src: &str) -> (ParseResult, Vec<Diagnostic>) {
        let source = SourceBuffer::new("decl.nif", src);
        let mut diagnostics = Vec::new();
        let result = Parser::new(&source, &mut diagnostics).parse();
        (result, diagnostics)
    }

    fn messages(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics.iter().map(|d| d.message.as_str()).collect()
    }

    #[test]
    fn test_second_namespace_is_rejected() {
        let (result, diagnostics) = parse("namespace app;\n\nnamespace other;\nfn main() {}");
        assert_eq!(messages(&diagnostics), ["namespace already set on line 1"]);
        assert_eq!(diagnostics[0].location.line, 3);
        assert_eq!(result.namespace.as_deref(), Some("app"));
        assert_eq!(result.nodes.len(), 2);
        assert!(result.found_entrypoint);
    }

    #[test]
    fn test_multiple_return_types() {
        let (result, diagnostics) = parse("fn divmod(a: int, b: int): int, int { return a / b, a % b; }");
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let AstNode::Function { prototype, body, .. } = &result.nodes[0] else {
            panic!("Expected function");
        };
        assert_eq!(prototype.params.len(), 2);
        assert_eq!(prototype.return_types.len(), 2);
        assert!(matches!(
            &body.statements[0],
            AstNode::Return { values, .. } if values.len() == 2
        ));
    }

    #[test]
    fn test_duplicate_argument() {
        let (_, diagnostics) = parse("fn f(a: int, a: int) {}");
        assert_eq!(messages(&diagnostics), ["redefinition of argument 'a'"]);
        assert_eq!(diagnostics[0].location.column, 14);
    }

    #[test]
    fn test_too_many_arguments() {
        let args: Vec<String> = (0..17).map(|i| format!("a{i}: int")).collect();
        let src = format!("fn wide({}) {{}}", args.join(", "));
        let (result, diagnostics) = parse(&src);
        assert_eq!(
            messages(&diagnostics),
            ["a function can't have more than 16 arguments"]
        );
        assert_eq!(result.nodes.len(), 1);
    }

    #[test]
    fn test_missing_return_type_separator() {
        let (_, diagnostics) = parse("fn f() int {}");
        assert_eq!(
            messages(&diagnostics),
            ["expected ':' or '{' after argument list, got 'int' instead"]
        );
    }

    #[test]
    fn test_extern_and_method() {
        let (result, diagnostics) = parse("extern fn puts(s: cstring): s32;\nmd area(self: Shape): f64 { return 0.0; }");
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert!(matches!(
            &result.nodes[0],
            AstNode::Prototype(p) if p.is_extern && p.name == "puts"
        ));
        assert!(matches!(
            &result.nodes[1],
            AstNode::Function { prototype, .. } if prototype.kind == FunctionKind::Method
        ));
        assert!(!result.found_entrypoint);
    }

    #[test]
    fn test_binding_forms() {
        let (result, diagnostics) =
            parse("let a: int = 1;\nval b = 2;\nconst c = 3;\nd := 4\ne ::= 5\nf: u8 = 6;\ng: bool");
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let forms: Vec<(String, Mutability, bool)> = result
            .nodes
            .iter()
            .map(|node| match node {
                AstNode::Var {
                    name,
                    mutability,
                    var_type,
                    ..
                } => (name.clone(), *mutability, var_type.is_some()),
                other => panic!("Expected var, got {other:?}"),
            })
            .collect();
        assert_eq!(
            forms,
            vec![
                ("a".to_string(), Mutability::Mutable, true),
                ("b".to_string(), Mutability::Immutable, false),
                ("c".to_string(), Mutability::Const, false),
                ("d".to_string(), Mutability::Mutable, false),
                ("e".to_string(), Mutability::Const, false),
                ("f".to_string(), Mutability::Mutable, true),
                ("g".to_string(), Mutability::Mutable, true),
            ]
        );
    }

    #[test]
    fn test_immutable_needs_initializer() {
        let (_, diagnostics) = parse("val x;\nconst y: int;");
        assert_eq!(
            messages(&diagnostics),
            [
                "immutable binding 'x' must be initialized",
                "immutable binding 'y' must be initialized"
            ]
        );
    }

    #[test]
    fn test_redeclaration_at_file_scope() {
        let (result, diagnostics) = parse("let x = 1;\nlet x = 2;\nfn f() {}\nfn f() {}");
        assert_eq!(
            messages(&diagnostics),
            ["redefinition of symbol 'x'", "redefinition of symbol 'f'"]
        );
        assert_eq!(result.error_count, 2);
        assert_eq!(result.nodes.len(), 4);
    }
}
