//! Expression parsing
//!
//! Binary operators use precedence climbing driven by
//! [`TokenKind::precedence`]. Prefix operators bind tighter than any binary
//! operator. Postfix `++`/`--` share the highest precedence and are folded
//! into the left operand as the climbing loop meets them.

use crate::parser::ast::*;
use crate::parser::parse::{ParseError, Parser};
use crate::parser::token::{NumberValue, Token, TokenKind};

impl<'src> Parser<'src, '_> {
    pub(crate) fn parse_expression(&mut self) -> Result<AstNode, ParseError> {
        let lhs = self.parse_unary()?;
        self.parse_binary_rhs(0, lhs)
    }

    /// Extend `lhs` with every operator binding at least `min_precedence`.
    fn parse_binary_rhs(
        &mut self,
        min_precedence: u8,
        mut lhs: AstNode,
    ) -> Result<AstNode, ParseError> {
        loop {
            let op_token = self.current;
            let Some(precedence) = op_token.kind.precedence() else {
                return Ok(lhs);
            };
            if precedence < min_precedence {
                return Ok(lhs);
            }
            self.advance();

            if let Some((step, arith)) = step_of(op_token.kind) {
                lhs = self.inc_dec(op_token, step, arith, lhs, false);
                continue;
            }

            let op = BinaryOp::from_token(op_token.kind).ok_or_else(|| {
                self.error_at(op_token, format!("{op_token} is not a binary operator"))
            })?;
            let mut rhs = self.parse_unary()?;

            // Let the right operand absorb tighter operators first. Assignment
            // also absorbs operators of its own level, grouping right to left.
            let right_assoc = op_token.kind.is_right_associative();
            if let Some(next) = self.current.kind.precedence() {
                if next > precedence || (right_assoc && next == precedence) {
                    let threshold = if right_assoc { precedence } else { precedence + 1 };
                    rhs = self.parse_binary_rhs(threshold, rhs)?;
                }
            }

            if op.is_assignment() {
                self.check_assignment(&lhs);
            }
            lhs = AstNode::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                location: self.location(&op_token),
            };
        }
    }

    /// Prefix `-`, `!`, `~` and the prefix increment family.
    fn parse_unary(&mut self) -> Result<AstNode, ParseError> {
        let token = self.current;
        let op = match token.kind {
            TokenKind::Sub => Some(UnaryOp::Neg),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::BitNot => Some(UnaryOp::BitNot),
            _ => None,
        };

        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(AstNode::Unary {
                op,
                operand: Box::new(operand),
                location: self.location(&token),
            });
        }

        if let Some((step, arith)) = step_of(token.kind) {
            self.advance();
            let operand = self.parse_primary()?;
            return Ok(self.inc_dec(token, step, arith, operand, true));
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<AstNode, ParseError> {
        let token = self.current;
        let location = self.location(&token);

        match token.kind {
            TokenKind::Number => {
                self.advance();
                Ok(self.number_literal(token))
            }
            TokenKind::True | TokenKind::False => {
                self.advance();
                Ok(AstNode::Bool {
                    value: token.is(TokenKind::True),
                    location,
                })
            }
            TokenKind::StringLit => {
                self.advance();
                Ok(AstNode::String {
                    value: strip_delimiters(token.lexeme).to_string(),
                    location,
                })
            }
            TokenKind::CharLit => {
                self.advance();
                let value = unescape_char(strip_delimiters(token.lexeme)).unwrap_or_else(|| {
                    self.report_error_at(token, "invalid character literal");
                    '\0'
                });
                Ok(AstNode::Char { value, location })
            }
            TokenKind::Ident if self.check_next(TokenKind::LParen) => self.parse_call(),
            TokenKind::Ident => {
                self.advance();
                if !self.symbols.exists(token.lexeme) {
                    self.report_warning_at(
                        token,
                        format!("use of undeclared identifier '{}'", token.lexeme),
                    );
                }
                Ok(AstNode::Ident {
                    name: token.lexeme.to_string(),
                    location,
                })
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect_token(TokenKind::RParen, "after expression")?;
                Ok(expr)
            }
            _ => Err(self.error_at_current(format!("expected expression, got {token} instead"))),
        }
    }

    /// `NAME(ARG, ...)`. Callees may be declared later in the file, so no
    /// visibility check is made.
    fn parse_call(&mut self) -> Result<AstNode, ParseError> {
        let callee = self.current;
        self.advance();
        self.advance();

        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect_token(TokenKind::RParen, "after arguments")?;

        Ok(AstNode::Call {
            callee: callee.lexeme.to_string(),
            args,
            location: self.location(&callee),
        })
    }

    fn number_literal(&mut self, token: Token<'src>) -> AstNode {
        let location = self.location(&token);
        match token.number_value() {
            Some(NumberValue::Int(value)) => AstNode::Int { value, location },
            Some(NumberValue::Float(value)) => AstNode::Float { value, location },
            None => {
                self.report_error_at(
                    token,
                    format!("numeric literal '{}' is out of range", token.lexeme),
                );
                AstNode::Int { value: 0, location }
            }
        }
    }

    fn inc_dec(
        &mut self,
        token: Token<'src>,
        step: Step,
        arith: Arith,
        operand: AstNode,
        prefix: bool,
    ) -> AstNode {
        self.check_assignment(&operand);
        AstNode::IncDec {
            step,
            arith,
            prefix,
            operand: Box::new(operand),
            location: self.location(&token),
        }
    }

    /// Writes need a name as target, and an immutable binding may only
    /// receive its value once. A successful write marks the symbol assigned.
    fn check_assignment(&mut self, target: &AstNode) {
        let AstNode::Ident { name, location } = target else {
            let location = target.location().clone();
            self.report_error_at_location(location, 1, "invalid assignment target");
            return;
        };

        let reassigned = match self.symbols.lookup_mut(name) {
            Some(symbol) if symbol.mutability != Mutability::Mutable && symbol.assigned => true,
            Some(symbol) => {
                symbol.assigned = true;
                false
            }
            None => false,
        };
        if reassigned {
            self.report_error_at_location(
                location.clone(),
                name.chars().count(),
                format!("cannot assign twice to immutable binding '{name}'"),
            );
        }
    }
}

/// Step and overflow flavor for the `++`/`--` token family.
fn step_of(kind: TokenKind) -> Option<(Step, Arith)> {
    let step = match kind {
        TokenKind::Inc => (Step::Increment, Arith::Plain),
        TokenKind::Dec => (Step::Decrement, Arith::Plain),
        TokenKind::IncWrap => (Step::Increment, Arith::Wrapping),
        TokenKind::DecWrap => (Step::Decrement, Arith::Wrapping),
        TokenKind::IncSat => (Step::Increment, Arith::Saturating),
        TokenKind::DecSat => (Step::Decrement, Arith::Saturating),
        _ => return None,
    };
    Some(step)
}

/// Text between the quotes of a string or character lexeme, kept verbatim.
fn strip_delimiters(lexeme: &str) -> &str {
    lexeme
        .get(1..lexeme.len().saturating_sub(1))
        .unwrap_or_default()
}

fn unescape_char(inner: &str) -> Option<char> {
    let mut chars = inner.chars();
    let value = match chars.next()? {
        '\\' => match chars.next()? {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            _ => return None,
        },
        c => c,
    };
    chars.next().is_none().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostic;
    use crate::parser::parse::ParseResult;
    use crate::source::SourceBuffer;

    fn parse(src: &str) -> (ParseResult, Vec<Diagnostic>) {
        let source = SourceBuffer::new("expr.nif", src);
        let mut diagnostics = Vec::new();
        let result = Parser::new(&source, &mut diagnostics).parse();
        (result, diagnostics)
    }

    /// Parse `expr;` inside a function with `a`, `b`, `c`, `x` in scope and
    /// render it as an s-expression.
    fn tree(expr: &str) -> String {
        let src = format!("fn main() {{\n let a = 1; let b = 2; let c = 3; let x = 4;\n {expr};\n}}");
        let (result, diagnostics) = parse(&src);
        assert!(diagnostics.is_empty(), "{expr}: {diagnostics:?}");
        let AstNode::Function { body, .. } = &result.nodes[0] else {
            panic!("Expected function");
        };
        body.statements[4].to_string()
    }

    #[test]
    fn test_precedence_climbing() {
        assert_eq!(tree("1 + 2 * 3"), "(+ 1 (* 2 3))");
        assert_eq!(tree("1 * 2 + 3"), "(+ (* 1 2) 3)");
        assert_eq!(tree("1 - 2 - 3"), "(- (- 1 2) 3)");
        assert_eq!(tree("1 + 2 * 3 - 4"), "(- (+ 1 (* 2 3)) 4)");
        assert_eq!(tree("a || b && c"), "(|| a (&& b c))");
        assert_eq!(tree("1 < 2 == true"), "(== (< 1 2) true)");
        assert_eq!(tree("a | b ^ c & x"), "(| a (^ b (& c x)))");
        assert_eq!(tree("1 << 2 + 3"), "(<< 1 (+ 2 3))");
        assert_eq!(tree("a ?? b || c"), "(|| (?? a b) c)");
    }

    #[test]
    fn test_assignment_is_right_associative() {
        assert_eq!(tree("a = b = 3"), "(= a (= b 3))");
        assert_eq!(tree("a += b * 2"), "(+= a (* b 2))");
        assert_eq!(tree("a = b + c"), "(= a (+ b c))");
    }

    #[test]
    fn test_unary_and_grouping() {
        assert_eq!(tree("-x * 2"), "(* (- x) 2)");
        assert_eq!(tree("2 - -5"), "(- 2 (- 5))");
        assert_eq!(tree("!(a && b)"), "(! (&& a b))");
        assert_eq!(tree("(1 + 2) * 3"), "(* (+ 1 2) 3)");
        assert_eq!(tree("~a"), "(~ a)");
    }

    #[test]
    fn test_increment_forms() {
        assert_eq!(tree("x++ + 1"), "(+ (post++ x) 1)");
        assert_eq!(tree("1 + x--"), "(+ 1 (post-- x))");
        assert_eq!(tree("++x"), "(pre++ x)");
        assert_eq!(tree("x%++"), "(post%++ x)");
        assert_eq!(tree("@--x"), "(pre@-- x)");
    }

    #[test]
    fn test_arithmetic_families() {
        assert_eq!(tree("a %+ b @* c"), "(%+ a (@* b c))");
        assert_eq!(tree("a @<<= 2"), "(@<<= a 2)");
    }

    #[test]
    fn test_calls_and_literals() {
        assert_eq!(tree("f(1, 2 + 3)"), "(call f 1 (+ 2 3))");
        assert_eq!(tree("g()"), "(call g)");
        assert_eq!(tree("0.5"), "0.5");
        assert_eq!(tree("'\\n'"), "'\\n'");
        assert_eq!(tree("\"hi\""), "\"hi\"");
    }

    #[test]
    fn test_string_keeps_newline() {
        let (result, diagnostics) = parse("let s = \"line one\nline two\";");
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let AstNode::Var { init: Some(init), .. } = &result.nodes[0] else {
            panic!("Expected var");
        };
        assert!(matches!(
            init.as_ref(),
            AstNode::String { value, .. } if value == "line one\nline two"
        ));
    }

    #[test]
    fn test_immutable_reassignment() {
        let (_, diagnostics) =
            parse("fn main() {\n  val v = 1;\n  let m = 1;\n  m = 2;\n  v = 2;\n  v++;\n}");
        let messages: Vec<&str> = diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            [
                "cannot assign twice to immutable binding 'v'",
                "cannot assign twice to immutable binding 'v'"
            ]
        );
        assert_eq!((diagnostics[0].location.line, diagnostics[0].location.column), (5, 3));
    }

    #[test]
    fn test_typed_binding_assigned_later() {
        let (_, diagnostics) = parse("fn main() {\n  v: int;\n  v = 1;\n}");
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
    }

    #[test]
    fn test_invalid_assignment_target() {
        let (_, diagnostics) = parse("fn main() { 1 = 2; }");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "invalid assignment target");
    }

    #[test]
    fn test_undeclared_identifier_warns() {
        let (result, diagnostics) = parse("fn main() { ghost + 1; }");
        assert_eq!(result.error_count, 0);
        assert_eq!(result.warning_count, 1);
        assert_eq!(diagnostics[0].message, "use of undeclared identifier 'ghost'");
        assert_eq!(diagnostics[0].length, 5);
    }

    #[test]
    fn test_number_out_of_range() {
        let (result, diagnostics) = parse("let big = 0xFFFF_FFFF_FFFF_FFFF_F;");
        assert_eq!(result.error_count, 1);
        assert!(diagnostics[0].message.contains("out of range"));
    }

    #[test]
    fn test_unescape_char() {
        assert_eq!(unescape_char("a"), Some('a'));
        assert_eq!(unescape_char("\\'"), Some('\''));
        assert_eq!(unescape_char("é"), Some('é'));
        assert_eq!(unescape_char(""), None);
        assert_eq!(unescape_char("ab"), None);
    }
}
