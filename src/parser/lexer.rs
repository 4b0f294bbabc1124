//! Lexer (tokenizer) for Nifty source code
//!
//! Produces one [`Token`] per [`Lexer::next_token`] call, on demand. Lexemes are
//! borrowed views into the source buffer. The lexer never fails: malformed input
//! becomes a [`TokenKind::Error`] token whose lexeme is the message.
//!
//! Operators are matched greedily, so `..=` is one token and `@<<=` is one
//! token. Block comments (`/- -/` or `/* */`) nest.

use super::token::{identifier_kind, Token, TokenKind};
use crate::source::SourceBuffer;

/// Cursor over the bytes of one source buffer.
pub struct Lexer<'src> {
    text: &'src str,
    bytes: &'src [u8],
    start: usize,
    current: usize,
    line: u32,
    /// Characters consumed on the current line; 0 right after a newline.
    column: u32,
    start_line: u32,
    start_column: u32,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src SourceBuffer) -> Self {
        Self::for_text(source.text())
    }

    /// Lex text that is not backed by a loaded file.
    pub fn for_text(text: &'src str) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            start: 0,
            current: 0,
            line: 1,
            column: 0,
            start_line: 1,
            start_column: 1,
        }
    }

    /// Lex the whole input. The last token is always [`TokenKind::Eof`].
    pub fn tokenize(&mut self) -> Vec<Token<'src>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            tokens.push(token);
            if token.is(TokenKind::Eof) {
                return tokens;
            }
        }
    }

    /// Scan the next token. Keeps returning `Eof` once the input is exhausted.
    pub fn next_token(&mut self) -> Token<'src> {
        if let Err(error) = self.skip_trivia() {
            return error;
        }

        self.start = self.current;
        self.start_line = self.line;
        self.start_column = self.column + 1;

        let Some(c) = self.advance() else {
            return self.make_token(TokenKind::Eof);
        };

        match c {
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),
            b'0'..=b'9' => self.number(c),
            b'"' => self.quoted(b'"', TokenKind::StringLit, "Unterminated string."),
            b'\'' => self.quoted(b'\'', TokenKind::CharLit, "Unterminated character literal."),

            b'(' => self.make_token(TokenKind::LParen),
            b')' => self.make_token(TokenKind::RParen),
            b'{' => self.make_token(TokenKind::LBrace),
            b'}' => self.make_token(TokenKind::RBrace),
            b'[' => self.make_token(TokenKind::LBracket),
            b']' => self.make_token(TokenKind::RBracket),
            b',' => self.make_token(TokenKind::Comma),
            b';' => self.make_token(TokenKind::Semicolon),
            b'#' => self.make_token(TokenKind::Hash),
            b'~' => self.make_token(TokenKind::BitNot),

            b'.' => {
                let kind = if self.eat(b'.') {
                    if self.eat(b'=') {
                        TokenKind::ClosedRange
                    } else if self.eat(b'<') {
                        TokenKind::OpenRange
                    } else {
                        TokenKind::DotDot
                    }
                } else {
                    TokenKind::Dot
                };
                self.make_token(kind)
            }
            b':' => {
                let kind = if self.eat(b':') {
                    if self.eat(b'=') {
                        TokenKind::ConstDecl
                    } else {
                        TokenKind::Scope
                    }
                } else if self.eat(b'=') {
                    TokenKind::LetDecl
                } else {
                    TokenKind::Colon
                };
                self.make_token(kind)
            }
            b'=' => {
                let kind = if self.eat(b'=') {
                    TokenKind::Eq
                } else {
                    TokenKind::Assign
                };
                self.make_token(kind)
            }
            b'!' => {
                let kind = if self.eat(b'=') {
                    TokenKind::NotEq
                } else {
                    TokenKind::Bang
                };
                self.make_token(kind)
            }
            b'+' => {
                let kind = if self.eat(b'+') {
                    TokenKind::Inc
                } else if self.eat(b'=') {
                    TokenKind::AddEq
                } else {
                    TokenKind::Add
                };
                self.make_token(kind)
            }
            b'-' => {
                let kind = if self.eat(b'-') {
                    TokenKind::Dec
                } else if self.eat(b'=') {
                    TokenKind::SubEq
                } else if self.eat(b'>') {
                    TokenKind::Arrow
                } else {
                    TokenKind::Sub
                };
                self.make_token(kind)
            }
            b'*' => {
                let kind = if self.eat(b'=') {
                    TokenKind::MulEq
                } else {
                    TokenKind::Mul
                };
                self.make_token(kind)
            }
            b'/' => {
                let kind = if self.eat(b'=') {
                    TokenKind::DivEq
                } else {
                    TokenKind::Div
                };
                self.make_token(kind)
            }
            b'%' => {
                let kind = self
                    .arithmetic_family(ArithFamily::WRAPPING)
                    .unwrap_or_else(|| {
                        if self.eat(b'=') {
                            TokenKind::ModEq
                        } else {
                            TokenKind::Mod
                        }
                    });
                self.make_token(kind)
            }
            b'@' => {
                let kind = self
                    .arithmetic_family(ArithFamily::SATURATING)
                    .unwrap_or(TokenKind::At);
                self.make_token(kind)
            }
            b'<' => {
                let kind = if self.eat(b'<') {
                    if self.eat(b'=') {
                        TokenKind::ShlEq
                    } else {
                        TokenKind::Shl
                    }
                } else if self.eat(b'=') {
                    TokenKind::LtEq
                } else if self.eat(b'-') {
                    TokenKind::LeftArrow
                } else {
                    TokenKind::Lt
                };
                self.make_token(kind)
            }
            b'>' => {
                let kind = if self.eat(b'>') {
                    if self.eat(b'=') {
                        TokenKind::ShrEq
                    } else {
                        TokenKind::Shr
                    }
                } else if self.eat(b'=') {
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                };
                self.make_token(kind)
            }
            b'&' => {
                let kind = if self.eat(b'&') {
                    TokenKind::And
                } else if self.eat(b'=') {
                    TokenKind::BitAndEq
                } else {
                    TokenKind::BitAnd
                };
                self.make_token(kind)
            }
            b'|' => {
                let kind = if self.eat(b'|') {
                    if self.eat(b'=') {
                        TokenKind::OrEq
                    } else {
                        TokenKind::Or
                    }
                } else if self.eat(b'=') {
                    TokenKind::BitOrEq
                } else {
                    TokenKind::BitOr
                };
                self.make_token(kind)
            }
            b'^' => {
                let kind = if self.eat(b'=') {
                    TokenKind::BitXorEq
                } else {
                    TokenKind::Caret
                };
                self.make_token(kind)
            }
            b'?' => {
                let kind = if self.eat(b'?') {
                    if self.eat(b'=') {
                        TokenKind::NullCoalesceEq
                    } else {
                        TokenKind::NullCoalesce
                    }
                } else if self.eat(b'.') {
                    TokenKind::QuestionDot
                } else {
                    TokenKind::Question
                };
                self.make_token(kind)
            }

            _ => {
                // Swallow the rest of a multi-byte character so the next token
                // starts on a char boundary.
                while self.peek().is_some_and(is_continuation_byte) {
                    self.advance();
                }
                self.error_token("Unexpected character.")
            }
        }
    }

    /// Longest match for the operators that follow a `%` or `@` prefix.
    fn arithmetic_family(&mut self, family: ArithFamily) -> Option<TokenKind> {
        let kind = if self.eat(b'+') {
            if self.eat(b'+') {
                family.inc
            } else if self.eat(b'=') {
                family.add_eq
            } else {
                family.add
            }
        } else if self.eat(b'-') {
            if self.eat(b'-') {
                family.dec
            } else if self.eat(b'=') {
                family.sub_eq
            } else {
                family.sub
            }
        } else if self.eat(b'*') {
            if self.eat(b'=') {
                family.mul_eq
            } else {
                family.mul
            }
        } else if self.eat_all(b"<<") {
            if self.eat(b'=') {
                family.shl_eq
            } else {
                family.shl
            }
        } else {
            return None;
        };
        Some(kind)
    }

    fn identifier(&mut self) -> Token<'src> {
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_')
        {
            self.advance();
        }
        let kind = identifier_kind(self.lexeme());
        self.make_token(kind)
    }

    fn number(&mut self, first: u8) -> Token<'src> {
        if first == b'0' {
            if self.eat(b'x') || self.eat(b'X') {
                return self.radix_literal(|b| b.is_ascii_hexdigit(), "Invalid hex literal.");
            }
            if self.eat(b'o') || self.eat(b'O') || self.eat(b'q') || self.eat(b'Q') {
                return self.radix_literal(|b| (b'0'..=b'7').contains(&b), "Invalid octal literal.");
            }
        }

        self.digit_run(|b| b.is_ascii_digit());

        // `1..5` is a range, not a malformed float.
        if self.peek() == Some(b'.') && self.peek_next().is_some_and(|b| b.is_ascii_digit()) {
            self.advance();
            self.digit_run(|b| b.is_ascii_digit());
        }

        if matches!(self.peek(), Some(b'e' | b'E')) {
            self.advance();
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.advance();
            }
            if self.digit_run(|b| b.is_ascii_digit()) == 0 {
                return self.error_token("Invalid exponent literal.");
            }
        }

        self.make_token(TokenKind::Number)
    }

    fn radix_literal(&mut self, is_digit: fn(u8) -> bool, message: &'static str) -> Token<'src> {
        if self.digit_run(is_digit) == 0 {
            return self.error_token(message);
        }
        self.make_token(TokenKind::Number)
    }

    /// Consume digits and `_` separators; returns how many real digits were seen.
    fn digit_run(&mut self, is_digit: fn(u8) -> bool) -> usize {
        let mut digits = 0;
        while let Some(b) = self.peek() {
            if is_digit(b) {
                digits += 1;
            } else if b != b'_' {
                break;
            }
            self.advance();
        }
        digits
    }

    /// String and character literals. The only escape the lexer knows is a
    /// backslash before the delimiter, which does not close the literal.
    /// Newlines are kept.
    fn quoted(&mut self, delimiter: u8, kind: TokenKind, unterminated: &'static str) -> Token<'src> {
        loop {
            match self.peek() {
                None => return self.error_token(unterminated),
                Some(b) if b == delimiter => {
                    self.advance();
                    return self.make_token(kind);
                }
                Some(b'\\') if self.peek_next() == Some(delimiter) => {
                    self.advance();
                    self.advance();
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    /// Skip whitespace and comments. An unterminated block comment comes back
    /// as an error token positioned at its opener.
    fn skip_trivia(&mut self) -> Result<(), Token<'src>> {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r' | b'\n') => {
                    self.advance();
                }
                Some(b'/') => match self.peek_next() {
                    Some(b'/') => {
                        while self.peek().is_some_and(|b| b != b'\n') {
                            self.advance();
                        }
                    }
                    Some(b'-' | b'*') => self.block_comment()?,
                    _ => return Ok(()),
                },
                _ => return Ok(()),
            }
        }
    }

    fn block_comment(&mut self) -> Result<(), Token<'src>> {
        let (line, column) = (self.line, self.column + 1);
        self.advance();
        self.advance();

        let mut level = 1usize;
        while level > 0 {
            match (self.peek(), self.peek_next()) {
                (None, _) => {
                    return Err(Token::new(
                        TokenKind::Error,
                        "Unterminated block comment.",
                        line,
                        column,
                    ))
                }
                (Some(b'/'), Some(b'-' | b'*')) => {
                    self.advance();
                    self.advance();
                    level += 1;
                }
                (Some(b'-' | b'*'), Some(b'/')) => {
                    self.advance();
                    self.advance();
                    level -= 1;
                }
                _ => {
                    self.advance();
                }
            }
        }
        Ok(())
    }

    fn advance(&mut self) -> Option<u8> {
        let b = *self.bytes.get(self.current)?;
        self.current += 1;
        if b == b'\n' {
            self.line += 1;
            self.column = 0;
        } else if !is_continuation_byte(b) {
            self.column += 1;
        }
        Some(b)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.current).copied()
    }

    fn peek_next(&self) -> Option<u8> {
        self.bytes.get(self.current + 1).copied()
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume `expected` only if every byte of it is next in the input.
    fn eat_all(&mut self, expected: &[u8]) -> bool {
        if !self.bytes[self.current..].starts_with(expected) {
            return false;
        }
        for _ in expected {
            self.advance();
        }
        true
    }

    fn lexeme(&self) -> &'src str {
        &self.text[self.start..self.current]
    }

    fn make_token(&self, kind: TokenKind) -> Token<'src> {
        Token::new(kind, self.lexeme(), self.start_line, self.start_column)
    }

    fn error_token(&self, message: &'static str) -> Token<'src> {
        Token::new(TokenKind::Error, message, self.start_line, self.start_column)
    }
}

fn is_continuation_byte(b: u8) -> bool {
    b & 0xC0 == 0x80
}

/// Token kinds for one `%`/`@` operator family.
struct ArithFamily {
    add: TokenKind,
    sub: TokenKind,
    mul: TokenKind,
    shl: TokenKind,
    add_eq: TokenKind,
    sub_eq: TokenKind,
    mul_eq: TokenKind,
    shl_eq: TokenKind,
    inc: TokenKind,
    dec: TokenKind,
}

impl ArithFamily {
    const WRAPPING: Self = Self {
        add: TokenKind::AddWrap,
        sub: TokenKind::SubWrap,
        mul: TokenKind::MulWrap,
        shl: TokenKind::ShlWrap,
        add_eq: TokenKind::AddEqWrap,
        sub_eq: TokenKind::SubEqWrap,
        mul_eq: TokenKind::MulEqWrap,
        shl_eq: TokenKind::ShlEqWrap,
        inc: TokenKind::IncWrap,
        dec: TokenKind::DecWrap,
    };

    const SATURATING: Self = Self {
        add: TokenKind::AddSat,
        sub: TokenKind::SubSat,
        mul: TokenKind::MulSat,
        shl: TokenKind::ShlSat,
        add_eq: TokenKind::AddEqSat,
        sub_eq: TokenKind::SubEqSat,
        mul_eq: TokenKind::MulEqSat,
        shl_eq: TokenKind::ShlEqSat,
        inc: TokenKind::IncSat,
        dec: TokenKind::DecSat,
    };
}
