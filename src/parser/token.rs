//! Token model
//!
//! [`TokenKind`] is the closed set of token variants the lexer can produce.
//! [`Token`] pairs a kind with a borrowed lexeme and its 1-based position.
//! The keyword and operator-precedence tables live here as read-only statics.

use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::LazyLock;

/// All token variants produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Declarations and control flow
    Fn,
    Md,
    Test,
    Skip,
    If,
    Elif,
    Else,
    In,
    As,
    Cast,
    Recast,
    AutoCast,
    Struct,
    Impl,
    ConstImpl,
    EndImpl,
    Does,
    Behavior,
    Enum,
    Defer,
    DeferErr,
    Restrict,
    Typedef,
    For,
    While,
    Until,
    When,
    Goto,
    Break,
    Continue,
    Return,
    Try,
    True,
    False,
    Let,   // mutable
    Val,   // immutable, run time
    Const, // immutable, compile time
    New,
    Delete,
    Use,
    Using,
    Namespace,
    Package,
    Api,
    Extern,
    SizeOf,
    AlignOf,
    TypeOf,
    TypeIdOf,
    TypeInfoOf,
    TypeFrom,
    NameOf,
    Assert,
    AssertDb,

    // Builtin types
    Int,
    Uint,
    Float,
    Double,
    StringType,
    CStringType,
    CharType,
    Bool,
    B8,
    B16,
    B32,
    B64,
    U8,
    U16,
    U32,
    U64,
    U128,
    S8,
    S16,
    S32,
    S64,
    S128,
    F16,
    F32,
    F64,
    F128,
    Void,
    RawPtr,
    UintPtr,
    TypeId,
    AnyType,

    Null,
    Undefined,
    Unused,

    // Punctuation
    Colon,       // :
    Comma,       // ,
    Semicolon,   // ;
    LParen,      // (
    RParen,      // )
    LBrace,      // {
    RBrace,      // }
    LBracket,    // [
    RBracket,    // ]
    Dot,         // .
    ClosedRange, // ..=
    OpenRange,   // ..<
    DotDot,      // ..
    At,          // @
    Hash,        // #
    Scope,       // ::
    LetDecl,     // :=
    ConstDecl,   // ::=

    // Operators
    Assign, // =
    Eq,     // ==
    And,    // &&
    Or,     // ||
    Bang,   // !
    NotEq,  // !=
    Add,    // +
    Inc,    // ++
    AddEq,  // +=
    Sub,    // -
    Dec,    // --
    SubEq,  // -=
    Mul,    // *
    MulEq,  // *=
    Div,    // /
    DivEq,  // /=
    Mod,    // %
    ModEq,  // %=

    // Wrapping arithmetic
    AddWrap,   // %+
    SubWrap,   // %-
    MulWrap,   // %*
    AddEqWrap, // %+=
    SubEqWrap, // %-=
    MulEqWrap, // %*=
    IncWrap,   // %++
    DecWrap,   // %--
    ShlWrap,   // %<<
    ShlEqWrap, // %<<=

    // Saturating arithmetic
    AddSat,   // @+
    SubSat,   // @-
    MulSat,   // @*
    AddEqSat, // @+=
    SubEqSat, // @-=
    MulEqSat, // @*=
    IncSat,   // @++
    DecSat,   // @--
    ShlSat,   // @<<
    ShlEqSat, // @<<=

    Gt,             // >
    GtEq,           // >=
    Lt,             // <
    LtEq,           // <=
    Caret,          // ^
    BitNot,         // ~
    BitAnd,         // &
    BitOr,          // |
    Shl,            // <<
    Shr,            // >>
    BitXorEq,       // ^=
    BitAndEq,       // &=
    BitOrEq,        // |=
    ShlEq,          // <<=
    ShrEq,          // >>=
    Arrow,          // ->
    LeftArrow,      // <-
    Question,       // ?
    QuestionDot,    // ?.
    NullCoalesce,   // ??
    NullCoalesceEq, // ??=
    OrEq,           // ||=

    // Literals and names
    Ident,
    StringLit,
    CharLit,
    Number,

    /// Lexing failed; the token's lexeme is the message.
    Error,
    Eof,
}

impl TokenKind {
    /// Source spelling for fixed tokens, or a category name for the rest.
    pub fn as_str(self) -> &'static str {
        use TokenKind::*;
        match self {
            Fn => "fn",
            Md => "md",
            Test => "test",
            Skip => "skip",
            If => "if",
            Elif => "elif",
            Else => "else",
            In => "in",
            As => "as",
            Cast => "cast",
            Recast => "recast",
            AutoCast => "auto_cast",
            Struct => "struct",
            Impl => "impl",
            ConstImpl => "constimpl",
            EndImpl => "endimpl",
            Does => "does",
            Behavior => "behavior",
            Enum => "enum",
            Defer => "defer",
            DeferErr => "defer_err",
            Restrict => "restrict",
            Typedef => "typedef",
            For => "for",
            While => "while",
            Until => "until",
            When => "when",
            Goto => "goto",
            Break => "break",
            Continue => "continue",
            Return => "return",
            Try => "try",
            True => "true",
            False => "false",
            Let => "let",
            Val => "val",
            Const => "const",
            New => "new",
            Delete => "delete",
            Use => "use",
            Using => "using",
            Namespace => "namespace",
            Package => "package",
            Api => "api",
            Extern => "extern",
            SizeOf => "size_of",
            AlignOf => "align_of",
            TypeOf => "type_of",
            TypeIdOf => "typeid_of",
            TypeInfoOf => "typeinfo_of",
            TypeFrom => "type_from",
            NameOf => "name_of",
            Assert => "assert",
            AssertDb => "assert_db",
            Int => "int",
            Uint => "uint",
            Float => "float",
            Double => "double",
            StringType => "string",
            CStringType => "cstring",
            CharType => "char",
            Bool => "bool",
            B8 => "b8",
            B16 => "b16",
            B32 => "b32",
            B64 => "b64",
            U8 => "u8",
            U16 => "u16",
            U32 => "u32",
            U64 => "u64",
            U128 => "u128",
            S8 => "s8",
            S16 => "s16",
            S32 => "s32",
            S64 => "s64",
            S128 => "s128",
            F16 => "f16",
            F32 => "f32",
            F64 => "f64",
            F128 => "f128",
            Void => "void",
            RawPtr => "rawptr",
            UintPtr => "uintptr",
            TypeId => "typeid",
            AnyType => "__anytype",
            Null => "null",
            Undefined => "undefined",
            Unused => "unused",
            Colon => ":",
            Comma => ",",
            Semicolon => ";",
            LParen => "(",
            RParen => ")",
            LBrace => "{",
            RBrace => "}",
            LBracket => "[",
            RBracket => "]",
            Dot => ".",
            ClosedRange => "..=",
            OpenRange => "..<",
            DotDot => "..",
            At => "@",
            Hash => "#",
            Scope => "::",
            LetDecl => ":=",
            ConstDecl => "::=",
            Assign => "=",
            Eq => "==",
            And => "&&",
            Or => "||",
            Bang => "!",
            NotEq => "!=",
            Add => "+",
            Inc => "++",
            AddEq => "+=",
            Sub => "-",
            Dec => "--",
            SubEq => "-=",
            Mul => "*",
            MulEq => "*=",
            Div => "/",
            DivEq => "/=",
            Mod => "%",
            ModEq => "%=",
            AddWrap => "%+",
            SubWrap => "%-",
            MulWrap => "%*",
            AddEqWrap => "%+=",
            SubEqWrap => "%-=",
            MulEqWrap => "%*=",
            IncWrap => "%++",
            DecWrap => "%--",
            ShlWrap => "%<<",
            ShlEqWrap => "%<<=",
            AddSat => "@+",
            SubSat => "@-",
            MulSat => "@*",
            AddEqSat => "@+=",
            SubEqSat => "@-=",
            MulEqSat => "@*=",
            IncSat => "@++",
            DecSat => "@--",
            ShlSat => "@<<",
            ShlEqSat => "@<<=",
            Gt => ">",
            GtEq => ">=",
            Lt => "<",
            LtEq => "<=",
            Caret => "^",
            BitNot => "~",
            BitAnd => "&",
            BitOr => "|",
            Shl => "<<",
            Shr => ">>",
            BitXorEq => "^=",
            BitAndEq => "&=",
            BitOrEq => "|=",
            ShlEq => "<<=",
            ShrEq => ">>=",
            Arrow => "->",
            LeftArrow => "<-",
            Question => "?",
            QuestionDot => "?.",
            NullCoalesce => "??",
            NullCoalesceEq => "??=",
            OrEq => "||=",
            Ident => "identifier",
            StringLit => "string literal",
            CharLit => "character literal",
            Number => "number",
            Error => "invalid token",
            Eof => "end of file",
        }
    }

    /// Builtin type names, usable anywhere a type is expected.
    pub fn is_builtin_type(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Int | Uint
                | Float
                | Double
                | StringType
                | CStringType
                | CharType
                | Bool
                | B8
                | B16
                | B32
                | B64
                | U8
                | U16
                | U32
                | U64
                | U128
                | S8
                | S16
                | S32
                | S64
                | S128
                | F16
                | F32
                | F64
                | F128
                | Void
                | RawPtr
                | UintPtr
                | TypeId
                | AnyType
        )
    }

    /// Binding strength of an infix or postfix operator; `None` for every
    /// token that cannot continue an expression.
    pub fn precedence(self) -> Option<u8> {
        use TokenKind::*;
        let prec = match self {
            Inc | Dec | IncWrap | DecWrap | IncSat | DecSat => 100,
            Mul | Div | Mod | MulWrap | MulSat => 80,
            Add | Sub | AddWrap | SubWrap | AddSat | SubSat => 70,
            Shl | Shr | ShlWrap | ShlSat => 65,
            Lt | LtEq | Gt | GtEq => 60,
            Eq | NotEq => 50,
            BitAnd => 40,
            Caret => 35,
            BitOr => 30,
            And => 20,
            NullCoalesce => 15,
            Or => 10,
            Assign | AddEq | SubEq | MulEq | DivEq | ModEq | AddEqWrap | SubEqWrap | MulEqWrap
            | ShlEqWrap | AddEqSat | SubEqSat | MulEqSat | ShlEqSat | BitXorEq | BitAndEq
            | BitOrEq | ShlEq | ShrEq | NullCoalesceEq | OrEq => 9,
            _ => return None,
        };
        Some(prec)
    }

    /// Assignment operators group right to left: `a = b = c` is `a = (b = c)`.
    pub fn is_right_associative(self) -> bool {
        self.precedence() == Some(9)
    }

    pub fn is_postfix(self) -> bool {
        use TokenKind::*;
        matches!(self, Inc | Dec | IncWrap | DecWrap | IncSat | DecSat)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident
            | TokenKind::StringLit
            | TokenKind::CharLit
            | TokenKind::Number
            | TokenKind::Error
            | TokenKind::Eof => f.write_str(self.as_str()),
            _ => write!(f, "'{}'", self.as_str()),
        }
    }
}

/// One lexed token.
///
/// `lexeme` is a view into the source buffer, except for
/// [`TokenKind::Error`] tokens where it holds the error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub lexeme: &'src str,
    pub line: u32,
    pub column: u32,
}

impl<'src> Token<'src> {
    pub fn new(kind: TokenKind, lexeme: &'src str, line: u32, column: u32) -> Self {
        Self {
            kind,
            lexeme,
            line,
            column,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// Number of columns the token covers on its first line, at least 1.
    pub fn width(&self) -> usize {
        match self.kind {
            TokenKind::Error | TokenKind::Eof => 1,
            _ => self
                .lexeme
                .split('\n')
                .next()
                .map(|first| first.chars().count())
                .unwrap_or(0)
                .max(1),
        }
    }

    /// Numeric value of a [`TokenKind::Number`] token. Underscores are
    /// digit separators and ignored. `None` for any other kind or when the
    /// value does not fit.
    pub fn number_value(&self) -> Option<NumberValue> {
        if self.kind != TokenKind::Number {
            return None;
        }
        NumberValue::parse(self.lexeme)
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Ident => write!(f, "identifier '{}'", self.lexeme),
            TokenKind::Number => write!(f, "number '{}'", self.lexeme),
            TokenKind::StringLit | TokenKind::CharLit => {
                let first = self.lexeme.split('\n').next().unwrap_or_default();
                write!(f, "{} {}", self.kind.as_str(), first)
            }
            _ => write!(f, "{}", self.kind),
        }
    }
}

/// Value of a numeric literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberValue {
    Int(u64),
    Float(f64),
}

impl NumberValue {
    pub fn parse(lexeme: &str) -> Option<Self> {
        let digits: String = lexeme.chars().filter(|&c| c != '_').collect();
        let radix_body = |prefixes: &[&str]| {
            prefixes
                .iter()
                .find_map(|p| digits.strip_prefix(p))
                .map(str::to_owned)
        };

        if let Some(hex) = radix_body(&["0x", "0X"]) {
            return u64::from_str_radix(&hex, 16).ok().map(NumberValue::Int);
        }
        if let Some(oct) = radix_body(&["0o", "0O", "0q", "0Q"]) {
            return u64::from_str_radix(&oct, 8).ok().map(NumberValue::Int);
        }
        if digits.contains(['.', 'e', 'E']) {
            return digits.parse::<f64>().ok().map(NumberValue::Float);
        }
        digits.parse::<u64>().ok().map(NumberValue::Int)
    }
}

static KEYWORDS: &[(&str, TokenKind)] = &[
    ("__anytype", TokenKind::AnyType),
    ("align_of", TokenKind::AlignOf),
    ("api", TokenKind::Api),
    ("as", TokenKind::As),
    ("assert", TokenKind::Assert),
    ("assert_db", TokenKind::AssertDb),
    ("auto_cast", TokenKind::AutoCast),
    ("b8", TokenKind::B8),
    ("b16", TokenKind::B16),
    ("b32", TokenKind::B32),
    ("b64", TokenKind::B64),
    ("behavior", TokenKind::Behavior),
    ("bool", TokenKind::Bool),
    ("break", TokenKind::Break),
    ("cast", TokenKind::Cast),
    ("char", TokenKind::CharType),
    ("const", TokenKind::Const),
    ("constimpl", TokenKind::ConstImpl),
    ("continue", TokenKind::Continue),
    ("cstring", TokenKind::CStringType),
    ("defer", TokenKind::Defer),
    ("defer_err", TokenKind::DeferErr),
    ("delete", TokenKind::Delete),
    ("does", TokenKind::Does),
    ("double", TokenKind::Double),
    ("elif", TokenKind::Elif),
    ("else", TokenKind::Else),
    ("endimpl", TokenKind::EndImpl),
    ("enum", TokenKind::Enum),
    ("extern", TokenKind::Extern),
    ("f16", TokenKind::F16),
    ("f32", TokenKind::F32),
    ("f64", TokenKind::F64),
    ("f128", TokenKind::F128),
    ("false", TokenKind::False),
    ("float", TokenKind::Float),
    ("fn", TokenKind::Fn),
    ("for", TokenKind::For),
    ("goto", TokenKind::Goto),
    ("if", TokenKind::If),
    ("impl", TokenKind::Impl),
    ("in", TokenKind::In),
    ("int", TokenKind::Int),
    ("let", TokenKind::Let),
    ("md", TokenKind::Md),
    ("name_of", TokenKind::NameOf),
    ("namespace", TokenKind::Namespace),
    ("new", TokenKind::New),
    ("null", TokenKind::Null),
    ("package", TokenKind::Package),
    ("rawptr", TokenKind::RawPtr),
    ("recast", TokenKind::Recast),
    ("restrict", TokenKind::Restrict),
    ("return", TokenKind::Return),
    ("s8", TokenKind::S8),
    ("s16", TokenKind::S16),
    ("s32", TokenKind::S32),
    ("s64", TokenKind::S64),
    ("s128", TokenKind::S128),
    ("size_of", TokenKind::SizeOf),
    ("skip", TokenKind::Skip),
    ("string", TokenKind::StringType),
    ("struct", TokenKind::Struct),
    ("test", TokenKind::Test),
    ("true", TokenKind::True),
    ("try", TokenKind::Try),
    ("type_from", TokenKind::TypeFrom),
    ("type_of", TokenKind::TypeOf),
    ("typedef", TokenKind::Typedef),
    ("typeid", TokenKind::TypeId),
    ("typeid_of", TokenKind::TypeIdOf),
    ("typeinfo_of", TokenKind::TypeInfoOf),
    ("u8", TokenKind::U8),
    ("u16", TokenKind::U16),
    ("u32", TokenKind::U32),
    ("u64", TokenKind::U64),
    ("u128", TokenKind::U128),
    ("uint", TokenKind::Uint),
    ("uintptr", TokenKind::UintPtr),
    ("undefined", TokenKind::Undefined),
    ("until", TokenKind::Until),
    ("unused", TokenKind::Unused),
    ("use", TokenKind::Use),
    ("using", TokenKind::Using),
    ("val", TokenKind::Val),
    ("void", TokenKind::Void),
    ("when", TokenKind::When),
    ("while", TokenKind::While),
];

/// Keywords bucketed by their first byte.
static KEYWORD_TABLE: LazyLock<FxHashMap<u8, Vec<(&'static str, TokenKind)>>> =
    LazyLock::new(|| {
        let mut table: FxHashMap<u8, Vec<(&'static str, TokenKind)>> = FxHashMap::default();
        for &(word, kind) in KEYWORDS {
            table.entry(word.as_bytes()[0]).or_default().push((word, kind));
        }
        table
    });

/// Classify a scanned identifier as a keyword or a plain identifier.
///
/// Each candidate sharing the first byte must have exactly the scanned
/// length before its remaining bytes are compared, so `in` never matches
/// the start of `int`.
pub fn identifier_kind(text: &str) -> TokenKind {
    let bytes = text.as_bytes();
    let Some(first) = bytes.first() else {
        return TokenKind::Ident;
    };
    let Some(candidates) = KEYWORD_TABLE.get(first) else {
        return TokenKind::Ident;
    };

    candidates
        .iter()
        .find(|(word, _)| word.len() == bytes.len() && word.as_bytes()[1..] == bytes[1..])
        .map(|&(_, kind)| kind)
        .unwrap_or(TokenKind::Ident)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_boundaries() {
        assert_eq!(identifier_kind("int"), TokenKind::Int);
        assert_eq!(identifier_kind("in"), TokenKind::In);
        assert_eq!(identifier_kind("integer"), TokenKind::Ident);
        assert_eq!(identifier_kind("i"), TokenKind::Ident);
        assert_eq!(identifier_kind("defer_err"), TokenKind::DeferErr);
        assert_eq!(identifier_kind("defer_"), TokenKind::Ident);
    }

    #[test]
    fn test_every_keyword_round_trips() {
        for &(word, kind) in KEYWORDS {
            assert_eq!(identifier_kind(word), kind, "keyword {word}");
            assert_eq!(kind.as_str(), word);
        }
    }

    #[test]
    fn test_number_values() {
        assert_eq!(NumberValue::parse("1_000"), Some(NumberValue::Int(1000)));
        assert_eq!(NumberValue::parse("0x1A"), Some(NumberValue::Int(26)));
        assert_eq!(NumberValue::parse("0o17"), Some(NumberValue::Int(15)));
        assert_eq!(NumberValue::parse("0Q17"), Some(NumberValue::Int(15)));
        assert_eq!(NumberValue::parse("3.14e-2"), Some(NumberValue::Float(0.0314)));
        assert_eq!(NumberValue::parse("99999999999999999999999"), None);
    }

    #[test]
    fn test_precedence_ordering() {
        assert!(TokenKind::Mul.precedence() > TokenKind::Add.precedence());
        assert!(TokenKind::Add.precedence() > TokenKind::Eq.precedence());
        assert!(TokenKind::And.precedence() > TokenKind::Or.precedence());
        assert!(TokenKind::Assign.is_right_associative());
        assert!(!TokenKind::Sub.is_right_associative());
        assert_eq!(TokenKind::Semicolon.precedence(), None);
        assert_eq!(TokenKind::Comma.precedence(), None);
    }

    #[test]
    fn test_token_display() {
        let ident = Token::new(TokenKind::Ident, "main", 1, 4);
        assert_eq!(ident.to_string(), "identifier 'main'");
        let semi = Token::new(TokenKind::Semicolon, ";", 1, 1);
        assert_eq!(semi.to_string(), "';'");
        let eof = Token::new(TokenKind::Eof, "", 3, 1);
        assert_eq!(eof.to_string(), "end of file");
    }
}
