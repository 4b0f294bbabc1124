// AST (Abstract Syntax Tree) definitions for Nifty

use super::token::TokenKind;
use std::fmt;
use std::sync::Arc;

/// Source location information for error reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: Arc<str>,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file: Arc<str>, line: u32, column: u32) -> Self {
        Self { file, line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:L{},C{}", self.file, self.line, self.column)
    }
}

/// How a binding may be written after its declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    /// `let`, `:=`
    Mutable,
    /// `val`: fixed once initialized at run time
    Immutable,
    /// `const`, `::=`: fixed at compile time
    Const,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Function,
    Method,
}

/// Overflow behavior of an arithmetic operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arith {
    Plain,
    /// `%`-prefixed
    Wrapping,
    /// `@`-prefixed
    Saturating,
}

impl Arith {
    fn prefix(self) -> &'static str {
        match self {
            Arith::Plain => "",
            Arith::Wrapping => "%",
            Arith::Saturating => "@",
        }
    }
}

/// Binary operators, including every assignment form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic
    Add(Arith),
    Sub(Arith),
    Mul(Arith),
    Div,
    Mod,
    Shl(Arith),
    Shr,
    // Comparison
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eq,
    NotEq,
    // Bitwise
    BitAnd,
    BitXor,
    BitOr,
    // Logical
    And,
    Or,
    NullCoalesce,
    // Assignment
    Assign,
    AddAssign(Arith),
    SubAssign(Arith),
    MulAssign(Arith),
    DivAssign,
    ModAssign,
    ShlAssign(Arith),
    ShrAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
    OrAssign,
    NullCoalesceAssign,
}

impl BinaryOp {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        use Arith::*;
        use TokenKind as T;
        let op = match kind {
            T::Add => BinaryOp::Add(Plain),
            T::AddWrap => BinaryOp::Add(Wrapping),
            T::AddSat => BinaryOp::Add(Saturating),
            T::Sub => BinaryOp::Sub(Plain),
            T::SubWrap => BinaryOp::Sub(Wrapping),
            T::SubSat => BinaryOp::Sub(Saturating),
            T::Mul => BinaryOp::Mul(Plain),
            T::MulWrap => BinaryOp::Mul(Wrapping),
            T::MulSat => BinaryOp::Mul(Saturating),
            T::Div => BinaryOp::Div,
            T::Mod => BinaryOp::Mod,
            T::Shl => BinaryOp::Shl(Plain),
            T::ShlWrap => BinaryOp::Shl(Wrapping),
            T::ShlSat => BinaryOp::Shl(Saturating),
            T::Shr => BinaryOp::Shr,
            T::Lt => BinaryOp::Lt,
            T::LtEq => BinaryOp::LtEq,
            T::Gt => BinaryOp::Gt,
            T::GtEq => BinaryOp::GtEq,
            T::Eq => BinaryOp::Eq,
            T::NotEq => BinaryOp::NotEq,
            T::BitAnd => BinaryOp::BitAnd,
            T::Caret => BinaryOp::BitXor,
            T::BitOr => BinaryOp::BitOr,
            T::And => BinaryOp::And,
            T::Or => BinaryOp::Or,
            T::NullCoalesce => BinaryOp::NullCoalesce,
            T::Assign => BinaryOp::Assign,
            T::AddEq => BinaryOp::AddAssign(Plain),
            T::AddEqWrap => BinaryOp::AddAssign(Wrapping),
            T::AddEqSat => BinaryOp::AddAssign(Saturating),
            T::SubEq => BinaryOp::SubAssign(Plain),
            T::SubEqWrap => BinaryOp::SubAssign(Wrapping),
            T::SubEqSat => BinaryOp::SubAssign(Saturating),
            T::MulEq => BinaryOp::MulAssign(Plain),
            T::MulEqWrap => BinaryOp::MulAssign(Wrapping),
            T::MulEqSat => BinaryOp::MulAssign(Saturating),
            T::DivEq => BinaryOp::DivAssign,
            T::ModEq => BinaryOp::ModAssign,
            T::ShlEq => BinaryOp::ShlAssign(Plain),
            T::ShlEqWrap => BinaryOp::ShlAssign(Wrapping),
            T::ShlEqSat => BinaryOp::ShlAssign(Saturating),
            T::ShrEq => BinaryOp::ShrAssign,
            T::BitAndEq => BinaryOp::BitAndAssign,
            T::BitOrEq => BinaryOp::BitOrAssign,
            T::BitXorEq => BinaryOp::BitXorAssign,
            T::OrEq => BinaryOp::OrAssign,
            T::NullCoalesceEq => BinaryOp::NullCoalesceAssign,
            _ => return None,
        };
        Some(op)
    }

    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            BinaryOp::Assign
                | BinaryOp::AddAssign(_)
                | BinaryOp::SubAssign(_)
                | BinaryOp::MulAssign(_)
                | BinaryOp::DivAssign
                | BinaryOp::ModAssign
                | BinaryOp::ShlAssign(_)
                | BinaryOp::ShrAssign
                | BinaryOp::BitAndAssign
                | BinaryOp::BitOrAssign
                | BinaryOp::BitXorAssign
                | BinaryOp::OrAssign
                | BinaryOp::NullCoalesceAssign
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (arith, symbol) = match *self {
            BinaryOp::Add(a) => (a, "+"),
            BinaryOp::Sub(a) => (a, "-"),
            BinaryOp::Mul(a) => (a, "*"),
            BinaryOp::Div => (Arith::Plain, "/"),
            BinaryOp::Mod => (Arith::Plain, "%"),
            BinaryOp::Shl(a) => (a, "<<"),
            BinaryOp::Shr => (Arith::Plain, ">>"),
            BinaryOp::Lt => (Arith::Plain, "<"),
            BinaryOp::LtEq => (Arith::Plain, "<="),
            BinaryOp::Gt => (Arith::Plain, ">"),
            BinaryOp::GtEq => (Arith::Plain, ">="),
            BinaryOp::Eq => (Arith::Plain, "=="),
            BinaryOp::NotEq => (Arith::Plain, "!="),
            BinaryOp::BitAnd => (Arith::Plain, "&"),
            BinaryOp::BitXor => (Arith::Plain, "^"),
            BinaryOp::BitOr => (Arith::Plain, "|"),
            BinaryOp::And => (Arith::Plain, "&&"),
            BinaryOp::Or => (Arith::Plain, "||"),
            BinaryOp::NullCoalesce => (Arith::Plain, "??"),
            BinaryOp::Assign => (Arith::Plain, "="),
            BinaryOp::AddAssign(a) => (a, "+="),
            BinaryOp::SubAssign(a) => (a, "-="),
            BinaryOp::MulAssign(a) => (a, "*="),
            BinaryOp::DivAssign => (Arith::Plain, "/="),
            BinaryOp::ModAssign => (Arith::Plain, "%="),
            BinaryOp::ShlAssign(a) => (a, "<<="),
            BinaryOp::ShrAssign => (Arith::Plain, ">>="),
            BinaryOp::BitAndAssign => (Arith::Plain, "&="),
            BinaryOp::BitOrAssign => (Arith::Plain, "|="),
            BinaryOp::BitXorAssign => (Arith::Plain, "^="),
            BinaryOp::OrAssign => (Arith::Plain, "||="),
            BinaryOp::NullCoalesceAssign => (Arith::Plain, "??="),
        };
        write!(f, "{}{}", arith.prefix(), symbol)
    }
}

/// Prefix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,    // -x
    Not,    // !x
    BitNot, // ~x
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Increment,
    Decrement,
}

/// Function parameter
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub param_type: Box<AstNode>,
    pub location: SourceLocation,
}

/// Function signature. Also stands alone as an `extern` declaration.
#[derive(Debug, Clone)]
pub struct Prototype {
    pub name: String,
    pub params: Vec<Param>,
    /// At least one entry; a lone [`AstNode::Void`] when no return type is written.
    pub return_types: Vec<AstNode>,
    pub kind: FunctionKind,
    pub is_extern: bool,
    pub location: SourceLocation,
}

/// Ordered statement list between `{` and `}`
#[derive(Debug, Clone)]
pub struct Block {
    pub statements: Vec<AstNode>,
    pub location: SourceLocation,
}

/// AST nodes representing declarations, statements and expressions
#[derive(Debug, Clone)]
pub enum AstNode {
    // Types
    Void {
        location: SourceLocation,
    },
    Type {
        name: String,
        location: SourceLocation,
    },

    // Literals
    Int {
        value: u64,
        location: SourceLocation,
    },
    Float {
        value: f64,
        location: SourceLocation,
    },
    Bool {
        value: bool,
        location: SourceLocation,
    },
    String {
        value: String,
        location: SourceLocation,
    },
    Char {
        value: char,
        location: SourceLocation,
    },

    // Expressions
    Ident {
        name: String,
        location: SourceLocation,
    },
    Unary {
        op: UnaryOp,
        operand: Box<AstNode>,
        location: SourceLocation,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<AstNode>,
        rhs: Box<AstNode>,
        location: SourceLocation,
    },
    IncDec {
        step: Step,
        arith: Arith,
        prefix: bool,
        operand: Box<AstNode>,
        location: SourceLocation,
    },
    Call {
        callee: String,
        args: Vec<AstNode>,
        location: SourceLocation,
    },

    // Declarations and statements
    Prototype(Prototype),
    Block(Block),
    NamedBlock {
        name: String,
        block: Block,
        location: SourceLocation,
    },
    Function {
        prototype: Prototype,
        body: Block,
        location: SourceLocation,
    },
    Return {
        values: Vec<AstNode>,
        location: SourceLocation,
    },
    Var {
        name: String,
        var_type: Option<Box<AstNode>>,
        init: Option<Box<AstNode>>,
        mutability: Mutability,
        location: SourceLocation,
    },
    Namespace {
        name: String,
        location: SourceLocation,
    },
}

impl AstNode {
    pub fn location(&self) -> &SourceLocation {
        match self {
            AstNode::Void { location }
            | AstNode::Type { location, .. }
            | AstNode::Int { location, .. }
            | AstNode::Float { location, .. }
            | AstNode::Bool { location, .. }
            | AstNode::String { location, .. }
            | AstNode::Char { location, .. }
            | AstNode::Ident { location, .. }
            | AstNode::Unary { location, .. }
            | AstNode::Binary { location, .. }
            | AstNode::IncDec { location, .. }
            | AstNode::Call { location, .. }
            | AstNode::NamedBlock { location, .. }
            | AstNode::Function { location, .. }
            | AstNode::Return { location, .. }
            | AstNode::Var { location, .. }
            | AstNode::Namespace { location, .. } => location,
            AstNode::Prototype(proto) => &proto.location,
            AstNode::Block(block) => &block.location,
        }
    }
}

/// S-expression rendering, used by the verbose tree dump and in tests to
/// compare tree shapes.
impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstNode::Void { .. } => f.write_str("void"),
            AstNode::Type { name, .. } | AstNode::Ident { name, .. } => f.write_str(name),
            AstNode::Int { value, .. } => write!(f, "{value}"),
            AstNode::Float { value, .. } => write!(f, "{value:?}"),
            AstNode::Bool { value, .. } => write!(f, "{value}"),
            AstNode::String { value, .. } => write!(f, "{value:?}"),
            AstNode::Char { value, .. } => write!(f, "{value:?}"),
            AstNode::Unary { op, operand, .. } => write!(f, "({op} {operand})"),
            AstNode::Binary { op, lhs, rhs, .. } => write!(f, "({op} {lhs} {rhs})"),
            AstNode::IncDec {
                step,
                arith,
                prefix,
                operand,
                ..
            } => {
                let symbol = match step {
                    Step::Increment => "++",
                    Step::Decrement => "--",
                };
                let fixity = if *prefix { "pre" } else { "post" };
                write!(f, "({fixity}{}{symbol} {operand})", arith.prefix())
            }
            AstNode::Call { callee, args, .. } => {
                write!(f, "(call {callee}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                f.write_str(")")
            }
            AstNode::Prototype(proto) => write!(f, "{proto}"),
            AstNode::Block(block) => write!(f, "{block}"),
            AstNode::NamedBlock { name, block, .. } => write!(f, "(label {name} {block})"),
            AstNode::Function {
                prototype, body, ..
            } => write!(f, "(fn {prototype} {body})"),
            AstNode::Return { values, .. } => {
                f.write_str("(return")?;
                for value in values {
                    write!(f, " {value}")?;
                }
                f.write_str(")")
            }
            AstNode::Var {
                name,
                var_type,
                init,
                mutability,
                ..
            } => {
                let keyword = match mutability {
                    Mutability::Mutable => "let",
                    Mutability::Immutable => "val",
                    Mutability::Const => "const",
                };
                write!(f, "({keyword} {name}")?;
                if let Some(ty) = var_type {
                    write!(f, " : {ty}")?;
                }
                if let Some(init) = init {
                    write!(f, " {init}")?;
                }
                f.write_str(")")
            }
            AstNode::Namespace { name, .. } => write!(f, "(namespace {name})"),
        }
    }
}

impl fmt::Display for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_extern {
            f.write_str("extern ")?;
        }
        if self.kind == FunctionKind::Method {
            f.write_str("md ")?;
        }
        write!(f, "{}(", self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", param.name, param.param_type)?;
        }
        f.write_str(") -> ")?;
        for (i, ty) in self.return_types.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{ty}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for statement in &self.statements {
            write!(f, " {statement}")?;
        }
        f.write_str(" }")
    }
}
