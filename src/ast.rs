//! Abstract syntax tree: tagged node variants with owned children
//! (spec.md §3, §9's "tagged variants over virtual dispatch").

use crate::error::SourceLocation;
use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    Automatic,
    Static,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    None,
    Internal,
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Specifier {
    None,
    Static,
    Extern,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Complement,
    Not,
    PreIncrement,
    PreDecrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostfixOp {
    PostIncrement,
    PostDecrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

/// Every expression node carries an inferred `Type`, populated by semantic
/// analysis (starts as `void`). Ownership is tree-shaped: a parent
/// exclusively owns its children, no shared sub-expressions.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: Type,
    pub loc: SourceLocation,
}

impl Expr {
    pub fn new(kind: ExprKind, loc: SourceLocation) -> Self {
        Expr {
            kind,
            ty: Type::void(),
            loc,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    IntLiteral(i64),
    LongLiteral(i64),
    UIntLiteral(u64),
    ULongLiteral(u64),
    DoubleLiteral(f64),
    CharLiteral(char),
    StringLiteral(String),
    BoolLiteral(bool),
    /// `{ e1, e2, ... }` — array/struct compound initializer.
    CompoundInit(Vec<Expr>),
    Var {
        name: String,
        /// Filled in by semantic analysis with the symbol's unique name.
        resolved_name: Option<String>,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Postfix {
        op: PostfixOp,
        operand: Box<Expr>,
    },
    /// `expr.field` or `expr->field`, distinguished by `via_pointer`.
    FieldAccess {
        base: Box<Expr>,
        field: String,
        via_pointer: bool,
    },
    Cast {
        target_ty: Type,
        expr: Box<Expr>,
    },
    Deref(Box<Expr>),
    AddrOf(Box<Expr>),
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: String,
    /// Filled in by semantic analysis.
    pub resolved_name: Option<String>,
    pub ty: Type,
    pub specifier: Specifier,
    pub init: Option<Expr>,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct StructDecl {
    pub name: String,
    pub ty: Type,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub resolved_name: Option<String>,
    pub ty: Type,
}

#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub return_ty: Type,
    pub specifier: Specifier,
    /// `None` for a prototype-only declaration (not produced by this
    /// grammar today, kept for symmetry with `VarDecl`'s optional init).
    pub body: Option<Vec<Stmt>>,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    Break,
    Continue,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Return {
        value: Option<Expr>,
        loc: SourceLocation,
    },
    VarDecl(VarDecl),
    ExprStmt(Expr),
    If {
        cond: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
        loc: SourceLocation,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
        /// Assigned by semantic analysis: distinguishes this loop's
        /// `.Lloop<n>_start` / `.Lloop<n>_end` labels.
        label: Option<String>,
        loc: SourceLocation,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Expr>,
        body: Vec<Stmt>,
        label: Option<String>,
        loc: SourceLocation,
    },
    LoopControl {
        kind: LoopKind,
        /// Resolved to the enclosing loop's label by semantic analysis.
        label: Option<String>,
        loc: SourceLocation,
    },
    Block(Vec<Stmt>),
}

#[derive(Debug, Clone)]
pub enum TopLevel {
    Func(FuncDecl),
    Var(VarDecl),
    Struct(StructDecl),
}

#[derive(Debug, Clone, Default)]
pub struct Program {
    pub items: Vec<TopLevel>,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }
}
