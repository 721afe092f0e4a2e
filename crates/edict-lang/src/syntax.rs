//! Untyped syntax tree produced by the parser

use rust_decimal::Decimal;

use crate::token::Position;

/// A parsed source file: header directives followed by body items
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceFile {
    pub directives: Vec<Directive>,
    pub body: Vec<StmtNode>,
}

/// `name(arg, ...)` in the file header
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub name: String,
    pub args: Vec<ExprNode>,
    pub position: Position,
}

/// A statement or rule in the body
#[derive(Debug, Clone, PartialEq)]
pub enum StmtNode {
    /// `{field} = expr`
    Assign {
        field: String,
        value: ExprNode,
        position: Position,
    },
    /// An expression evaluated for its side effects
    Expr(ExprNode),
    /// `if ... fi`
    Rule(RuleNode),
}

/// `if c then ... (elif c then ...)* (else ...)? fi`
#[derive(Debug, Clone, PartialEq)]
pub struct RuleNode {
    pub branches: Vec<(ExprNode, Vec<StmtNode>)>,
    pub otherwise: Option<Vec<StmtNode>>,
    pub position: Position,
}

/// An expression and where it starts
#[derive(Debug, Clone, PartialEq)]
pub struct ExprNode {
    pub kind: ExprKind,
    pub position: Position,
}

impl ExprNode {
    pub fn new(kind: ExprKind, position: Position) -> Self {
        Self { kind, position }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    String(String),
    Number(Decimal),
    Bool(bool),
    Regex(String),
    Field(String),
    Call {
        name: String,
        args: Vec<ExprNode>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<ExprNode>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<ExprNode>,
        rhs: Box<ExprNode>,
    },
    Compare {
        op: CompareOp,
        lhs: Box<ExprNode>,
        rhs: Box<ExprNode>,
    },
    /// `subject ~ pattern` or `subject !~ pattern`
    Match {
        negated: bool,
        subject: Box<ExprNode>,
        pattern: Box<ExprNode>,
    },
    And(Box<ExprNode>, Box<ExprNode>),
    Or(Box<ExprNode>, Box<ExprNode>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}

/// Arithmetic and concatenation operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Concat,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Concat => ".",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    /// Whether an ordering satisfies this operator
    pub fn holds(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::{Equal, Greater, Less};
        match self {
            CompareOp::Eq => ordering == Equal,
            CompareOp::Ne => ordering != Equal,
            CompareOp::Lt => ordering == Less,
            CompareOp::Le => ordering != Greater,
            CompareOp::Gt => ordering == Greater,
            CompareOp::Ge => ordering != Less,
        }
    }
}
