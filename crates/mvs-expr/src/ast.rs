//! Abstract syntax tree of a compiled expression.

use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    In,
}

/// One name step of a path, with the predicates applied to its result.
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    pub name: String,
    pub stages: Vec<Node>,
}

impl Step {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Literal(Value),
    /// A reference to data: `a.b[0].c`.
    Path(Vec<Step>),
    /// `$`, the whole evaluation context.
    Context,
    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    Condition {
        test: Box<Node>,
        then: Box<Node>,
        otherwise: Option<Box<Node>>,
    },
    Call {
        function: String,
        arguments: Vec<Node>,
    },
    /// `[a, b, c]`.
    Array(Vec<Node>),
    /// A predicate applied to something that is not a path.
    Filter {
        base: Box<Node>,
        predicate: Box<Node>,
    },
}

impl Node {
    /// Returns `true` if this node reads data by path.
    pub fn is_path(&self) -> bool {
        matches!(self, Node::Path(_))
    }
}
