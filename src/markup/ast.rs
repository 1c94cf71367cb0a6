//! Syntax tree for report markup

use smallvec::SmallVec;

use crate::context::RenderContext;
use crate::value::Value;

/// One positional argument of an expression or partial call
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Literal(Value),
    Path(String),
}

impl Arg {
    /// Value of the argument in `ctx`; an undefined path yields `Null`
    pub fn resolve(&self, ctx: &RenderContext) -> Value {
        match self {
            Arg::Literal(value) => value.clone(),
            Arg::Path(path) => ctx.resolve(path).cloned().unwrap_or_default(),
        }
    }
}

/// The trimmed content of a `{{...}}` token, pre-split for evaluation.
///
/// Whether `head` names a helper is decided when the expression is
/// evaluated, against the registry in use at that moment.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    /// Whole trimmed token, used as a path when no helper matches
    pub source: String,
    /// First whitespace-delimited word
    pub head: String,
    /// Remaining words parsed as arguments
    pub args: SmallVec<[Arg; 4]>,
    /// Set when the whole token is one string, number or boolean literal
    pub literal: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Expression {
        raw: String,
        expr: Expression,
    },
    If {
        condition: Expression,
        then_branch: Vec<Node>,
        else_branch: Vec<Node>,
    },
    Each {
        source: Expression,
        body: Vec<Node>,
        else_branch: Vec<Node>,
    },
    Partial {
        raw: String,
        name: String,
        args: Vec<(String, Arg)>,
    },
}
