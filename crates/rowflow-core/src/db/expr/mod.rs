//! Module: db::expr
//! Responsibility: the filter expression language of post-processing specs.
//! Columns are referenced by 1-based ordinal (`@1` is the first column).
//! Does not own: projection (plain column index lists in `PostProcessSpec`).

mod eval;
mod lexer;
mod parser;


use crate::{error::InternalError, value::Value};
use thiserror::Error as ThisError;

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompareOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
        }
    }
}

///
/// ArithOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl ArithOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
        }
    }
}

///
/// Expr
///
/// Parsed scalar expression. `Column` holds the 0-based column index.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Column(usize),
    Literal(Value),
    Neg(Box<Expr>),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Arith {
        op: ArithOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    IsNull {
        expr: Box<Expr>,
        negated: bool,
    },
}

impl Expr {
    /// Parse expression text such as `@3 <= 5 AND @4 IS NOT NULL`.
    pub fn parse(text: &str) -> Result<Self, ExprError> {
        let tokens = lexer::tokenize(text)?;
        parser::Parser::new(tokens).parse()
    }

    /// Largest referenced column index, if any.
    #[must_use]
    pub fn max_column(&self) -> Option<usize> {
        match self {
            Self::Column(idx) => Some(*idx),
            Self::Literal(_) => None,
            Self::Neg(inner) | Self::Not(inner) | Self::IsNull { expr: inner, .. } => {
                inner.max_column()
            }
            Self::And(left, right)
            | Self::Or(left, right)
            | Self::Compare { left, right, .. }
            | Self::Arith { left, right, .. } => left.max_column().max(right.max_column()),
        }
    }

    /// Reject references past the end of rows of `arity` columns.
    pub fn validate_columns(&self, arity: usize) -> Result<(), ExprError> {
        match self.max_column() {
            Some(column) if column >= arity => Err(ExprError::ColumnOutOfRange {
                column: column + 1,
                arity,
            }),
            _ => Ok(()),
        }
    }
}

///
/// ExprError
///
/// Failures while parsing or evaluating an expression.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ExprError {
    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedChar { ch: char, position: usize },

    #[error("unterminated string literal starting at position {position}")]
    UnterminatedString { position: usize },

    #[error("invalid column reference at position {position}")]
    InvalidColumn { position: usize },

    #[error("invalid numeric literal '{text}'")]
    InvalidNumber { text: String },

    #[error("unexpected token '{found}' at position {position}")]
    UnexpectedToken { found: String, position: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("column @{column} out of range for rows of {arity} columns")]
    ColumnOutOfRange { column: usize, arity: usize },

    #[error("operator {op} is not defined for {left} and {right}")]
    TypeMismatch {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("{op} expects a boolean operand, found {found}")]
    NotBoolean {
        op: &'static str,
        found: &'static str,
    },

    #[error("integer overflow evaluating {op}")]
    Overflow { op: &'static str },

    #[error("division by zero")]
    DivisionByZero,
}

impl From<ExprError> for InternalError {
    fn from(err: ExprError) -> Self {
        match err {
            ExprError::Overflow { .. } | ExprError::DivisionByZero => {
                Self::expr_internal(err.to_string())
            }
            _ => Self::expr_unsupported(err.to_string()),
        }
    }
}
