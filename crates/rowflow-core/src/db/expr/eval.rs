use crate::{
    db::{
        expr::{ArithOp, CompareOp, Expr, ExprError},
        row::Row,
    },
    error::InternalError,
    types::ColumnType,
    value::{Value, canonical_cmp, numeric_cmp},
};
use std::cmp::Ordering;

impl Expr {
    /// Evaluate against one row using SQL three-valued logic.
    pub fn eval(&self, row: &Row, types: &[ColumnType]) -> Result<Value, InternalError> {
        let value = match self {
            Self::Column(idx) => {
                let (Some(datum), Some(ty)) = (row.get(*idx), types.get(*idx)) else {
                    return Err(ExprError::ColumnOutOfRange {
                        column: idx + 1,
                        arity: row.len(),
                    }
                    .into());
                };
                datum.ensure_decoded(*ty)?.clone()
            }
            Self::Literal(value) => value.clone(),
            Self::Neg(inner) => negate(inner.eval(row, types)?)?,
            Self::Not(inner) => match inner.eval(row, types)? {
                Value::Null => Value::Null,
                Value::Bool(b) => Value::Bool(!b),
                other => {
                    return Err(ExprError::NotBoolean {
                        op: "NOT",
                        found: other.label(),
                    }
                    .into());
                }
            },
            Self::And(left, right) => {
                let left = truth(left.eval(row, types)?, "AND")?;
                if left == Some(false) {
                    return Ok(Value::Bool(false));
                }
                match (left, truth(right.eval(row, types)?, "AND")?) {
                    (_, Some(false)) => Value::Bool(false),
                    (Some(true), Some(true)) => Value::Bool(true),
                    _ => Value::Null,
                }
            }
            Self::Or(left, right) => {
                let left = truth(left.eval(row, types)?, "OR")?;
                if left == Some(true) {
                    return Ok(Value::Bool(true));
                }
                match (left, truth(right.eval(row, types)?, "OR")?) {
                    (_, Some(true)) => Value::Bool(true),
                    (Some(false), Some(false)) => Value::Bool(false),
                    _ => Value::Null,
                }
            }
            Self::Compare { op, left, right } => {
                compare(*op, &left.eval(row, types)?, &right.eval(row, types)?)?
            }
            Self::Arith { op, left, right } => {
                arith(*op, &left.eval(row, types)?, &right.eval(row, types)?)?
            }
            Self::IsNull { expr, negated } => {
                Value::Bool(expr.eval(row, types)?.is_null() != *negated)
            }
        };

        Ok(value)
    }

    /// Evaluate as a filter: only TRUE passes, NULL and FALSE reject.
    pub fn eval_filter(&self, row: &Row, types: &[ColumnType]) -> Result<bool, InternalError> {
        match self.eval(row, types)? {
            Value::Bool(b) => Ok(b),
            Value::Null => Ok(false),
            other => Err(ExprError::NotBoolean {
                op: "filter",
                found: other.label(),
            }
            .into()),
        }
    }
}

fn truth(value: Value, op: &'static str) -> Result<Option<bool>, ExprError> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(b)),
        other => Err(ExprError::NotBoolean {
            op,
            found: other.label(),
        }),
    }
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> Result<Value, ExprError> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }

    let ordering = match (left, right) {
        (Value::Bool(_), Value::Bool(_))
        | (Value::Text(_), Value::Text(_))
        | (Value::Bytes(_), Value::Bytes(_)) => canonical_cmp(left, right),
        _ => numeric_cmp(left, right).ok_or(ExprError::TypeMismatch {
            op: op.symbol(),
            left: left.label(),
            right: right.label(),
        })?,
    };

    let result = match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Ne => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Lte => ordering != Ordering::Greater,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Gte => ordering != Ordering::Less,
    };

    Ok(Value::Bool(result))
}

fn negate(value: Value) -> Result<Value, ExprError> {
    let overflow = ExprError::Overflow { op: "-" };
    match value {
        Value::Null => Ok(Value::Null),
        Value::Int(v) => v.checked_neg().map(Value::Int).ok_or(overflow),
        Value::Uint(v) => i64::try_from(v)
            .map(|v| Value::Int(-v))
            .map_err(|_| overflow),
        Value::Float(v) => Ok(Value::Float(-v)),
        other => Err(ExprError::TypeMismatch {
            op: "-",
            left: other.label(),
            right: other.label(),
        }),
    }
}

fn arith(op: ArithOp, left: &Value, right: &Value) -> Result<Value, ExprError> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }
    let mismatch = || ExprError::TypeMismatch {
        op: op.symbol(),
        left: left.label(),
        right: right.label(),
    };
    if !left.is_numeric() || !right.is_numeric() {
        return Err(mismatch());
    }

    match (left, right) {
        (Value::Uint(a), Value::Uint(b)) => arith_u64(op, *a, *b).map(Value::Uint),
        (Value::Float(_), _) | (_, Value::Float(_)) => {
            arith_f64(op, as_f64(left), as_f64(right)).map(Value::Float)
        }
        _ => {
            let overflow = ExprError::Overflow { op: op.symbol() };
            let a = as_i64(left).ok_or_else(|| overflow.clone())?;
            let b = as_i64(right).ok_or(overflow)?;
            arith_i64(op, a, b).map(Value::Int)
        }
    }
}

fn arith_i64(op: ArithOp, a: i64, b: i64) -> Result<i64, ExprError> {
    if matches!(op, ArithOp::Div | ArithOp::Rem) && b == 0 {
        return Err(ExprError::DivisionByZero);
    }
    let result = match op {
        ArithOp::Add => a.checked_add(b),
        ArithOp::Sub => a.checked_sub(b),
        ArithOp::Mul => a.checked_mul(b),
        ArithOp::Div => a.checked_div(b),
        ArithOp::Rem => a.checked_rem(b),
    };

    result.ok_or(ExprError::Overflow { op: op.symbol() })
}

fn arith_u64(op: ArithOp, a: u64, b: u64) -> Result<u64, ExprError> {
    if matches!(op, ArithOp::Div | ArithOp::Rem) && b == 0 {
        return Err(ExprError::DivisionByZero);
    }
    let result = match op {
        ArithOp::Add => a.checked_add(b),
        ArithOp::Sub => a.checked_sub(b),
        ArithOp::Mul => a.checked_mul(b),
        ArithOp::Div => a.checked_div(b),
        ArithOp::Rem => a.checked_rem(b),
    };

    result.ok_or(ExprError::Overflow { op: op.symbol() })
}

fn arith_f64(op: ArithOp, a: f64, b: f64) -> Result<f64, ExprError> {
    if matches!(op, ArithOp::Div | ArithOp::Rem) && b == 0.0 {
        return Err(ExprError::DivisionByZero);
    }

    Ok(match op {
        ArithOp::Add => a + b,
        ArithOp::Sub => a - b,
        ArithOp::Mul => a * b,
        ArithOp::Div => a / b,
        ArithOp::Rem => a % b,
    })
}

#[allow(clippy::cast_precision_loss)]
fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Int(v) => *v as f64,
        Value::Uint(v) => *v as f64,
        Value::Float(v) => *v,
        _ => 0.0,
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Int(v) => Some(*v),
        Value::Uint(v) => i64::try_from(*v).ok(),
        _ => None,
    }
}
