//! Row-wise expression evaluation.
//!
//! Shared by the executor and the simplify pass: constant folding runs
//! the same routines over literals that the executor runs over rows, so
//! the two can never disagree.
//!
//! Null handling follows three-valued logic. A null operand makes a
//! comparison or arithmetic result null; `and`/`or` use Kleene truth
//! tables; `is_null`/`is_not_null` are the only operators that turn null
//! into a definite boolean.

use crate::ast::{BinaryOp, Expr, UnaryOp};
use rivulet_core::{DataType, Error, Result, Row, Schema, Value};

/// Evaluates an expression against one row.
pub fn eval_expr(expr: &Expr, schema: &Schema, row: &Row) -> Result<Value> {
    match expr {
        Expr::Column(name) => {
            let index = schema
                .index_of(name)
                .ok_or_else(|| Error::column_not_found(name))?;
            row.get(index)
                .cloned()
                .ok_or_else(|| Error::internal(format!("row missing column {}", name)))
        }
        Expr::Literal(value) => Ok(value.clone()),
        Expr::BinaryOp { left, op, right } => {
            let left = eval_expr(left, schema, row)?;
            let right = eval_expr(right, schema, row)?;
            eval_binary(*op, &left, &right)
        }
        Expr::UnaryOp { op, expr } => {
            let value = eval_expr(expr, schema, row)?;
            eval_unary(*op, &value)
        }
        Expr::Cast { expr, to } => eval_expr(expr, schema, row)?.cast(*to),
        Expr::Alias { expr, .. } => eval_expr(expr, schema, row),
    }
}

/// Evaluates a predicate against one row; a null result keeps nothing.
pub fn eval_predicate(expr: &Expr, schema: &Schema, row: &Row) -> Result<bool> {
    match eval_expr(expr, schema, row)? {
        Value::Null => Ok(false),
        Value::Boolean(b) => Ok(b),
        other => Err(Error::type_mismatch(
            other.data_type().unwrap_or(DataType::Boolean),
            DataType::Boolean,
        )),
    }
}

/// Applies a binary operator to two values.
pub fn eval_binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    match op {
        BinaryOp::And => eval_and(left, right),
        BinaryOp::Or => eval_or(left, right),
        BinaryOp::Eq
        | BinaryOp::Ne
        | BinaryOp::Lt
        | BinaryOp::Le
        | BinaryOp::Gt
        | BinaryOp::Ge => eval_comparison(op, left, right),
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            eval_arithmetic(op, left, right)
        }
    }
}

/// Applies a unary operator to a value.
pub fn eval_unary(op: UnaryOp, value: &Value) -> Result<Value> {
    match op {
        UnaryOp::IsNull => Ok(Value::Boolean(value.is_null())),
        UnaryOp::IsNotNull => Ok(Value::Boolean(!value.is_null())),
        UnaryOp::Not => match value {
            Value::Null => Ok(Value::Null),
            Value::Boolean(b) => Ok(Value::Boolean(!b)),
            other => Err(Error::type_mismatch(
                other.data_type().unwrap_or(DataType::Boolean),
                DataType::Boolean,
            )),
        },
        UnaryOp::Neg => match value {
            Value::Null => Ok(Value::Null),
            Value::Int32(v) => Ok(Value::Int32(v.wrapping_neg())),
            Value::Int64(v) => Ok(Value::Int64(v.wrapping_neg())),
            Value::Float64(v) => Ok(Value::Float64(-v)),
            other => Err(Error::type_mismatch(
                other.data_type().unwrap_or(DataType::Float64),
                DataType::Float64,
            )),
        },
    }
}

fn eval_and(left: &Value, right: &Value) -> Result<Value> {
    let l = logical_operand(left)?;
    let r = logical_operand(right)?;
    Ok(match (l, r) {
        (Some(false), _) | (_, Some(false)) => Value::Boolean(false),
        (Some(true), Some(true)) => Value::Boolean(true),
        _ => Value::Null,
    })
}

fn eval_or(left: &Value, right: &Value) -> Result<Value> {
    let l = logical_operand(left)?;
    let r = logical_operand(right)?;
    Ok(match (l, r) {
        (Some(true), _) | (_, Some(true)) => Value::Boolean(true),
        (Some(false), Some(false)) => Value::Boolean(false),
        _ => Value::Null,
    })
}

fn logical_operand(value: &Value) -> Result<Option<bool>> {
    match value {
        Value::Null => Ok(None),
        Value::Boolean(b) => Ok(Some(*b)),
        other => Err(Error::type_mismatch(
            other.data_type().unwrap_or(DataType::Boolean),
            DataType::Boolean,
        )),
    }
}

fn eval_comparison(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }
    let (lt, rt) = (left.data_type(), right.data_type());
    match (lt, rt) {
        (Some(lt), Some(rt)) if DataType::common_super_type(lt, rt).is_none() => {
            return Err(Error::type_mismatch(lt, rt));
        }
        _ => {}
    }
    let ordering = left.cmp(right);
    let out = match op {
        BinaryOp::Eq => ordering.is_eq(),
        BinaryOp::Ne => ordering.is_ne(),
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::Le => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        BinaryOp::Ge => ordering.is_ge(),
        _ => return Err(Error::internal("not a comparison operator")),
    };
    Ok(Value::Boolean(out))
}

fn eval_arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }
    match (left, right) {
        // Same-width integer math stays in its width; division by zero
        // yields null rather than a mid-query abort.
        (Value::Int32(a), Value::Int32(b)) => int32_arithmetic(op, *a, *b),
        (Value::Float64(_), _) | (_, Value::Float64(_)) => {
            let (a, b) = match (left.to_f64(), right.to_f64()) {
                (Some(a), Some(b)) => (a, b),
                _ => return arithmetic_mismatch(left, right),
            };
            Ok(Value::Float64(match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                _ => return Err(Error::internal("not an arithmetic operator")),
            }))
        }
        (Value::Int32(_) | Value::Int64(_), Value::Int32(_) | Value::Int64(_)) => {
            let (a, b) = match (left, right) {
                (Value::Int32(a), Value::Int64(b)) => (*a as i64, *b),
                (Value::Int64(a), Value::Int32(b)) => (*a, *b as i64),
                (Value::Int64(a), Value::Int64(b)) => (*a, *b),
                _ => return arithmetic_mismatch(left, right),
            };
            int64_arithmetic(op, a, b)
        }
        _ => arithmetic_mismatch(left, right),
    }
}

fn int32_arithmetic(op: BinaryOp, a: i32, b: i32) -> Result<Value> {
    let out = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => {
            if b == 0 {
                return Ok(Value::Null);
            }
            a.checked_div(b)
        }
        _ => return Err(Error::internal("not an arithmetic operator")),
    };
    out.map(Value::Int32)
        .ok_or_else(|| Error::internal("i32 overflow in arithmetic"))
}

fn int64_arithmetic(op: BinaryOp, a: i64, b: i64) -> Result<Value> {
    let out = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => {
            if b == 0 {
                return Ok(Value::Null);
            }
            a.checked_div(b)
        }
        _ => return Err(Error::internal("not an arithmetic operator")),
    };
    out.map(Value::Int64)
        .ok_or_else(|| Error::internal("i64 overflow in arithmetic"))
}

fn arithmetic_mismatch(left: &Value, right: &Value) -> Result<Value> {
    Err(Error::type_mismatch(
        left.data_type().unwrap_or(DataType::Float64),
        right.data_type().unwrap_or(DataType::Float64),
    ))
}
