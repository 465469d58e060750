//! Binary and unary operators for configuration expressions.
//!
//! Direct enum dispatch: the value set is closed, so matching on
//! `(left, right)` beats trait objects and keeps the cases exhaustive.

use std::cmp::Ordering;

use morph_ir::{BinaryOp, EvalError, EvalResult, UnaryOp, Value};

#[inline]
fn checked_arith(result: Option<i64>, operation: &'static str) -> EvalResult {
    result
        .map(Value::Int)
        .ok_or(EvalError::Overflow { operation })
}

/// Evaluate `left op right`. `And`/`Or` short-circuit in the lowering and
/// only reach here with both operands evaluated.
#[expect(
    clippy::needless_pass_by_value,
    reason = "operands are produced fresh by the caller's thunks"
)]
pub fn evaluate_binary(left: Value, right: Value, op: BinaryOp) -> EvalResult {
    match (&left, &right) {
        (Value::Int(a), Value::Int(b)) => eval_int_binary(*a, *b, op),
        (Value::Float(a), Value::Float(b)) => eval_float_binary(*a, *b, op),
        #[expect(clippy::cast_precision_loss, reason = "mixed arithmetic promotes to float")]
        (Value::Int(a), Value::Float(b)) => eval_float_binary(*a as f64, *b, op),
        #[expect(clippy::cast_precision_loss, reason = "mixed arithmetic promotes to float")]
        (Value::Float(a), Value::Int(b)) => eval_float_binary(*a, *b as f64, op),
        (Value::Bool(a), Value::Bool(b)) => eval_bool_binary(*a, *b, op),
        (Value::Str(a), Value::Str(b)) => match op {
            BinaryOp::Add => Ok(Value::string(format!("{a}{b}"))),
            _ => compare(a.cmp(b), op, &left, &right),
        },
        (Value::Char(a), Value::Char(b)) => compare(a.cmp(b), op, &left, &right),
        (Value::Timestamp(a), Value::Timestamp(b)) => compare(a.cmp(b), op, &left, &right),
        _ => match op {
            BinaryOp::Eq => Ok(Value::Bool(left == right)),
            BinaryOp::NotEq => Ok(Value::Bool(left != right)),
            _ => Err(binary_mismatch(&left, &right)),
        },
    }
}

fn eval_int_binary(a: i64, b: i64, op: BinaryOp) -> EvalResult {
    match op {
        BinaryOp::Add => checked_arith(a.checked_add(b), "addition"),
        BinaryOp::Sub => checked_arith(a.checked_sub(b), "subtraction"),
        BinaryOp::Mul => checked_arith(a.checked_mul(b), "multiplication"),
        BinaryOp::Div if b == 0 => Err(EvalError::DivisionByZero),
        BinaryOp::Div => checked_arith(a.checked_div(b), "division"),
        BinaryOp::And | BinaryOp::Or => Err(binary_mismatch(&Value::Int(a), &Value::Int(b))),
        _ => compare(a.cmp(&b), op, &Value::Int(a), &Value::Int(b)),
    }
}

fn eval_float_binary(a: f64, b: f64, op: BinaryOp) -> EvalResult {
    match op {
        BinaryOp::Add => Ok(Value::Float(a + b)),
        BinaryOp::Sub => Ok(Value::Float(a - b)),
        BinaryOp::Mul => Ok(Value::Float(a * b)),
        BinaryOp::Div => Ok(Value::Float(a / b)),
        BinaryOp::And | BinaryOp::Or => {
            Err(binary_mismatch(&Value::Float(a), &Value::Float(b)))
        }
        _ => match a.partial_cmp(&b) {
            Some(ordering) => compare(ordering, op, &Value::Float(a), &Value::Float(b)),
            // NaN compares unequal to everything.
            None => Ok(Value::Bool(op == BinaryOp::NotEq)),
        },
    }
}

fn eval_bool_binary(a: bool, b: bool, op: BinaryOp) -> EvalResult {
    match op {
        BinaryOp::And => Ok(Value::Bool(a && b)),
        BinaryOp::Or => Ok(Value::Bool(a || b)),
        BinaryOp::Eq => Ok(Value::Bool(a == b)),
        BinaryOp::NotEq => Ok(Value::Bool(a != b)),
        _ => Err(binary_mismatch(&Value::Bool(a), &Value::Bool(b))),
    }
}

fn compare(ordering: Ordering, op: BinaryOp, left: &Value, right: &Value) -> EvalResult {
    let result = match op {
        BinaryOp::Eq => ordering == Ordering::Equal,
        BinaryOp::NotEq => ordering != Ordering::Equal,
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::LtEq => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        BinaryOp::GtEq => ordering != Ordering::Less,
        _ => return Err(binary_mismatch(left, right)),
    };
    Ok(Value::Bool(result))
}

/// Evaluate `op value`.
pub fn evaluate_unary(value: Value, op: UnaryOp) -> EvalResult {
    match (&value, op) {
        (_, UnaryOp::IsNull) => Ok(Value::Bool(value.is_null())),
        (_, UnaryOp::IsNotNull) => Ok(Value::Bool(!value.is_null())),
        (Value::Bool(b), UnaryOp::Not) => Ok(Value::Bool(!b)),
        (Value::Int(n), UnaryOp::Neg) => n
            .checked_neg()
            .map(Value::Int)
            .ok_or(EvalError::Overflow {
                operation: "negation",
            }),
        (Value::Float(f), UnaryOp::Neg) => Ok(Value::Float(-f)),
        (_, UnaryOp::Not) => Err(EvalError::mismatch("bool", &value)),
        (_, UnaryOp::Neg) => Err(EvalError::mismatch("number", &value)),
    }
}

#[cold]
fn binary_mismatch(left: &Value, right: &Value) -> EvalError {
    EvalError::TypeMismatch {
        expected: left.kind_name(),
        found: right.kind_name(),
    }
}
