//! Tree-walking evaluator.
//!
//! Evaluation yields `Option<Value>`: `None` is "undefined", which is distinct
//! from JSON `null`. Paths over arrays map over their items and flatten; a
//! sequence of one item collapses to the item itself.

use std::cmp::Ordering;

use serde_json::Value;

use crate::ast::{BinaryOp, Node, Step, UnaryOp};
use crate::error::{ExprError, ExprResult};
use crate::functions;
use crate::parser::number_value;

/// Evaluate `node` against the context value.
pub fn evaluate(node: &Node, ctx: &Value) -> ExprResult<Option<Value>> {
    match node {
        Node::Literal(v) => Ok(Some(v.clone())),
        Node::Context => Ok(Some(ctx.clone())),
        Node::Path(steps) => eval_path(steps, ctx),
        Node::Unary {
            op: UnaryOp::Neg,
            operand,
        } => match evaluate(operand, ctx)? {
            None => Ok(None),
            Some(v) => {
                let n = as_number(&v, "operand of unary '-'")?;
                Ok(Some(number_value(-n)))
            }
        },
        Node::Binary { op, lhs, rhs } => eval_binary(*op, lhs, rhs, ctx),
        Node::Condition {
            test,
            then,
            otherwise,
        } => {
            if truthy(&evaluate(test, ctx)?) {
                evaluate(then, ctx)
            } else if let Some(o) = otherwise {
                evaluate(o, ctx)
            } else {
                Ok(None)
            }
        }
        Node::Call {
            function,
            arguments,
        } => {
            let args = arguments
                .iter()
                .map(|a| evaluate(a, ctx))
                .collect::<ExprResult<Vec<_>>>()?;
            functions::call(function, &args)
        }
        Node::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                if let Some(v) = evaluate(item, ctx)? {
                    out.push(v);
                }
            }
            Ok(Some(Value::Array(out)))
        }
        Node::Filter { base, predicate } => {
            let seq = match evaluate(base, ctx)? {
                None => Vec::new(),
                Some(Value::Array(items)) => items,
                Some(v) => vec![v],
            };
            Ok(collapse(apply_stage(predicate, seq)?))
        }
    }
}

fn eval_path(steps: &[Step], ctx: &Value) -> ExprResult<Option<Value>> {
    let mut inputs = vec![ctx.clone()];

    for (i, step) in steps.iter().enumerate() {
        let last = i + 1 == steps.len();
        let mut found = Vec::new();
        for input in &inputs {
            match input {
                Value::Object(map) => {
                    if let Some(v) = map.get(&step.name) {
                        found.push(v.clone());
                    }
                }
                Value::Array(items) => {
                    for item in items {
                        if let Some(v) = item.get(&step.name) {
                            found.push(v.clone());
                        }
                    }
                }
                _ => {}
            }
        }

        // A plain field read returns the stored value unchanged, arrays included.
        if last && step.stages.is_empty() && inputs.len() == 1 && found.len() <= 1 {
            return Ok(found.pop());
        }

        let mut seq = flatten(found);
        for stage in &step.stages {
            seq = apply_stage(stage, seq)?;
        }
        inputs = seq;
    }

    Ok(collapse(inputs))
}

fn flatten(values: Vec<Value>) -> Vec<Value> {
    let mut out = Vec::with_capacity(values.len());
    for v in values {
        match v {
            Value::Array(items) => out.extend(items),
            other => out.push(other),
        }
    }
    out
}

/// Keep the items selected by a predicate. A numeric predicate result is an
/// index (negative counts from the end); anything else is a truth test.
fn apply_stage(predicate: &Node, seq: Vec<Value>) -> ExprResult<Vec<Value>> {
    let len = seq.len() as i64;
    let mut out = Vec::new();
    for (i, item) in seq.into_iter().enumerate() {
        let keep = match evaluate(predicate, &item)? {
            Some(Value::Number(n)) => {
                let idx = n.as_f64().unwrap_or(f64::NAN).floor() as i64;
                let idx = if idx < 0 { len + idx } else { idx };
                idx == i as i64
            }
            other => truthy(&other),
        };
        if keep {
            out.push(item);
        }
    }
    Ok(out)
}

fn collapse(mut seq: Vec<Value>) -> Option<Value> {
    match seq.len() {
        0 => None,
        1 => seq.pop(),
        _ => Some(Value::Array(seq)),
    }
}

fn eval_binary(op: BinaryOp, lhs: &Node, rhs: &Node, ctx: &Value) -> ExprResult<Option<Value>> {
    match op {
        BinaryOp::And => {
            let l = truthy(&evaluate(lhs, ctx)?);
            return Ok(Some(Value::Bool(l && truthy(&evaluate(rhs, ctx)?))));
        }
        BinaryOp::Or => {
            let l = truthy(&evaluate(lhs, ctx)?);
            return Ok(Some(Value::Bool(l || truthy(&evaluate(rhs, ctx)?))));
        }
        _ => {}
    }

    let l = evaluate(lhs, ctx)?;
    let r = evaluate(rhs, ctx)?;

    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            let (Some(l), Some(r)) = (l, r) else {
                return Ok(None);
            };
            let a = as_number(&l, "left operand")?;
            let b = as_number(&r, "right operand")?;
            let n = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div if b == 0.0 => return Err(ExprError::Type("division by zero".into())),
                BinaryOp::Div => a / b,
                BinaryOp::Mod if b == 0.0 => return Err(ExprError::Type("division by zero".into())),
                _ => a % b,
            };
            Ok(Some(number_value(n)))
        }
        BinaryOp::Concat => Ok(Some(Value::String(format!(
            "{}{}",
            stringify(&l),
            stringify(&r)
        )))),
        BinaryOp::Eq | BinaryOp::Ne => {
            let (Some(l), Some(r)) = (l, r) else {
                return Ok(Some(Value::Bool(false)));
            };
            let eq = values_equal(&l, &r);
            Ok(Some(Value::Bool(if op == BinaryOp::Eq { eq } else { !eq })))
        }
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let (Some(l), Some(r)) = (l, r) else {
                return Ok(Some(Value::Bool(false)));
            };
            let ord = compare(&l, &r)?;
            let result = match op {
                BinaryOp::Lt => ord == Ordering::Less,
                BinaryOp::Le => ord != Ordering::Greater,
                BinaryOp::Gt => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            };
            Ok(Some(Value::Bool(result)))
        }
        BinaryOp::In => {
            let (Some(l), Some(r)) = (l, r) else {
                return Ok(Some(Value::Bool(false)));
            };
            let found = match &r {
                Value::Array(items) => items.iter().any(|i| values_equal(&l, i)),
                other => values_equal(&l, other),
            };
            Ok(Some(Value::Bool(found)))
        }
        BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
    }
}

fn compare(l: &Value, r: &Value) -> ExprResult<Ordering> {
    match (l, r) {
        (Value::Number(a), Value::Number(b)) => {
            let (a, b) = (a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN));
            a.partial_cmp(&b)
                .ok_or_else(|| ExprError::Type("cannot compare NaN".into()))
        }
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        _ => Err(ExprError::Type(format!(
            "cannot compare {} with {}",
            type_name(l),
            type_name(r)
        ))),
    }
}

/// Deep equality where `2` and `2.0` are the same number.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| values_equal(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| values_equal(v, w)))
        }
        _ => a == b,
    }
}

/// Truthiness: undefined, null, false, 0, "", empty containers and arrays
/// with no truthy member are false.
pub fn truthy(v: &Option<Value>) -> bool {
    match v {
        None => false,
        Some(v) => value_truthy(v),
    }
}

fn value_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => items.iter().any(value_truthy),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Render a value as text: strings verbatim, undefined as empty, everything
/// else as JSON.
pub fn stringify(v: &Option<Value>) -> String {
    match v {
        None => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

pub(crate) fn as_number(v: &Value, what: &str) -> ExprResult<f64> {
    match v {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| ExprError::Type(format!("{what} is not a finite number"))),
        other => Err(ExprError::Type(format!(
            "{what} must be a number, got {}",
            type_name(other)
        ))),
    }
}

pub(crate) fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
