//! Built-in `$functions`.
//!
//! Every function is registered with its arity so calls can be rejected at
//! parse time, before any data is seen.

use serde_json::Value;

use crate::error::{ExprError, ExprResult};
use crate::eval::{as_number, stringify, truthy, type_name};
use crate::parser::number_value;

type Args<'a> = &'a [Option<Value>];
type Impl = fn(&[Option<Value>]) -> ExprResult<Option<Value>>;

struct FunctionDef {
    name: &'static str,
    min: usize,
    max: usize,
    eval: Impl,
}

const FUNCTIONS: &[FunctionDef] = &[
    FunctionDef { name: "count", min: 1, max: 1, eval: count },
    FunctionDef { name: "sum", min: 1, max: 1, eval: sum },
    FunctionDef { name: "max", min: 1, max: 1, eval: max },
    FunctionDef { name: "min", min: 1, max: 1, eval: min },
    FunctionDef { name: "average", min: 1, max: 1, eval: average },
    FunctionDef { name: "string", min: 1, max: 1, eval: string },
    FunctionDef { name: "number", min: 1, max: 1, eval: number },
    FunctionDef { name: "length", min: 1, max: 1, eval: length },
    FunctionDef { name: "uppercase", min: 1, max: 1, eval: uppercase },
    FunctionDef { name: "lowercase", min: 1, max: 1, eval: lowercase },
    FunctionDef { name: "exists", min: 1, max: 1, eval: exists },
    FunctionDef { name: "not", min: 1, max: 1, eval: not },
    FunctionDef { name: "join", min: 1, max: 2, eval: join },
    FunctionDef { name: "boolean", min: 1, max: 1, eval: boolean },
];

fn lookup(name: &str) -> ExprResult<&'static FunctionDef> {
    FUNCTIONS
        .iter()
        .find(|f| f.name == name)
        .ok_or_else(|| ExprError::UnknownFunction(name.to_string()))
}

/// Names of all built-in functions.
pub fn names() -> impl Iterator<Item = &'static str> {
    FUNCTIONS.iter().map(|f| f.name)
}

/// Validate a call site: the function exists and accepts `argc` arguments.
pub fn check_call(name: &str, argc: usize) -> ExprResult<()> {
    let def = lookup(name)?;
    if argc < def.min || argc > def.max {
        let expected = if def.min == def.max {
            def.min.to_string()
        } else {
            format!("{}..={}", def.min, def.max)
        };
        return Err(ExprError::Arity {
            function: name.to_string(),
            expected,
            got: argc,
        });
    }
    Ok(())
}

pub fn call(name: &str, args: &[Option<Value>]) -> ExprResult<Option<Value>> {
    check_call(name, args.len())?;
    (lookup(name)?.eval)(args)
}

/// Arguments are sequences: undefined is empty, a scalar is a singleton.
fn items(arg: &Option<Value>) -> Vec<&Value> {
    match arg {
        None => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(v) => vec![v],
    }
}

fn numbers(function: &str, arg: &Option<Value>) -> ExprResult<Vec<f64>> {
    items(arg)
        .into_iter()
        .map(|v| as_number(v, &format!("argument of ${function}")))
        .collect()
}

fn text<'a>(function: &str, arg: &'a Option<Value>) -> ExprResult<Option<&'a str>> {
    match arg {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(ExprError::Type(format!(
            "argument of ${function} must be a string, got {}",
            type_name(other)
        ))),
    }
}

fn count(args: Args<'_>) -> ExprResult<Option<Value>> {
    Ok(Some(Value::from(items(&args[0]).len())))
}

fn sum(args: Args<'_>) -> ExprResult<Option<Value>> {
    let total: f64 = numbers("sum", &args[0])?.into_iter().sum();
    Ok(Some(number_value(total)))
}

fn max(args: Args<'_>) -> ExprResult<Option<Value>> {
    Ok(numbers("max", &args[0])?
        .into_iter()
        .reduce(f64::max)
        .map(number_value))
}

fn min(args: Args<'_>) -> ExprResult<Option<Value>> {
    Ok(numbers("min", &args[0])?
        .into_iter()
        .reduce(f64::min)
        .map(number_value))
}

fn average(args: Args<'_>) -> ExprResult<Option<Value>> {
    let ns = numbers("average", &args[0])?;
    if ns.is_empty() {
        return Ok(None);
    }
    let total: f64 = ns.iter().sum();
    Ok(Some(number_value(total / ns.len() as f64)))
}

fn string(args: Args<'_>) -> ExprResult<Option<Value>> {
    Ok(args[0]
        .as_ref()
        .map(|_| Value::String(stringify(&args[0]))))
}

fn number(args: Args<'_>) -> ExprResult<Option<Value>> {
    match &args[0] {
        None => Ok(None),
        Some(Value::Number(n)) => Ok(Some(Value::Number(n.clone()))),
        Some(Value::Bool(b)) => Ok(Some(Value::from(u8::from(*b)))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(|n| Some(number_value(n)))
            .ok_or_else(|| ExprError::Type(format!("cannot convert {s:?} to a number"))),
        Some(other) => Err(ExprError::Type(format!(
            "cannot convert {} to a number",
            type_name(other)
        ))),
    }
}

fn length(args: Args<'_>) -> ExprResult<Option<Value>> {
    Ok(text("length", &args[0])?.map(|s| Value::from(s.chars().count())))
}

fn uppercase(args: Args<'_>) -> ExprResult<Option<Value>> {
    Ok(text("uppercase", &args[0])?.map(|s| Value::String(s.to_uppercase())))
}

fn lowercase(args: Args<'_>) -> ExprResult<Option<Value>> {
    Ok(text("lowercase", &args[0])?.map(|s| Value::String(s.to_lowercase())))
}

fn exists(args: Args<'_>) -> ExprResult<Option<Value>> {
    Ok(Some(Value::Bool(args[0].is_some())))
}

fn not(args: Args<'_>) -> ExprResult<Option<Value>> {
    Ok(args[0].as_ref().map(|_| Value::Bool(!truthy(&args[0]))))
}

fn boolean(args: Args<'_>) -> ExprResult<Option<Value>> {
    Ok(args[0].as_ref().map(|_| Value::Bool(truthy(&args[0]))))
}

fn join(args: Args<'_>) -> ExprResult<Option<Value>> {
    let separator = match args.get(1) {
        Some(sep) => text("join", sep)?.unwrap_or(""),
        None => "",
    };
    let parts = items(&args[0])
        .into_iter()
        .map(|v| match v {
            Value::String(s) => Ok(s.as_str()),
            other => Err(ExprError::Type(format!(
                "$join expects strings, got {}",
                type_name(other)
            ))),
        })
        .collect::<ExprResult<Vec<_>>>()?;
    if args[0].is_none() {
        return Ok(None);
    }
    Ok(Some(Value::String(parts.join(separator))))
}
