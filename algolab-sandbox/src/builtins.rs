//! The allow-listed numeric builtin surface reachable from snippets.
//!
//! This table is the *entire* host interface of the sandbox: snippets have
//! no import mechanism, no filesystem or network primitives, and no way to
//! reach anything that is not listed here.

use crate::config::SandboxLimits;
use crate::error::SnippetError;
use crate::value::{Value, format_number};

/// Names callable from snippets, sorted.
pub const BUILTIN_NAMES: &[&str] = &[
    "abs", "dot", "exp", "len", "linspace", "log", "max", "mean", "min", "ones", "pow", "print",
    "range", "round", "sqrt", "std", "sum", "zeros",
];

/// Whether `name` is a reserved builtin.
pub fn is_builtin(name: &str) -> bool {
    BUILTIN_NAMES.binary_search(&name).is_ok()
}

/// Dispatch a builtin call.
///
/// `out` is the captured stdout buffer for this run; `line` is the call
/// site used for error attribution.
pub fn call(
    name: &str,
    args: &[Value],
    out: &mut String,
    limits: &SandboxLimits,
    line: u32,
) -> Result<Value, SnippetError> {
    match name {
        "print" => print(args, out, limits, line),
        "len" => len(args, line),
        "range" => range(args, limits, line),
        "zeros" => filled(args, 0.0, "zeros", limits, line),
        "ones" => filled(args, 1.0, "ones", limits, line),
        "linspace" => linspace(args, limits, line),
        "sum" => reduce(args, "sum", line, |items| items.iter().sum()),
        "mean" => mean(args, line),
        "std" => std_dev(args, line),
        "min" => extremum(args, "min", line, |acc, x| acc.min(x)),
        "max" => extremum(args, "max", line, |acc, x| acc.max(x)),
        "abs" => elementwise(args, "abs", line, f64::abs),
        "sqrt" => elementwise(args, "sqrt", line, f64::sqrt),
        "exp" => elementwise(args, "exp", line, f64::exp),
        "log" => elementwise(args, "log", line, f64::ln),
        "pow" => pow(args, line),
        "round" => round(args, line),
        "dot" => dot(args, line),
        _ => Err(SnippetError::name(
            format!("name '{name}' is not defined"),
            line,
        )),
    }
}

// -- Output ------------------------------------------------------------------

fn print(
    args: &[Value],
    out: &mut String,
    limits: &SandboxLimits,
    line: u32,
) -> Result<Value, SnippetError> {
    let mut text = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            text.push(' ');
        }
        text.push_str(&arg.display_string());
    }
    text.push('\n');
    if out.len() + text.len() > limits.max_output_bytes {
        return Err(SnippetError::output_limit(line));
    }
    out.push_str(&text);
    Ok(Value::Unit)
}

// -- Array construction ------------------------------------------------------

fn range(args: &[Value], limits: &SandboxLimits, line: u32) -> Result<Value, SnippetError> {
    let (start, stop) = match args {
        [stop] => (0.0, expect_int(stop, "range", line)?),
        [start, stop] => (
            expect_int(start, "range", line)?,
            expect_int(stop, "range", line)?,
        ),
        _ => {
            return Err(arity_error("range", "1 or 2", args.len(), line));
        }
    };
    let count = (stop - start).max(0.0) as usize;
    check_array_len(count, limits, line)?;
    Ok(Value::Array(
        (0..count).map(|i| start + i as f64).collect(),
    ))
}

fn filled(
    args: &[Value],
    fill: f64,
    name: &str,
    limits: &SandboxLimits,
    line: u32,
) -> Result<Value, SnippetError> {
    let [count] = args else {
        return Err(arity_error(name, "1", args.len(), line));
    };
    let count = expect_int(count, name, line)?;
    if count < 0.0 {
        return Err(SnippetError::value(
            format!("{name}() length must not be negative"),
            line,
        ));
    }
    let count = count as usize;
    check_array_len(count, limits, line)?;
    Ok(Value::Array(vec![fill; count]))
}

fn linspace(args: &[Value], limits: &SandboxLimits, line: u32) -> Result<Value, SnippetError> {
    let [start, stop, count] = args else {
        return Err(arity_error("linspace", "3", args.len(), line));
    };
    let start = expect_num(start, "linspace", line)?;
    let stop = expect_num(stop, "linspace", line)?;
    let count = expect_int(count, "linspace", line)?;
    if count < 1.0 {
        return Err(SnippetError::value(
            "linspace() needs at least one sample",
            line,
        ));
    }
    let count = count as usize;
    check_array_len(count, limits, line)?;
    if count == 1 {
        return Ok(Value::Array(vec![start]));
    }
    let step = (stop - start) / (count - 1) as f64;
    Ok(Value::Array(
        (0..count).map(|i| start + step * i as f64).collect(),
    ))
}

// -- Reductions --------------------------------------------------------------

fn reduce(
    args: &[Value],
    name: &str,
    line: u32,
    f: impl Fn(&[f64]) -> f64,
) -> Result<Value, SnippetError> {
    let [value] = args else {
        return Err(arity_error(name, "1", args.len(), line));
    };
    let items = expect_array(value, name, line)?;
    Ok(Value::Num(f(items)))
}

fn mean(args: &[Value], line: u32) -> Result<Value, SnippetError> {
    let [value] = args else {
        return Err(arity_error("mean", "1", args.len(), line));
    };
    let items = expect_array(value, "mean", line)?;
    if items.is_empty() {
        return Err(SnippetError::value("mean() of an empty array", line));
    }
    Ok(Value::Num(items.iter().sum::<f64>() / items.len() as f64))
}

fn std_dev(args: &[Value], line: u32) -> Result<Value, SnippetError> {
    let [value] = args else {
        return Err(arity_error("std", "1", args.len(), line));
    };
    let items = expect_array(value, "std", line)?;
    if items.is_empty() {
        return Err(SnippetError::value("std() of an empty array", line));
    }
    let mean = items.iter().sum::<f64>() / items.len() as f64;
    let variance = items.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / items.len() as f64;
    Ok(Value::Num(variance.sqrt()))
}

/// `min`/`max` accept either a single array or two-plus scalars.
fn extremum(
    args: &[Value],
    name: &str,
    line: u32,
    fold: impl Fn(f64, f64) -> f64,
) -> Result<Value, SnippetError> {
    let items: Vec<f64> = match args {
        [Value::Array(items)] => {
            if items.is_empty() {
                return Err(SnippetError::value(
                    format!("{name}() of an empty array"),
                    line,
                ));
            }
            items.clone()
        }
        args if args.len() >= 2 => args
            .iter()
            .map(|v| expect_num(v, name, line))
            .collect::<Result<_, _>>()?,
        _ => {
            return Err(SnippetError::type_error(
                format!("{name}() takes an array or at least two numbers"),
                line,
            ));
        }
    };
    let mut acc = items[0];
    for &x in &items[1..] {
        acc = fold(acc, x);
    }
    Ok(Value::Num(acc))
}

// -- Elementwise math --------------------------------------------------------

fn elementwise(
    args: &[Value],
    name: &str,
    line: u32,
    f: impl Fn(f64) -> f64,
) -> Result<Value, SnippetError> {
    let [value] = args else {
        return Err(arity_error(name, "1", args.len(), line));
    };
    apply_elementwise(value, name, line, &f)
}

fn apply_elementwise(
    value: &Value,
    name: &str,
    line: u32,
    f: &impl Fn(f64) -> f64,
) -> Result<Value, SnippetError> {
    match value {
        Value::Num(n) => Ok(Value::Num(f(*n))),
        Value::Array(items) => Ok(Value::Array(items.iter().map(|&x| f(x)).collect())),
        other => Err(SnippetError::type_error(
            format!("{name}() expects a number or array, got {}", other.type_name()),
            line,
        )),
    }
}

fn pow(args: &[Value], line: u32) -> Result<Value, SnippetError> {
    let [base, exponent] = args else {
        return Err(arity_error("pow", "2", args.len(), line));
    };
    let exponent = expect_num(exponent, "pow", line)?;
    apply_elementwise(base, "pow", line, &|x| x.powf(exponent))
}

fn round(args: &[Value], line: u32) -> Result<Value, SnippetError> {
    let (value, digits) = match args {
        [value] => (value, 0.0),
        [value, digits] => (value, expect_int(digits, "round", line)?),
        _ => return Err(arity_error("round", "1 or 2", args.len(), line)),
    };
    let factor = 10f64.powi(digits as i32);
    apply_elementwise(value, "round", line, &|x| (x * factor).round() / factor)
}

fn dot(args: &[Value], line: u32) -> Result<Value, SnippetError> {
    let [a, b] = args else {
        return Err(arity_error("dot", "2", args.len(), line));
    };
    let a = expect_array(a, "dot", line)?;
    let b = expect_array(b, "dot", line)?;
    if a.len() != b.len() {
        return Err(SnippetError::value(
            format!(
                "dot() arrays must have equal length, got {} and {}",
                a.len(),
                b.len()
            ),
            line,
        ));
    }
    Ok(Value::Num(a.iter().zip(b).map(|(x, y)| x * y).sum()))
}

// -- Shared helpers ----------------------------------------------------------

fn len(args: &[Value], line: u32) -> Result<Value, SnippetError> {
    let [value] = args else {
        return Err(arity_error("len", "1", args.len(), line));
    };
    match value {
        Value::Array(items) => Ok(Value::Num(items.len() as f64)),
        Value::Str(s) => Ok(Value::Num(s.chars().count() as f64)),
        other => Err(SnippetError::type_error(
            format!("len() expects an array or string, got {}", other.type_name()),
            line,
        )),
    }
}

fn arity_error(name: &str, expected: &str, got: usize, line: u32) -> SnippetError {
    SnippetError::type_error(
        format!("{name}() takes {expected} argument(s), got {got}"),
        line,
    )
}

fn expect_num(value: &Value, name: &str, line: u32) -> Result<f64, SnippetError> {
    match value {
        Value::Num(n) => Ok(*n),
        other => Err(SnippetError::type_error(
            format!("{name}() expects a number, got {}", other.type_name()),
            line,
        )),
    }
}

fn expect_int(value: &Value, name: &str, line: u32) -> Result<f64, SnippetError> {
    let n = expect_num(value, name, line)?;
    if n.fract() != 0.0 || !n.is_finite() {
        return Err(SnippetError::type_error(
            format!("{name}() expects a whole number, got {}", format_number(n)),
            line,
        ));
    }
    Ok(n)
}

fn expect_array<'a>(
    value: &'a Value,
    name: &str,
    line: u32,
) -> Result<&'a [f64], SnippetError> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(SnippetError::type_error(
            format!("{name}() expects an array, got {}", other.type_name()),
            line,
        )),
    }
}

fn check_array_len(len: usize, limits: &SandboxLimits, line: u32) -> Result<(), SnippetError> {
    if len > limits.max_array_len {
        return Err(SnippetError::value(
            format!(
                "array of {len} elements exceeds the limit of {}",
                limits.max_array_len
            ),
            line,
        ));
    }
    Ok(())
}
