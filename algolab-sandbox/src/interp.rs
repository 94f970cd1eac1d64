//! Tree-walking interpreter for a single snippet run.
//!
//! One [`Interpreter`] is created per execution request and owns that
//! request's binding environment and captured output. Nothing is shared
//! across concurrent runs except the read-only limits and the cancellation
//! flag installed by the executor.
//!
//! Every statement, loop iteration, and compound expression charges one
//! unit of fuel; the same checkpoint observes the cancellation flag, so a
//! cancelled run stops within a bounded number of steps.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::builtins;
use crate::config::SandboxLimits;
use crate::error::SnippetError;
use crate::parser::{BinaryOp, Expr, Stmt, UnaryOp};
use crate::value::Value;

pub struct Interpreter {
    env: BTreeMap<String, Value>,
    output: String,
    fuel: u64,
    limits: SandboxLimits,
    cancel: Arc<AtomicBool>,
}

impl Interpreter {
    pub fn new(limits: SandboxLimits, cancel: Arc<AtomicBool>) -> Self {
        Self {
            env: BTreeMap::new(),
            output: String::new(),
            fuel: limits.max_fuel,
            limits,
            cancel,
        }
    }

    /// Execute a parsed program to completion or first error.
    pub fn run(&mut self, program: &[Stmt]) -> Result<(), SnippetError> {
        for stmt in program {
            self.exec_stmt(stmt)?;
        }
        Ok(())
    }

    /// Consume the interpreter, yielding captured output and final bindings.
    pub fn into_parts(self) -> (String, BTreeMap<String, Value>) {
        (self.output, self.env)
    }

    /// Fuel/cancellation checkpoint. Charged once per statement, loop
    /// iteration, and compound expression node.
    fn charge(&mut self, line: u32) -> Result<(), SnippetError> {
        if self.cancel.load(Ordering::Relaxed) {
            return Err(SnippetError::cancelled(line));
        }
        match self.fuel.checked_sub(1) {
            Some(fuel) => {
                self.fuel = fuel;
                Ok(())
            }
            None => Err(SnippetError::out_of_fuel(line)),
        }
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<(), SnippetError> {
        match stmt {
            Stmt::Assign { name, value, line } => {
                self.charge(*line)?;
                if builtins::is_builtin(name) {
                    return Err(SnippetError::type_error(
                        format!("cannot rebind builtin '{name}'"),
                        *line,
                    ));
                }
                let value = self.eval(value)?;
                self.env.insert(name.clone(), value);
                Ok(())
            }
            Stmt::Expr { expr, line } => {
                self.charge(*line)?;
                self.eval(expr)?;
                Ok(())
            }
            Stmt::If {
                cond,
                then_body,
                else_body,
                line,
            } => {
                self.charge(*line)?;
                if self.eval(cond)?.truthy() {
                    self.exec_block(then_body)
                } else {
                    self.exec_block(else_body)
                }
            }
            Stmt::While { cond, body, line } => {
                loop {
                    self.charge(*line)?;
                    if !self.eval(cond)?.truthy() {
                        return Ok(());
                    }
                    self.exec_block(body)?;
                }
            }
            Stmt::For {
                var,
                iterable,
                body,
                line,
            } => {
                self.charge(*line)?;
                if builtins::is_builtin(var) {
                    return Err(SnippetError::type_error(
                        format!("cannot rebind builtin '{var}'"),
                        *line,
                    ));
                }
                let items = match self.eval(iterable)? {
                    Value::Array(items) => items,
                    other => {
                        return Err(SnippetError::type_error(
                            format!("for loop expects an array, got {}", other.type_name()),
                            *line,
                        ));
                    }
                };
                for item in items {
                    self.charge(*line)?;
                    self.env.insert(var.clone(), Value::Num(item));
                    self.exec_block(body)?;
                }
                Ok(())
            }
        }
    }

    fn exec_block(&mut self, stmts: &[Stmt]) -> Result<(), SnippetError> {
        for stmt in stmts {
            self.exec_stmt(stmt)?;
        }
        Ok(())
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value, SnippetError> {
        match expr {
            Expr::Number(n) => Ok(Value::Num(*n)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    match self.eval(item)? {
                        Value::Num(n) => values.push(n),
                        other => {
                            return Err(SnippetError::type_error(
                                format!(
                                    "array literals hold numbers, got {}",
                                    other.type_name()
                                ),
                                line_of(item),
                            ));
                        }
                    }
                }
                Ok(Value::Array(values))
            }
            Expr::Ident { name, line } => match self.env.get(name) {
                Some(value) => Ok(value.clone()),
                None => Err(SnippetError::name(
                    format!("name '{name}' is not defined"),
                    *line,
                )),
            },
            Expr::Index {
                target,
                index,
                line,
            } => {
                self.charge(*line)?;
                let target = self.eval(target)?;
                let index = self.eval(index)?;
                self.index(target, index, *line)
            }
            Expr::Call { name, args, line } => {
                self.charge(*line)?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg)?);
                }
                builtins::call(name, &values, &mut self.output, &self.limits, *line)
            }
            Expr::Unary { op, operand, line } => {
                self.charge(*line)?;
                let value = self.eval(operand)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!value.truthy())),
                    UnaryOp::Neg => match value {
                        Value::Num(n) => Ok(Value::Num(-n)),
                        Value::Array(items) => {
                            Ok(Value::Array(items.into_iter().map(|x| -x).collect()))
                        }
                        other => Err(SnippetError::type_error(
                            format!("cannot negate {}", other.type_name()),
                            *line,
                        )),
                    },
                }
            }
            Expr::Binary { op, lhs, rhs, line } => {
                self.charge(*line)?;
                match op {
                    // Short-circuit forms evaluate the right side lazily.
                    BinaryOp::And => {
                        if !self.eval(lhs)?.truthy() {
                            return Ok(Value::Bool(false));
                        }
                        Ok(Value::Bool(self.eval(rhs)?.truthy()))
                    }
                    BinaryOp::Or => {
                        if self.eval(lhs)?.truthy() {
                            return Ok(Value::Bool(true));
                        }
                        Ok(Value::Bool(self.eval(rhs)?.truthy()))
                    }
                    _ => {
                        let lhs = self.eval(lhs)?;
                        let rhs = self.eval(rhs)?;
                        binary(*op, lhs, rhs, *line)
                    }
                }
            }
        }
    }

    fn index(&self, target: Value, index: Value, line: u32) -> Result<Value, SnippetError> {
        let items = match target {
            Value::Array(items) => items,
            other => {
                return Err(SnippetError::type_error(
                    format!("cannot index {}", other.type_name()),
                    line,
                ));
            }
        };
        let raw = match index {
            Value::Num(n) if n.fract() == 0.0 && n.is_finite() => n as i64,
            other => {
                return Err(SnippetError::type_error(
                    format!(
                        "array index must be a whole number, got {}",
                        other.type_name()
                    ),
                    line,
                ));
            }
        };
        // Negative indices count from the end.
        let resolved = if raw < 0 {
            raw + items.len() as i64
        } else {
            raw
        };
        if resolved < 0 || resolved as usize >= items.len() {
            return Err(SnippetError::index(
                format!(
                    "index {raw} out of range for array of length {}",
                    items.len()
                ),
                line,
            ));
        }
        Ok(Value::Num(items[resolved as usize]))
    }
}

/// Best-effort source line for an expression (literals fall back to 1).
fn line_of(expr: &Expr) -> u32 {
    match expr {
        Expr::Ident { line, .. }
        | Expr::Index { line, .. }
        | Expr::Call { line, .. }
        | Expr::Unary { line, .. }
        | Expr::Binary { line, .. } => *line,
        _ => 1,
    }
}

// -- Binary operators --------------------------------------------------------

fn binary(op: BinaryOp, lhs: Value, rhs: Value, line: u32) -> Result<Value, SnippetError> {
    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod
        | BinaryOp::Pow => arith(op, lhs, rhs, line),
        BinaryOp::Eq => Ok(Value::Bool(lhs == rhs)),
        BinaryOp::NotEq => Ok(Value::Bool(lhs != rhs)),
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => compare(op, lhs, rhs, line),
        // And/Or are handled by the short-circuit path in `eval`.
        BinaryOp::And | BinaryOp::Or => Ok(Value::Bool(
            if op == BinaryOp::And {
                lhs.truthy() && rhs.truthy()
            } else {
                lhs.truthy() || rhs.truthy()
            },
        )),
    }
}

fn compare(op: BinaryOp, lhs: Value, rhs: Value, line: u32) -> Result<Value, SnippetError> {
    let ordering_holds = |ord: std::cmp::Ordering| match op {
        BinaryOp::Lt => ord.is_lt(),
        BinaryOp::LtEq => ord.is_le(),
        BinaryOp::Gt => ord.is_gt(),
        _ => ord.is_ge(),
    };
    match (&lhs, &rhs) {
        (Value::Num(a), Value::Num(b)) => match a.partial_cmp(b) {
            Some(ord) => Ok(Value::Bool(ordering_holds(ord))),
            // NaN comparisons are always false.
            None => Ok(Value::Bool(false)),
        },
        (Value::Str(a), Value::Str(b)) => Ok(Value::Bool(ordering_holds(a.cmp(b)))),
        _ => Err(SnippetError::type_error(
            format!(
                "'{}' not supported between {} and {}",
                op.symbol(),
                lhs.type_name(),
                rhs.type_name()
            ),
            line,
        )),
    }
}

fn arith(op: BinaryOp, lhs: Value, rhs: Value, line: u32) -> Result<Value, SnippetError> {
    match (lhs, rhs) {
        (Value::Num(a), Value::Num(b)) => Ok(Value::Num(apply(op, a, b, line)?)),
        (Value::Array(items), Value::Num(b)) => {
            let mut out = Vec::with_capacity(items.len());
            for a in items {
                out.push(apply(op, a, b, line)?);
            }
            Ok(Value::Array(out))
        }
        (Value::Num(a), Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for b in items {
                out.push(apply(op, a, b, line)?);
            }
            Ok(Value::Array(out))
        }
        (Value::Array(a), Value::Array(b)) => {
            if a.len() != b.len() {
                return Err(SnippetError::type_error(
                    format!(
                        "elementwise '{}' needs equal lengths, got {} and {}",
                        op.symbol(),
                        a.len(),
                        b.len()
                    ),
                    line,
                ));
            }
            let mut out = Vec::with_capacity(a.len());
            for (x, y) in a.into_iter().zip(b) {
                out.push(apply(op, x, y, line)?);
            }
            Ok(Value::Array(out))
        }
        (lhs, rhs) => Err(SnippetError::type_error(
            format!(
                "unsupported operand types for '{}': {} and {}",
                op.symbol(),
                lhs.type_name(),
                rhs.type_name()
            ),
            line,
        )),
    }
}

fn apply(op: BinaryOp, a: f64, b: f64, line: u32) -> Result<f64, SnippetError> {
    match op {
        BinaryOp::Add => Ok(a + b),
        BinaryOp::Sub => Ok(a - b),
        BinaryOp::Mul => Ok(a * b),
        BinaryOp::Div => {
            if b == 0.0 {
                Err(SnippetError::division_by_zero("division by zero", line))
            } else {
                Ok(a / b)
            }
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                Err(SnippetError::division_by_zero("modulo by zero", line))
            } else {
                Ok(a % b)
            }
        }
        BinaryOp::Pow => Ok(a.powf(b)),
        // Unreachable: routed through `binary` above.
        _ => Ok(f64::NAN),
    }
}
