use crate::ast::{BinaryOp, Block, CompareOp, Condition, Expr, Program, Stmt, UnaryOp};
use crate::error::{ImpError, Span};
use crate::value::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::io::Write;

/// The single flat variable table. Owned by the caller so it can outlive one
/// program run, which is how the REPL keeps variables between lines.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` only when the name was never assigned.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn assign(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Bindings sorted by name.
    pub fn bindings(&self) -> Vec<(&str, &Value)> {
        let mut bindings: Vec<_> = self
            .values
            .iter()
            .map(|(name, value)| (name.as_str(), value))
            .collect();
        bindings.sort_by(|a, b| a.0.cmp(b.0));
        bindings
    }
}

/// Run `program` against `environment`, writing `print` output to `out`.
/// Returns the value of the program's last statement, if it produced one.
pub fn interpret<W: Write>(
    program: &Program,
    environment: &mut Environment,
    out: W,
) -> Result<Option<Value>, ImpError> {
    Evaluator::new(environment, out).run(program)
}

pub struct Evaluator<'env, W: Write> {
    environment: &'env mut Environment,
    out: W,
}

impl<'env, W: Write> Evaluator<'env, W> {
    pub fn new(environment: &'env mut Environment, out: W) -> Self {
        Self { environment, out }
    }

    pub fn run(&mut self, program: &Program) -> Result<Option<Value>, ImpError> {
        self.execute_block(program)
    }

    pub fn execute_block(&mut self, block: &Block) -> Result<Option<Value>, ImpError> {
        let mut last = None;
        for statement in &block.statements {
            last = self.execute_statement(statement)?;
        }
        Ok(last)
    }

    pub fn execute_statement(&mut self, stmt: &Stmt) -> Result<Option<Value>, ImpError> {
        match stmt {
            Stmt::Assign { target, value, .. } => {
                let value = self.evaluate_expression(value)?;
                self.environment.assign(&target.name, value);
                Ok(None)
            }
            Stmt::Print { value, span } => {
                let value = self.evaluate_expression(value)?;
                writeln!(self.out, "{}", value).map_err(|e| ImpError::output_error(*span, e))?;
                Ok(None)
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                if self.condition_holds(condition)? {
                    self.execute_block(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute_block(else_branch)?;
                }
                Ok(None)
            }
            Stmt::While {
                condition, body, ..
            } => {
                while self.condition_holds(condition)? {
                    self.execute_block(body)?;
                }
                Ok(None)
            }
            Stmt::Expression { expr, .. } => self.evaluate_expression(expr).map(Some),
            Stmt::NoOp { .. } => Ok(None),
        }
    }

    pub fn evaluate_expression(&mut self, expr: &Expr) -> Result<Value, ImpError> {
        match expr {
            Expr::Number { value, .. } => Ok(Value::Int(*value)),
            Expr::StringLiteral { value, .. } => Ok(Value::Str(value.clone())),
            Expr::Variable(variable) => self
                .environment
                .get(&variable.name)
                .cloned()
                .ok_or_else(|| ImpError::name_error(variable.span, &variable.name)),
            Expr::Unary {
                operator,
                operand,
                span,
            } => {
                let operand = self.evaluate_expression(operand)?;
                evaluate_unary_op(*operator, operand, span)
            }
            Expr::Binary { .. } => self.evaluate_chain(expr),
        }
    }

    /// Evaluate a left-nested run of binary operators without recursing
    /// down the left spine: leftmost operand first, then each right operand
    /// in source order.
    fn evaluate_chain(&mut self, expr: &Expr) -> Result<Value, ImpError> {
        let mut spine = Vec::new();
        let mut leftmost = expr;
        while let Expr::Binary {
            left,
            operator,
            right,
            span,
        } = leftmost
        {
            spine.push((*operator, right.as_ref(), span));
            leftmost = left.as_ref();
        }

        let mut result = self.evaluate_expression(leftmost)?;
        for (operator, right, span) in spine.into_iter().rev() {
            let right_val = self.evaluate_expression(right)?;
            result = evaluate_binary_op(operator, result, right_val, span, right.span())?;
        }
        Ok(result)
    }

    /// Evaluates to a `Value::Bool`.
    pub fn evaluate_condition(&mut self, condition: &Condition) -> Result<Value, ImpError> {
        self.condition_holds(condition).map(Value::Bool)
    }

    fn condition_holds(&mut self, condition: &Condition) -> Result<bool, ImpError> {
        let left = self.evaluate_expression(&condition.left)?;
        let right = self.evaluate_expression(&condition.right)?;
        compare(condition.operator, &left, &right, &condition.span)
    }
}

fn evaluate_unary_op(operator: UnaryOp, operand: Value, span: &Span) -> Result<Value, ImpError> {
    match (operator, operand) {
        (UnaryOp::Plus, value @ (Value::Int(_) | Value::Float(_))) => Ok(value),
        (UnaryOp::Negate, Value::Int(n)) => n.checked_neg().map(Value::Int).ok_or_else(|| {
            ImpError::overflow_error(*span, format!("Integer overflow negating {}", n))
        }),
        (UnaryOp::Negate, Value::Float(n)) => Ok(Value::Float(-n)),
        (operator, operand) => Err(ImpError::type_error(
            *span,
            format!(
                "Unary '{}' is not supported for {}",
                unary_symbol(operator),
                operand.type_name()
            ),
        )),
    }
}

fn evaluate_binary_op(
    operator: BinaryOp,
    left: Value,
    right: Value,
    span: &Span,
    right_span: &Span,
) -> Result<Value, ImpError> {
    match (operator, left, right) {
        (BinaryOp::Add, Value::Str(l), Value::Str(r)) => Ok(Value::Str(l + &r)),
        (BinaryOp::Divide, l, r) if l.is_numeric() && r.is_numeric() => {
            let (l, r) = (float(&l), float(&r));
            if r == 0.0 {
                Err(ImpError::division_error(*right_span))
            } else {
                Ok(Value::Float(l / r))
            }
        }
        (operator, Value::Int(l), Value::Int(r)) => {
            let result = match operator {
                BinaryOp::Add => l.checked_add(r),
                BinaryOp::Subtract => l.checked_sub(r),
                BinaryOp::Multiply => l.checked_mul(r),
                BinaryOp::Divide => unreachable!("division is handled above"),
            };
            result.map(Value::Int).ok_or_else(|| {
                ImpError::overflow_error(
                    *span,
                    format!("Integer overflow in {} {} {}", l, binary_symbol(operator), r),
                )
            })
        }
        (operator, l, r) if l.is_numeric() && r.is_numeric() => {
            let (l, r) = (float(&l), float(&r));
            Ok(Value::Float(match operator {
                BinaryOp::Add => l + r,
                BinaryOp::Subtract => l - r,
                BinaryOp::Multiply => l * r,
                BinaryOp::Divide => l / r,
            }))
        }
        (operator, l, r) => Err(ImpError::type_error(
            *span,
            format!(
                "Cannot apply '{}' to {} and {}",
                binary_symbol(operator),
                l.type_name(),
                r.type_name()
            ),
        )),
    }
}

fn compare(operator: CompareOp, left: &Value, right: &Value, span: &Span) -> Result<bool, ImpError> {
    let ordering = match (left, right) {
        (Value::Int(l), Value::Int(r)) => Some(l.cmp(r)),
        (Value::Int(l), Value::Float(r)) => compare_int_float(*l, *r),
        (Value::Float(l), Value::Int(r)) => compare_int_float(*r, *l).map(Ordering::reverse),
        (Value::Float(l), Value::Float(r)) => l.partial_cmp(r),
        (Value::Str(l), Value::Str(r)) => Some(l.cmp(r)),
        (Value::Bool(l), Value::Bool(r)) if operator == CompareOp::Equal => Some(l.cmp(r)),
        // Values of different kinds are never equal
        _ if operator == CompareOp::Equal => return Ok(false),
        (l, r) => {
            return Err(ImpError::type_error(
                *span,
                format!(
                    "Cannot compare {} and {} with '{}'",
                    l.type_name(),
                    r.type_name(),
                    compare_symbol(operator)
                ),
            ));
        }
    };

    Ok(matches!(
        (operator, ordering),
        (CompareOp::Greater, Some(Ordering::Greater))
            | (CompareOp::Less, Some(Ordering::Less))
            | (CompareOp::Equal, Some(Ordering::Equal))
    ))
}

/// Exact ordering of an integer against a float. Integral floats inside the
/// `i64` range are compared as integers so values above 2^53 stay distinct.
fn compare_int_float(int: i64, float: f64) -> Option<Ordering> {
    // 2^63, the first float past i64::MAX
    const BOUND: f64 = 9_223_372_036_854_775_808.0;

    if float.is_nan() {
        None
    } else if float >= BOUND {
        Some(Ordering::Less)
    } else if float < -BOUND {
        Some(Ordering::Greater)
    } else if float.fract() == 0.0 {
        Some(int.cmp(&(float as i64)))
    } else {
        // A fractional float is below 2^52 in magnitude, so rounding the
        // integer cannot cross it.
        (int as f64).partial_cmp(&float)
    }
}

fn float(value: &Value) -> f64 {
    value.as_f64().unwrap_or(f64::NAN)
}

fn unary_symbol(operator: UnaryOp) -> &'static str {
    match operator {
        UnaryOp::Plus => "+",
        UnaryOp::Negate => "-",
    }
}

fn binary_symbol(operator: BinaryOp) -> &'static str {
    match operator {
        BinaryOp::Add => "+",
        BinaryOp::Subtract => "-",
        BinaryOp::Multiply => "*",
        BinaryOp::Divide => "/",
    }
}

fn compare_symbol(operator: CompareOp) -> &'static str {
    match operator {
        CompareOp::Greater => ">",
        CompareOp::Less => "<",
        CompareOp::Equal => "==",
    }
}
