// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::number::Number;
use crate::value::Value;

use hcl::expr::{BinaryOp, BinaryOperator, Expression, Operation, UnaryOperator};

use super::error::EvalError;
use super::eval::Evaluator;

fn operand_number(op: &str, value: &Value) -> Result<Number, EvalError> {
    match value {
        Value::Number(n) => Ok(*n),
        Value::String(s) => s.parse::<Number>().map_err(|_| {
            EvalError::invalid(format!("`{op}` expects numeric operands. Got \"{s}\" instead"))
        }),
        v => Err(EvalError::invalid(format!(
            "`{op}` expects numeric operands. Got {} instead",
            v.type_name()
        ))),
    }
}

fn operand_bool(op: &str, value: &Value) -> Result<bool, EvalError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s.as_ref() == "true" => Ok(true),
        Value::String(s) if s.as_ref() == "false" => Ok(false),
        v => Err(EvalError::invalid(format!(
            "`{op}` expects bool operands. Got {} instead",
            v.type_name()
        ))),
    }
}

fn binary_operator_str(op: &BinaryOperator) -> &'static str {
    match op {
        BinaryOperator::Eq => "==",
        BinaryOperator::NotEq => "!=",
        BinaryOperator::LessEq => "<=",
        BinaryOperator::GreaterEq => ">=",
        BinaryOperator::Less => "<",
        BinaryOperator::Greater => ">",
        BinaryOperator::Plus => "+",
        BinaryOperator::Minus => "-",
        BinaryOperator::Mul => "*",
        BinaryOperator::Div => "/",
        BinaryOperator::Mod => "%",
        BinaryOperator::And => "&&",
        BinaryOperator::Or => "||",
        #[allow(unreachable_patterns)]
        _ => "operator",
    }
}

/// A run of binary operators with no parentheses between them.
///
/// The parser nests such runs to the right without regard to precedence, so
/// they are flattened and re-associated before evaluation.
struct Chain<'e> {
    operands: Vec<&'e Expression>,
    operators: Vec<BinaryOperator>,
}

impl<'e> Chain<'e> {
    fn new(binary: &'e BinaryOp) -> Self {
        let mut chain = Chain {
            operands: vec![],
            operators: vec![],
        };
        chain.push_binary(binary);
        chain
    }

    fn push_binary(&mut self, binary: &'e BinaryOp) {
        self.push_operand(&binary.lhs_expr);
        self.operators.push(binary.operator);
        self.push_operand(&binary.rhs_expr);
    }

    fn push_operand(&mut self, expr: &'e Expression) {
        match expr {
            Expression::Operation(op) => match op.as_ref() {
                Operation::Binary(binary) => self.push_binary(binary),
                _ => self.operands.push(expr),
            },
            _ => self.operands.push(expr),
        }
    }
}

impl<'a> Evaluator<'a> {
    pub(super) fn eval_operation(&mut self, op: &Operation) -> Result<Value, EvalError> {
        match op {
            Operation::Unary(unary) => {
                let value = self.evaluate_value(&unary.expr)?;
                apply_unary(&unary.operator, value)
            }
            Operation::Binary(binary) => {
                let chain = Chain::new(binary);
                let mut next = 0;
                self.eval_chain(&chain, &mut next, 0)
            }
            #[allow(unreachable_patterns)]
            _ => Err(EvalError::Unsupported("operation")),
        }
    }

    // Precedence climbing. Operators of equal precedence associate to the left.
    fn eval_chain(
        &mut self,
        chain: &Chain<'_>,
        next: &mut usize,
        min_precedence: u8,
    ) -> Result<Value, EvalError> {
        let operand = chain
            .operands
            .get(*next)
            .ok_or(EvalError::Unsupported("incomplete binary operation"))?;
        let mut lhs = self.evaluate_value(operand)?;
        while let Some(op) = chain.operators.get(*next) {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            *next += 1;
            let rhs = self.eval_chain(chain, next, precedence + 1)?;
            lhs = apply_binary(op, lhs, rhs)?;
        }
        Ok(lhs)
    }
}

pub(super) fn apply_unary(operator: &UnaryOperator, value: Value) -> Result<Value, EvalError> {
    if value.is_unknown() {
        return Ok(Value::Unknown);
    }
    match operator {
        UnaryOperator::Neg => Ok(Value::from(operand_number("-", &value)?.neg())),
        UnaryOperator::Not => Ok(Value::Bool(!operand_bool("!", &value)?)),
        #[allow(unreachable_patterns)]
        _ => Err(EvalError::Unsupported("unary operator")),
    }
}

fn apply_binary(op: &BinaryOperator, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
    let name = binary_operator_str(op);

    if matches!(op, BinaryOperator::Eq | BinaryOperator::NotEq) {
        if lhs.contains_unknown() || rhs.contains_unknown() {
            return Ok(Value::Unknown);
        }
        let equal = lhs == rhs;
        return Ok(Value::Bool(match op {
            BinaryOperator::Eq => equal,
            _ => !equal,
        }));
    }

    if lhs.is_unknown() || rhs.is_unknown() {
        return Ok(Value::Unknown);
    }

    if matches!(op, BinaryOperator::And | BinaryOperator::Or) {
        let l = operand_bool(name, &lhs)?;
        let r = operand_bool(name, &rhs)?;
        return Ok(Value::Bool(match op {
            BinaryOperator::And => l && r,
            _ => l || r,
        }));
    }

    let l = operand_number(name, &lhs)?;
    let r = operand_number(name, &rhs)?;
    let arithmetic_error = |e: anyhow::Error| EvalError::invalid(e.to_string());
    Ok(match op {
        BinaryOperator::LessEq => Value::Bool(l <= r),
        BinaryOperator::GreaterEq => Value::Bool(l >= r),
        BinaryOperator::Less => Value::Bool(l < r),
        BinaryOperator::Greater => Value::Bool(l > r),
        BinaryOperator::Plus => Value::from(l.add(&r)),
        BinaryOperator::Minus => Value::from(l.sub(&r)),
        BinaryOperator::Mul => Value::from(l.mul(&r)),
        BinaryOperator::Div => Value::from(l.divide(&r).map_err(arithmetic_error)?),
        BinaryOperator::Mod => Value::from(l.modulo(&r).map_err(arithmetic_error)?),
        _ => return Err(EvalError::Unsupported("binary operator")),
    })
}
