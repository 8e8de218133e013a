// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::number::Number;
use crate::references::{self, MetaAttribute, Subject};
use crate::value::Value;

use std::path::Path;

use hcl::expr::{Expression, Operation, Traversal, TraversalOperator};

use super::error::EvalError;
use super::eval::Evaluator;
use super::operations::apply_unary;

fn path_value(path: &Path) -> Value {
    Value::from(path.to_string_lossy().as_ref())
}

impl<'a> Evaluator<'a> {
    pub(super) fn eval_traversal(&mut self, traversal: &Traversal) -> Result<Value, EvalError> {
        self.eval_traversed(&traversal.expr, &traversal.operators)
    }

    fn eval_traversed(
        &mut self,
        expr: &Expression,
        operators: &[TraversalOperator],
    ) -> Result<Value, EvalError> {
        match expr {
            Expression::Variable(var) => self.eval_root(var.as_str(), operators),
            // `!var.enabled` parses with the operator bound to `var` alone.
            Expression::Operation(op) => match op.as_ref() {
                Operation::Unary(unary) => {
                    let value = self.eval_traversed(&unary.expr, operators)?;
                    apply_unary(&unary.operator, value)
                }
                _ => {
                    let value = self.evaluate_value(expr)?;
                    self.apply_operators(value, operators)
                }
            },
            expr => {
                let value = self.evaluate_value(expr)?;
                self.apply_operators(value, operators)
            }
        }
    }

    /// Resolve a root name followed by traversal operators.
    pub(super) fn eval_root(
        &mut self,
        root: &str,
        operators: &[TraversalOperator],
    ) -> Result<Value, EvalError> {
        if let Some(value) = self.lookup_variable(root) {
            return self.apply_operators(value, operators);
        }

        let subject = references::subject(root, operators)?;
        let value = self.resolve_subject(&subject)?;
        let rest = operators.get(subject.operator_count()..).unwrap_or_default();
        self.apply_operators(value, rest)
    }

    fn resolve_subject(&self, subject: &Subject) -> Result<Value, EvalError> {
        let meta = self.context.meta;
        match subject {
            Subject::InputVariable(name) => self
                .context
                .env
                .get(self.context.module, name)
                .cloned()
                .ok_or_else(|| EvalError::UnresolvedVariable { name: name.clone() }),
            Subject::MetaAttribute(MetaAttribute::Workspace) => {
                Ok(Value::from(meta.workspace.as_str()))
            }
            Subject::MetaAttribute(MetaAttribute::PathModule) => Ok(path_value(&meta.path_module)),
            Subject::MetaAttribute(MetaAttribute::PathRoot) => Ok(path_value(&meta.path_root)),
            Subject::MetaAttribute(MetaAttribute::PathCwd) => Ok(path_value(&meta.path_cwd)),
            other => Err(EvalError::UnsupportedReference {
                subject: other.to_string(),
            }),
        }
    }

    pub(super) fn apply_operators(
        &mut self,
        mut value: Value,
        operators: &[TraversalOperator],
    ) -> Result<Value, EvalError> {
        for (idx, operator) in operators.iter().enumerate() {
            if value.is_unknown() {
                return Ok(Value::Unknown);
            }
            value = match operator {
                TraversalOperator::GetAttr(name) => get_attr(&value, name.as_str())?,
                TraversalOperator::Index(index) => {
                    let index = self.evaluate_value(index)?;
                    self.index(&value, &index)?
                }
                TraversalOperator::LegacyIndex(index) => {
                    self.index(&value, &Value::from(*index))?
                }
                TraversalOperator::AttrSplat => {
                    // Only the attribute accesses that follow apply per element.
                    let rest = &operators[idx + 1..];
                    let len = rest
                        .iter()
                        .take_while(|op| matches!(op, TraversalOperator::GetAttr(_)))
                        .count();
                    let splatted = self.splat(value, &rest[..len])?;
                    return self.apply_operators(splatted, &rest[len..]);
                }
                TraversalOperator::FullSplat => {
                    return self.splat(value, &operators[idx + 1..]);
                }
                #[allow(unreachable_patterns)]
                _ => return Err(EvalError::Unsupported("traversal operator")),
            };
        }
        Ok(value)
    }

    fn splat(&mut self, value: Value, operators: &[TraversalOperator]) -> Result<Value, EvalError> {
        let items = match value {
            Value::Unknown => return Ok(Value::Unknown),
            Value::Null => vec![],
            Value::Array(items) => items.as_ref().clone(),
            v => vec![v],
        };
        let mut results = Vec::with_capacity(items.len());
        for item in items {
            results.push(self.apply_operators(item, operators)?);
        }
        Ok(Value::from(results))
    }

    fn index(&self, value: &Value, index: &Value) -> Result<Value, EvalError> {
        if index.is_unknown() {
            return Ok(Value::Unknown);
        }
        match value {
            Value::Array(items) => {
                let position = list_index(index)?;
                match position.as_i64() {
                    Some(i) if i >= 0 && (i as usize) < items.len() => Ok(items[i as usize].clone()),
                    _ => Err(EvalError::IndexOutOfBounds {
                        index: position.to_string(),
                        len: items.len(),
                    }),
                }
            }
            Value::Object(fields) => {
                let key = match index {
                    Value::String(s) => s.to_string(),
                    Value::Number(n) => n.to_string(),
                    v => {
                        return Err(EvalError::invalid(format!(
                            "map key must be a string, got {}",
                            v.type_name()
                        )))
                    }
                };
                fields
                    .get(key.as_str())
                    .cloned()
                    .ok_or(EvalError::MissingKey { key })
            }
            Value::Null => Err(EvalError::invalid("cannot index a null value")),
            v => Err(EvalError::invalid(format!(
                "cannot index a value of type {}",
                v.type_name()
            ))),
        }
    }
}

fn list_index(index: &Value) -> Result<Number, EvalError> {
    let n = match index {
        Value::Number(n) => *n,
        Value::String(s) => s
            .parse::<Number>()
            .map_err(|_| EvalError::invalid(format!("invalid list index \"{s}\"")))?,
        v => {
            return Err(EvalError::invalid(format!(
                "list index must be a number, got {}",
                v.type_name()
            )))
        }
    };
    if !n.is_integer() {
        return Err(EvalError::invalid(format!(
            "list index must be a whole number, got {n}"
        )));
    }
    Ok(n)
}

fn get_attr(value: &Value, name: &str) -> Result<Value, EvalError> {
    match value {
        Value::Object(fields) => fields
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::MissingKey {
                key: name.to_string(),
            }),
        Value::Null => Err(EvalError::invalid(format!(
            "cannot access attribute \"{name}\" of a null value"
        ))),
        v => Err(EvalError::invalid(format!(
            "cannot access attribute \"{name}\" of a value of type {}",
            v.type_name()
        ))),
    }
}
