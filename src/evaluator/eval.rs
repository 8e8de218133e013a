// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::coerce::FromValue;
use crate::value::Value;

use std::collections::BTreeMap;
use std::rc::Rc;

use hcl::expr::{Conditional, Expression, ForExpr, ObjectKey};

use super::error::EvalError;
use super::EvalContext;

pub(super) struct Evaluator<'a> {
    pub(super) context: &'a EvalContext<'a>,
    variables: Vec<VariableBinding>,
}

struct VariableBinding {
    name: String,
    value: Value,
}

impl<'a> Evaluator<'a> {
    pub(super) fn new(context: &'a EvalContext<'a>) -> Self {
        Self {
            context,
            variables: Vec::new(),
        }
    }

    pub(super) fn evaluate_value(&mut self, expr: &Expression) -> Result<Value, EvalError> {
        match expr {
            Expression::Null => Ok(Value::Null),
            Expression::Bool(b) => Ok(Value::Bool(*b)),
            Expression::Number(n) => n
                .as_f64()
                .map(Value::from)
                .ok_or_else(|| EvalError::invalid(format!("invalid number {n}"))),
            Expression::String(s) => Ok(Value::from(s.as_str())),
            Expression::Array(items) => self.eval_array(items),
            Expression::Object(fields) => self.eval_object(fields.iter()),
            Expression::TemplateExpr(template) => self.eval_template_expr(template),
            Expression::Variable(var) => self.eval_root(var.as_str(), &[]),
            Expression::Traversal(traversal) => self.eval_traversal(traversal),
            Expression::FuncCall(call) => self.eval_function(call),
            Expression::Parenthesis(inner) => self.evaluate_value(inner),
            Expression::Conditional(cond) => self.eval_conditional(cond),
            Expression::Operation(op) => self.eval_operation(op),
            Expression::ForExpr(for_expr) => self.eval_for(for_expr),
            #[allow(unreachable_patterns)]
            _ => Err(EvalError::Unsupported("expression kind")),
        }
    }

    pub(super) fn push_variable(&mut self, name: &str, value: Value) {
        self.variables.push(VariableBinding {
            name: name.to_string(),
            value,
        });
    }

    pub(super) fn pop_variable(&mut self) {
        self.variables.pop();
    }

    pub(super) fn lookup_variable(&self, name: &str) -> Option<Value> {
        self.variables
            .iter()
            .rev()
            .find(|binding| binding.name == name)
            .map(|binding| binding.value.clone())
    }

    fn eval_array(&mut self, items: &[Expression]) -> Result<Value, EvalError> {
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            values.push(self.evaluate_value(item)?);
        }
        Ok(Value::from(values))
    }

    fn eval_object<'e>(
        &mut self,
        fields: impl Iterator<Item = (&'e ObjectKey, &'e Expression)>,
    ) -> Result<Value, EvalError> {
        let mut map = BTreeMap::new();
        for (key, value) in fields {
            let key = self.eval_object_key(key)?;
            let value = self.evaluate_value(value)?;
            map.insert(key, value);
        }
        Ok(Value::from(map))
    }

    fn eval_object_key(&mut self, key: &ObjectKey) -> Result<Rc<str>, EvalError> {
        match key {
            ObjectKey::Identifier(ident) => Ok(ident.as_str().into()),
            // A bare identifier key is a literal name.
            ObjectKey::Expression(Expression::Variable(var)) => Ok(var.as_str().into()),
            ObjectKey::Expression(expr) => {
                let key = self.evaluate_value(expr)?;
                Ok(String::from_value(&key)?.into())
            }
            #[allow(unreachable_patterns)]
            _ => Err(EvalError::Unsupported("object key kind")),
        }
    }

    pub(super) fn eval_condition(&mut self, expr: &Expression) -> Result<Option<bool>, EvalError> {
        match self.evaluate_value(expr)? {
            Value::Unknown => Ok(None),
            Value::Null => Err(EvalError::invalid("condition must not be null")),
            v => bool::from_value(&v)
                .map(Some)
                .map_err(|_| EvalError::invalid(format!("condition must be a bool, got {}", v.type_name()))),
        }
    }

    fn eval_conditional(&mut self, cond: &Conditional) -> Result<Value, EvalError> {
        match self.eval_condition(&cond.cond_expr)? {
            Some(true) => self.evaluate_value(&cond.true_expr),
            Some(false) => self.evaluate_value(&cond.false_expr),
            None => Ok(Value::Unknown),
        }
    }

    fn eval_for(&mut self, for_expr: &ForExpr) -> Result<Value, EvalError> {
        let collection = self.evaluate_value(&for_expr.collection_expr)?;
        let items: Vec<(Value, Value)> = match &collection {
            Value::Unknown => return Ok(Value::Unknown),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(idx, v)| (Value::from(idx), v.clone()))
                .collect(),
            Value::Object(fields) => fields
                .iter()
                .map(|(k, v)| (Value::String(k.clone()), v.clone()))
                .collect(),
            v => {
                return Err(EvalError::invalid(format!(
                    "cannot iterate over {}",
                    v.type_name()
                )))
            }
        };

        let mut list = vec![];
        let mut map: BTreeMap<Rc<str>, Value> = BTreeMap::new();
        for (key, value) in items {
            let mut bound = 1;
            if let Some(key_var) = &for_expr.key_var {
                self.push_variable(key_var.as_str(), key);
                bound += 1;
            }
            self.push_variable(for_expr.value_var.as_str(), value);

            let result = self.eval_for_item(for_expr, &mut list, &mut map);
            for _ in 0..bound {
                self.pop_variable();
            }
            if !result? {
                return Ok(Value::Unknown);
            }
        }

        Ok(match for_expr.key_expr {
            Some(_) => Value::from(map),
            None => Value::from(list),
        })
    }

    // Returns false when the result depends on an unknown value.
    fn eval_for_item(
        &mut self,
        for_expr: &ForExpr,
        list: &mut Vec<Value>,
        map: &mut BTreeMap<Rc<str>, Value>,
    ) -> Result<bool, EvalError> {
        if let Some(cond_expr) = &for_expr.cond_expr {
            match self.eval_condition(cond_expr)? {
                Some(true) => (),
                Some(false) => return Ok(true),
                None => return Ok(false),
            }
        }

        let Some(key_expr) = &for_expr.key_expr else {
            list.push(self.evaluate_value(&for_expr.value_expr)?);
            return Ok(true);
        };

        let key = self.evaluate_value(key_expr)?;
        if key.is_unknown() {
            return Ok(false);
        }
        let key: Rc<str> = String::from_value(&key)?.into();
        let value = self.evaluate_value(&for_expr.value_expr)?;
        if for_expr.grouping {
            let group = map.entry(key).or_insert_with(Value::new_array);
            group
                .as_array_mut()
                .map_err(|e| EvalError::invalid(e.to_string()))?
                .push(value);
        } else if map.contains_key(&key) {
            return Err(EvalError::invalid(format!(
                "duplicate key \"{key}\" in for expression; use `...` to group values"
            )));
        } else {
            map.insert(key, value);
        }
        Ok(true)
    }
}
