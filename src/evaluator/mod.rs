// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Expression evaluator.
//!
//! Evaluates attribute expressions against an explicit [`EvalContext`].
//! Only input variables and meta attributes can be resolved; any other
//! reference reached during evaluation is an error. Callers are expected to
//! gate expressions with [`crate::classify`] first.

mod access;
mod error;
mod eval;
mod functions;
mod operations;
mod templates;

#[cfg(test)]
mod tests;

pub use error::EvalError;

use crate::coerce::FromValue;
use crate::configs::ROOT_MODULE;
use crate::env::{MetaContext, VariableEnv};
use crate::value::Value;
use eval::Evaluator;

use hcl::Expression;

/// Everything an expression may read while being evaluated.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub env: &'a VariableEnv,
    /// Module-instance key variables are looked up under.
    pub module: &'a str,
    pub meta: &'a MetaContext,
}

impl<'a> EvalContext<'a> {
    pub fn new(env: &'a VariableEnv, module: &'a str, meta: &'a MetaContext) -> Self {
        Self { env, module, meta }
    }

    /// Context for the root module.
    pub fn root(env: &'a VariableEnv, meta: &'a MetaContext) -> Self {
        Self::new(env, ROOT_MODULE, meta)
    }

    pub fn evaluate(&self, expr: &Expression) -> Result<Value, EvalError> {
        evaluate(expr, self)
    }

    pub fn evaluate_as<T: FromValue>(&self, expr: &Expression) -> Result<T, EvalError> {
        evaluate_as(expr, self)
    }
}

/// Evaluate `expr` to a dynamic value.
pub fn evaluate(expr: &Expression, ctx: &EvalContext) -> Result<Value, EvalError> {
    let mut evaluator = Evaluator::new(ctx);
    evaluator.evaluate_value(expr)
}

/// Evaluate `expr` and convert the result into `T`.
pub fn evaluate_as<T: FromValue>(expr: &Expression, ctx: &EvalContext) -> Result<T, EvalError> {
    let value = evaluate(expr, ctx)?;
    Ok(T::from_value(&value)?)
}
