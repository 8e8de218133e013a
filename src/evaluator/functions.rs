// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins::BUILTINS;
use crate::value::Value;

use hcl::expr::FuncCall;

use super::error::EvalError;
use super::eval::Evaluator;

impl<'a> Evaluator<'a> {
    pub(super) fn eval_function(&mut self, call: &FuncCall) -> Result<Value, EvalError> {
        let name = call.name.to_string();
        let Some(builtin) = BUILTINS.get(name.as_str()) else {
            return Err(EvalError::UnknownFunction { name });
        };

        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.evaluate_value(arg)?);
        }

        if call.expand_final {
            match args.pop() {
                Some(Value::Array(items)) => args.extend(items.iter().cloned()),
                Some(Value::Unknown) => return Ok(Value::Unknown),
                Some(v) => {
                    return Err(EvalError::invalid(format!(
                        "`{name}`: the final argument must be a list to be expanded, got {}",
                        v.type_name()
                    )))
                }
                None => {
                    return Err(EvalError::invalid(format!(
                        "`{name}`: no final argument to expand"
                    )))
                }
            }
        }

        if args.iter().any(Value::contains_unknown) {
            return Ok(Value::Unknown);
        }

        builtin(&args).map_err(|e| EvalError::Function {
            name,
            source: e.into(),
        })
    }
}
