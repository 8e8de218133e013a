// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::coerce::FromValue;
use crate::value::Value;

use hcl::expr::TemplateExpr;
use hcl::template::{Element, Template};

use super::error::EvalError;
use super::eval::Evaluator;

impl<'a> Evaluator<'a> {
    pub(super) fn eval_template_expr(&mut self, expr: &TemplateExpr) -> Result<Value, EvalError> {
        let template = Template::from_expr(expr).map_err(|e| EvalError::Template(e.to_string()))?;
        self.eval_template(&template)
    }

    fn eval_template(&mut self, template: &Template) -> Result<Value, EvalError> {
        let elements = template.elements();

        // "${expr}" yields the value of expr without string conversion.
        if let [Element::Interpolation(interpolation)] = elements {
            return self.evaluate_value(&interpolation.expr);
        }

        let mut result = String::new();
        let mut unknown = false;
        for element in elements {
            match element {
                Element::Literal(literal) => result.push_str(literal),
                Element::Interpolation(interpolation) => {
                    let value = self.evaluate_value(&interpolation.expr)?;
                    match value {
                        Value::Unknown => unknown = true,
                        Value::Null => {
                            return Err(EvalError::Template(
                                "cannot include a null value in a string".to_string(),
                            ))
                        }
                        v => match String::from_value(&v) {
                            Ok(s) => result.push_str(&s),
                            Err(_) if v.contains_unknown() => unknown = true,
                            Err(_) => {
                                return Err(EvalError::Template(format!(
                                    "cannot include a {} in a string",
                                    v.type_name()
                                )))
                            }
                        },
                    }
                }
                Element::Directive(_) => return Err(EvalError::Unsupported("template directive")),
                #[allow(unreachable_patterns)]
                _ => return Err(EvalError::Unsupported("template element")),
            }
        }

        Ok(match unknown {
            true => Value::Unknown,
            false => Value::from(result),
        })
    }
}
