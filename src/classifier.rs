// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::references::{references_in_expr, ReferenceError, Subject};

use hcl::Expression;

/// Outcome of classifying an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluability {
    Evaluable,
    /// The first reference that needs more than variables and meta attributes.
    NotEvaluable(Subject),
}

impl Evaluability {
    pub fn is_evaluable(&self) -> bool {
        matches!(self, Evaluability::Evaluable)
    }
}

// Closed list of reference kinds answerable from the variable environment
// and meta context. Every other kind, including ones added later, is unsafe.
fn is_safe(subject: &Subject) -> bool {
    matches!(
        subject,
        Subject::InputVariable(_) | Subject::MetaAttribute(_)
    )
}

/// Decide whether `expr` can be evaluated without another resource's
/// computed value.
pub fn classify(expr: &Expression) -> Result<Evaluability, ReferenceError> {
    for reference in references_in_expr(expr)? {
        if !is_safe(&reference.subject) {
            return Ok(Evaluability::NotEvaluable(reference.subject));
        }
    }
    Ok(Evaluability::Evaluable)
}

pub fn is_evaluable(expr: &Expression) -> Result<bool, ReferenceError> {
    Ok(classify(expr)?.is_evaluable())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::ResourceAddr;

    fn parse_expr(src: &str) -> Expression {
        let body = hcl::parse(&format!("value = {src}\n")).unwrap();
        body.attributes().next().unwrap().expr.clone()
    }

    #[test]
    fn literals_and_variables_are_evaluable() {
        for src in [
            r#""t2.micro""#,
            "var.instance_type",
            r#""${var.family}.${var.size}""#,
            r#"terraform.workspace == "prod" ? "m5.large" : "t3.micro""#,
            "path.module",
            r#"lookup(var.types, terraform.workspace, "t2.micro")"#,
            "[for t in var.types : upper(t)]",
            "!var.enabled && var.count * 2 > 1",
        ] {
            assert!(is_evaluable(&parse_expr(src)).unwrap(), "{src}");
        }
    }

    #[test]
    fn first_unsafe_reference_is_reported() {
        let result = classify(&parse_expr(
            r#""${var.prefix}-${aws_instance.web.instance_type}-${local.x}""#,
        ))
        .unwrap();
        assert_eq!(
            result,
            Evaluability::NotEvaluable(Subject::ResourceAttribute(ResourceAddr::managed(
                "aws_instance",
                "web"
            )))
        );
    }

    #[test]
    fn other_kinds_are_not_evaluable() {
        for src in [
            "local.size",
            "module.sizes.default",
            "data.aws_ec2_instance_type.t.id",
            "count.index",
            "each.value",
            "self.id",
            "!local.enabled",
            r#""%{ if var.big }m5.large%{ endif }""#,
        ] {
            assert!(!is_evaluable(&parse_expr(src)).unwrap(), "{src}");
        }
    }

    #[test]
    fn malformed_reference_is_an_error() {
        assert!(classify(&parse_expr("var")).is_err());
        assert!(classify(&parse_expr("terraform.foo")).is_err());
    }
}
