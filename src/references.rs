// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Free references of an expression.
//!
//! Root names are interpreted the way Terraform addresses them: `var.x`,
//! `local.x`, `module.x`, `data.t.n`, `t.n`, `count.index`, `each.key`,
//! `self`, `path.*` and `terraform.workspace`.

use crate::configs::{ResourceAddr, ResourceMode};

use core::fmt;

use hcl::expr::{Expression, ForExpr, ObjectKey, Operation, TraversalOperator};
use hcl::template::{Element, Template};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    #[error("a reference to `{root}` must be followed by {expected}")]
    MissingAttribute { root: String, expected: &'static str },
    #[error("`{root}.{attribute}` is not a valid reference")]
    InvalidAttribute { root: String, attribute: String },
    #[error("invalid template: {0}")]
    InvalidTemplate(String),
}

/// Pseudo attributes that are always known without evaluating resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetaAttribute {
    Workspace,
    PathModule,
    PathRoot,
    PathCwd,
}

impl fmt::Display for MetaAttribute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            MetaAttribute::Workspace => "terraform.workspace",
            MetaAttribute::PathModule => "path.module",
            MetaAttribute::PathRoot => "path.root",
            MetaAttribute::PathCwd => "path.cwd",
        })
    }
}

/// What a reference names.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Subject {
    InputVariable(String),
    MetaAttribute(MetaAttribute),
    ResourceAttribute(ResourceAddr),
    ModuleCallOutput(String),
    LocalValue(String),
    CountAttribute(String),
    EachAttribute(String),
    SelfAttribute,
    // A construct whose references are not extracted, e.g. template directives.
    Opaque(&'static str),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Subject::InputVariable(name) => write!(f, "var.{name}"),
            Subject::MetaAttribute(attr) => write!(f, "{attr}"),
            Subject::ResourceAttribute(addr) => write!(f, "{addr}"),
            Subject::ModuleCallOutput(name) => write!(f, "module.{name}"),
            Subject::LocalValue(name) => write!(f, "local.{name}"),
            Subject::CountAttribute(name) => write!(f, "count.{name}"),
            Subject::EachAttribute(name) => write!(f, "each.{name}"),
            Subject::SelfAttribute => f.write_str("self"),
            Subject::Opaque(what) => f.write_str(what),
        }
    }
}

impl Subject {
    /// Number of traversal steps that make up the reference itself.
    pub(crate) fn operator_count(&self) -> usize {
        match self {
            Subject::SelfAttribute | Subject::Opaque(_) => 0,
            Subject::ResourceAttribute(addr) if addr.mode == ResourceMode::Data => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub subject: Subject,
}

/// Collect the free references of `expr` in the order they appear.
pub fn references_in_expr(expr: &Expression) -> Result<Vec<Reference>, ReferenceError> {
    let mut collector = Collector {
        bound: vec![],
        refs: vec![],
    };
    collector.expr(expr)?;
    Ok(collector.refs)
}

struct Collector {
    // Names introduced by enclosing `for` expressions.
    bound: Vec<String>,
    refs: Vec<Reference>,
}

fn attribute_at<'a>(operators: &'a [TraversalOperator], idx: usize) -> Option<&'a str> {
    match operators.get(idx) {
        Some(TraversalOperator::GetAttr(ident)) => Some(ident.as_str()),
        _ => None,
    }
}

/// Interpret a traversal rooted at `root` as a reference.
pub(crate) fn subject(root: &str, operators: &[TraversalOperator]) -> Result<Subject, ReferenceError> {
    let attr = |idx: usize, expected: &'static str| {
        attribute_at(operators, idx).ok_or_else(|| ReferenceError::MissingAttribute {
            root: root.to_string(),
            expected,
        })
    };

    Ok(match root {
        "var" => Subject::InputVariable(attr(0, "a variable name")?.to_string()),
        "local" => Subject::LocalValue(attr(0, "a local value name")?.to_string()),
        "module" => Subject::ModuleCallOutput(attr(0, "a module call name")?.to_string()),
        "self" => Subject::SelfAttribute,
        "count" => match attr(0, "an attribute name")? {
            "index" => Subject::CountAttribute("index".to_string()),
            other => {
                return Err(ReferenceError::InvalidAttribute {
                    root: root.to_string(),
                    attribute: other.to_string(),
                })
            }
        },
        "each" => match attr(0, "an attribute name")? {
            name @ ("key" | "value") => Subject::EachAttribute(name.to_string()),
            other => {
                return Err(ReferenceError::InvalidAttribute {
                    root: root.to_string(),
                    attribute: other.to_string(),
                })
            }
        },
        "terraform" => match attr(0, "an attribute name")? {
            "workspace" => Subject::MetaAttribute(MetaAttribute::Workspace),
            other => {
                return Err(ReferenceError::InvalidAttribute {
                    root: root.to_string(),
                    attribute: other.to_string(),
                })
            }
        },
        "path" => match attr(0, "an attribute name")? {
            "module" => Subject::MetaAttribute(MetaAttribute::PathModule),
            "root" => Subject::MetaAttribute(MetaAttribute::PathRoot),
            "cwd" => Subject::MetaAttribute(MetaAttribute::PathCwd),
            other => {
                return Err(ReferenceError::InvalidAttribute {
                    root: root.to_string(),
                    attribute: other.to_string(),
                })
            }
        },
        "data" => {
            let resource_type = attr(0, "a data source type")?;
            let name = attr(1, "a data source name")?;
            Subject::ResourceAttribute(ResourceAddr::data(resource_type, name))
        }
        resource_type => {
            let name = attr(0, "a resource name")?;
            Subject::ResourceAttribute(ResourceAddr::managed(resource_type, name))
        }
    })
}

impl Collector {
    fn push(&mut self, subject: Subject) {
        self.refs.push(Reference { subject });
    }

    fn is_bound(&self, name: &str) -> bool {
        self.bound.iter().any(|b| b == name)
    }

    fn root(&mut self, root: &str, operators: &[TraversalOperator]) -> Result<(), ReferenceError> {
        if !self.is_bound(root) {
            let subject = subject(root, operators)?;
            self.push(subject);
        }
        Ok(())
    }

    fn expr(&mut self, expr: &Expression) -> Result<(), ReferenceError> {
        match expr {
            Expression::Null
            | Expression::Bool(_)
            | Expression::Number(_)
            | Expression::String(_) => Ok(()),
            Expression::Array(items) => items.iter().try_for_each(|item| self.expr(item)),
            Expression::Object(fields) => {
                for (key, value) in fields.iter() {
                    match key {
                        // A bare identifier key is a literal name.
                        ObjectKey::Expression(Expression::Variable(_)) => (),
                        ObjectKey::Expression(key) => self.expr(key)?,
                        _ => (),
                    }
                    self.expr(value)?;
                }
                Ok(())
            }
            Expression::TemplateExpr(template) => {
                let template = Template::from_expr(template)
                    .map_err(|e| ReferenceError::InvalidTemplate(e.to_string()))?;
                self.template(&template)
            }
            Expression::Variable(var) => self.root(var.as_str(), &[]),
            Expression::Traversal(traversal) => {
                self.traversed(&traversal.expr, &traversal.operators)?;
                for operator in &traversal.operators {
                    if let TraversalOperator::Index(index) = operator {
                        self.expr(index)?;
                    }
                }
                Ok(())
            }
            Expression::FuncCall(call) => call.args.iter().try_for_each(|arg| self.expr(arg)),
            Expression::Parenthesis(inner) => self.expr(inner),
            Expression::Conditional(cond) => {
                self.expr(&cond.cond_expr)?;
                self.expr(&cond.true_expr)?;
                self.expr(&cond.false_expr)
            }
            Expression::Operation(op) => match op.as_ref() {
                Operation::Unary(unary) => self.expr(&unary.expr),
                Operation::Binary(binary) => {
                    self.expr(&binary.lhs_expr)?;
                    self.expr(&binary.rhs_expr)
                }
                #[allow(unreachable_patterns)]
                _ => {
                    self.push(Subject::Opaque("unsupported operation"));
                    Ok(())
                }
            },
            Expression::ForExpr(for_expr) => {
                self.expr(&for_expr.collection_expr)?;
                let scope = self.bound.len();
                if let Some(key_var) = &for_expr.key_var {
                    self.bound.push(key_var.as_str().to_string());
                }
                self.bound.push(for_expr.value_var.as_str().to_string());
                let result = self.for_body(for_expr);
                self.bound.truncate(scope);
                result
            }
            #[allow(unreachable_patterns)]
            _ => {
                self.push(Subject::Opaque("unsupported expression"));
                Ok(())
            }
        }
    }

    fn traversed(
        &mut self,
        expr: &Expression,
        operators: &[TraversalOperator],
    ) -> Result<(), ReferenceError> {
        match expr {
            Expression::Variable(var) => self.root(var.as_str(), operators),
            // A leading unary operator binds to the root, not to the traversal.
            Expression::Operation(op) => match op.as_ref() {
                Operation::Unary(unary) => self.traversed(&unary.expr, operators),
                _ => self.expr(expr),
            },
            other => self.expr(other),
        }
    }

    fn for_body(&mut self, for_expr: &ForExpr) -> Result<(), ReferenceError> {
        if let Some(key_expr) = &for_expr.key_expr {
            self.expr(key_expr)?;
        }
        self.expr(&for_expr.value_expr)?;
        if let Some(cond_expr) = &for_expr.cond_expr {
            self.expr(cond_expr)?;
        }
        Ok(())
    }

    fn template(&mut self, template: &Template) -> Result<(), ReferenceError> {
        for element in template.elements() {
            match element {
                Element::Literal(_) => (),
                Element::Interpolation(interpolation) => self.expr(&interpolation.expr)?,
                Element::Directive(_) => self.push(Subject::Opaque("template directive")),
                #[allow(unreachable_patterns)]
                _ => self.push(Subject::Opaque("template element")),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_expr(src: &str) -> Expression {
        let body = hcl::parse(&format!("value = {src}\n")).unwrap();
        body.attributes().next().unwrap().expr.clone()
    }

    fn subjects(src: &str) -> Vec<Subject> {
        references_in_expr(&parse_expr(src))
            .unwrap()
            .into_iter()
            .map(|r| r.subject)
            .collect()
    }

    #[test]
    fn literals_have_no_references() {
        assert!(subjects(r#""t2.micro""#).is_empty());
        assert!(subjects(r#"["a", 1, true, null, { k = "v" }]"#).is_empty());
    }

    #[test]
    fn classifies_roots() {
        assert_eq!(
            subjects(r#""${var.instance_type}-${terraform.workspace}""#),
            vec![
                Subject::InputVariable("instance_type".to_string()),
                Subject::MetaAttribute(MetaAttribute::Workspace),
            ]
        );
        assert_eq!(
            subjects("aws_instance.web.private_ip"),
            vec![Subject::ResourceAttribute(ResourceAddr::managed(
                "aws_instance",
                "web"
            ))]
        );
        assert_eq!(
            subjects("data.aws_ami.ubuntu.id"),
            vec![Subject::ResourceAttribute(ResourceAddr::data(
                "aws_ami", "ubuntu"
            ))]
        );
        assert_eq!(
            subjects("module.network.vpc_id"),
            vec![Subject::ModuleCallOutput("network".to_string())]
        );
        assert_eq!(
            subjects("local.size"),
            vec![Subject::LocalValue("size".to_string())]
        );
        assert_eq!(
            subjects("path.module"),
            vec![Subject::MetaAttribute(MetaAttribute::PathModule)]
        );
    }

    #[test]
    fn nested_references_are_found() {
        assert_eq!(
            subjects(r#"lookup(var.types, local.env, "t2.micro")"#),
            vec![
                Subject::InputVariable("types".to_string()),
                Subject::LocalValue("env".to_string()),
            ]
        );
        assert_eq!(
            subjects("var.types[count.index]"),
            vec![
                Subject::InputVariable("types".to_string()),
                Subject::CountAttribute("index".to_string()),
            ]
        );
    }

    #[test]
    fn for_expression_variables_are_bound() {
        assert_eq!(
            subjects("[for k, v in var.tags : upper(v) if k != var.skip]"),
            vec![
                Subject::InputVariable("tags".to_string()),
                Subject::InputVariable("skip".to_string()),
            ]
        );
    }

    #[test]
    fn template_directives_are_opaque() {
        assert_eq!(
            subjects(r#""%{ if var.large }m5.large%{ else }t3.micro%{ endif }""#),
            vec![Subject::Opaque("template directive")]
        );
    }

    #[test]
    fn malformed_references_are_errors() {
        for src in ["var", "terraform.foo", "path.home", "aws_instance", "data.aws_ami"] {
            assert!(
                references_in_expr(&parse_expr(src)).is_err(),
                "expected `{src}` to be rejected"
            );
        }
    }
}
