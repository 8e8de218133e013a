// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::classifier::{classify, Evaluability};
use crate::coerce::FromValue;
use crate::configs::{Attribute, Config, Resource};
use crate::env::{MetaContext, VariableEnv};
use crate::evaluator::{evaluate_as, EvalContext};
use crate::issue::{Issue, Issues};
use crate::rules::Rule;

use anyhow::Result;
use log::debug;

/// Shared harness rules use to inspect a configuration and record issues.
pub struct Runner<'a> {
    config: &'a Config,
    ctx: EvalContext<'a>,
    issues: Issues,
}

impl<'a> Runner<'a> {
    pub fn new(config: &'a Config, env: &'a VariableEnv, meta: &'a MetaContext) -> Self {
        Self {
            config,
            ctx: EvalContext::new(env, config.module_key(), meta),
            issues: Issues::new(),
        }
    }

    pub fn config(&self) -> &'a Config {
        self.config
    }

    pub fn context(&self) -> &EvalContext<'a> {
        &self.ctx
    }

    /// Evaluate an attribute that is known to be evaluable.
    ///
    /// Failures are fatal and point at the attribute.
    pub fn evaluate_attribute<T: FromValue>(
        &self,
        resource: &Resource,
        attribute: &Attribute,
    ) -> Result<T> {
        evaluate_as(&attribute.expr, &self.ctx).map_err(|e| {
            attribute.span.error(&format!(
                "failed to evaluate `{}` of `{}`: {e}",
                attribute.name, resource.addr
            ))
        })
    }

    /// Check `attribute` of every managed resource of `resource_type`.
    ///
    /// Resources without the attribute, or whose value depends on something
    /// other than variables, are skipped. `judge` returns a message for
    /// values that violate the rule.
    pub fn check_attribute<T, F>(
        &mut self,
        rule: &dyn Rule,
        resource_type: &str,
        attribute: &str,
        mut judge: F,
    ) -> Result<()>
    where
        T: FromValue,
        F: FnMut(&T) -> Option<String>,
    {
        let config = self.config;
        for resource in config.managed_resources(resource_type) {
            let Some(attr) = resource.attribute(attribute) else {
                continue;
            };

            let evaluability = classify(&attr.expr).map_err(|e| {
                attr.span.error(&format!(
                    "invalid reference in `{}` of `{}`: {e}",
                    attr.name, resource.addr
                ))
            })?;
            if let Evaluability::NotEvaluable(subject) = evaluability {
                debug!(
                    "{}: skipping `{}` of `{}`, it depends on `{subject}`",
                    rule.name(),
                    attr.name,
                    resource.addr
                );
                continue;
            }

            let value: T = self.evaluate_attribute(resource, attr)?;
            if let Some(message) = judge(&value) {
                self.emit_issue(rule, message, attr);
            }
        }
        Ok(())
    }

    pub fn emit_issue(&mut self, rule: &dyn Rule, message: String, attribute: &Attribute) {
        self.issues.push(Issue {
            detector: rule.name().to_string(),
            severity: rule.severity(),
            message,
            file: attribute.file_name().to_string(),
            line: attribute.line(),
            link: rule.link(),
        });
    }

    pub fn issues(&self) -> &Issues {
        &self.issues
    }

    pub fn into_issues(self) -> Issues {
        self.issues
    }
}
