// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::catalog::{CatalogSource, AWS_PREVIOUS_GENERATION_INSTANCE_FAMILIES};
use crate::issue::Severity;
use crate::rules::Rule;
use crate::runner::Runner;

use std::rc::Rc;

use anyhow::Result;

/// Warns about `aws_instance` resources using a previous generation
/// instance family, such as `t1.micro` or `m3.large`.
pub struct AwsInstancePreviousType {
    families: Rc<dyn CatalogSource>,
}

impl AwsInstancePreviousType {
    pub fn new() -> Self {
        Self::with_catalog(Rc::new(AWS_PREVIOUS_GENERATION_INSTANCE_FAMILIES))
    }

    pub fn with_catalog(families: Rc<dyn CatalogSource>) -> Self {
        Self { families }
    }
}

impl Default for AwsInstancePreviousType {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for AwsInstancePreviousType {
    fn name(&self) -> &'static str {
        "aws_instance_previous_type"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, runner: &mut Runner) -> Result<()> {
        let families = self.families.load()?;
        runner.check_attribute(self, "aws_instance", "instance_type", |t: &String| {
            let family = t.split('.').next().unwrap_or_default();
            match families.contains(family) {
                true => Some(format!("\"{t}\" is previous generation instance type.")),
                false => None,
            }
        })
    }
}
