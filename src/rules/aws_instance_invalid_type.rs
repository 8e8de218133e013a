// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::catalog::{CatalogSource, AWS_INSTANCE_TYPES};
use crate::issue::Severity;
use crate::rules::Rule;
use crate::runner::Runner;

use std::rc::Rc;

use anyhow::Result;

/// Reports `aws_instance` resources whose `instance_type` is not an EC2
/// instance type.
pub struct AwsInstanceInvalidType {
    catalog: Rc<dyn CatalogSource>,
}

impl AwsInstanceInvalidType {
    pub fn new() -> Self {
        Self::with_catalog(Rc::new(AWS_INSTANCE_TYPES))
    }

    pub fn with_catalog(catalog: Rc<dyn CatalogSource>) -> Self {
        Self { catalog }
    }
}

impl Default for AwsInstanceInvalidType {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for AwsInstanceInvalidType {
    fn name(&self) -> &'static str {
        "aws_instance_invalid_type"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, runner: &mut Runner) -> Result<()> {
        let types = self.catalog.load()?;
        runner.check_attribute(self, "aws_instance", "instance_type", |t: &String| {
            match types.contains(t) {
                true => None,
                false => Some(format!("\"{t}\" is invalid instance type.")),
            }
        })
    }
}
