// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::catalog::{CatalogSource, AWS_DB_INSTANCE_CLASSES};
use crate::issue::Severity;
use crate::rules::Rule;
use crate::runner::Runner;

use std::rc::Rc;

use anyhow::Result;

/// Reports `aws_db_instance` resources whose `instance_class` is not an RDS
/// instance class.
pub struct AwsDbInstanceInvalidType {
    catalog: Rc<dyn CatalogSource>,
}

impl AwsDbInstanceInvalidType {
    pub fn new() -> Self {
        Self::with_catalog(Rc::new(AWS_DB_INSTANCE_CLASSES))
    }

    pub fn with_catalog(catalog: Rc<dyn CatalogSource>) -> Self {
        Self { catalog }
    }
}

impl Default for AwsDbInstanceInvalidType {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for AwsDbInstanceInvalidType {
    fn name(&self) -> &'static str {
        "aws_db_instance_invalid_type"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, runner: &mut Runner) -> Result<()> {
        let classes = self.catalog.load()?;
        runner.check_attribute(self, "aws_db_instance", "instance_class", |c: &String| {
            match classes.contains(c) {
                true => None,
                false => Some(format!("\"{c}\" is invalid instance type.")),
            }
        })
    }
}
