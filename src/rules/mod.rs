// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod aws_db_instance_invalid_type;
mod aws_instance_invalid_type;
mod aws_instance_previous_type;

pub use aws_db_instance_invalid_type::AwsDbInstanceInvalidType;
pub use aws_instance_invalid_type::AwsInstanceInvalidType;
pub use aws_instance_previous_type::AwsInstancePreviousType;

use crate::issue::Severity;
use crate::runner::Runner;

use anyhow::Result;

/// Documentation link of a rule.
pub fn reference_link(name: &str) -> String {
    format!("https://github.com/tfcheck/tfcheck/blob/main/docs/rules/{name}.md")
}

/// A stateless check over a configuration.
pub trait Rule {
    fn name(&self) -> &'static str;

    fn severity(&self) -> Severity;

    fn link(&self) -> String {
        reference_link(self.name())
    }

    fn enabled_by_default(&self) -> bool {
        true
    }

    fn check(&self, runner: &mut Runner) -> Result<()>;
}

/// Rules registered with a new engine, in the order they run.
pub fn default_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(AwsInstanceInvalidType::new()),
        Box::new(AwsInstancePreviousType::new()),
        Box::new(AwsDbInstanceInvalidType::new()),
    ]
}
