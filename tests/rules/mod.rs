// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use std::rc::Rc;

use anyhow::Result;
use tfcheck::rules::*;
use tfcheck::*;

const FIXTURES: &str = "tests/fixtures";

fn check_with(rule: Box<dyn Rule>, dir: &str) -> Result<Vec<Issue>> {
    let mut engine = Engine::empty();
    engine.add_rule(rule);
    Ok(engine.check_dir(format!("{FIXTURES}/{dir}"))?.into_vec())
}

fn invalid_type(dir: &str) -> Result<Vec<Issue>> {
    check_with(
        Box::new(AwsInstanceInvalidType::new()),
        &format!("aws_instance_invalid_type/{dir}"),
    )
}

#[test]
fn literal_instance_type() -> Result<()> {
    let issues = invalid_type("literal")?;
    assert_eq!(issues.len(), 1);

    let issue = &issues[0];
    assert_eq!(issue.detector, "aws_instance_invalid_type");
    assert_eq!(issue.severity, Severity::Error);
    assert_eq!(issue.message, "\"t1.2xlarge\" is invalid instance type.");
    assert_eq!(issue.file, "instances.tf");
    assert_eq!(issue.line, 2);
    assert_eq!(
        issue.link,
        "https://github.com/tfcheck/tfcheck/blob/main/docs/rules/aws_instance_invalid_type.md"
    );
    Ok(())
}

#[test]
fn instance_type_from_variable() -> Result<()> {
    let issues = invalid_type("variable")?;
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].message, "\"t1.2xlarge\" is invalid instance type.");
    assert_eq!(issues[0].file, "instances.tf");
    assert_eq!(issues[0].line, 4);
    Ok(())
}

#[test]
fn instance_type_from_variable_default() -> Result<()> {
    let issues = invalid_type("variable_default")?;
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].message, "\"t1.2xlarge\" is invalid instance type.");
    // The issue points at the attribute, not at the variable.
    assert_eq!(issues[0].line, 7);
    Ok(())
}

#[test]
fn auto_tfvars_override_terraform_tfvars() -> Result<()> {
    let issues = invalid_type("tfvars")?;
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].message, "\"m5.gigantic\" is invalid instance type.");
    assert_eq!(issues[0].file, "instances.tf");
    assert_eq!(issues[0].line, 2);
    Ok(())
}

#[test]
fn compound_condition() -> Result<()> {
    let issues = invalid_type("compound_condition")?;
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].message, "\"t1.2xlarge\" is invalid instance type.");
    assert_eq!(issues[0].line, 6);
    Ok(())
}

#[test]
fn unresolvable_values_are_skipped() -> Result<()> {
    assert!(invalid_type("unresolvable")?.is_empty());
    Ok(())
}

#[test]
fn missing_attribute() -> Result<()> {
    assert!(invalid_type("missing_attribute")?.is_empty());
    Ok(())
}

#[test]
fn valid_instance_types() -> Result<()> {
    assert!(invalid_type("valid")?.is_empty());
    Ok(())
}

#[test]
fn evaluation_failure_is_fatal() {
    let err = invalid_type("missing_key").unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("rule aws_instance_invalid_type failed"));
    assert!(message.contains("instances.tf:8:3"));
    assert!(message.contains("map has no element for key \"qa\""));
}

#[test]
fn catalog_failure_is_fatal() {
    let rule = AwsInstanceInvalidType::with_catalog(Rc::new(FileCatalog::new(
        "tests/fixtures/no_such_catalog.json",
    )));
    let err = check_with(Box::new(rule), "aws_instance_invalid_type/literal").unwrap_err();
    assert!(format!("{err:#}").contains("no_such_catalog.json"));
}

#[test]
fn custom_catalog() -> Result<()> {
    let catalog = Catalog::new("instance types", ["t1.2xlarge"]);
    struct Fixed(Catalog);
    impl CatalogSource for Fixed {
        fn load(&self) -> Result<Catalog> {
            Ok(self.0.clone())
        }
    }

    let rule = AwsInstanceInvalidType::with_catalog(Rc::new(Fixed(catalog)));
    let issues = check_with(Box::new(rule), "aws_instance_invalid_type/literal")?;
    assert!(issues.is_empty());
    Ok(())
}

#[test]
fn previous_generation_instance_type() -> Result<()> {
    let issues = check_with(
        Box::new(AwsInstancePreviousType::new()),
        "aws_instance_previous_type",
    )?;
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].severity, Severity::Warning);
    assert_eq!(
        issues[0].message,
        "\"m1.small\" is previous generation instance type."
    );
    assert_eq!(issues[0].line, 2);
    Ok(())
}

#[test]
fn invalid_db_instance_class() -> Result<()> {
    let issues = check_with(
        Box::new(AwsDbInstanceInvalidType::new()),
        "aws_db_instance_invalid_type",
    )?;
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].detector, "aws_db_instance_invalid_type");
    assert_eq!(issues[0].message, "\"db.m5.gigantic\" is invalid instance type.");
    assert_eq!(issues[0].file, "databases.tf");
    assert_eq!(issues[0].line, 3);
    Ok(())
}
