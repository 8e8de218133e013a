// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use anyhow::Result;
use tfcheck::*;

const MIXED: &str = "tests/fixtures/mixed";

#[test]
fn default_rules_with_settings() -> Result<()> {
    let mut engine = Engine::new();
    engine.set_settings(Settings::from_dir(MIXED)?);
    let issues = engine.check_dir(MIXED)?.into_vec();

    let lines: Vec<String> = issues.iter().map(|i| i.to_string()).collect();
    assert_eq!(
        lines,
        vec![
            "main.tf:10: ERROR - \"c9.large\" is invalid instance type. (aws_instance_invalid_type)",
            "main.tf:6: WARNING - \"m3.medium\" is previous generation instance type. (aws_instance_previous_type)",
        ]
    );
    Ok(())
}

#[test]
fn disabled_rules_do_not_run() -> Result<()> {
    let mut settings = Settings::from_dir(MIXED)?;
    settings.rules.insert(
        "aws_instance_invalid_type".to_string(),
        RuleSettings { enabled: false },
    );
    let mut engine = Engine::new();
    engine.set_settings(settings);

    let issues = engine.check_dir(MIXED)?;
    assert_eq!(issues.len(), 1);
    assert!(issues
        .iter()
        .all(|i| i.detector == "aws_instance_previous_type"));
    Ok(())
}

#[test]
fn without_settings_defaults_apply() -> Result<()> {
    // t1.micro is valid, but from a previous generation.
    let issues = Engine::new().check_dir(MIXED)?.into_vec();
    assert_eq!(issues.len(), 2);
    assert_eq!(issues[1].message, "\"t1.micro\" is previous generation instance type.");
    Ok(())
}

#[test]
fn issues_serialize_to_json() -> Result<()> {
    let mut engine = Engine::empty();
    engine.add_rule(Box::new(rules::AwsInstanceInvalidType::new()));
    let issues = engine.check_dir(MIXED)?;

    let json: serde_json::Value = serde_json::to_value(&issues)?;
    assert_eq!(json[0]["detector"], "aws_instance_invalid_type");
    assert_eq!(json[0]["severity"], "ERROR");
    assert_eq!(json[0]["file"], "main.tf");
    assert_eq!(json[0]["line"], 10);
    Ok(())
}

// Reports EBS volumes larger than a fixed size.
struct VolumeSizeLimit;

impl Rule for VolumeSizeLimit {
    fn name(&self) -> &'static str {
        "aws_ebs_volume_size_limit"
    }

    fn severity(&self) -> Severity {
        Severity::Notice
    }

    fn check(&self, runner: &mut Runner) -> Result<()> {
        runner.check_attribute(self, "aws_ebs_volume", "size", |size: &u64| {
            (*size > 100).then(|| format!("volume size {size} is larger than 100 GiB."))
        })
    }
}

#[test]
fn custom_rule() -> Result<()> {
    let config = Config::from_file_contents(
        "volumes.tf",
        r#"
variable "size" {
  default = 50
}

resource "aws_ebs_volume" "logs" {
  size = var.size * 4
}

resource "aws_ebs_volume" "data" {
  size = var.size
}

resource "aws_ebs_volume" "copy" {
  size = aws_ebs_volume.data.size
}
"#,
    )?;
    let env = load_variables(&config, &VariableInputs::default())?;
    let meta = MetaContext::default();

    let mut engine = Engine::empty();
    engine.add_rule(Box::new(VolumeSizeLimit));
    assert_eq!(engine.rules().count(), 1);

    let issues = engine.check(&config, &env, &meta)?.into_vec();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].message, "volume size 200 is larger than 100 GiB.");
    assert_eq!(issues[0].severity, Severity::Notice);
    assert_eq!(issues[0].line, 7);
    Ok(())
}

// Same check, but only run when a setting turns it on.
struct OptInVolumeSizeLimit;

impl Rule for OptInVolumeSizeLimit {
    fn name(&self) -> &'static str {
        "aws_ebs_volume_size_limit"
    }

    fn severity(&self) -> Severity {
        Severity::Notice
    }

    fn enabled_by_default(&self) -> bool {
        false
    }

    fn check(&self, runner: &mut Runner) -> Result<()> {
        VolumeSizeLimit.check(runner)
    }
}

#[test]
fn rules_disabled_by_default() -> Result<()> {
    let config = Config::from_file_contents(
        "volumes.tf",
        "resource \"aws_ebs_volume\" \"logs\" {\n  size = 500\n}\n",
    )?;
    let env = load_variables(&config, &VariableInputs::default())?;
    let meta = MetaContext::default();

    let mut engine = Engine::empty();
    engine.add_rule(Box::new(OptInVolumeSizeLimit));
    assert!(engine.check(&config, &env, &meta)?.is_empty());

    engine.set_settings(Settings::from_json_str(
        r#"{"rules": {"aws_ebs_volume_size_limit": {"enabled": true}}}"#,
    )?);
    let issues = engine.check(&config, &env, &meta)?.into_vec();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].message, "volume size 500 is larger than 100 GiB.");
    assert_eq!(issues[0].line, 2);
    Ok(())
}

#[test]
fn parse_errors_are_reported() {
    let err = Config::from_file_contents("broken.tf", "resource \"aws_instance\" {\n").unwrap_err();
    assert!(err.to_string().contains("broken.tf"));
}
