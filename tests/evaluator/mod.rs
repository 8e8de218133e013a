// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use std::collections::BTreeMap;
use std::env;

use anyhow::{bail, Result};
use serde::Deserialize;
use test_generator::test_resources;
use tfcheck::*;

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct Case {
    note: String,
    expr: String,
    #[serde(default)]
    module: Option<String>,
    #[serde(default)]
    variables: BTreeMap<String, Value>,
    #[serde(default)]
    unknown_variables: Vec<String>,
    #[serde(default)]
    workspace: Option<String>,
    #[serde(default)]
    evaluable: Option<bool>,
    #[serde(default)]
    want_result: Option<Value>,
    #[serde(default)]
    want_unknown: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize, Debug)]
struct Test {
    cases: Vec<Case>,
}

fn parse_expr(expr: &str) -> Result<hcl::Expression> {
    let body = hcl::parse(&format!("value = {expr}\n"))?;
    match body.attributes().next() {
        Some(attr) => Ok(attr.expr.clone()),
        None => bail!("no expression in `{expr}`"),
    }
}

fn run_case(case: &Case) -> Result<()> {
    let module = case.module.clone().unwrap_or_default();
    let mut vars = VariableEnv::new();
    for (name, value) in &case.variables {
        vars.set(&module, name, value.clone());
    }
    for name in &case.unknown_variables {
        vars.set(&module, name, Value::Unknown);
    }
    let meta = MetaContext {
        workspace: case.workspace.clone().unwrap_or_else(|| "default".to_string()),
        ..MetaContext::default()
    };
    let ctx = EvalContext::new(&vars, &module, &meta);

    let expr = parse_expr(&case.expr)?;
    if let Some(evaluable) = case.evaluable {
        assert_eq!(
            is_evaluable(&expr)?,
            evaluable,
            "classification of `{}`",
            case.expr
        );
    }

    match (evaluate(&expr, &ctx), &case.error) {
        (Ok(actual), None) => {
            if case.want_unknown {
                assert!(actual.is_unknown(), "expected unknown, got {actual}");
            } else if let Some(expected) = &case.want_result {
                assert_eq!(&actual, expected, "result of `{}`", case.expr);
            }
        }
        (Ok(actual), Some(expected)) => {
            bail!("expected error `{expected}`, got {actual}");
        }
        (Err(actual), Some(expected)) => {
            let actual = actual.to_string();
            if !actual.contains(expected.as_str()) {
                bail!("Error message\n`{actual}\n`\ndoes not contain `{expected}`");
            }
        }
        (Err(actual), None) => return Err(actual.into()),
    }
    Ok(())
}

fn yaml_test_impl(file: &str) -> Result<()> {
    println!("\nrunning {file}");
    let yaml = std::fs::read_to_string(file)?;
    let test: Test = serde_yaml::from_str(&yaml)?;

    for case in &test.cases {
        print!("case {} ", case.note);
        run_case(case)?;
        println!("passed");
    }
    println!("{} cases passed.", test.cases.len());
    Ok(())
}

fn yaml_test(file: &str) -> Result<()> {
    match yaml_test_impl(file) {
        Ok(_) => Ok(()),
        Err(e) => {
            // If Err is returned, it doesn't always get printed by cargo test.
            // Therefore, panic with the error.
            panic!("{}", e);
        }
    }
}

#[test]
#[ignore = "intended for running a single yaml file"]
fn one_yaml() -> Result<()> {
    let mut file = String::default();
    for a in env::args() {
        if a.ends_with(".yaml") {
            file = a;
            break;
        }
    }

    yaml_test(file.as_str())
}

#[test_resources("tests/evaluator/cases/**/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}
