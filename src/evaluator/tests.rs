// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::coerce::CoercionError;

use std::collections::BTreeMap;

fn parse_expr(src: &str) -> Expression {
    let body = hcl::parse(&format!("value = {src}\n")).unwrap();
    body.attributes().next().unwrap().expr.clone()
}

fn basic_env() -> VariableEnv {
    let mut env = VariableEnv::new();
    env.set("", "instance_type", Value::from("t2.micro"));
    env.set("", "family", Value::from("m5"));
    env.set("", "large", Value::Bool(true));
    env.set(
        "",
        "sizes",
        Value::from_json_str(r#"{"dev": "t3.micro", "prod": "m5.large"}"#).unwrap(),
    );
    env.set(
        "",
        "types",
        Value::from_json_str(r#"["t2.micro", "t3.small", "m5.large"]"#).unwrap(),
    );
    env.set("", "pending", Value::Unknown);
    env.set("module.db", "instance_type", Value::from("db.t3.micro"));
    env
}

fn eval(src: &str) -> Result<Value, EvalError> {
    let env = basic_env();
    let meta = MetaContext {
        workspace: "prod".to_string(),
        ..MetaContext::default()
    };
    let ctx = EvalContext::root(&env, &meta);
    evaluate(&parse_expr(src), &ctx)
}

fn value(src: &str) -> Value {
    eval(src).unwrap()
}

#[test]
fn literals() {
    assert_eq!(value(r#""t2.micro""#), Value::from("t2.micro"));
    assert_eq!(value("42"), Value::from(42i64));
    assert_eq!(value("true"), Value::Bool(true));
    assert_eq!(value("null"), Value::Null);
    assert_eq!(
        value(r#"{ a = 1, "b" = [1, 2] }"#),
        Value::from_json_str(r#"{"a": 1, "b": [1, 2]}"#).unwrap()
    );
}

#[test]
fn variables_and_meta() {
    assert_eq!(value("var.instance_type"), Value::from("t2.micro"));
    assert_eq!(value("terraform.workspace"), Value::from("prod"));
    assert_eq!(value("path.module"), Value::from("."));
    assert_eq!(value(r#"var.sizes["prod"]"#), Value::from("m5.large"));
    assert_eq!(value("var.sizes.dev"), Value::from("t3.micro"));
    assert_eq!(value("var.types[1]"), Value::from("t3.small"));
    assert_eq!(value("var.types.2"), Value::from("m5.large"));
}

#[test]
fn variables_are_scoped_by_module() {
    let env = basic_env();
    let meta = MetaContext::default();
    let ctx = EvalContext::new(&env, "module.db", &meta);
    assert_eq!(
        ctx.evaluate(&parse_expr("var.instance_type")).unwrap(),
        Value::from("db.t3.micro")
    );
    assert!(matches!(
        ctx.evaluate(&parse_expr("var.family")),
        Err(EvalError::UnresolvedVariable { .. })
    ));
}

#[test]
fn templates() {
    assert_eq!(value(r#""${var.family}.large""#), Value::from("m5.large"));
    // A lone interpolation keeps the type of its value.
    assert_eq!(value(r#""${var.large}""#), Value::Bool(true));
    assert_eq!(value(r#""${var.types}""#), value("var.types"));
    assert_eq!(value(r#""n=${1 + 1}""#), Value::from("n=2"));
    assert!(matches!(
        eval(r#""${var.types}-x""#),
        Err(EvalError::Template(_))
    ));
    assert!(matches!(
        eval(r#""%{ if var.large }m5%{ endif }""#),
        Err(EvalError::Unsupported(_))
    ));
}

#[test]
fn conditionals_and_operators() {
    assert_eq!(
        value(r#"var.large ? "m5.large" : "t3.micro""#),
        Value::from("m5.large")
    );
    assert_eq!(
        value(r#"terraform.workspace == "dev" ? "t3.micro" : var.sizes[terraform.workspace]"#),
        Value::from("m5.large")
    );
    assert_eq!(value("2 * 3 + 4 % 3"), Value::from(7i64));
    assert_eq!(value("-(1 - 3)"), Value::from(2i64));
    assert_eq!(value("1 < 2 && !false"), Value::Bool(true));
    assert_eq!(value(r#""1" + 1"#), Value::from(2i64));
    assert_eq!(value("[1, 2] != [1, 2]"), Value::Bool(false));
    assert!(matches!(eval("1 / 0"), Err(EvalError::InvalidOperation(_))));
    assert!(matches!(eval(r#"true + 1"#), Err(EvalError::InvalidOperation(_))));
    assert!(matches!(eval(r#"1 ? 2 : 3"#), Err(EvalError::InvalidOperation(_))));
}

#[test]
fn operator_precedence() {
    assert_eq!(value("2 * 3 + 4"), Value::from(10i64));
    assert_eq!(value("4 + 2 * 3"), Value::from(10i64));
    assert_eq!(value("10 - 2 - 3"), Value::from(5i64));
    assert_eq!(value("64 / 4 / 2"), Value::from(8i64));
    assert_eq!(value("10 - 2 * 3 - 1"), Value::from(3i64));
    assert_eq!(value("(10 - 2) * 3"), Value::from(24i64));
    assert_eq!(value("1 + 1 == 2 && 3 > 2 || false"), Value::Bool(true));
    assert_eq!(
        value(r#"terraform.workspace == "prod" && var.large ? "m5.xlarge" : "t1.2xlarge""#),
        Value::from("m5.xlarge")
    );
}

#[test]
fn unary_operators_on_traversals() {
    assert_eq!(value("!var.large"), Value::Bool(false));
    assert_eq!(value("!var.large || true"), Value::Bool(true));
    assert_eq!(value("-length(var.types) + 1"), Value::from(-2i64));
    // The operand is resolved before negation is attempted.
    assert!(matches!(
        eval("-var.instance_type"),
        Err(EvalError::InvalidOperation(_))
    ));
}

#[test]
fn functions() {
    assert_eq!(value(r#"upper(var.family)"#), Value::from("M5"));
    assert_eq!(
        value(r#"lookup(var.sizes, "qa", "t2.nano")"#),
        Value::from("t2.nano")
    );
    assert_eq!(
        value(r#"format("%s.%s", var.family, "xlarge")"#),
        Value::from("m5.xlarge")
    );
    assert_eq!(value("max([3, 9, 1]...)"), Value::from(9i64));
    assert_eq!(value("length(var.types)"), Value::from(3i64));
}

#[test]
fn function_errors() {
    assert!(matches!(
        eval("nosuchfunction(1)"),
        Err(EvalError::UnknownFunction { .. })
    ));
    let err = eval(r#"lookup(var.sizes, "qa")"#).unwrap_err();
    assert!(matches!(err, EvalError::Function { ref name, .. } if name == "lookup"));
    assert!(err.to_string().contains("qa"));
}

#[test]
fn for_expressions() {
    assert_eq!(
        value("[for t in var.types : upper(t) if t != \"t3.small\"]"),
        Value::from_json_str(r#"["T2.MICRO", "M5.LARGE"]"#).unwrap()
    );
    assert_eq!(
        value("{ for k, v in var.sizes : v => k }"),
        Value::from_json_str(r#"{"m5.large": "prod", "t3.micro": "dev"}"#).unwrap()
    );
    assert_eq!(
        value(r#"{ for t in var.types : substr(t, 0, 1) => t... }"#),
        Value::from_json_str(r#"{"m": ["m5.large"], "t": ["t2.micro", "t3.small"]}"#).unwrap()
    );
    assert_eq!(
        value("[for i, t in var.types : i]"),
        Value::from_json_str("[0, 1, 2]").unwrap()
    );
    assert!(matches!(
        eval(r#"{ for t in var.types : substr(t, 0, 1) => t }"#),
        Err(EvalError::InvalidOperation(_))
    ));
}

#[test]
fn splats() {
    let mut env = VariableEnv::new();
    env.set(
        "",
        "instances",
        Value::from_json_str(r#"[{"type": "t2.micro"}, {"type": "m5.large"}]"#).unwrap(),
    );
    let meta = MetaContext::default();
    let ctx = EvalContext::root(&env, &meta);
    assert_eq!(
        ctx.evaluate(&parse_expr("var.instances[*].type")).unwrap(),
        Value::from_json_str(r#"["t2.micro", "m5.large"]"#).unwrap()
    );
    assert_eq!(
        ctx.evaluate(&parse_expr("var.instances.*.type[1]")).unwrap(),
        Value::from("m5.large")
    );
}

#[test]
fn lookup_failures() {
    assert!(matches!(
        eval("var.missing"),
        Err(EvalError::UnresolvedVariable { ref name }) if name == "missing"
    ));
    assert!(matches!(
        eval("var.types[3]"),
        Err(EvalError::IndexOutOfBounds { len: 3, .. })
    ));
    assert!(matches!(
        eval(r#"var.sizes["qa"]"#),
        Err(EvalError::MissingKey { ref key }) if key == "qa"
    ));
    assert!(matches!(
        eval("aws_instance.web.instance_type"),
        Err(EvalError::UnsupportedReference { ref subject }) if subject == "aws_instance.web"
    ));
    assert!(matches!(
        eval("local.size"),
        Err(EvalError::UnsupportedReference { .. })
    ));
    assert!(matches!(eval("var"), Err(EvalError::Reference(_))));
}

#[test]
fn unknown_propagates() {
    assert_eq!(value("var.pending"), Value::Unknown);
    assert_eq!(value(r#""${var.pending}.large""#), Value::Unknown);
    assert_eq!(value("upper(var.pending)"), Value::Unknown);
    assert_eq!(value("var.pending == 1"), Value::Unknown);
    assert_eq!(value(r#"var.pending ? "a" : "b""#), Value::Unknown);
    assert_eq!(value("var.pending.attr[0]"), Value::Unknown);
    assert_eq!(value("[for x in var.pending : x]"), Value::Unknown);
}

#[test]
fn coercion() {
    let env = basic_env();
    let meta = MetaContext::default();
    let ctx = EvalContext::root(&env, &meta);

    let s: String = ctx.evaluate_as(&parse_expr("var.instance_type")).unwrap();
    assert_eq!(s, "t2.micro");

    let sizes: BTreeMap<String, String> = ctx.evaluate_as(&parse_expr("var.sizes")).unwrap();
    assert_eq!(sizes["prod"], "m5.large");

    let types: Vec<String> = ctx.evaluate_as(&parse_expr("var.types")).unwrap();
    assert_eq!(types.len(), 3);

    assert!(matches!(
        ctx.evaluate_as::<String>(&parse_expr("var.types")),
        Err(EvalError::Coercion(CoercionError::Mismatch { .. }))
    ));
    assert!(matches!(
        ctx.evaluate_as::<String>(&parse_expr("var.pending")),
        Err(EvalError::Coercion(CoercionError::Unknown))
    ));
    assert!(matches!(
        ctx.evaluate_as::<String>(&parse_expr("null")),
        Err(EvalError::Coercion(CoercionError::Null { .. }))
    ));
    assert_eq!(
        ctx.evaluate_as::<Option<String>>(&parse_expr("null")).unwrap(),
        None
    );
}

#[test]
fn evaluation_is_repeatable() {
    let env = basic_env();
    let meta = MetaContext::default();
    let ctx = EvalContext::root(&env, &meta);
    let expr = parse_expr(
        r#"merge({ for k, v in var.sizes : upper(k) => v }, { keys = keys(var.sizes) })"#,
    );

    let first = ctx.evaluate(&expr).unwrap();
    let second = ctx.evaluate(&expr).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first,
        Value::from_json_str(
            r#"{"DEV": "t3.micro", "PROD": "m5.large", "keys": ["dev", "prod"]}"#
        )
        .unwrap()
    );
}
