// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins;
use crate::builtins::utils::{ensure_args_count, ensure_integer, ensure_min_args, ensure_numeric, ensure_string};
use crate::number::Number;
use crate::value::Value;

use std::collections::HashMap;

use anyhow::{bail, Result};

pub fn register(m: &mut HashMap<&'static str, builtins::BuiltinFcn>) {
    m.insert("abs", abs);
    m.insert("ceil", ceil);
    m.insert("floor", floor);
    m.insert("max", max);
    m.insert("min", min);
    m.insert("parseint", parseint);
    m.insert("signum", signum);
}

fn abs(args: &[Value]) -> Result<Value> {
    ensure_args_count("abs", args, 1)?;
    Ok(Value::from(ensure_numeric("abs", &args[0])?.as_f64().abs()))
}

fn ceil(args: &[Value]) -> Result<Value> {
    ensure_args_count("ceil", args, 1)?;
    Ok(Value::from(ensure_numeric("ceil", &args[0])?.as_f64().ceil()))
}

fn floor(args: &[Value]) -> Result<Value> {
    ensure_args_count("floor", args, 1)?;
    Ok(Value::from(
        ensure_numeric("floor", &args[0])?.as_f64().floor(),
    ))
}

fn extreme(fcn: &'static str, args: &[Value], pick: fn(Number, Number) -> Number) -> Result<Value> {
    ensure_min_args(fcn, args, 1)?;
    let mut result = ensure_numeric(fcn, &args[0])?;
    for arg in &args[1..] {
        result = pick(result, ensure_numeric(fcn, arg)?);
    }
    Ok(Value::from(result))
}

fn max(args: &[Value]) -> Result<Value> {
    extreme("max", args, std::cmp::max)
}

fn min(args: &[Value]) -> Result<Value> {
    extreme("min", args, std::cmp::min)
}

fn signum(args: &[Value]) -> Result<Value> {
    ensure_args_count("signum", args, 1)?;
    let n = ensure_numeric("signum", &args[0])?.as_f64();
    Ok(Value::from(match n {
        n if n > 0.0 => 1i64,
        n if n < 0.0 => -1i64,
        _ => 0i64,
    }))
}

fn parseint(args: &[Value]) -> Result<Value> {
    ensure_args_count("parseint", args, 2)?;
    let s = ensure_string("parseint", &args[0])?;
    let base = ensure_integer("parseint", &args[1])?;
    if !(2..=62).contains(&base) {
        bail!("`parseint` base must be between 2 and 62. Got {base}");
    }
    // Bases above 36 are not supported by the standard parser.
    if base > 36 {
        bail!("`parseint` base {base} is not supported");
    }
    match i64::from_str_radix(s.as_ref(), base as u32) {
        Ok(n) => Ok(Value::from(n)),
        Err(_) => bail!("`parseint` cannot parse \"{s}\" as a base {base} integer"),
    }
}
