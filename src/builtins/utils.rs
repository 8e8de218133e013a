// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::number::Number;
use crate::value::Value;

use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::{bail, Result};

pub fn ensure_args_count(fcn: &str, args: &[Value], expected: usize) -> Result<()> {
    if args.len() != expected {
        if expected == 1 {
            bail!("`{fcn}` expects 1 argument")
        } else {
            bail!("`{fcn}` expects {expected} arguments")
        }
    }
    Ok(())
}

pub fn ensure_args_range(fcn: &str, args: &[Value], min: usize, max: usize) -> Result<()> {
    if args.len() < min || args.len() > max {
        bail!("`{fcn}` expects {min} to {max} arguments");
    }
    Ok(())
}

pub fn ensure_min_args(fcn: &str, args: &[Value], min: usize) -> Result<()> {
    if args.len() < min {
        bail!("`{fcn}` expects at least {min} argument(s)");
    }
    Ok(())
}

pub fn ensure_numeric(fcn: &str, v: &Value) -> Result<Number> {
    Ok(match v {
        Value::Number(n) => *n,
        Value::String(s) => match s.parse::<Number>() {
            Ok(n) => n,
            Err(_) => bail!("`{fcn}` expects numeric argument. Got `{v}` instead"),
        },
        _ => bail!("`{fcn}` expects numeric argument. Got `{v}` instead"),
    })
}

pub fn ensure_integer(fcn: &str, v: &Value) -> Result<i64> {
    match ensure_numeric(fcn, v)?.as_i64() {
        Some(i) => Ok(i),
        None => bail!("`{fcn}` expects integer argument. Got `{v}` instead"),
    }
}

pub fn ensure_string(fcn: &str, v: &Value) -> Result<Rc<str>> {
    Ok(match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.format_decimal().into(),
        Value::Bool(b) => b.to_string().into(),
        _ => bail!("`{fcn}` expects string argument. Got `{v}` instead"),
    })
}

pub fn ensure_array(fcn: &str, v: &Value) -> Result<Rc<Vec<Value>>> {
    Ok(match v {
        Value::Array(a) => a.clone(),
        _ => bail!("`{fcn}` expects list argument. Got `{v}` instead"),
    })
}

pub fn ensure_object(fcn: &str, v: &Value) -> Result<Rc<BTreeMap<Rc<str>, Value>>> {
    Ok(match v {
        Value::Object(o) => o.clone(),
        _ => bail!("`{fcn}` expects map argument. Got `{v}` instead"),
    })
}

pub fn ensure_string_collection(fcn: &str, v: &Value) -> Result<Vec<Rc<str>>> {
    let mut collection = vec![];
    for (idx, elem) in ensure_array(fcn, v)?.iter().enumerate() {
        match elem {
            Value::Null => bail!("`{fcn}` expects string collection. Element {idx} is null."),
            elem => collection.push(ensure_string(fcn, elem).map_err(|_| {
                anyhow::anyhow!("`{fcn}` expects string collection. Element {idx} is not a string.")
            })?),
        }
    }
    Ok(collection)
}
