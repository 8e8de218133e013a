// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins;
use crate::builtins::utils::ensure_args_count;
use crate::number::Number;
use crate::value::Value;

use std::collections::HashMap;

use anyhow::{bail, Result};

pub fn register(m: &mut HashMap<&'static str, builtins::BuiltinFcn>) {
    m.insert("tobool", to_bool);
    m.insert("tonumber", to_number);
    m.insert("toset", to_set);
    m.insert("tostring", to_string);
}

fn to_bool(args: &[Value]) -> Result<Value> {
    ensure_args_count("tobool", args, 1)?;
    Ok(match &args[0] {
        v @ (Value::Null | Value::Bool(_)) => v.clone(),
        Value::String(s) if s.as_ref() == "true" => Value::Bool(true),
        Value::String(s) if s.as_ref() == "false" => Value::Bool(false),
        v => bail!("`tobool` cannot convert `{v}` to bool"),
    })
}

fn to_number(args: &[Value]) -> Result<Value> {
    ensure_args_count("tonumber", args, 1)?;
    Ok(match &args[0] {
        v @ (Value::Null | Value::Number(_)) => v.clone(),
        Value::String(s) => match s.parse::<Number>() {
            Ok(n) => Value::from(n),
            Err(_) => bail!("`tonumber` cannot convert \"{s}\" to number"),
        },
        v => bail!("`tonumber` cannot convert `{v}` to number"),
    })
}

fn to_string(args: &[Value]) -> Result<Value> {
    ensure_args_count("tostring", args, 1)?;
    Ok(match &args[0] {
        v @ (Value::Null | Value::String(_)) => v.clone(),
        Value::Number(n) => Value::from(n.format_decimal()),
        Value::Bool(b) => Value::from(b.to_string()),
        v => bail!("`tostring` cannot convert a {} to string", v.type_name()),
    })
}

// Sets are represented as sorted lists without duplicates.
fn to_set(args: &[Value]) -> Result<Value> {
    ensure_args_count("toset", args, 1)?;
    Ok(match &args[0] {
        Value::Null => Value::Null,
        Value::Array(items) => {
            let mut items = items.as_ref().clone();
            items.sort();
            items.dedup();
            Value::from(items)
        }
        v => bail!("`toset` cannot convert a {} to set", v.type_name()),
    })
}
