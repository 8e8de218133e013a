// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins;
use crate::builtins::utils::{
    ensure_args_count, ensure_args_range, ensure_array, ensure_integer, ensure_min_args,
    ensure_numeric, ensure_object, ensure_string, ensure_string_collection,
};
use crate::value::Value;

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use anyhow::{bail, Result};

// Upper bound on the number of elements `range` may produce.
const MAX_RANGE_LEN: usize = 1024;

pub fn register(m: &mut HashMap<&'static str, builtins::BuiltinFcn>) {
    m.insert("coalesce", coalesce);
    m.insert("compact", compact);
    m.insert("concat", concat);
    m.insert("contains", contains);
    m.insert("distinct", distinct);
    m.insert("element", element);
    m.insert("flatten", flatten);
    m.insert("index", index);
    m.insert("keys", keys);
    m.insert("length", length);
    m.insert("lookup", lookup);
    m.insert("merge", merge);
    m.insert("range", range);
    m.insert("reverse", reverse);
    m.insert("slice", slice);
    m.insert("sort", sort);
    m.insert("values", values);
    m.insert("zipmap", zipmap);
}

fn coalesce(args: &[Value]) -> Result<Value> {
    ensure_min_args("coalesce", args, 1)?;
    for v in args {
        match v {
            Value::Null => (),
            Value::String(s) if s.is_empty() => (),
            v => return Ok(v.clone()),
        }
    }
    bail!("`coalesce` found no non-null, non-empty arguments")
}

fn compact(args: &[Value]) -> Result<Value> {
    ensure_args_count("compact", args, 1)?;
    let items = ensure_array("compact", &args[0])?;
    let mut result = vec![];
    for v in items.iter() {
        match v {
            Value::Null => (),
            Value::String(s) if s.is_empty() => (),
            Value::String(_) => result.push(v.clone()),
            _ => bail!("`compact` expects a list of strings. Got `{v}`"),
        }
    }
    Ok(Value::from(result))
}

fn concat(args: &[Value]) -> Result<Value> {
    let mut result = vec![];
    for list in args {
        result.extend(ensure_array("concat", list)?.iter().cloned());
    }
    Ok(Value::from(result))
}

fn contains(args: &[Value]) -> Result<Value> {
    ensure_args_count("contains", args, 2)?;
    let items = ensure_array("contains", &args[0])?;
    Ok(Value::Bool(items.contains(&args[1])))
}

fn distinct(args: &[Value]) -> Result<Value> {
    ensure_args_count("distinct", args, 1)?;
    let mut result: Vec<Value> = vec![];
    for v in ensure_array("distinct", &args[0])?.iter() {
        if !result.contains(v) {
            result.push(v.clone());
        }
    }
    Ok(Value::from(result))
}

fn element(args: &[Value]) -> Result<Value> {
    ensure_args_count("element", args, 2)?;
    let items = ensure_array("element", &args[0])?;
    let idx = ensure_integer("element", &args[1])?;
    if items.is_empty() {
        bail!("`element` cannot use an empty list");
    }
    if idx < 0 {
        bail!("`element` index must not be negative");
    }
    // The index wraps around the end of the list.
    Ok(items[idx as usize % items.len()].clone())
}

fn flatten_into(items: &[Value], result: &mut Vec<Value>) {
    for v in items {
        match v {
            Value::Array(inner) => flatten_into(inner, result),
            v => result.push(v.clone()),
        }
    }
}

fn flatten(args: &[Value]) -> Result<Value> {
    ensure_args_count("flatten", args, 1)?;
    let mut result = vec![];
    flatten_into(&ensure_array("flatten", &args[0])?, &mut result);
    Ok(Value::from(result))
}

fn index(args: &[Value]) -> Result<Value> {
    ensure_args_count("index", args, 2)?;
    let items = ensure_array("index", &args[0])?;
    match items.iter().position(|v| v == &args[1]) {
        Some(idx) => Ok(Value::from(idx)),
        None => bail!("`index` item not found in list"),
    }
}

fn keys(args: &[Value]) -> Result<Value> {
    ensure_args_count("keys", args, 1)?;
    let fields = ensure_object("keys", &args[0])?;
    Ok(Value::from(
        fields
            .keys()
            .map(|k| Value::String(k.clone()))
            .collect::<Vec<Value>>(),
    ))
}

fn values(args: &[Value]) -> Result<Value> {
    ensure_args_count("values", args, 1)?;
    let fields = ensure_object("values", &args[0])?;
    Ok(Value::from(fields.values().cloned().collect::<Vec<Value>>()))
}

fn length(args: &[Value]) -> Result<Value> {
    ensure_args_count("length", args, 1)?;
    Ok(Value::from(match &args[0] {
        Value::String(s) => s.chars().count(),
        Value::Array(a) => a.len(),
        Value::Object(o) => o.len(),
        v => bail!("`length` expects a string, list or map. Got `{v}`"),
    }))
}

fn lookup(args: &[Value]) -> Result<Value> {
    ensure_args_range("lookup", args, 2, 3)?;
    let fields = ensure_object("lookup", &args[0])?;
    let key = ensure_string("lookup", &args[1])?;
    match (fields.get(key.as_ref()), args.get(2)) {
        (Some(v), _) => Ok(v.clone()),
        (None, Some(default)) => Ok(default.clone()),
        (None, None) => bail!("`lookup` found no element for key \"{key}\""),
    }
}

fn merge(args: &[Value]) -> Result<Value> {
    let mut result = Value::new_object();
    for v in args {
        match v {
            Value::Null => (),
            Value::Object(_) => result.merge(v.clone())?,
            _ => bail!("`merge` expects map arguments. Got `{v}`"),
        }
    }
    Ok(result)
}

fn range(args: &[Value]) -> Result<Value> {
    ensure_args_range("range", args, 1, 3)?;
    let nums = args
        .iter()
        .map(|a| ensure_numeric("range", a).map(|n| n.as_f64()))
        .collect::<Result<Vec<f64>>>()?;
    let (start, limit, step) = match nums[..] {
        [limit] => (0.0, limit, 1.0),
        [start, limit] => (start, limit, if limit >= start { 1.0 } else { -1.0 }),
        [start, limit, step] => (start, limit, step),
        _ => bail!("`range` expects 1 to 3 arguments"),
    };
    if step == 0.0 {
        bail!("`range` step must not be zero");
    }
    if (step > 0.0 && limit < start) || (step < 0.0 && limit > start) {
        bail!("`range` step moves away from the limit");
    }

    let mut result = vec![];
    let mut n = start;
    while (step > 0.0 && n < limit) || (step < 0.0 && n > limit) {
        if result.len() == MAX_RANGE_LEN {
            bail!("`range` would produce more than {MAX_RANGE_LEN} elements");
        }
        result.push(Value::from(n));
        n += step;
    }
    Ok(Value::from(result))
}

fn reverse(args: &[Value]) -> Result<Value> {
    ensure_args_count("reverse", args, 1)?;
    let items = ensure_array("reverse", &args[0])?;
    Ok(Value::from(items.iter().rev().cloned().collect::<Vec<Value>>()))
}

fn slice(args: &[Value]) -> Result<Value> {
    ensure_args_count("slice", args, 3)?;
    let items = ensure_array("slice", &args[0])?;
    let start = ensure_integer("slice", &args[1])?;
    let end = ensure_integer("slice", &args[2])?;
    if start < 0 || end < start || end as usize > items.len() {
        bail!(
            "`slice` indices {start}..{end} are out of range for a list of length {}",
            items.len()
        );
    }
    Ok(Value::from(items[start as usize..end as usize].to_vec()))
}

fn sort(args: &[Value]) -> Result<Value> {
    ensure_args_count("sort", args, 1)?;
    let mut items = ensure_string_collection("sort", &args[0])?;
    items.sort();
    Ok(Value::from(
        items.into_iter().map(Value::String).collect::<Vec<Value>>(),
    ))
}

fn zipmap(args: &[Value]) -> Result<Value> {
    ensure_args_count("zipmap", args, 2)?;
    let keys = ensure_string_collection("zipmap", &args[0])?;
    let values = ensure_array("zipmap", &args[1])?;
    if keys.len() != values.len() {
        bail!(
            "`zipmap` number of keys ({}) does not match number of values ({})",
            keys.len(),
            values.len()
        );
    }
    let map: BTreeMap<Rc<str>, Value> = keys.into_iter().zip(values.iter().cloned()).collect();
    Ok(Value::from(map))
}
