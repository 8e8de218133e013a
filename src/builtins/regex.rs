// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins;
use crate::builtins::utils::{ensure_args_count, ensure_string};
use crate::value::Value;

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use anyhow::{bail, Result};
use regex::{Captures, Regex};

pub fn register(m: &mut HashMap<&'static str, builtins::BuiltinFcn>) {
    m.insert("regex", regex_match);
    m.insert("regexall", regexall);
}

fn compile(fcn: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).or_else(|e| bail!("`{fcn}` invalid regular expression: {e}"))
}

/// Replace every match of `pattern`, expanding `$1` style group references.
pub fn replace_all(s: &str, pattern: &str, replacement: &str) -> Result<Value> {
    let re = compile("replace", pattern)?;
    Ok(Value::from(re.replace_all(s, replacement).as_ref()))
}

// No groups yields the match, named groups a map, otherwise a list.
fn captures_value(re: &Regex, captures: &Captures) -> Value {
    let group = |m: Option<regex::Match>| match m {
        Some(m) => Value::from(m.as_str()),
        None => Value::Null,
    };

    if captures.len() == 1 {
        return group(captures.get(0));
    }
    if re.capture_names().flatten().next().is_some() {
        let mut map: BTreeMap<Rc<str>, Value> = BTreeMap::new();
        for name in re.capture_names().flatten() {
            map.insert(name.into(), group(captures.name(name)));
        }
        return Value::from(map);
    }
    Value::from(
        captures
            .iter()
            .skip(1)
            .map(group)
            .collect::<Vec<Value>>(),
    )
}

fn regex_match(args: &[Value]) -> Result<Value> {
    let name = "regex";
    ensure_args_count(name, args, 2)?;
    let pattern = ensure_string(name, &args[0])?;
    let value = ensure_string(name, &args[1])?;

    let re = compile(name, &pattern)?;
    match re.captures(&value) {
        Some(captures) => Ok(captures_value(&re, &captures)),
        None => bail!("`{name}` pattern did not match any part of the given string"),
    }
}

fn regexall(args: &[Value]) -> Result<Value> {
    let name = "regexall";
    ensure_args_count(name, args, 2)?;
    let pattern = ensure_string(name, &args[0])?;
    let value = ensure_string(name, &args[1])?;

    let re = compile(name, &pattern)?;
    Ok(Value::from(
        re.captures_iter(&value)
            .map(|captures| captures_value(&re, &captures))
            .collect::<Vec<Value>>(),
    ))
}
