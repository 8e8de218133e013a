// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins;
use crate::builtins::utils::{
    ensure_args_count, ensure_integer, ensure_min_args, ensure_numeric, ensure_string,
    ensure_string_collection,
};
use crate::value::Value;

use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;

use anyhow::{bail, Result};

pub fn register(m: &mut HashMap<&'static str, builtins::BuiltinFcn>) {
    m.insert("chomp", chomp);
    m.insert("format", format);
    m.insert("join", join);
    m.insert("lower", lower);
    m.insert("replace", replace);
    m.insert("split", split);
    m.insert("startswith", startswith);
    m.insert("strrev", strrev);
    m.insert("substr", substr);
    m.insert("title", title);
    m.insert("trim", trim);
    m.insert("trimprefix", trimprefix);
    m.insert("trimspace", trimspace);
    m.insert("trimsuffix", trimsuffix);
    m.insert("upper", upper);
}

fn chomp(args: &[Value]) -> Result<Value> {
    ensure_args_count("chomp", args, 1)?;
    let s = ensure_string("chomp", &args[0])?;
    Ok(Value::from(s.trim_end_matches(['\r', '\n'])))
}

fn startswith(args: &[Value]) -> Result<Value> {
    ensure_args_count("startswith", args, 2)?;
    let s = ensure_string("startswith", &args[0])?;
    let prefix = ensure_string("startswith", &args[1])?;
    Ok(Value::Bool(s.starts_with(prefix.as_ref())))
}

fn join(args: &[Value]) -> Result<Value> {
    ensure_min_args("join", args, 2)?;
    let separator = ensure_string("join", &args[0])?;
    let mut parts = vec![];
    for list in &args[1..] {
        parts.extend(ensure_string_collection("join", list)?);
    }
    let parts: Vec<&str> = parts.iter().map(|s| s.as_ref()).collect();
    Ok(Value::from(parts.join(separator.as_ref())))
}

fn lower(args: &[Value]) -> Result<Value> {
    ensure_args_count("lower", args, 1)?;
    Ok(Value::from(ensure_string("lower", &args[0])?.to_lowercase()))
}

fn upper(args: &[Value]) -> Result<Value> {
    ensure_args_count("upper", args, 1)?;
    Ok(Value::from(ensure_string("upper", &args[0])?.to_uppercase()))
}

fn title(args: &[Value]) -> Result<Value> {
    ensure_args_count("title", args, 1)?;
    let s = ensure_string("title", &args[0])?;
    let mut result = String::with_capacity(s.len());
    let mut at_word_start = true;
    for ch in s.chars() {
        if at_word_start && ch.is_alphabetic() {
            result.extend(ch.to_uppercase());
        } else {
            result.push(ch);
        }
        at_word_start = !ch.is_alphanumeric();
    }
    Ok(Value::from(result))
}

fn replace(args: &[Value]) -> Result<Value> {
    ensure_args_count("replace", args, 3)?;
    let s = ensure_string("replace", &args[0])?;
    let substr = ensure_string("replace", &args[1])?;
    let replacement = ensure_string("replace", &args[2])?;

    if substr.len() > 1 && substr.starts_with('/') && substr.ends_with('/') {
        #[cfg(feature = "regex")]
        return builtins::regex::replace_all(&s, &substr[1..substr.len() - 1], &replacement);
        #[cfg(not(feature = "regex"))]
        bail!("`replace` with a regular expression requires the `regex` feature");
    }
    Ok(Value::from(s.replace(substr.as_ref(), replacement.as_ref())))
}

fn split(args: &[Value]) -> Result<Value> {
    ensure_args_count("split", args, 2)?;
    let separator = ensure_string("split", &args[0])?;
    let s = ensure_string("split", &args[1])?;
    if s.is_empty() {
        return Ok(Value::from(vec![Value::from("")]));
    }
    Ok(Value::from(
        s.split(separator.as_ref())
            .map(Value::from)
            .collect::<Vec<Value>>(),
    ))
}

fn strrev(args: &[Value]) -> Result<Value> {
    ensure_args_count("strrev", args, 1)?;
    let s = ensure_string("strrev", &args[0])?;
    Ok(Value::from(s.chars().rev().collect::<String>()))
}

fn substr(args: &[Value]) -> Result<Value> {
    ensure_args_count("substr", args, 3)?;
    let s = ensure_string("substr", &args[0])?;
    let offset = ensure_integer("substr", &args[1])?;
    let length = ensure_integer("substr", &args[2])?;

    let chars: Vec<char> = s.chars().collect();
    let len = chars.len() as i64;
    let start = match offset {
        o if o < 0 => (len + o).max(0),
        o => o,
    };
    if start > len {
        bail!("`substr` offset {offset} is greater than the length of the string");
    }
    let end = match length {
        -1 => len,
        l if l < 0 => bail!("`substr` length must be non-negative, or -1"),
        l => (start + l).min(len),
    };
    Ok(Value::from(
        chars[start as usize..end as usize].iter().collect::<String>(),
    ))
}

fn trim(args: &[Value]) -> Result<Value> {
    ensure_args_count("trim", args, 2)?;
    let s = ensure_string("trim", &args[0])?;
    let cutset: Vec<char> = ensure_string("trim", &args[1])?.chars().collect();
    Ok(Value::from(s.trim_matches(cutset.as_slice())))
}

fn trimprefix(args: &[Value]) -> Result<Value> {
    ensure_args_count("trimprefix", args, 2)?;
    let s = ensure_string("trimprefix", &args[0])?;
    let prefix = ensure_string("trimprefix", &args[1])?;
    Ok(Value::from(
        s.strip_prefix(prefix.as_ref()).unwrap_or(s.as_ref()),
    ))
}

fn trimsuffix(args: &[Value]) -> Result<Value> {
    ensure_args_count("trimsuffix", args, 2)?;
    let s = ensure_string("trimsuffix", &args[0])?;
    let suffix = ensure_string("trimsuffix", &args[1])?;
    Ok(Value::from(
        s.strip_suffix(suffix.as_ref()).unwrap_or(s.as_ref()),
    ))
}

fn trimspace(args: &[Value]) -> Result<Value> {
    ensure_args_count("trimspace", args, 1)?;
    Ok(Value::from(ensure_string("trimspace", &args[0])?.trim()))
}

// Optional `.N` precision of a verb.
fn precision(chars: &mut Peekable<Chars>) -> Option<usize> {
    if chars.peek() != Some(&'.') {
        return None;
    }
    chars.next();
    let mut digits = String::new();
    while let Some(c) = chars.peek().filter(|c| c.is_ascii_digit()) {
        digits.push(*c);
        chars.next();
    }
    Some(digits.parse().unwrap_or(0))
}

fn format(args: &[Value]) -> Result<Value> {
    ensure_min_args("format", args, 1)?;
    let spec = ensure_string("format", &args[0])?;
    let mut values = args[1..].iter();
    let mut result = String::new();

    let mut chars = spec.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            result.push(c);
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            result.push('%');
            continue;
        }
        let precision = precision(&mut chars);
        let Some(verb) = chars.next() else {
            bail!("`format` specification ends with an incomplete verb");
        };
        let Some(value) = values.next() else {
            bail!("`format` has too few arguments for the specification \"{spec}\"");
        };
        match verb {
            's' => result.push_str(&ensure_string("format", value)?),
            'd' => match ensure_numeric("format", value)?.as_i64() {
                Some(i) => result.push_str(&i.to_string()),
                None => bail!("`format` %d requires an integer. Got `{value}` instead"),
            },
            'f' => {
                let n = ensure_numeric("format", value)?.as_f64();
                result.push_str(&std::format!("{:.*}", precision.unwrap_or(6), n));
            }
            't' => match value {
                Value::Bool(b) => result.push_str(&b.to_string()),
                _ => bail!("`format` %t requires a bool. Got `{value}` instead"),
            },
            'q' => result.push_str(&serde_json::to_string(
                ensure_string("format", value)?.as_ref(),
            )?),
            'v' => match value {
                Value::String(s) => result.push_str(s),
                v => result.push_str(&v.to_string()),
            },
            other => bail!("`format` does not support the verb %{other}"),
        }
    }

    if values.next().is_some() {
        bail!("`format` has too many arguments for the specification \"{spec}\"");
    }
    Ok(Value::from(result))
}
