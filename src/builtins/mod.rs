// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

pub mod collections;
pub mod conversions;
pub mod numbers;
#[cfg(feature = "regex")]
pub mod regex;
pub mod strings;
pub mod utils;

use crate::value::Value;

use std::collections::HashMap;

use anyhow::Result;
use lazy_static::lazy_static;

/// A builtin receives its evaluated arguments, none of which are unknown.
pub type BuiltinFcn = fn(&[Value]) -> Result<Value>;

#[rustfmt::skip]
lazy_static! {
    pub static ref BUILTINS: HashMap<&'static str, BuiltinFcn> = {
	let mut m : HashMap<&'static str, BuiltinFcn>  = HashMap::new();

	numbers::register(&mut m);
	strings::register(&mut m);
	collections::register(&mut m);
	conversions::register(&mut m);
	#[cfg(feature = "regex")]
	regex::register(&mut m);

	m
    };
}
