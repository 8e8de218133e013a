// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use anyhow::{bail, Result};
use serde::ser::Serializer;
use serde::Serialize;

const F64_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0; // 2^53

/// Configuration-language number.
///
/// HCL numbers are arbitrary precision decimals. Checks only ever compare and
/// format them, so a double is enough; integral values are printed without a
/// fractional part.
#[derive(Clone, Copy, Debug)]
pub struct Number(f64);

impl Number {
    pub fn as_f64(&self) -> f64 {
        self.0
    }

    pub fn is_integer(&self) -> bool {
        self.0.is_finite() && self.0.fract() == 0.0
    }

    pub fn as_i64(&self) -> Option<i64> {
        if self.is_integer() && self.0.abs() <= F64_SAFE_INTEGER {
            Some(self.0 as i64)
        } else {
            None
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self.as_i64() {
            Some(i) if i >= 0 => Some(i as u64),
            _ => None,
        }
    }

    pub fn add(&self, other: &Number) -> Number {
        Number(self.0 + other.0)
    }

    pub fn sub(&self, other: &Number) -> Number {
        Number(self.0 - other.0)
    }

    pub fn mul(&self, other: &Number) -> Number {
        Number(self.0 * other.0)
    }

    pub fn divide(&self, other: &Number) -> Result<Number> {
        if other.0 == 0.0 {
            bail!("divide by zero");
        }
        Ok(Number(self.0 / other.0))
    }

    pub fn modulo(&self, other: &Number) -> Result<Number> {
        if other.0 == 0.0 {
            bail!("modulo by zero");
        }
        Ok(Number(self.0 % other.0))
    }

    pub fn neg(&self) -> Number {
        Number(-self.0)
    }

    pub fn format_decimal(&self) -> String {
        match self.as_i64() {
            Some(i) => i.to_string(),
            None => self.0.to_string(),
        }
    }
}

impl From<f64> for Number {
    fn from(n: f64) -> Self {
        Number(n)
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Number(n as f64)
    }
}

impl From<u64> for Number {
    fn from(n: u64) -> Self {
        Number(n as f64)
    }
}

impl From<usize> for Number {
    fn from(n: usize) -> Self {
        Number(n as f64)
    }
}

impl From<i32> for Number {
    fn from(n: i32) -> Self {
        Number(f64::from(n))
    }
}

impl FromStr for Number {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Number(n)),
            _ => bail!("`{s}` is not a valid number"),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.format_decimal())
    }
}

impl Serialize for Number {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.as_i64() {
            Some(i) => serializer.serialize_i64(i),
            None => serializer.serialize_f64(self.0),
        }
    }
}
