// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Conversion of dynamic values into the native types rules work with.

use crate::number::Number;
use crate::value::Value;

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoercionError {
    #[error("value is not known until apply")]
    Unknown,
    #[error("null value cannot be converted to {expected}")]
    Null { expected: &'static str },
    #[error("{expected} required, got {actual}")]
    Mismatch {
        expected: &'static str,
        actual: String,
    },
    #[error("{value} is out of range for {expected}")]
    OutOfRange {
        expected: &'static str,
        value: String,
    },
    #[error("{path}: {source}")]
    Element {
        path: String,
        #[source]
        source: Box<CoercionError>,
    },
}

impl CoercionError {
    fn at(self, key: impl std::fmt::Display) -> CoercionError {
        match self {
            CoercionError::Element { path, source } => CoercionError::Element {
                path: format!("[{key}]{path}"),
                source,
            },
            e => CoercionError::Element {
                path: format!("[{key}]"),
                source: Box::new(e),
            },
        }
    }
}

/// Types a value can be converted into.
pub trait FromValue: Sized {
    /// Name used in mismatch messages.
    const EXPECTED: &'static str;

    fn from_value(value: &Value) -> Result<Self, CoercionError>;
}

// Unknown never converts and null only converts into Option.
fn check_known(value: &Value, expected: &'static str) -> Result<(), CoercionError> {
    match value {
        Value::Unknown => Err(CoercionError::Unknown),
        Value::Null => Err(CoercionError::Null { expected }),
        _ => Ok(()),
    }
}

fn mismatch(value: &Value, expected: &'static str) -> CoercionError {
    CoercionError::Mismatch {
        expected,
        actual: value.type_name().to_string(),
    }
}

fn number(value: &Value, expected: &'static str) -> Result<Number, CoercionError> {
    check_known(value, expected)?;
    match value {
        Value::Number(n) => Ok(*n),
        Value::String(s) => s.parse::<Number>().map_err(|_| CoercionError::Mismatch {
            expected,
            actual: format!("string \"{s}\""),
        }),
        _ => Err(mismatch(value, expected)),
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "string";

    fn from_value(value: &Value) -> Result<Self, CoercionError> {
        check_known(value, Self::EXPECTED)?;
        match value {
            Value::String(s) => Ok(s.to_string()),
            Value::Number(n) => Ok(n.format_decimal()),
            Value::Bool(b) => Ok(b.to_string()),
            _ => Err(mismatch(value, Self::EXPECTED)),
        }
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_value(value: &Value) -> Result<Self, CoercionError> {
        check_known(value, Self::EXPECTED)?;
        match value {
            Value::Bool(b) => Ok(*b),
            Value::String(s) if s.as_ref() == "true" => Ok(true),
            Value::String(s) if s.as_ref() == "false" => Ok(false),
            _ => Err(mismatch(value, Self::EXPECTED)),
        }
    }
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "number";

    fn from_value(value: &Value) -> Result<Self, CoercionError> {
        Ok(number(value, Self::EXPECTED)?.as_f64())
    }
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "integer";

    fn from_value(value: &Value) -> Result<Self, CoercionError> {
        let n = number(value, Self::EXPECTED)?;
        n.as_i64().ok_or_else(|| CoercionError::OutOfRange {
            expected: Self::EXPECTED,
            value: n.to_string(),
        })
    }
}

impl FromValue for u64 {
    const EXPECTED: &'static str = "unsigned integer";

    fn from_value(value: &Value) -> Result<Self, CoercionError> {
        let n = number(value, Self::EXPECTED)?;
        n.as_u64().ok_or_else(|| CoercionError::OutOfRange {
            expected: Self::EXPECTED,
            value: n.to_string(),
        })
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_value(value: &Value) -> Result<Self, CoercionError> {
        match value {
            Value::Null => Ok(None),
            v => T::from_value(v).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    const EXPECTED: &'static str = "list";

    fn from_value(value: &Value) -> Result<Self, CoercionError> {
        check_known(value, Self::EXPECTED)?;
        let Value::Array(items) = value else {
            return Err(mismatch(value, Self::EXPECTED));
        };
        items
            .iter()
            .enumerate()
            .map(|(idx, item)| T::from_value(item).map_err(|e| e.at(idx)))
            .collect()
    }
}

impl<T: FromValue> FromValue for BTreeMap<String, T> {
    const EXPECTED: &'static str = "map";

    fn from_value(value: &Value) -> Result<Self, CoercionError> {
        check_known(value, Self::EXPECTED)?;
        let Value::Object(fields) = value else {
            return Err(mismatch(value, Self::EXPECTED));
        };
        fields
            .iter()
            .map(|(k, v)| {
                T::from_value(v)
                    .map(|v| (k.to_string(), v))
                    .map_err(|e| e.at(format!("\"{k}\"")))
            })
            .collect()
    }
}

impl FromValue for Value {
    const EXPECTED: &'static str = "any";

    fn from_value(value: &Value) -> Result<Self, CoercionError> {
        if value.contains_unknown() {
            return Err(CoercionError::Unknown);
        }
        Ok(value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings() {
        assert_eq!(String::from_value(&Value::from("t2.micro")), Ok("t2.micro".to_string()));
        assert_eq!(String::from_value(&Value::from(8i64)), Ok("8".to_string()));
        assert_eq!(String::from_value(&Value::from(true)), Ok("true".to_string()));
        assert_eq!(
            String::from_value(&Value::new_array()),
            Err(CoercionError::Mismatch {
                expected: "string",
                actual: "list".to_string()
            })
        );
    }

    #[test]
    fn unknown_and_null() {
        assert_eq!(String::from_value(&Value::Unknown), Err(CoercionError::Unknown));
        assert_eq!(
            String::from_value(&Value::Null),
            Err(CoercionError::Null { expected: "string" })
        );
        assert_eq!(Option::<String>::from_value(&Value::Null), Ok(None));
        assert_eq!(
            Option::<String>::from_value(&Value::Unknown),
            Err(CoercionError::Unknown)
        );
        assert_eq!(
            Value::from_value(&Value::from(vec![Value::Unknown])),
            Err(CoercionError::Unknown)
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(i64::from_value(&Value::from("42")), Ok(42));
        assert_eq!(f64::from_value(&Value::from(1.5)), Ok(1.5));
        assert!(matches!(
            i64::from_value(&Value::from(1.5)),
            Err(CoercionError::OutOfRange { .. })
        ));
        assert!(matches!(
            u64::from_value(&Value::from(-1i64)),
            Err(CoercionError::OutOfRange { .. })
        ));
        assert!(matches!(
            f64::from_value(&Value::from("large")),
            Err(CoercionError::Mismatch { .. })
        ));
    }

    #[test]
    fn bools() {
        assert_eq!(bool::from_value(&Value::from("true")), Ok(true));
        assert!(bool::from_value(&Value::from("yes")).is_err());
    }

    #[test]
    fn element_errors_carry_path() -> anyhow::Result<()> {
        let v = Value::from_json_str(r#"{"web": ["t2.micro", ["nested"]]}"#)?;
        let err = BTreeMap::<String, Vec<String>>::from_value(&v).unwrap_err();
        assert_eq!(err.to_string(), "[\"web\"][1]: string required, got list");

        let v = Value::from_json_str(r#"{"web": ["t2.micro"], "db": ["db.t3.micro"]}"#)?;
        let map = BTreeMap::<String, Vec<String>>::from_value(&v)?;
        assert_eq!(map["db"], vec!["db.t3.micro".to_string()]);
        Ok(())
    }
}
