// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::coerce::CoercionError;
use crate::references::ReferenceError;

/// Error returned while evaluating an expression.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("no value for variable `var.{name}`")]
    UnresolvedVariable { name: String },
    #[error("`{subject}` cannot be resolved without a dependency graph")]
    UnsupportedReference { subject: String },
    #[error(transparent)]
    Reference(#[from] ReferenceError),
    #[error("index {index} is out of bounds for a list of length {len}")]
    IndexOutOfBounds { index: String, len: usize },
    #[error("map has no element for key \"{key}\"")]
    MissingKey { key: String },
    #[error("call to unknown function `{name}`")]
    UnknownFunction { name: String },
    #[error("call to function `{name}` failed: {source}")]
    Function {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("{0}")]
    InvalidOperation(String),
    #[error("{0} is not supported")]
    Unsupported(&'static str),
    #[error("invalid template: {0}")]
    Template(String),
    #[error(transparent)]
    Coercion(#[from] CoercionError),
}

impl EvalError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        EvalError::InvalidOperation(message.into())
    }
}
