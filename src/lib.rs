// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

mod builtins;
mod catalog;
mod classifier;
mod coerce;
mod configs;
mod engine;
mod env;
mod evaluator;
mod inputs;
mod issue;
mod number;
mod references;
mod runner;
mod settings;
mod source;
mod value;

pub mod rules;

pub use catalog::{
    Catalog, CatalogSource, EmbeddedCatalog, FileCatalog, AWS_DB_INSTANCE_CLASSES,
    AWS_INSTANCE_TYPES, AWS_PREVIOUS_GENERATION_INSTANCE_FAMILIES,
};
pub use classifier::{classify, is_evaluable, Evaluability};
pub use coerce::{CoercionError, FromValue};
pub use configs::{
    Attribute, Config, ConfigError, Resource, ResourceAddr, ResourceMode, Variable, ROOT_MODULE,
};
pub use engine::Engine;
pub use env::{MetaContext, VariableEnv};
pub use evaluator::{evaluate, evaluate_as, EvalContext, EvalError};
pub use inputs::{load_variables, parse_tfvars, read_var_file, VariableInputs, ENV_VAR_PREFIX};
pub use issue::{Issue, Issues, Severity};
pub use number::Number;
pub use references::{references_in_expr, MetaAttribute, Reference, ReferenceError, Subject};
pub use rules::Rule;
pub use runner::Runner;
pub use settings::{RuleSettings, Settings, DEFAULT_SETTINGS_FILE};
pub use source::{Source, Span};
pub use value::Value;

/// Commit the crate was built from, or `unknown`.
pub fn build_revision() -> &'static str {
    env!("GIT_HASH")
}

/// Names of the builtin functions available to expressions.
pub fn builtin_functions() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = builtins::BUILTINS.keys().copied().collect();
    names.sort_unstable();
    names
}
