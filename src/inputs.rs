// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Input variable values.
//!
//! Values are applied lowest precedence first: declaration defaults,
//! `TF_VAR_` environment variables, `terraform.tfvars`, `*.auto.tfvars` in
//! lexical order, explicit var files, then explicit values.

use crate::configs::Config;
use crate::env::{MetaContext, VariableEnv};
use crate::evaluator::{evaluate, EvalContext};
use crate::settings::Settings;
use crate::value::Value;

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::{debug, warn};

pub const ENV_VAR_PREFIX: &str = "TF_VAR_";

/// Where variable values come from, besides the declarations themselves.
#[derive(Debug, Clone, Default)]
pub struct VariableInputs {
    /// Process environment entries. Only `TF_VAR_` entries are used.
    pub environment: Vec<(String, String)>,
    pub var_files: Vec<PathBuf>,
    pub variables: BTreeMap<String, Value>,
}

impl VariableInputs {
    /// Inputs from the process environment and settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            environment: tf_var_entries(std::env::vars_os()),
            var_files: settings.var_files.clone(),
            variables: settings.variables.clone(),
        }
    }
}

/// Keep the `TF_VAR_` entries of an environment. Entries that are not valid
/// UTF-8 are skipped.
fn tf_var_entries<I>(vars: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    let mut entries = vec![];
    for (key, value) in vars {
        let Some(key) = key.to_str() else {
            continue;
        };
        if !key.starts_with(ENV_VAR_PREFIX) {
            continue;
        }
        match value.into_string() {
            Ok(value) => entries.push((key.to_string(), value)),
            Err(_) => warn!("{key}: value is not valid UTF-8 and is ignored"),
        }
    }
    entries
}

struct Loader<'a> {
    config: &'a Config,
    env: VariableEnv,
}

impl<'a> Loader<'a> {
    fn set(&mut self, origin: &str, name: &str, value: Value) {
        if self.config.variable(name).is_none() {
            warn!("{origin}: value for undeclared variable \"{name}\" is ignored");
            return;
        }
        debug!("{origin}: setting var.{name}");
        self.env.set(self.config.module_key(), name, value);
    }

    fn apply_defaults(&mut self) -> Result<()> {
        let empty = VariableEnv::new();
        let meta = MetaContext::default();
        let ctx = EvalContext::root(&empty, &meta);
        for variable in self.config.variables() {
            let Some(default) = &variable.default else {
                continue;
            };
            let value = evaluate(&default.expr, &ctx).map_err(|e| {
                default.span.error(&format!(
                    "invalid default value for variable \"{}\": {e}",
                    variable.name
                ))
            })?;
            self.env.set(self.config.module_key(), &variable.name, value);
        }
        Ok(())
    }

    fn apply_environment(&mut self, environment: &[(String, String)]) {
        for (key, value) in environment {
            if let Some(name) = key.strip_prefix(ENV_VAR_PREFIX) {
                self.set(key, name, Value::from(value.as_str()));
            }
        }
    }

    fn apply_file(&mut self, path: &Path) -> Result<()> {
        let origin = path.display().to_string();
        for (name, value) in read_var_file(path)? {
            self.set(&origin, &name, value);
        }
        Ok(())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("json")
}

/// Read the variable values of a `.tfvars` or `.tfvars.json` file.
pub fn read_var_file(path: &Path) -> Result<BTreeMap<String, Value>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read var file {}", path.display()))?;
    let values = match is_json(path) {
        true => parse_json_vars(&contents),
        false => parse_tfvars(&contents),
    };
    values.with_context(|| format!("invalid var file {}", path.display()))
}

fn parse_json_vars(contents: &str) -> Result<BTreeMap<String, Value>> {
    let value = Value::from_json_str(contents)?;
    let Value::Object(fields) = value else {
        bail!("expected an object of variable values");
    };
    Ok(fields
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect())
}

/// Parse `name = value` assignments. Values may not reference anything.
pub fn parse_tfvars(contents: &str) -> Result<BTreeMap<String, Value>> {
    let body = hcl::parse(contents)?;
    let empty = VariableEnv::new();
    let meta = MetaContext::default();
    let ctx = EvalContext::root(&empty, &meta);

    let mut values = BTreeMap::new();
    for structure in body.iter() {
        let hcl::Structure::Attribute(attr) = structure else {
            bail!("blocks are not allowed in var files");
        };
        let value = evaluate(&attr.expr, &ctx)
            .with_context(|| format!("invalid value for variable \"{}\"", attr.key.as_str()))?;
        values.insert(attr.key.as_str().to_string(), value);
    }
    Ok(values)
}

// terraform.tfvars[.json] first, then *.auto.tfvars[.json] sorted by name.
fn auto_var_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = vec![];
    for name in ["terraform.tfvars", "terraform.tfvars.json"] {
        let path = dir.join(name);
        if path.is_file() {
            files.push(path);
        }
    }

    let mut auto = vec![];
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if (name.ends_with(".auto.tfvars") || name.ends_with(".auto.tfvars.json")) && path.is_file() {
            auto.push(path);
        }
    }
    auto.sort();
    files.extend(auto);
    Ok(files)
}

/// Build the variable environment of `config`.
pub fn load_variables(config: &Config, inputs: &VariableInputs) -> Result<VariableEnv> {
    let mut loader = Loader {
        config,
        env: VariableEnv::new(),
    };

    loader.apply_defaults()?;
    loader.apply_environment(&inputs.environment);
    for path in auto_var_files(config.dir())? {
        loader.apply_file(&path)?;
    }
    for path in &inputs.var_files {
        loader.apply_file(path)?;
    }
    for (name, value) in &inputs.variables {
        loader.set("settings", name, value.clone());
    }
    Ok(loader.env)
}
