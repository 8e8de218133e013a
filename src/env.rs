// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::value::Value;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Input variable values, per module instance.
///
/// Populated once before rules run and only read afterwards. A variable
/// missing from the environment has no known value.
#[derive(Debug, Clone, Default)]
pub struct VariableEnv {
    modules: BTreeMap<String, BTreeMap<String, Value>>,
}

impl VariableEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, module: &str, name: &str, value: Value) {
        self.modules
            .entry(module.to_string())
            .or_default()
            .insert(name.to_string(), value);
    }

    pub fn get(&self, module: &str, name: &str) -> Option<&Value> {
        self.modules.get(module).and_then(|vars| vars.get(name))
    }

    /// All values of one module instance.
    pub fn module(&self, module: &str) -> Option<&BTreeMap<String, Value>> {
        self.modules.get(module)
    }
}

/// Values of `terraform.workspace` and `path.*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaContext {
    pub workspace: String,
    pub path_module: PathBuf,
    pub path_root: PathBuf,
    pub path_cwd: PathBuf,
}

impl Default for MetaContext {
    fn default() -> Self {
        Self {
            workspace: "default".to_string(),
            path_module: PathBuf::from("."),
            path_root: PathBuf::from("."),
            path_cwd: PathBuf::from("."),
        }
    }
}

impl MetaContext {
    /// Context for checking the root module in `dir`.
    pub fn for_root_module<P: AsRef<Path>>(dir: P, workspace: &str) -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            workspace: workspace.to_string(),
            path_module: dir.as_ref().to_path_buf(),
            path_root: dir.as_ref().to_path_buf(),
            path_cwd: cwd,
        }
    }
}
