// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::rules::Rule;
use crate::value::Value;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Name of the settings file looked up in the checked directory.
pub const DEFAULT_SETTINGS_FILE: &str = ".tfcheck.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSettings {
    pub enabled: bool,
}

/// Tool settings.
///
/// ```yaml
/// workspace: prod
/// var_files:
///   - prod.tfvars
/// variables:
///   instance_type: t3.micro
/// rules:
///   aws_instance_previous_type:
///     enabled: false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub workspace: Option<String>,
    pub var_files: Vec<PathBuf>,
    pub variables: BTreeMap<String, Value>,
    pub rules: BTreeMap<String, RuleSettings>,
}

impl Settings {
    pub fn from_json_str(json: &str) -> Result<Settings> {
        Ok(serde_json::from_str(json)?)
    }

    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(yaml: &str) -> Result<Settings> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read settings from a `.json`, `.yaml` or `.yml` file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Settings> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings {}", path.display()))?;
        let settings = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            #[cfg(feature = "yaml")]
            Some("yaml" | "yml") => Self::from_yaml_str(&contents),
            _ => bail!("unsupported settings file {}", path.display()),
        };
        settings.with_context(|| format!("invalid settings {}", path.display()))
    }

    /// Settings from [`DEFAULT_SETTINGS_FILE`] in `dir`, or the defaults if
    /// there is no such file.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Settings> {
        let path = dir.as_ref().join(DEFAULT_SETTINGS_FILE);
        match path.is_file() {
            true => Self::from_file(path),
            false => Ok(Settings::default()),
        }
    }

    /// Workspace name, falling back to `TF_WORKSPACE` and then `default`.
    pub fn workspace(&self) -> String {
        self.workspace
            .clone()
            .or_else(|| std::env::var("TF_WORKSPACE").ok())
            .unwrap_or_else(|| "default".to_string())
    }

    pub fn is_rule_enabled(&self, rule: &dyn Rule) -> bool {
        match self.rules.get(rule.name()) {
            Some(settings) => settings.enabled,
            None => rule.enabled_by_default(),
        }
    }
}
