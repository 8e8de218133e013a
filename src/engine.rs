// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::configs::Config;
use crate::env::{MetaContext, VariableEnv};
use crate::inputs::{load_variables, VariableInputs};
use crate::issue::Issues;
use crate::rules::{default_rules, Rule};
use crate::runner::Runner;
use crate::settings::Settings;

use std::convert::AsRef;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;

/// The check engine.
pub struct Engine {
    rules: Vec<Box<dyn Rule>>,
    settings: Settings,
}

/// Create an engine with the default rules.
impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
            settings: Settings::default(),
        }
    }

    /// An engine without any rules.
    pub fn empty() -> Self {
        Self {
            rules: vec![],
            settings: Settings::default(),
        }
    }

    pub fn add_rule(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run every enabled rule, in registration order.
    ///
    /// The first rule that fails aborts the run.
    pub fn check(
        &self,
        config: &Config,
        env: &VariableEnv,
        meta: &MetaContext,
    ) -> Result<Issues> {
        let mut issues = Issues::new();
        for rule in &self.rules {
            if !self.settings.is_rule_enabled(rule.as_ref()) {
                info!("rule {} is disabled", rule.name());
                continue;
            }

            let mut runner = Runner::new(config, env, meta);
            rule.check(&mut runner)
                .with_context(|| format!("rule {} failed", rule.name()))?;
            let found = runner.into_issues();
            info!("rule {} found {} issue(s)", rule.name(), found.len());
            issues.extend(found);
        }
        Ok(issues)
    }

    /// Load the root module in `dir` with its variable inputs and check it.
    pub fn check_dir<P: AsRef<Path>>(&self, dir: P) -> Result<Issues> {
        let dir = dir.as_ref();
        info!("loading configuration from {}", dir.display());
        let config = Config::load_dir(dir)?;
        let env = load_variables(&config, &VariableInputs::from_settings(&self.settings))?;
        let meta = MetaContext::for_root_module(dir, &self.settings.workspace());
        self.check(&config, &env, &meta)
    }
}
