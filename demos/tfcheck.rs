// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tfcheck::*;

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

// NAME=VALUE, with VALUE parsed like a tfvars value and falling back to a
// plain string.
fn parse_var(arg: &str) -> Result<(String, Value)> {
    let Some((name, value)) = arg.split_once('=') else {
        bail!("expected NAME=VALUE, got `{arg}`");
    };
    let value = match parse_tfvars(&format!("v = {value}\n")) {
        Ok(mut values) => values.remove("v").unwrap_or_else(|| Value::from(value)),
        Err(_) => Value::from(value),
    };
    Ok((name.to_string(), value))
}

fn settings_for(
    dir: &Path,
    config: Option<PathBuf>,
    var_files: Vec<PathBuf>,
    vars: Vec<String>,
    workspace: Option<String>,
) -> Result<Settings> {
    let mut settings = match config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::from_dir(dir)?,
    };
    settings.var_files.extend(var_files);
    for var in vars {
        let (name, value) = parse_var(&var)?;
        settings.variables.insert(name, value);
    }
    if workspace.is_some() {
        settings.workspace = workspace;
    }
    Ok(settings)
}

fn tf_check(dir: PathBuf, settings: Settings, format: Format) -> Result<bool> {
    let mut engine = Engine::new();
    engine.set_settings(settings);
    let issues = engine
        .check_dir(&dir)
        .with_context(|| format!("Failed to check {}", dir.display()))?;

    match format {
        Format::Text => {
            for issue in issues.iter() {
                println!("{issue}");
            }
            if !issues.is_empty() {
                println!("{} issue(s) found.", issues.len());
            }
        }
        Format::Json => println!("{}", serde_json::to_string_pretty(&issues)?),
    }

    let ok = issues.iter().all(|i| i.severity != Severity::Error);
    Ok(ok)
}

fn tf_eval(dir: PathBuf, settings: Settings, expr: String) -> Result<()> {
    let config = Config::load_dir(&dir)?;
    let env = load_variables(&config, &VariableInputs::from_settings(&settings))?;
    let meta = MetaContext::for_root_module(&dir, &settings.workspace());

    let body = hcl::parse(&format!("value = {expr}\n")).context("Failed to parse expression")?;
    let Some(attr) = body.attributes().next() else {
        bail!("no expression given");
    };

    if let Evaluability::NotEvaluable(subject) = classify(&attr.expr)? {
        bail!("`{subject}` cannot be evaluated statically");
    }
    let value = EvalContext::new(&env, config.module_key(), &meta).evaluate(&attr.expr)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

#[derive(Subcommand)]
enum TfCheckCommand {
    /// Check the Terraform files of a directory.
    Check {
        /// Directory containing the root module.
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Settings file. Defaults to .tfcheck.yaml in the directory.
        #[arg(long, short, value_name = "settings.yaml")]
        config: Option<PathBuf>,

        /// Variable definitions file.
        #[arg(long, value_name = "prod.tfvars")]
        var_file: Vec<PathBuf>,

        /// Variable value.
        #[arg(long, value_name = "NAME=VALUE")]
        var: Vec<String>,

        /// Value of terraform.workspace.
        #[arg(long, short)]
        workspace: Option<String>,

        /// Output format.
        #[arg(long, short, value_enum, default_value = "text")]
        format: Format,
    },

    /// Evaluate an expression against the variables of a directory.
    Eval {
        /// Expression to evaluate.
        expr: String,

        /// Directory containing the root module.
        #[arg(long, short, default_value = ".")]
        dir: PathBuf,

        /// Variable definitions file.
        #[arg(long, value_name = "prod.tfvars")]
        var_file: Vec<PathBuf>,

        /// Variable value.
        #[arg(long, value_name = "NAME=VALUE")]
        var: Vec<String>,

        /// Value of terraform.workspace.
        #[arg(long, short)]
        workspace: Option<String>,
    },

    /// List rules and builtin functions.
    List,
}

#[derive(clap::Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: TfCheckCommand,
}

fn main() -> Result<()> {
    env_logger::init();

    // Parse and dispatch command.
    let cli = Cli::parse();
    match cli.command {
        TfCheckCommand::Check {
            dir,
            config,
            var_file,
            var,
            workspace,
            format,
        } => {
            let settings = settings_for(&dir, config, var_file, var, workspace)?;
            if !tf_check(dir, settings, format)? {
                std::process::exit(2);
            }
            Ok(())
        }
        TfCheckCommand::Eval {
            expr,
            dir,
            var_file,
            var,
            workspace,
        } => {
            let settings = settings_for(&dir, None, var_file, var, workspace)?;
            tf_eval(dir, settings, expr)
        }
        TfCheckCommand::List => {
            println!("tfcheck {}", build_revision());
            println!("rules:");
            for rule in Engine::new().rules() {
                println!("  {} ({})", rule.name(), rule.severity());
            }
            println!("functions:\n  {}", builtin_functions().join(" "));
            Ok(())
        }
    }
}
