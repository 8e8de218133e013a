// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Reference data used by rules.
//!
//! Rules only ask whether a value is a member of a catalog. Where the data
//! comes from is up to the [`CatalogSource`].

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogData {
    name: String,
    items: Vec<String>,
}

/// A set of known values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    name: String,
    items: BTreeSet<String>,
}

impl Catalog {
    pub fn new<I, S>(name: &str, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_string(),
            items: items.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a catalog from `{"name": ..., "items": [...]}`.
    pub fn from_json_str(json: &str) -> Result<Catalog> {
        let data: CatalogData = serde_json::from_str(json)?;
        Ok(Self::new(&data.name, data.items))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contains(&self, item: &str) -> bool {
        self.items.contains(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Loads a catalog when a rule starts checking.
pub trait CatalogSource {
    fn load(&self) -> Result<Catalog>;
}

/// Catalog data compiled into the binary.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedCatalog {
    name: &'static str,
    json: &'static str,
}

impl EmbeddedCatalog {
    pub const fn new(name: &'static str, json: &'static str) -> Self {
        Self { name, json }
    }
}

impl CatalogSource for EmbeddedCatalog {
    fn load(&self) -> Result<Catalog> {
        Catalog::from_json_str(self.json)
            .with_context(|| format!("failed to load embedded catalog `{}`", self.name))
    }
}

/// Catalog data read from a JSON file on every load.
#[derive(Debug, Clone)]
pub struct FileCatalog {
    path: PathBuf,
}

impl FileCatalog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl CatalogSource for FileCatalog {
    fn load(&self) -> Result<Catalog> {
        let json = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read catalog {}", self.path.display()))?;
        Catalog::from_json_str(&json)
            .with_context(|| format!("failed to parse catalog {}", self.path.display()))
    }
}

pub const AWS_INSTANCE_TYPES: EmbeddedCatalog = EmbeddedCatalog::new(
    "aws_instance_types",
    include_str!("../data/aws_instance_types.json"),
);

pub const AWS_PREVIOUS_GENERATION_INSTANCE_FAMILIES: EmbeddedCatalog = EmbeddedCatalog::new(
    "aws_previous_generation_instance_families",
    include_str!("../data/aws_previous_generation_instance_families.json"),
);

pub const AWS_DB_INSTANCE_CLASSES: EmbeddedCatalog = EmbeddedCatalog::new(
    "aws_db_instance_classes",
    include_str!("../data/aws_db_instance_classes.json"),
);
