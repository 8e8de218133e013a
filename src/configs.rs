// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The configuration tree of a single module.
//!
//! Files are parsed twice: `hcl-edit` keeps byte spans for every structure and
//! `hcl-rs` produces the owned expression tree the evaluator works on. Both
//! parsers see the same text, so their structures are paired positionally.

use crate::source::{Source, Span};

use core::fmt;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use hcl::Expression;
use hcl_edit::Span as _;
use log::debug;

/// Module-instance key of the root module.
pub const ROOT_MODULE: &str = "";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{file}: {message}")]
    Parse { file: String, message: String },
    #[error("{location}: duplicate resource `{addr}`, previously declared at {previous}")]
    DuplicateResource {
        addr: String,
        location: String,
        previous: String,
    },
    #[error("{location}: duplicate variable `{name}`, previously declared at {previous}")]
    DuplicateVariable {
        name: String,
        location: String,
        previous: String,
    },
    #[error("{location}: {message}")]
    InvalidBlock { location: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceMode {
    Managed,
    Data,
}

/// Key of a resource within a module.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceAddr {
    pub mode: ResourceMode,
    pub resource_type: String,
    pub name: String,
}

impl ResourceAddr {
    pub fn managed(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            mode: ResourceMode::Managed,
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }

    pub fn data(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            mode: ResourceMode::Data,
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.mode {
            ResourceMode::Managed => write!(f, "{}.{}", self.resource_type, self.name),
            ResourceMode::Data => write!(f, "data.{}.{}", self.resource_type, self.name),
        }
    }
}

/// An attribute's expression and where it was written.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub expr: Expression,
    pub span: Span,
}

impl Attribute {
    /// File name of the attribute without its directory.
    pub fn file_name(&self) -> &str {
        self.span.source.file_name()
    }

    pub fn line(&self) -> u32 {
        self.span.line
    }
}

#[derive(Debug, Clone)]
pub struct Resource {
    pub addr: ResourceAddr,
    pub span: Span,
    attributes: Vec<Attribute>,
}

impl Resource {
    pub fn resource_type(&self) -> &str {
        &self.addr.resource_type
    }

    pub fn name(&self) -> &str {
        &self.addr.name
    }

    /// Top-level attribute of the resource body. Nested blocks are not searched.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }
}

/// An input variable declaration.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub default: Option<Attribute>,
    pub span: Span,
}

/// Parsed, read-only view of one module's resources and variables.
#[derive(Debug, Clone)]
pub struct Config {
    module: String,
    dir: PathBuf,
    resources: Vec<Resource>,
    index: BTreeMap<ResourceAddr, usize>,
    variables: Vec<Variable>,
}

// Positions of the structures of a body, in body order.
enum Layout {
    Attribute(Option<usize>),
    Block(Option<usize>, Vec<Layout>),
}

fn layout(body: &hcl_edit::structure::Body) -> Vec<Layout> {
    body.iter()
        .map(|structure| match structure {
            hcl_edit::structure::Structure::Attribute(attr) => {
                Layout::Attribute(attr.span().map(|r| r.start))
            }
            hcl_edit::structure::Structure::Block(block) => {
                Layout::Block(block.span().map(|r| r.start), layout(&block.body))
            }
        })
        .collect()
}

fn is_config_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if !name.ends_with(".tf") {
        return false;
    }
    if name == "override.tf" || name.ends_with("_override.tf") {
        debug!("skipping override file {}", path.display());
        return false;
    }
    true
}

impl Config {
    /// Load every `.tf` file of a directory as the root module.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Config, ConfigError> {
        let dir = dir.as_ref();
        let io_err = |source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut files = vec![];
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.is_file() && is_config_file(&path) {
                files.push(path);
            }
        }
        files.sort();

        let mut sources = vec![];
        for file in files {
            let contents = std::fs::read_to_string(&file).map_err(|source| ConfigError::Io {
                path: file.clone(),
                source,
            })?;
            sources.push(Self::make_source(file.to_string_lossy().to_string(), contents)?);
        }

        Self::from_sources(dir, sources)
    }

    /// Build the root module from a single in-memory file.
    pub fn from_file_contents(file: &str, contents: &str) -> Result<Config, ConfigError> {
        let source = Self::make_source(file.to_string(), contents.to_string())?;
        Self::from_sources(Path::new("."), vec![source])
    }

    pub fn from_sources<P: AsRef<Path>>(
        dir: P,
        sources: Vec<Source>,
    ) -> Result<Config, ConfigError> {
        let mut config = Config {
            module: ROOT_MODULE.to_string(),
            dir: dir.as_ref().to_path_buf(),
            resources: vec![],
            index: BTreeMap::new(),
            variables: vec![],
        };
        for source in &sources {
            config.add_source(source)?;
        }
        Ok(config)
    }

    fn make_source(file: String, contents: String) -> Result<Source, ConfigError> {
        Source::from_contents(file.clone(), contents).map_err(|e| ConfigError::Parse {
            file,
            message: e.to_string(),
        })
    }

    fn parse_error(source: &Source, message: impl fmt::Display) -> ConfigError {
        ConfigError::Parse {
            file: source.file().clone(),
            message: message.to_string(),
        }
    }

    fn span(source: &Source, offset: Option<usize>) -> Result<Span, ConfigError> {
        let offset = offset.ok_or_else(|| Self::parse_error(source, "missing source position"))?;
        source
            .span_at(offset)
            .map_err(|e| Self::parse_error(source, e))
    }

    fn location(span: &Span) -> String {
        format!("{}:{}", span.source.file(), span.line)
    }

    fn add_source(&mut self, source: &Source) -> Result<(), ConfigError> {
        let edit_body = hcl_edit::parser::parse_body(source.contents())
            .map_err(|e| Self::parse_error(source, e))?;
        let body = hcl::parse(source.contents()).map_err(|e| Self::parse_error(source, e))?;

        let layout = layout(&edit_body);
        if layout.len() != body.iter().count() {
            return Err(Self::parse_error(source, "internal error: body layout mismatch"));
        }

        for (structure, layout) in body.iter().zip(layout.iter()) {
            let (block, offset, inner) = match (structure, layout) {
                (hcl::Structure::Block(block), Layout::Block(offset, inner)) => {
                    (block, *offset, inner)
                }
                (hcl::Structure::Attribute(_), Layout::Attribute(_)) => continue,
                _ => {
                    return Err(Self::parse_error(
                        source,
                        "internal error: body layout mismatch",
                    ))
                }
            };
            let span = Self::span(source, offset)?;
            let labels: Vec<&str> = block.labels.iter().map(|l| l.as_str()).collect();

            match block.identifier.as_str() {
                "resource" | "data" => {
                    let [resource_type, name] = labels[..] else {
                        return Err(ConfigError::InvalidBlock {
                            location: Self::location(&span),
                            message: format!(
                                "`{}` block requires a type label and a name label",
                                block.identifier.as_str()
                            ),
                        });
                    };
                    let addr = match block.identifier.as_str() {
                        "data" => ResourceAddr::data(resource_type, name),
                        _ => ResourceAddr::managed(resource_type, name),
                    };
                    let attributes = Self::attributes(source, &block.body, inner)?;
                    self.add_resource(Resource {
                        addr,
                        span,
                        attributes,
                    })?;
                }
                "variable" => {
                    let [name] = labels[..] else {
                        return Err(ConfigError::InvalidBlock {
                            location: Self::location(&span),
                            message: "`variable` block requires a name label".to_string(),
                        });
                    };
                    let default = Self::attributes(source, &block.body, inner)?
                        .into_iter()
                        .find(|a| a.name == "default");
                    self.add_variable(Variable {
                        name: name.to_string(),
                        default,
                        span,
                    })?;
                }
                "module" => debug!(
                    "{}: module calls are not loaded",
                    Self::location(&span)
                ),
                _ => (),
            }
        }
        Ok(())
    }

    fn attributes(
        source: &Source,
        body: &hcl::Body,
        layout: &[Layout],
    ) -> Result<Vec<Attribute>, ConfigError> {
        if layout.len() != body.iter().count() {
            return Err(Self::parse_error(source, "internal error: body layout mismatch"));
        }
        let mut attributes = vec![];
        for (structure, layout) in body.iter().zip(layout.iter()) {
            if let (hcl::Structure::Attribute(attr), Layout::Attribute(offset)) =
                (structure, layout)
            {
                attributes.push(Attribute {
                    name: attr.key.as_str().to_string(),
                    expr: attr.expr.clone(),
                    span: Self::span(source, *offset)?,
                });
            }
        }
        Ok(attributes)
    }

    fn add_resource(&mut self, resource: Resource) -> Result<(), ConfigError> {
        if let Some(previous) = self.index.get(&resource.addr) {
            return Err(ConfigError::DuplicateResource {
                addr: resource.addr.to_string(),
                location: Self::location(&resource.span),
                previous: Self::location(&self.resources[*previous].span),
            });
        }
        self.index
            .insert(resource.addr.clone(), self.resources.len());
        self.resources.push(resource);
        Ok(())
    }

    fn add_variable(&mut self, variable: Variable) -> Result<(), ConfigError> {
        if let Some(previous) = self.variables.iter().find(|v| v.name == variable.name) {
            return Err(ConfigError::DuplicateVariable {
                name: variable.name.clone(),
                location: Self::location(&variable.span),
                previous: Self::location(&previous.span),
            });
        }
        self.variables.push(variable);
        Ok(())
    }

    /// Module-instance key used to look up variable values.
    pub fn module_key(&self) -> &str {
        &self.module
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All resources, in file order then declaration order.
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter()
    }

    /// Managed resources of the given type, in tree order.
    pub fn managed_resources<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = &'a Resource> + 'a {
        self.resources.iter().filter(move |r| {
            r.addr.mode == ResourceMode::Managed && r.addr.resource_type == resource_type
        })
    }

    pub fn resource(&self, addr: &ResourceAddr) -> Option<&Resource> {
        self.index.get(addr).map(|idx| &self.resources[*idx])
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }
}
