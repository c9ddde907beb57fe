//! Workflow and templates configuration documents
//!
//! This module provides:
//! - Document types (WorkflowConfig, TemplatesConfig) with their serde defaults
//! - Schema validation with field-level errors
//! - Built-in default documents
//! - Discovery and loading from local files or a remote repository
//! - Template catalog helpers (choice lists, lookup)

pub mod catalog;
pub mod defaults;
pub mod resolver;
pub mod schema;
pub mod version;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub use catalog::{filter_templates_by_options, find_template, template_choices};
pub use defaults::{create_default_templates_config, create_default_workflow_config};
pub use resolver::{ConfigOrigin, ConfigResolver, Loaded, ResolveRequest, ResolvedConfig};
pub use schema::{validate, validate_templates, validate_workflow, SchemaKind, TypedConfig};

pub(crate) fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_true() -> bool {
    true
}

/// Capability flags a template can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateOption {
    Ts,
    Esbuild,
    Nextjs,
    React,
    Vue,
    Docker,
    Mongodb,
    Postgresql,
}

impl TemplateOption {
    pub const ALL: [TemplateOption; 8] = [
        TemplateOption::Ts,
        TemplateOption::Esbuild,
        TemplateOption::Nextjs,
        TemplateOption::React,
        TemplateOption::Vue,
        TemplateOption::Docker,
        TemplateOption::Mongodb,
        TemplateOption::Postgresql,
    ];

    /// Identifier used in configuration documents
    pub fn id(&self) -> &'static str {
        match self {
            TemplateOption::Ts => "ts",
            TemplateOption::Esbuild => "esbuild",
            TemplateOption::Nextjs => "nextjs",
            TemplateOption::React => "react",
            TemplateOption::Vue => "vue",
            TemplateOption::Docker => "docker",
            TemplateOption::Mongodb => "mongodb",
            TemplateOption::Postgresql => "postgresql",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TemplateOption::Ts => "TypeScript",
            TemplateOption::Esbuild => "ESBuild",
            TemplateOption::Nextjs => "Next.js",
            TemplateOption::React => "React",
            TemplateOption::Vue => "Vue",
            TemplateOption::Docker => "Docker",
            TemplateOption::Mongodb => "MongoDB",
            TemplateOption::Postgresql => "PostgreSQL",
        }
    }
}

impl fmt::Display for TemplateOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A single entry of the templates catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateConfig {
    /// Unique locator of the template directory
    pub path: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub options: Vec<TemplateOption>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Higher sorts first
    #[serde(default)]
    pub priority: u32,

    #[serde(default)]
    pub deprecated: bool,

    #[serde(default)]
    pub experimental: bool,
}

impl TemplateConfig {
    pub fn has_option(&self, option: TemplateOption) -> bool {
        self.options.contains(&option)
    }
}

/// Fallback answers used when the catalog carries them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultOptions {
    #[serde(default = "default_true")]
    pub typescript: bool,
    #[serde(default = "default_true")]
    pub esbuild: bool,
    #[serde(default = "default_true")]
    pub npm_install: bool,
}

impl Default for DefaultOptions {
    fn default() -> Self {
        Self {
            typescript: true,
            esbuild: true,
            npm_install: true,
        }
    }
}

/// Templates catalog document (JSON)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatesConfig {
    #[serde(default = "default_version")]
    pub version: String,

    pub templates: Vec<TemplateConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_options: Option<DefaultOptions>,
}

/// Prompt kinds a workflow step can use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    List,
    Confirm,
    Input,
    Checkbox,
    Password,
}

impl StepKind {
    /// List and checkbox steps need a choice set
    pub fn needs_choices(&self) -> bool {
        matches!(self, StepKind::List | StepKind::Checkbox)
    }
}

/// A static choice of a list/checkbox step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub name: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Choice {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            description: None,
        }
    }
}

fn default_max_width() -> usize {
    80
}

fn default_separator() -> String {
    " - ".to_string()
}

/// How template catalog entries are rendered as choices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDisplay {
    #[serde(default = "default_true")]
    pub show_description: bool,
    #[serde(default)]
    pub show_category: bool,
    #[serde(default = "default_true")]
    pub show_options: bool,
    #[serde(default = "default_max_width")]
    pub max_width: usize,
    #[serde(default = "default_separator")]
    pub separator: String,
}

impl Default for TemplateDisplay {
    /// Used when a step declares no display block at all
    fn default() -> Self {
        Self {
            show_description: true,
            show_category: false,
            show_options: true,
            max_width: 200,
            separator: default_separator(),
        }
    }
}

/// One declarative prompt of a workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptStep {
    #[serde(rename = "type")]
    pub kind: StepKind,

    /// Answer key, unique within the workflow
    pub name: String,

    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Choice>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Registered validator name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate: Option<String>,

    /// Registered condition name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,

    /// Registered filter name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,

    #[serde(default, rename = "loop", skip_serializing_if = "Option::is_none")]
    pub loop_choices: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_display: Option<TemplateDisplay>,
}

impl PromptStep {
    pub fn new(kind: StepKind, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            message: message.into(),
            choices: None,
            default: None,
            validate: None,
            when: None,
            filter: None,
            required: false,
            page_size: None,
            loop_choices: None,
            template_display: None,
        }
    }
}

/// Steps run after the project files are in place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostProcess {
    #[serde(default = "default_true")]
    pub update_package_json: bool,
    #[serde(default)]
    pub install_dependencies: bool,
    #[serde(default)]
    pub custom_scripts: Vec<String>,
}

/// Workflow document (YAML)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowConfig {
    #[serde(default = "default_version")]
    pub version: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub steps: Vec<PromptStep>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_process: Option<PostProcess>,
}
