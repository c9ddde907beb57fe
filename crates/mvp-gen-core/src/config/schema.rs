//! Schema validation for configuration documents
//!
//! Validation runs in three passes:
//! 1. Structural checks against an embedded JSON Schema, collecting every error
//! 2. Deserialization into typed documents, which fills in declared defaults
//! 3. Semantic checks the schema cannot express (unique step names,
//!    references to registered prompt functions)

use super::{TemplateOption, TemplatesConfig, WorkflowConfig};
use crate::error::FieldError;
use crate::prompts::FunctionRegistry;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::fmt;

/// Which configuration document a value should be validated as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Workflow,
    Templates,
}

impl SchemaKind {
    pub fn label(&self) -> &'static str {
        match self {
            SchemaKind::Workflow => "workflow",
            SchemaKind::Templates => "templates",
        }
    }

    /// Parse raw document text: YAML for workflows, JSON for templates
    pub fn parse(&self, text: &str) -> Result<Value, String> {
        match self {
            SchemaKind::Workflow => serde_yaml::from_str(text).map_err(|e| e.to_string()),
            SchemaKind::Templates => serde_json::from_str(text).map_err(|e| e.to_string()),
        }
    }

    fn schema(&self) -> Value {
        match self {
            SchemaKind::Workflow => workflow_schema(),
            SchemaKind::Templates => templates_schema(),
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A validated document of either kind
#[derive(Debug, Clone, PartialEq)]
pub enum TypedConfig {
    Workflow(WorkflowConfig),
    Templates(TemplatesConfig),
}

/// Validate a parsed document against the schema of `kind`
pub fn validate(
    document: &Value,
    kind: SchemaKind,
    registry: &FunctionRegistry,
) -> Result<TypedConfig, Vec<FieldError>> {
    match kind {
        SchemaKind::Workflow => validate_workflow(document, registry).map(TypedConfig::Workflow),
        SchemaKind::Templates => validate_templates(document).map(TypedConfig::Templates),
    }
}

/// Validate a workflow document, resolving its function references against `registry`
pub fn validate_workflow(
    document: &Value,
    registry: &FunctionRegistry,
) -> Result<WorkflowConfig, Vec<FieldError>> {
    let workflow: WorkflowConfig = check_and_build(document, SchemaKind::Workflow)?;

    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    for (idx, step) in workflow.steps.iter().enumerate() {
        if !seen.insert(step.name.as_str()) {
            errors.push(FieldError::new(
                format!("steps.{}.name", idx),
                format!("Duplicate step name \"{}\"", step.name),
            ));
        }
        errors.extend(registry.check_references(step, &format!("steps.{}", idx)));
    }

    if errors.is_empty() {
        Ok(workflow)
    } else {
        Err(errors)
    }
}

/// Validate a templates catalog document
pub fn validate_templates(document: &Value) -> Result<TemplatesConfig, Vec<FieldError>> {
    check_and_build(document, SchemaKind::Templates)
}

fn check_and_build<T: DeserializeOwned>(
    document: &Value,
    kind: SchemaKind,
) -> Result<T, Vec<FieldError>> {
    let validator = jsonschema::validator_for(&kind.schema()).map_err(|e| {
        vec![FieldError::new(
            "",
            format!("Invalid built-in {} schema: {}", kind, e),
        )]
    })?;

    let errors: Vec<FieldError> = validator
        .iter_errors(document)
        .map(|e| FieldError::new(pointer_to_dotted(&e.instance_path().to_string()), e.to_string()))
        .collect();
    if !errors.is_empty() {
        return Err(errors);
    }

    serde_json::from_value(document.clone()).map_err(|e| vec![FieldError::new("", e.to_string())])
}

/// `/templates/0/path` -> `templates.0.path`
fn pointer_to_dotted(pointer: &str) -> String {
    pointer
        .trim_start_matches('/')
        .split('/')
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect::<Vec<_>>()
        .join(".")
}

fn templates_schema() -> Value {
    let options: Vec<&str> = TemplateOption::ALL.iter().map(|o| o.id()).collect();
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "required": ["templates"],
        "properties": {
            "version": { "type": "string" },
            "templates": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["path", "name"],
                    "properties": {
                        "path": { "type": "string", "minLength": 1 },
                        "name": { "type": "string", "minLength": 1 },
                        "description": { "type": "string" },
                        "options": { "type": "array", "items": { "enum": options } },
                        "category": { "type": "string" },
                        "priority": { "type": "integer", "minimum": 0, "maximum": u32::MAX },
                        "deprecated": { "type": "boolean" },
                        "experimental": { "type": "boolean" }
                    }
                }
            },
            "defaultOptions": {
                "type": "object",
                "properties": {
                    "typescript": { "type": "boolean" },
                    "esbuild": { "type": "boolean" },
                    "npmInstall": { "type": "boolean" }
                }
            }
        }
    })
}

fn workflow_schema() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "required": ["name", "steps"],
        "properties": {
            "version": { "type": "string" },
            "name": { "type": "string", "minLength": 1 },
            "description": { "type": "string" },
            "steps": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "required": ["type", "name", "message"],
                    "properties": {
                        "type": { "enum": ["list", "confirm", "input", "checkbox", "password"] },
                        "name": { "type": "string", "minLength": 1 },
                        "message": { "type": "string", "minLength": 1 },
                        "choices": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "required": ["name"],
                                "properties": {
                                    "name": { "type": "string" },
                                    "description": { "type": "string" }
                                }
                            }
                        },
                        "validate": { "type": "string" },
                        "when": { "type": "string" },
                        "filter": { "type": "string" },
                        "required": { "type": "boolean" },
                        "pageSize": { "type": "integer", "minimum": 1 },
                        "loop": { "type": "boolean" },
                        "templateDisplay": {
                            "type": "object",
                            "properties": {
                                "showDescription": { "type": "boolean" },
                                "showCategory": { "type": "boolean" },
                                "showOptions": { "type": "boolean" },
                                "maxWidth": { "type": "integer", "minimum": 1 },
                                "separator": { "type": "string" }
                            }
                        }
                    }
                }
            },
            "postProcess": {
                "type": "object",
                "properties": {
                    "updatePackageJson": { "type": "boolean" },
                    "installDependencies": { "type": "boolean" },
                    "customScripts": { "type": "array", "items": { "type": "string" } }
                }
            }
        }
    })
}
