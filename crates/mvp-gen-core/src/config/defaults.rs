//! Built-in documents used when nothing else can be loaded
//!
//! These keep the generator usable fully offline.

use super::{
    default_version, Choice, DefaultOptions, PostProcess, PromptStep, StepKind, TemplateConfig,
    TemplateOption, TemplatesConfig, WorkflowConfig,
};
use serde_json::json;

/// Default workflow: template selection followed by three feature toggles
pub fn create_default_workflow_config() -> WorkflowConfig {
    let mut template = PromptStep::new(StepKind::List, "template", "Select a project template:");
    template.choices = Some(vec![
        Choice::new("🌐 Express + Handlebars", "express-hbs"),
        Choice::new("⚡ Express API", "express-api"),
        Choice::new("📦 Node.js CLI Tool", "node-cli"),
        Choice::new("🏗️ Basic Node.js", "basic-node"),
    ]);

    let confirm = |name: &str, message: &str| {
        let mut step = PromptStep::new(StepKind::Confirm, name, message);
        step.default = Some(json!(true));
        step
    };

    WorkflowConfig {
        version: default_version(),
        name: "Default MVP Generator Workflow".to_string(),
        description: Some("Standard project generation workflow".to_string()),
        steps: vec![
            template,
            confirm("typescript", "Add TypeScript support?"),
            confirm("esbuild", "Add ESBuild for fast compilation?"),
            confirm("npmInstall", "Install dependencies automatically?"),
        ],
        post_process: Some(PostProcess {
            update_package_json: true,
            install_dependencies: false,
            custom_scripts: Vec::new(),
        }),
    }
}

/// Default catalog of four TypeScript + ESBuild templates
pub fn create_default_templates_config() -> TemplatesConfig {
    let template = |path: &str, name: &str, description: &str, category: &str, priority: u32| {
        TemplateConfig {
            path: path.to_string(),
            name: name.to_string(),
            description: Some(description.to_string()),
            options: vec![TemplateOption::Ts, TemplateOption::Esbuild],
            category: Some(category.to_string()),
            priority,
            deprecated: false,
            experimental: false,
        }
    };

    TemplatesConfig {
        version: default_version(),
        templates: vec![
            template(
                "express-hbs",
                "Express + Handlebars",
                "Full-stack web application with Express and Handlebars",
                "web",
                100,
            ),
            template(
                "express-api",
                "Express API",
                "RESTful API server with Express",
                "api",
                90,
            ),
            template(
                "node-cli",
                "Node.js CLI Tool",
                "Command-line application template",
                "cli",
                80,
            ),
            template(
                "basic-node",
                "Basic Node.js",
                "Minimal Node.js project",
                "basic",
                70,
            ),
        ],
        default_options: Some(DefaultOptions::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{validate_templates, validate_workflow};
    use crate::prompts::FunctionRegistry;

    #[test]
    fn test_defaults_pass_their_own_schema() {
        let workflow = serde_json::to_value(create_default_workflow_config()).unwrap();
        let parsed = validate_workflow(&workflow, &FunctionRegistry::default()).unwrap();
        assert_eq!(parsed, create_default_workflow_config());

        let templates = serde_json::to_value(create_default_templates_config()).unwrap();
        let parsed = validate_templates(&templates).unwrap();
        assert_eq!(parsed, create_default_templates_config());
    }

    #[test]
    fn test_default_catalog_is_ts_esbuild() {
        let config = create_default_templates_config();
        assert_eq!(config.templates.len(), 4);
        for t in &config.templates {
            assert!(t.has_option(TemplateOption::Ts));
            assert!(t.has_option(TemplateOption::Esbuild));
        }
    }
}
