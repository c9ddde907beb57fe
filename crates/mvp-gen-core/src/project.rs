//! Target directory checks and generated project customization

use crate::config::{TemplateConfig, TemplateOption};
use crate::error::{Error, Result};
use crate::prompts::PromptAnswers;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use tokio::process::Command as TokioCommand;
use tracing::{debug, info};

/// Files tolerated in a directory initialized in place
pub const ALLOWED_EXISTING_FILES: &[&str] = &[
    ".git",
    ".gitignore",
    "README.md",
    ".DS_Store",
    "Thumbs.db",
    "mvp-gen.yml",
    "mvp-gen.yaml",
    ".mvp-gen.yml",
    ".mvp-gen.yaml",
    "templates.json",
    ".templates.json",
];

/// Final project settings after prompting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectConfig {
    pub typescript: bool,
    pub esbuild: bool,
    pub npm_install: bool,
}

impl ProjectConfig {
    /// The catalog entry's options decide TypeScript/ESBuild; answers are only
    /// consulted when the selected template is not in the catalog
    pub fn derive(template: Option<&TemplateConfig>, answers: &PromptAnswers) -> Self {
        let answered = |key: &str| answers.get(key).and_then(Value::as_bool).unwrap_or(false);
        let (typescript, esbuild) = match template {
            Some(t) => (t.has_option(TemplateOption::Ts), t.has_option(TemplateOption::Esbuild)),
            None => (answered("typescript"), answered("esbuild")),
        };
        Self {
            typescript,
            esbuild,
            npm_install: answered("npmInstall"),
        }
    }
}

/// Where the project is generated
#[derive(Debug, Clone)]
pub struct TargetDir {
    pub path: PathBuf,
    pub project_name: String,
    /// Generating into the current directory rather than a new one
    pub in_place: bool,
}

pub fn is_in_place(name: &str) -> bool {
    name == "." || name == "./"
}

/// Check the target directory before anything is written
pub fn prepare_target(name: &str, cwd: &Path) -> Result<TargetDir> {
    if is_in_place(name) {
        let mut files: Vec<String> = std::fs::read_dir(cwd)?
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|f| !ALLOWED_EXISTING_FILES.contains(&f.as_str()))
            .collect();
        if !files.is_empty() {
            files.sort();
            return Err(Error::DirectoryNotEmpty { files });
        }

        let project_name = cwd
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string());
        return Ok(TargetDir {
            path: cwd.to_path_buf(),
            project_name,
            in_place: true,
        });
    }

    let path = cwd.join(name);
    if path.exists() {
        return Err(Error::DirectoryAlreadyExists { path });
    }
    Ok(TargetDir {
        path,
        project_name: name.to_string(),
        in_place: false,
    })
}

/// Folder name used by templates laid out as `<ts|js>-<esbuild|default>-<template>`
pub fn legacy_template_name(template: &str, project: &ProjectConfig) -> String {
    format!(
        "{}-{}-{}",
        if project.typescript { "ts" } else { "js" },
        if project.esbuild { "esbuild" } else { "default" },
        template
    )
}

fn merge(manifest: &mut Map<String, Value>, section: &str, entries: &[(&str, &str)]) {
    let slot = manifest
        .entry(section)
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(map) = slot {
        for (key, value) in entries {
            map.insert(key.to_string(), json!(value));
        }
    }
}

/// Patch `package.json`: project name plus TypeScript/ESBuild tooling
///
/// Returns false when the template ships no manifest.
pub async fn update_package_json(dir: &Path, name: &str, project: &ProjectConfig) -> Result<bool> {
    let path = dir.join("package.json");
    if !path.is_file() {
        debug!("No package.json in {}, skipping update", dir.display());
        return Ok(false);
    }

    let content = tokio::fs::read_to_string(&path).await?;
    let mut manifest: Map<String, Value> = serde_json::from_str(&content)?;

    manifest.insert("name".to_string(), json!(name));

    if project.typescript {
        merge(
            &mut manifest,
            "devDependencies",
            &[
                ("typescript", "^5.0.0"),
                ("@types/node", "^20.0.0"),
                ("ts-node", "^10.9.0"),
            ],
        );
        merge(
            &mut manifest,
            "scripts",
            &[("build", "tsc"), ("dev", "ts-node src/index.ts")],
        );
    }

    if project.esbuild {
        merge(&mut manifest, "devDependencies", &[("esbuild", "^0.19.0")]);
        merge(
            &mut manifest,
            "scripts",
            &[(
                "build:fast",
                "esbuild src/index.ts --bundle --platform=node --outfile=dist/index.js",
            )],
        );
    }

    let mut out = serde_json::to_string_pretty(&manifest)?;
    out.push('\n');
    tokio::fs::write(&path, out).await?;
    Ok(true)
}

/// Run `npm install` in the project directory
pub async fn install_dependencies(dir: &Path) -> Result<()> {
    let npm = if cfg!(windows) { "npm.cmd" } else { "npm" };
    info!("Running {} install in {}", npm, dir.display());

    let status = TokioCommand::new(npm)
        .arg("install")
        .current_dir(dir)
        .status()
        .await?;

    if !status.success() {
        return Err(Error::PostProcessScriptFailed {
            script: "npm install".to_string(),
            code: status.code(),
        });
    }
    Ok(())
}
