//! Custom scripts declared in a workflow's `postProcess` section

use super::PromptAnswers;
use crate::config::WorkflowConfig;
use crate::error::{Error, Result};
use serde_json::Value;
use std::path::Path;
use tokio::process::Command as TokioCommand;
use tracing::{debug, info};

/// Answers as environment variables; strings are passed as-is, everything
/// else as its JSON text
pub fn answer_env(answers: &PromptAnswers) -> Vec<(String, String)> {
    answers
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect()
}

fn shell_command(script: &str) -> TokioCommand {
    if cfg!(windows) {
        let mut cmd = TokioCommand::new("cmd");
        cmd.arg("/C").arg(script);
        cmd
    } else {
        let mut cmd = TokioCommand::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }
}

/// Run each custom script in order inside `target_dir`
///
/// The first script that exits unsuccessfully stops the run.
pub async fn run_post_process(
    workflow: &WorkflowConfig,
    answers: &PromptAnswers,
    target_dir: &Path,
) -> Result<()> {
    let scripts = match &workflow.post_process {
        Some(post) if !post.custom_scripts.is_empty() => &post.custom_scripts,
        _ => return Ok(()),
    };

    let env = answer_env(answers);
    for script in scripts {
        info!("Running post-process script: {}", script);
        let status = shell_command(script)
            .current_dir(target_dir)
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .status()
            .await?;

        if !status.success() {
            return Err(Error::PostProcessScriptFailed {
                script: script.clone(),
                code: status.code(),
            });
        }
        debug!("Script finished: {}", script);
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::PostProcess;
    use serde_json::json;
    use tempfile::TempDir;

    fn workflow(scripts: &[&str]) -> WorkflowConfig {
        let mut workflow = crate::config::create_default_workflow_config();
        workflow.post_process = Some(PostProcess {
            update_package_json: true,
            install_dependencies: false,
            custom_scripts: scripts.iter().map(|s| s.to_string()).collect(),
        });
        workflow
    }

    #[test]
    fn test_answer_env_stringifies() {
        let mut answers = PromptAnswers::new();
        answers.insert("projectName".to_string(), json!("demo"));
        answers.insert("typescript".to_string(), json!(true));
        answers.insert("features".to_string(), json!(["auth"]));
        let env = answer_env(&answers);
        assert!(env.contains(&("projectName".to_string(), "demo".to_string())));
        assert!(env.contains(&("typescript".to_string(), "true".to_string())));
        assert!(env.contains(&("features".to_string(), "[\"auth\"]".to_string())));
    }

    #[tokio::test]
    async fn test_scripts_see_answers_and_run_in_target() {
        let dir = TempDir::new().unwrap();
        let mut answers = PromptAnswers::new();
        answers.insert("projectName".to_string(), json!("demo"));
        answers.insert("typescript".to_string(), json!(true));

        run_post_process(
            &workflow(&["echo \"$projectName-$typescript\" > out.txt"]),
            &answers,
            dir.path(),
        )
        .await
        .unwrap();

        let out = std::fs::read_to_string(dir.path().join("out.txt")).unwrap();
        assert_eq!(out.trim(), "demo-true");
    }

    #[tokio::test]
    async fn test_failure_stops_remaining_scripts() {
        let dir = TempDir::new().unwrap();
        let err = run_post_process(
            &workflow(&["exit 3", "touch never.txt"]),
            &PromptAnswers::new(),
            dir.path(),
        )
        .await
        .unwrap_err();

        match err {
            Error::PostProcessScriptFailed { script, code } => {
                assert_eq!(script, "exit 3");
                assert_eq!(code, Some(3));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!dir.path().join("never.txt").exists());
    }

    #[tokio::test]
    async fn test_no_scripts_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut workflow = crate::config::create_default_workflow_config();
        workflow.post_process = None;
        run_post_process(&workflow, &PromptAnswers::new(), dir.path())
            .await
            .unwrap();
    }
}
