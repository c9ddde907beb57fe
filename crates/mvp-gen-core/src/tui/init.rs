//! The `init` pipeline: configuration, answers, acquisition, customization

use super::prompts::ClackPrompts;
use crate::cache::CacheManager;
use crate::config::{
    create_default_workflow_config, find_template, ConfigResolver, ResolveRequest, ResolvedConfig,
    TemplatesConfig, WorkflowConfig,
};
use crate::product::ProductConfig;
use crate::project::{
    install_dependencies, legacy_template_name, prepare_target, update_package_json,
    ProjectConfig, TargetDir,
};
use crate::error::Error;
use crate::prompts::{
    run_post_process, FunctionRegistry, PromptAnswers, PromptBackend, PromptEngine, TEMPLATE_STEP,
};
use crate::remote::{RemoteFetcher, DEFAULT_BRANCH};
use crate::templates::{
    locate_templates_root, plan_sources, TemplateAcquirer, TemplateRequest, TemplateSource,
};
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;

/// Settings for one `init` run
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Directory name to create, or `.` for the current directory
    pub project_name: String,

    /// Template name or path (skips the template prompt)
    pub template: Option<String>,
    pub typescript: Option<bool>,
    pub esbuild: Option<bool>,
    pub install: Option<bool>,

    /// Unified configuration file (not supported; discovery is used instead)
    pub config: Option<String>,
    pub workflow: Option<String>,
    pub templates: Option<String>,

    /// Repository holding configuration and templates
    pub repo: Option<String>,
    pub branch: Option<String>,

    /// Check local configuration files before the repository
    pub prefer_local: bool,

    /// Skip the cached repository checkout
    pub no_cache: bool,

    /// Local templates root
    pub templates_dir: Option<PathBuf>,
}

impl InitOptions {
    /// Any answer given as a flag switches to non-interactive mode
    pub fn has_answer_flags(&self) -> bool {
        self.template.is_some()
            || self.typescript.is_some()
            || self.esbuild.is_some()
            || self.install.is_some()
    }

    fn flag_answers(&self) -> PromptAnswers {
        let mut answers = PromptAnswers::new();
        if let Some(template) = &self.template {
            answers.insert(TEMPLATE_STEP.to_string(), Value::String(template.clone()));
        }
        for (key, flag) in [
            ("typescript", self.typescript),
            ("esbuild", self.esbuild),
            ("npmInstall", self.install),
        ] {
            if let Some(value) = flag {
                answers.insert(key.to_string(), Value::Bool(value));
            }
        }
        answers
    }
}

/// Generate a project with interactive prompts
pub async fn run_init<C: ProductConfig>(config: &C, options: InitOptions) -> Result<()> {
    cliclack::intro(config.display_name())?;

    // Step 1: Check the target before anything is written
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    let target = prepare_target(&options.project_name, &cwd)?;

    let repo = config.resolve_repo(options.repo.as_deref());
    let branch = options
        .branch
        .clone()
        .unwrap_or_else(|| DEFAULT_BRANCH.to_string());

    // Step 2: Resolve configuration
    if options.config.is_some() {
        cliclack::log::warning(
            "Unified config files are not supported yet. Using workflow and templates separately.",
        )?;
    }
    let fetcher = RemoteFetcher::new(config.user_agent());
    let registry = FunctionRegistry::default();
    let resolved = load_configuration(&fetcher, &registry, &cwd, &options, repo.clone(), &branch).await;
    let workflow = &resolved.workflow.value;
    let templates = &resolved.templates.value;

    // Step 3: Collect answers
    let answers = collect_answers(&registry, workflow, templates, &options, &mut ClackPrompts)?;
    let template_name = answers
        .get(TEMPLATE_STEP)
        .and_then(Value::as_str)
        .map(str::to_string)
        .context("No template was selected")?;

    // Step 4: Settle the project configuration
    let selected = find_template(templates, &template_name);
    let project = ProjectConfig::derive(selected, &answers);
    match selected {
        Some(t) => debug!(
            "Selected template: {} ({}), options: {:?}",
            t.name, t.path, t.options
        ),
        None => debug!("Template '{}' not in catalog, using fallback name", template_name),
    }
    debug!("Project configuration: {:?}", project);

    // Step 5: Create the project
    let locator = selected
        .map(|t| t.path.clone())
        .unwrap_or_else(|| legacy_template_name(&template_name, &project));
    let request = TemplateRequest::new(locator).with_legacy_name(template_name.as_str());

    let env_dir = std::env::var(config.templates_dir_env()).ok();
    let local_root = locate_templates_root(options.templates_dir.as_deref(), env_dir.as_deref(), &cwd);
    let sources = plan_sources(repo.as_deref(), &branch, local_root, !options.no_cache);
    debug!("Template sources: {:?}", sources);

    let cache = CacheManager::discover(config);
    let acquirer = TemplateAcquirer::new(&cache, &fetcher);
    create_project(&acquirer, &target, &sources, &request, &project, workflow).await?;

    // Step 6: Dependencies and post-processing never fail the run
    let install_requested = project.npm_install
        || workflow
            .post_process
            .as_ref()
            .is_some_and(|p| p.install_dependencies);
    if install_requested {
        cliclack::log::step("Installing dependencies...")?;
        match install_dependencies(&target.path).await {
            Ok(()) => cliclack::log::success("Dependencies installed")?,
            Err(e) => cliclack::log::warning(format!("Dependency installation failed: {}", e))?,
        }
    }

    if let Err(e) = run_post_process(workflow, &answers, &target.path).await {
        cliclack::log::warning(format!("Post-processing failed: {}", e))?;
    }

    // Step 7: Show next steps
    print_next_steps(config, &target, &project)?;

    Ok(())
}

async fn load_configuration(
    fetcher: &RemoteFetcher,
    registry: &FunctionRegistry,
    cwd: &std::path::Path,
    options: &InitOptions,
    repo: Option<String>,
    branch: &str,
) -> ResolvedConfig {
    let spinner = cliclack::spinner();
    spinner.start("Loading configuration...");

    let request = ResolveRequest {
        workflow_path: options.workflow.clone(),
        templates_path: options.templates.clone(),
        repo,
        branch: Some(branch.to_string()),
        prefer_local: options.prefer_local,
    };
    let resolver = ConfigResolver::new(fetcher, registry, cwd.to_path_buf());
    let resolved = resolver.resolve(&request).await;

    spinner.stop(format!(
        "Workflow: {} | Templates: {}",
        resolved.workflow.origin, resolved.templates.origin
    ));
    resolved
}

fn collect_answers(
    registry: &FunctionRegistry,
    workflow: &WorkflowConfig,
    templates: &TemplatesConfig,
    options: &InitOptions,
    backend: &mut dyn PromptBackend,
) -> Result<PromptAnswers> {
    if options.has_answer_flags() {
        cliclack::log::info("Using CLI options (non-interactive mode)")?;
        let mut answers = options.flag_answers();
        let engine = PromptEngine::new(registry);
        for step in &create_default_workflow_config().steps {
            if answers.contains_key(&step.name) {
                continue;
            }
            if let Some(answer) = engine.run_step(step, &answers, backend)? {
                answers.insert(step.name.clone(), answer);
            }
        }
        return Ok(answers);
    }

    let engine = PromptEngine::new(registry).with_templates(templates);
    match engine.run(workflow, backend) {
        Ok(answers) => Ok(answers),
        Err(Error::Cancelled) => Err(Error::Cancelled.into()),
        Err(e) => {
            cliclack::log::warning(format!("Workflow execution failed: {}", e))?;
            cliclack::log::remark("Falling back to default prompts...")?;
            Ok(PromptEngine::new(registry).run(&create_default_workflow_config(), backend)?)
        }
    }
}

async fn create_project(
    acquirer: &TemplateAcquirer<'_>,
    target: &TargetDir,
    sources: &[TemplateSource],
    request: &TemplateRequest,
    project: &ProjectConfig,
    workflow: &WorkflowConfig,
) -> Result<()> {
    let spinner = cliclack::spinner();
    spinner.start("Creating project...");

    if !target.in_place {
        std::fs::create_dir_all(&target.path)
            .with_context(|| format!("Failed to create directory: {}", target.path.display()))?;
    }

    let source = match acquirer.acquire_any(sources, request, &target.path).await {
        Ok(source) => source,
        Err(e) => {
            spinner.error("Failed to create project");
            if sources.iter().all(|s| matches!(s, TemplateSource::Local(_))) {
                cliclack::log::remark("Use --repo or --templates-dir to point at your templates")?;
            }
            return Err(e.into());
        }
    };

    let patch_manifest = workflow
        .post_process
        .as_ref()
        .map_or(true, |p| p.update_package_json);
    if patch_manifest {
        spinner.set_message("Updating configuration...");
        update_package_json(&target.path, &target.project_name, project)
            .await
            .context("Failed to update package.json")?;
    }

    spinner.stop(format!(
        "Project \"{}\" created from {}",
        target.project_name, source
    ));
    Ok(())
}

fn print_next_steps<C: ProductConfig>(config: &C, target: &TargetDir, project: &ProjectConfig) -> Result<()> {
    let steps = config.next_steps(&target.path, project, target.in_place);

    println!();
    println!("  Next steps");
    println!();

    for (i, step) in steps.iter().enumerate() {
        println!("  {}.  {}", i + 1, step);
    }

    cliclack::outro("Happy coding!")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::create_default_templates_config;
    use crate::prompts::Question;
    use serde_json::json;

    /// Cancels at the first prompt
    struct CancelFirst {
        asked: usize,
    }

    impl PromptBackend for CancelFirst {
        fn ask(&mut self, _question: &Question<'_>) -> crate::error::Result<Value> {
            self.asked += 1;
            Err(Error::Cancelled)
        }
    }

    #[test]
    fn test_cancel_does_not_fall_back_to_default_prompts() {
        let registry = FunctionRegistry::default();
        let workflow = create_default_workflow_config();
        let templates = create_default_templates_config();
        let options = InitOptions {
            project_name: "demo".to_string(),
            ..InitOptions::default()
        };
        let mut backend = CancelFirst { asked: 0 };

        let err = collect_answers(&registry, &workflow, &templates, &options, &mut backend)
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Cancelled)));
        assert_eq!(backend.asked, 1);
    }

    #[test]
    fn test_flag_answers() {
        let options = InitOptions {
            project_name: "demo".to_string(),
            template: Some("express-api".to_string()),
            esbuild: Some(false),
            ..InitOptions::default()
        };
        assert!(options.has_answer_flags());

        let answers = options.flag_answers();
        assert_eq!(answers.get("template"), Some(&json!("express-api")));
        assert_eq!(answers.get("esbuild"), Some(&json!(false)));
        assert!(!answers.contains_key("typescript"));
        assert!(!answers.contains_key("npmInstall"));
    }

    #[test]
    fn test_no_flags_is_interactive() {
        let options = InitOptions {
            project_name: "demo".to_string(),
            repo: Some("https://github.com/acme/templates".to_string()),
            ..InitOptions::default()
        };
        assert!(!options.has_answer_flags());
    }
}
