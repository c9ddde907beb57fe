//! MVP Gen - project generation from configurable workflows and templates

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use colored::Colorize;
use mvp_gen_core::cache::{format_size, CacheManager};
use mvp_gen_core::config::{ConfigResolver, ResolveRequest};
use mvp_gen_core::templates::package_templates;
use mvp_gen_core::{FunctionRegistry, InitOptions, ProductConfig, ProjectConfig, RemoteFetcher};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// MVP Gen product configuration
#[derive(Clone)]
pub struct MvpGenConfig;

impl ProductConfig for MvpGenConfig {
    fn name(&self) -> &'static str {
        "mvp-gen"
    }

    fn display_name(&self) -> &'static str {
        "MVP Gen"
    }

    fn repo_url_env(&self) -> &'static str {
        "MVP_GEN_REPO"
    }

    fn cache_dir_env(&self) -> &'static str {
        "MVP_GEN_CACHE_DIR"
    }

    fn templates_dir_env(&self) -> &'static str {
        "MVP_GEN_TEMPLATES_DIR"
    }

    fn cli_description(&self) -> &'static str {
        "MVP Template Generator - create projects quickly from configurable templates"
    }

    fn next_steps(&self, dir: &Path, project: &ProjectConfig, in_place: bool) -> Vec<String> {
        let mut steps = Vec::new();

        if !in_place {
            let name = dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| dir.display().to_string());
            steps.push(format!("cd {}", name));
        }

        if !project.npm_install {
            steps.push("npm install".to_string());
        }

        if project.typescript || project.esbuild {
            steps.push("npm run dev    # Start development server".to_string());
        } else {
            steps.push("npm start      # Start the application".to_string());
        }

        steps
    }
}

#[derive(Parser, Debug)]
#[command(name = "mvp-gen")]
#[command(about = MvpGenConfig.cli_description())]
#[command(version)]
pub struct Args {
    /// Show debug information
    #[arg(long, global = true)]
    pub debug: bool,

    /// Verbose output (same as --debug)
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new project from a template
    Init(InitArgs),
    /// Manage the repository cache
    #[command(subcommand)]
    Cache(CacheCommand),
    /// Build template zips and templates-index.json (for template authors)
    PackageTemplates(PackageArgs),
}

#[derive(ClapArgs, Debug)]
pub struct InitArgs {
    /// Project directory to create, or "." for the current directory
    pub project_name: String,

    /// Template to use
    #[arg(short, long)]
    pub template: Option<String>,

    /// Add TypeScript support (--typescript=false to disable)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub typescript: Option<bool>,

    /// Add ESBuild (--esbuild=false to disable)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub esbuild: Option<bool>,

    /// Install dependencies (--install=false to skip)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub install: Option<bool>,

    /// Unified configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Workflow configuration file
    #[arg(short, long)]
    pub workflow: Option<String>,

    /// Templates configuration file
    #[arg(long)]
    pub templates: Option<String>,

    /// Repository with configuration and templates
    #[arg(short, long)]
    pub repo: Option<String>,

    /// Repository branch
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Prefer local configuration files over the repository
    #[arg(long)]
    pub local: bool,

    /// Do not use the cached repository checkout
    #[arg(long)]
    pub no_cache: bool,

    /// Local templates directory
    #[arg(long = "templates-dir")]
    pub templates_dir: Option<PathBuf>,
}

impl From<InitArgs> for InitOptions {
    fn from(args: InitArgs) -> Self {
        InitOptions {
            project_name: args.project_name,
            template: args.template,
            typescript: args.typescript,
            esbuild: args.esbuild,
            install: args.install,
            config: args.config,
            workflow: args.workflow,
            templates: args.templates,
            repo: args.repo,
            branch: args.branch,
            prefer_local: args.local,
            no_cache: args.no_cache,
            templates_dir: args.templates_dir,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Show cache location, size and cached repositories
    Info,
    /// Remove the cache directory
    Clean {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Print the cache directory
    Path,
}

#[derive(ClapArgs, Debug)]
pub struct PackageArgs {
    /// Directory containing the template folders
    #[arg(long = "templates-dir", default_value = "templates")]
    pub templates_dir: PathBuf,

    /// Templates configuration file (discovered when omitted)
    #[arg(long)]
    pub templates: Option<String>,
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn cache_info(cache: &CacheManager) -> Result<()> {
    let info = cache.info()?;

    println!("{}", "Cache information".cyan().bold());
    println!("  {} {}", "Directory:".dimmed(), info.dir.display());
    println!(
        "  {} {}",
        "Exists:".dimmed(),
        if info.exists { "yes".green() } else { "no".yellow() }
    );
    if info.exists {
        println!("  {} {}", "Size:".dimmed(), info.size_display());
        println!("  {} {}", "Repositories:".dimmed(), info.repositories.len());
        for repo in &info.repositories {
            println!("    {} {}", "->".blue(), repo);
        }
    }
    Ok(())
}

fn cache_clean(cache: &CacheManager, force: bool) -> Result<()> {
    if !force {
        let confirm: bool = cliclack::confirm(format!("Remove {}?", cache.root().display()))
            .initial_value(false)
            .interact()?;
        if !confirm {
            println!("{}", "Cancelled".yellow());
            return Ok(());
        }
    }

    if cache.clean()? {
        println!("{} {}", "Removed".green().bold(), cache.root().display());
    } else {
        println!("{}", "Cache is already empty".dimmed());
    }
    Ok(())
}

async fn package(args: PackageArgs) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    let fetcher = RemoteFetcher::new(MvpGenConfig.user_agent());
    let registry = FunctionRegistry::default();
    let resolver = ConfigResolver::new(&fetcher, &registry, cwd);
    let request = ResolveRequest {
        templates_path: args.templates,
        prefer_local: true,
        ..ResolveRequest::default()
    };
    let templates = resolver
        .load_templates(&request)
        .await
        .context("Failed to load templates configuration")?;

    println!(
        "{}",
        format!("Packaging templates from {}...", templates.origin)
            .cyan()
            .bold()
    );

    let summary = package_templates(&args.templates_dir, &templates.value)?;
    println!();
    for (path, size) in &summary.packaged {
        println!(
            "  {} {}.zip ({})",
            "->".blue(),
            path,
            format_size(*size as u64)
        );
    }
    for path in &summary.skipped {
        println!("  {} {} (directory not found)", "skipped".yellow(), path);
    }
    println!();
    println!(
        "{} {} template zip(s), index written to {}",
        "Built".green().bold(),
        summary.packaged.len(),
        summary.index_path.display()
    );
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let config = MvpGenConfig;

    match args.command {
        Command::Init(init_args) => {
            let result = mvp_gen_core::run_init(&config, init_args.into()).await;

            // Ensure cursor is visible on normal exit
            let _ = console::Term::stderr().show_cursor();

            result
        }
        Command::Cache(cache_command) => {
            let cache = CacheManager::discover(&config);
            match cache_command {
                CacheCommand::Info => cache_info(&cache),
                CacheCommand::Clean { force } => cache_clean(&cache, force),
                CacheCommand::Path => {
                    println!("{}", cache.root().display());
                    Ok(())
                }
            }
        }
        Command::PackageTemplates(package_args) => package(package_args).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    let args = Args::parse();
    let debug = args.debug || args.verbose;
    init_tracing(debug);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            if debug {
                for cause in e.chain().skip(1) {
                    eprintln!("  {} {}", "caused by:".dimmed(), cause);
                }
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_about_comes_from_product_config() {
        let about = Args::command().get_about().map(|a| a.to_string());
        assert_eq!(about.as_deref(), Some(MvpGenConfig.cli_description()));
    }

    #[test]
    fn test_init_flags() {
        let args = Args::parse_from([
            "mvp-gen",
            "init",
            "my-app",
            "--template",
            "express-api",
            "--typescript",
            "--esbuild=false",
            "--repo",
            "https://github.com/acme/templates",
            "--local",
        ]);
        let Command::Init(init) = args.command else {
            panic!("expected init");
        };
        let options: InitOptions = init.into();
        assert_eq!(options.project_name, "my-app");
        assert_eq!(options.typescript, Some(true));
        assert_eq!(options.esbuild, Some(false));
        assert_eq!(options.install, None);
        assert!(options.prefer_local);
        assert!(!options.no_cache);
    }

    #[test]
    fn test_cache_clean_force() {
        let args = Args::parse_from(["mvp-gen", "cache", "clean", "--force"]);
        assert!(matches!(
            args.command,
            Command::Cache(CacheCommand::Clean { force: true })
        ));
    }

    #[test]
    fn test_next_steps() {
        let project = ProjectConfig {
            typescript: true,
            esbuild: true,
            npm_install: false,
        };
        let steps = MvpGenConfig.next_steps(Path::new("/tmp/my-app"), &project, false);
        assert_eq!(steps[0], "cd my-app");
        assert_eq!(steps[1], "npm install");
        assert!(steps[2].starts_with("npm run dev"));

        let installed = ProjectConfig {
            npm_install: true,
            ..ProjectConfig::default()
        };
        let steps = MvpGenConfig.next_steps(Path::new("/tmp/my-app"), &installed, true);
        assert_eq!(steps.len(), 1);
        assert!(steps[0].starts_with("npm start"));
    }
}
