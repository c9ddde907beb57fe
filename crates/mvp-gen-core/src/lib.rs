//! MVP Gen Core - library behind the `mvp-gen` project generator
//!
//! A project is generated in one linear pipeline: resolve the workflow and
//! templates documents, collect answers, acquire the chosen template, patch
//! its `package.json`, then run post-processing scripts.
//!
//! # Architecture
//!
//! - **Configuration** - `config`: schema validation, discovery of local and
//!   remote documents, built-in defaults, template catalog helpers
//! - **Acquisition** - `remote`, `cache`, `templates`: raw downloads from the
//!   hosting provider, cached checkouts, archive extraction, local copies
//! - **Prompting** - `prompts`: the declarative step engine, its function
//!   registry and post-processing
//! - **CLI/TUI** - `tui` (feature-gated): cliclack prompt backend and the
//!   `init` orchestration
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based prompts and `init` pipeline
//!
//! # Example Usage (without TUI)
//!
//! ```ignore
//! use mvp_gen_core::{config::ConfigResolver, FunctionRegistry, RemoteFetcher};
//!
//! let fetcher = RemoteFetcher::new("my-tool");
//! let registry = FunctionRegistry::default();
//! let resolver = ConfigResolver::new(&fetcher, &registry, std::env::current_dir()?);
//! let resolved = resolver.resolve(&Default::default()).await;
//! println!("{} steps", resolved.workflow.value.steps.len());
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod product;
pub mod project;
pub mod prompts;
pub mod remote;
pub mod templates;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use cache::{CacheInfo, CacheManager};
pub use config::{
    ConfigOrigin, ConfigResolver, ResolveRequest, TemplateConfig, TemplatesConfig, WorkflowConfig,
};
pub use error::{Error, FieldError, Result};
pub use product::ProductConfig;
pub use project::ProjectConfig;
pub use prompts::{FunctionRegistry, PromptAnswers, PromptBackend, PromptEngine};
pub use remote::RemoteFetcher;
pub use templates::{TemplateAcquirer, TemplateRequest, TemplateSource};

#[cfg(feature = "tui")]
pub use tui::{run_init, InitOptions};
