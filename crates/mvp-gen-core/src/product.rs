//! Product configuration trait for the CLI binary
//!
//! This trait defines the identity and environment hooks the scaffolding
//! pipeline needs, so the core never hard-codes a product name.

use crate::project::ProjectConfig;
use std::path::Path;

/// Configuration trait for a scaffolding CLI product
///
/// Implementors define:
/// - Product identity (name, display name)
/// - Default template repository
/// - Environment variable names for overrides
/// - Post-setup instructions
pub trait ProductConfig: Clone + Send + Sync + 'static {
    /// Internal product name (used for cache directory, env vars)
    fn name(&self) -> &'static str;

    /// Human-readable display name
    fn display_name(&self) -> &'static str;

    /// Repository used for configuration and templates when `--repo` is absent
    fn default_repo_url(&self) -> Option<&'static str> {
        None
    }

    /// Environment variable name for overriding the repository URL
    fn repo_url_env(&self) -> &'static str;

    /// Environment variable name for overriding the cache directory
    fn cache_dir_env(&self) -> &'static str;

    /// Environment variable name for overriding the local templates directory
    fn templates_dir_env(&self) -> &'static str;

    /// CLI description shown in help text
    fn cli_description(&self) -> &'static str;

    /// Generate the "next steps" instructions after project creation
    fn next_steps(&self, dir: &Path, project: &ProjectConfig, in_place: bool) -> Vec<String>;

    /// User agent string for HTTP requests
    fn user_agent(&self) -> &'static str {
        self.name()
    }

    /// Resolve the repository reference: explicit value, then env override, then default
    fn resolve_repo(&self, explicit: Option<&str>) -> Option<String> {
        explicit
            .map(str::to_string)
            .or_else(|| std::env::var(self.repo_url_env()).ok().filter(|v| !v.is_empty()))
            .or_else(|| self.default_repo_url().map(str::to_string))
    }
}
