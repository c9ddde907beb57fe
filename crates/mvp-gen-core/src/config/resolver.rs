//! Discovery and loading of configuration documents
//!
//! Each document kind is resolved independently:
//! - an explicit path is loaded as-is (repository-relative when a supported
//!   repository is given, otherwise a local file), with no fallback
//! - otherwise a fixed list of candidate paths is probed, remote first unless
//!   `prefer_local` is set, falling back to the other side
//!
//! `resolve` never fails: a kind that cannot be loaded is replaced by its
//! built-in default and the reason is logged.

use super::schema::{validate_templates, validate_workflow, SchemaKind};
use super::version::check_compatibility;
use super::{create_default_templates_config, create_default_workflow_config};
use super::{TemplatesConfig, WorkflowConfig};
use crate::error::{Error, Result};
use crate::prompts::FunctionRegistry;
use crate::remote::{self, RemoteFetcher, DEFAULT_BRANCH};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Candidate workflow document paths, in probe order
pub const WORKFLOW_CANDIDATES: &[&str] = &[
    "mvp-gen.yml",
    "mvp-gen.yaml",
    ".mvp-gen.yml",
    ".mvp-gen.yaml",
    "config/workflow.yml",
    "config/workflow.yaml",
];

/// Candidate templates document paths, in probe order
pub const TEMPLATES_CANDIDATES: &[&str] = &[
    "templates.json",
    ".templates.json",
    "config/templates.json",
    "templates/config.json",
];

impl SchemaKind {
    pub fn candidates(&self) -> &'static [&'static str] {
        match self {
            SchemaKind::Workflow => WORKFLOW_CANDIDATES,
            SchemaKind::Templates => TEMPLATES_CANDIDATES,
        }
    }
}

/// Inputs of one resolution run
#[derive(Debug, Clone, Default)]
pub struct ResolveRequest {
    pub workflow_path: Option<String>,
    pub templates_path: Option<String>,
    pub repo: Option<String>,
    pub branch: Option<String>,
    pub prefer_local: bool,
}

impl ResolveRequest {
    fn branch(&self) -> &str {
        self.branch.as_deref().unwrap_or(DEFAULT_BRANCH)
    }

    /// Repository usable for raw downloads
    fn remote_repo(&self) -> Option<&str> {
        self.repo.as_deref().filter(|r| remote::is_supported_host(r))
    }
}

/// Where a loaded document came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    Local(PathBuf),
    Remote(String),
    BuiltIn,
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigOrigin::Local(path) => write!(f, "{}", path.display()),
            ConfigOrigin::Remote(url) => write!(f, "{}", url),
            ConfigOrigin::BuiltIn => write!(f, "built-in defaults"),
        }
    }
}

/// A document together with its origin
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    pub value: T,
    pub origin: ConfigOrigin,
}

/// Both documents, defaults substituted where loading failed
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub workflow: Loaded<WorkflowConfig>,
    pub templates: Loaded<TemplatesConfig>,
}

/// Locates, parses and validates configuration documents
pub struct ConfigResolver<'a> {
    fetcher: &'a RemoteFetcher,
    registry: &'a FunctionRegistry,
    root_dir: PathBuf,
}

impl<'a> ConfigResolver<'a> {
    /// `root_dir` anchors local candidate paths (normally the working directory)
    pub fn new(fetcher: &'a RemoteFetcher, registry: &'a FunctionRegistry, root_dir: PathBuf) -> Self {
        Self {
            fetcher,
            registry,
            root_dir,
        }
    }

    /// Load both documents, falling back to built-in defaults per kind
    pub async fn resolve(&self, request: &ResolveRequest) -> ResolvedConfig {
        let workflow = match self.load_workflow(request).await {
            Ok(loaded) => {
                info!("Loaded workflow config: {}", loaded.origin);
                loaded
            }
            Err(e @ Error::ConfigNotFound { .. }) => {
                info!("{}, using built-in defaults", e);
                Loaded {
                    value: create_default_workflow_config(),
                    origin: ConfigOrigin::BuiltIn,
                }
            }
            Err(e) => {
                warn!("Failed to load workflow config: {}", e);
                Loaded {
                    value: create_default_workflow_config(),
                    origin: ConfigOrigin::BuiltIn,
                }
            }
        };

        let templates = match self.load_templates(request).await {
            Ok(loaded) => {
                info!("Loaded templates config: {}", loaded.origin);
                loaded
            }
            Err(e @ Error::ConfigNotFound { .. }) => {
                info!("{}, using built-in defaults", e);
                Loaded {
                    value: create_default_templates_config(),
                    origin: ConfigOrigin::BuiltIn,
                }
            }
            Err(e) => {
                warn!("Failed to load templates config: {}", e);
                Loaded {
                    value: create_default_templates_config(),
                    origin: ConfigOrigin::BuiltIn,
                }
            }
        };

        ResolvedConfig {
            workflow,
            templates,
        }
    }

    /// Locate and validate the workflow document
    pub async fn load_workflow(&self, request: &ResolveRequest) -> Result<Loaded<WorkflowConfig>> {
        let kind = SchemaKind::Workflow;
        let (document, origin) = self
            .locate(kind, request.workflow_path.as_deref(), request)
            .await?;
        let value = validate_workflow(&document, self.registry)
            .map_err(|errors| Error::validation(kind.label(), errors))?;
        warn_on_version(kind, &value.version);
        Ok(Loaded { value, origin })
    }

    /// Locate and validate the templates document
    pub async fn load_templates(&self, request: &ResolveRequest) -> Result<Loaded<TemplatesConfig>> {
        let kind = SchemaKind::Templates;
        let (document, origin) = self
            .locate(kind, request.templates_path.as_deref(), request)
            .await?;
        let value =
            validate_templates(&document).map_err(|errors| Error::validation(kind.label(), errors))?;
        warn_on_version(kind, &value.version);
        Ok(Loaded { value, origin })
    }

    async fn locate(
        &self,
        kind: SchemaKind,
        explicit: Option<&str>,
        request: &ResolveRequest,
    ) -> Result<(Value, ConfigOrigin)> {
        let (text, origin) = match explicit {
            Some(path) => self.load_explicit(kind, path, request).await?,
            None => self.discover(kind, request).await?,
        };

        let document = kind.parse(&text).map_err(|message| Error::ConfigParseFailed {
            kind: kind.label(),
            location: origin.to_string(),
            message,
        })?;
        Ok((document, origin))
    }

    async fn load_explicit(
        &self,
        kind: SchemaKind,
        path: &str,
        request: &ResolveRequest,
    ) -> Result<(String, ConfigOrigin)> {
        if let Some(repo) = request.remote_repo() {
            let url = self
                .fetcher
                .raw_url(repo, path, request.branch())
                .unwrap_or_else(|| path.to_string());
            return match self.fetcher.fetch_raw(repo, path, request.branch()).await {
                Some(text) => Ok((text, ConfigOrigin::Remote(url))),
                None => Err(Error::ConfigNotFound {
                    kind: kind.label(),
                    location: url,
                }),
            };
        }

        let full_path = self.root_dir.join(path);
        if !is_file(&full_path).await {
            return Err(Error::ConfigNotFound {
                kind: kind.label(),
                location: full_path.display().to_string(),
            });
        }
        let text = fs::read_to_string(&full_path).await?;
        Ok((text, ConfigOrigin::Local(full_path)))
    }

    async fn discover(&self, kind: SchemaKind, request: &ResolveRequest) -> Result<(String, ConfigOrigin)> {
        let candidates = kind.candidates();
        debug!(
            "Discovering {} config (prefer_local: {}) among {:?}",
            kind, request.prefer_local, candidates
        );

        let found = if request.prefer_local {
            match self.discover_local(candidates).await? {
                Some(found) => Some(found),
                None => self.discover_remote(candidates, request).await,
            }
        } else {
            match self.discover_remote(candidates, request).await {
                Some(found) => Some(found),
                None => self.discover_local(candidates).await?,
            }
        };

        found.ok_or_else(|| Error::ConfigNotFound {
            kind: kind.label(),
            location: format!("{} (and repository candidates)", self.root_dir.display()),
        })
    }

    async fn discover_local(&self, candidates: &[&str]) -> Result<Option<(String, ConfigOrigin)>> {
        for candidate in candidates {
            let path = self.root_dir.join(candidate);
            if is_file(&path).await {
                debug!("Found local config: {}", path.display());
                let text = fs::read_to_string(&path).await?;
                return Ok(Some((text, ConfigOrigin::Local(path))));
            }
        }
        Ok(None)
    }

    async fn discover_remote(
        &self,
        candidates: &[&str],
        request: &ResolveRequest,
    ) -> Option<(String, ConfigOrigin)> {
        let repo = request.remote_repo()?;
        let branch = request.branch();
        let mut results = self.fetcher.fetch_many_raw(repo, candidates, branch).await;

        // First hit in candidate order, not in completion order
        candidates.iter().find_map(|candidate| {
            let text = results.remove(*candidate).flatten()?;
            let url = self.fetcher.raw_url(repo, candidate, branch)?;
            debug!("Found remote config: {}", url);
            Some((text, ConfigOrigin::Remote(url)))
        })
    }
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
}

fn warn_on_version(kind: SchemaKind, version: &str) {
    if let Some(warning) = check_compatibility(kind.label(), version) {
        warn!("{}", warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const WORKFLOW_YAML: &str = "name: Local Flow\nsteps:\n  - type: input\n    name: projectName\n    message: Name?\n";

    fn fetcher() -> RemoteFetcher {
        RemoteFetcher::new("test")
    }

    #[tokio::test]
    async fn test_local_discovery_order() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("config")).unwrap();
        std::fs::write(dir.path().join("config/workflow.yml"), WORKFLOW_YAML).unwrap();
        std::fs::write(
            dir.path().join(".mvp-gen.yml"),
            WORKFLOW_YAML.replace("Local Flow", "Dotfile Flow"),
        )
        .unwrap();

        let fetcher = fetcher();
        let registry = FunctionRegistry::default();
        let resolver = ConfigResolver::new(&fetcher, &registry, dir.path().to_path_buf());
        let loaded = resolver
            .load_workflow(&ResolveRequest::default())
            .await
            .unwrap();
        assert_eq!(loaded.value.name, "Dotfile Flow");
        assert_eq!(loaded.origin, ConfigOrigin::Local(dir.path().join(".mvp-gen.yml")));
    }

    #[tokio::test]
    async fn test_nothing_found_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let fetcher = fetcher();
        let registry = FunctionRegistry::default();
        let resolver = ConfigResolver::new(&fetcher, &registry, dir.path().to_path_buf());

        let resolved = resolver.resolve(&ResolveRequest::default()).await;
        assert_eq!(resolved.workflow.origin, ConfigOrigin::BuiltIn);
        assert_eq!(resolved.templates.origin, ConfigOrigin::BuiltIn);
        assert_eq!(resolved.templates.value, create_default_templates_config());
    }

    #[tokio::test]
    async fn test_invalid_templates_do_not_block_workflow() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("mvp-gen.yml"), WORKFLOW_YAML).unwrap();
        std::fs::write(
            dir.path().join("templates.json"),
            r#"{ "templates": [{ "path": "", "name": "Broken", "priority": -3 }] }"#,
        )
        .unwrap();

        let fetcher = fetcher();
        let registry = FunctionRegistry::default();
        let resolver = ConfigResolver::new(&fetcher, &registry, dir.path().to_path_buf());

        match resolver.load_templates(&ResolveRequest::default()).await {
            Err(Error::ConfigValidationFailed { errors, .. }) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation failure, got {:?}", other),
        }

        let resolved = resolver.resolve(&ResolveRequest::default()).await;
        assert_eq!(resolved.workflow.value.name, "Local Flow");
        assert_eq!(resolved.templates.origin, ConfigOrigin::BuiltIn);
    }

    #[tokio::test]
    async fn test_explicit_path_has_no_fallback() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("mvp-gen.yml"), WORKFLOW_YAML).unwrap();

        let fetcher = fetcher();
        let registry = FunctionRegistry::default();
        let resolver = ConfigResolver::new(&fetcher, &registry, dir.path().to_path_buf());
        let request = ResolveRequest {
            workflow_path: Some("custom/flow.yml".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            resolver.load_workflow(&request).await,
            Err(Error::ConfigNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_parse_error_reported() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("templates.json"), "{ not json").unwrap();

        let fetcher = fetcher();
        let registry = FunctionRegistry::default();
        let resolver = ConfigResolver::new(&fetcher, &registry, dir.path().to_path_buf());
        assert!(matches!(
            resolver.load_templates(&ResolveRequest::default()).await,
            Err(Error::ConfigParseFailed { kind: "templates", .. })
        ));
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("mvp-gen.yaml"), WORKFLOW_YAML).unwrap();

        let fetcher = fetcher();
        let registry = FunctionRegistry::default();
        let resolver = ConfigResolver::new(&fetcher, &registry, dir.path().to_path_buf());
        let request = ResolveRequest {
            prefer_local: true,
            ..Default::default()
        };
        let first = resolver.resolve(&request).await;
        let second = resolver.resolve(&request).await;
        assert_eq!(first, second);
    }
}
