//! Template acquisition
//!
//! A template can come from three places:
//! - a local templates root on disk
//! - a cached shallow checkout of the template repository
//! - a packaged `templates/<path>.zip` downloaded from the repository
//!
//! Each [`TemplateSource`] is tried on its own; the caller decides the order
//! with [`plan_sources`] and [`TemplateAcquirer::acquire_any`].

pub mod copier;
pub mod package;

use crate::cache::CacheManager;
use crate::error::{Error, Result};
use crate::remote::{is_supported_host, RemoteFetcher};
use std::fmt;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tokio::process::Command as TokioCommand;
use tracing::{debug, info, warn};

pub use copier::{copy_dir_all, extract_zip};
pub use package::{build_template_zip, package_templates, PackageSummary, TemplatesIndex};

/// Directory inside a template repository holding the templates
pub const REPO_TEMPLATES_DIR: &str = "templates";

/// Where a template is acquired from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// Templates root on the local filesystem
    Local(PathBuf),
    /// Shallow clone kept in the cache
    Checkout { repo: String, branch: String },
    /// Packaged archive fetched over HTTP
    Archive { repo: String, branch: String },
}

impl fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(root) => write!(f, "local templates at {}", root.display()),
            Self::Checkout { repo, branch } => write!(f, "repository checkout of {} ({})", repo, branch),
            Self::Archive { repo, branch } => write!(f, "template archive from {} ({})", repo, branch),
        }
    }
}

/// The template to acquire
#[derive(Debug, Clone)]
pub struct TemplateRequest {
    /// Folder (or archive stem) of the template
    pub locator: String,
    /// Alternate folder name tried when `locator` is absent
    pub legacy_name: Option<String>,
}

impl TemplateRequest {
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            legacy_name: None,
        }
    }

    pub fn with_legacy_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if name != self.locator {
            self.legacy_name = Some(name);
        }
        self
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.locator.as_str()).chain(self.legacy_name.as_deref())
    }
}

/// Ordered sources for a run
///
/// Archive first for supported hosts, then the cached checkout unless caching
/// is disabled, then the local templates root.
pub fn plan_sources(
    repo: Option<&str>,
    branch: &str,
    local_root: PathBuf,
    use_cache: bool,
) -> Vec<TemplateSource> {
    let mut sources = Vec::new();
    if let Some(repo) = repo {
        if is_supported_host(repo) {
            sources.push(TemplateSource::Archive {
                repo: repo.to_string(),
                branch: branch.to_string(),
            });
        }
        if use_cache {
            sources.push(TemplateSource::Checkout {
                repo: repo.to_string(),
                branch: branch.to_string(),
            });
        }
    }
    sources.push(TemplateSource::Local(local_root));
    sources
}

/// First existing templates root: explicit path, environment override,
/// `./templates`, then a `templates` folder beside or above the executable.
/// Falls back to `./templates` so a failed lookup still names it.
pub fn locate_templates_root(explicit: Option<&Path>, env_dir: Option<&str>, cwd: &Path) -> PathBuf {
    let mut candidates: Vec<PathBuf> = Vec::new();
    candidates.extend(explicit.map(Path::to_path_buf));
    candidates.extend(env_dir.filter(|d| !d.is_empty()).map(PathBuf::from));
    candidates.push(cwd.join(REPO_TEMPLATES_DIR));
    if let Ok(exe) = std::env::current_exe() {
        candidates.extend(exe.ancestors().skip(1).map(|dir| dir.join(REPO_TEMPLATES_DIR)));
    }
    candidates
        .into_iter()
        .find(|dir| dir.is_dir())
        .unwrap_or_else(|| cwd.join(REPO_TEMPLATES_DIR))
}

/// Acquires templates into a target directory
pub struct TemplateAcquirer<'a> {
    cache: &'a CacheManager,
    fetcher: &'a RemoteFetcher,
}

impl<'a> TemplateAcquirer<'a> {
    pub fn new(cache: &'a CacheManager, fetcher: &'a RemoteFetcher) -> Self {
        Self { cache, fetcher }
    }

    /// Try each source in order; the error names every location attempted
    pub async fn acquire_any(
        &self,
        sources: &[TemplateSource],
        request: &TemplateRequest,
        target: &Path,
    ) -> Result<TemplateSource> {
        let mut attempted = Vec::new();
        for source in sources {
            match self.acquire(source, request, target).await {
                Ok(()) => {
                    info!("Template {} acquired from {}", request.locator, source);
                    return Ok(source.clone());
                }
                Err(e) => {
                    warn!("Template acquisition from {} failed: {}", source, e);
                    attempted.push(format!("{}: {}", source, e));
                }
            }
        }
        Err(Error::template_not_found(&request.locator, attempted))
    }

    /// Acquire from a single source
    pub async fn acquire(&self, source: &TemplateSource, request: &TemplateRequest, target: &Path) -> Result<()> {
        match source {
            TemplateSource::Local(root) => acquire_local(root, request, target),
            TemplateSource::Checkout { repo, branch } => {
                self.acquire_checkout(repo, branch, request, target).await
            }
            TemplateSource::Archive { repo, branch } => {
                self.acquire_archive(repo, branch, request, target).await
            }
        }
    }

    async fn acquire_checkout(
        &self,
        repo: &str,
        branch: &str,
        request: &TemplateRequest,
        target: &Path,
    ) -> Result<()> {
        let checkout = self.ensure_checkout(repo, branch).await?;
        acquire_local(&checkout.join(REPO_TEMPLATES_DIR), request, target)
    }

    /// Clone the repository into the cache, or refresh an existing clone
    pub async fn ensure_checkout(&self, repo: &str, branch: &str) -> Result<PathBuf> {
        let dir = self.cache.repo_dir(repo);

        if dir.join(".git").is_dir() {
            debug!("Refreshing cached checkout {} ({})", dir.display(), branch);
            match refresh_checkout(&dir, branch).await {
                Ok(()) => debug!("Checkout refreshed"),
                Err(message) => warn!("Could not refresh cached checkout, using it as is: {}", message),
            }
            return Ok(dir);
        }

        if let Some(parent) = dir.parent() {
            std::fs::create_dir_all(parent)?;
        }
        info!("Cloning {} ({}) into {}", repo, branch, dir.display());
        git(&[
            "clone",
            "--depth",
            "1",
            "--single-branch",
            "--branch",
            branch,
            repo,
            &dir.to_string_lossy(),
        ])
        .await
        .map_err(|message| Error::checkout_failed(repo, message))?;
        Ok(dir)
    }

    async fn acquire_archive(
        &self,
        repo: &str,
        branch: &str,
        request: &TemplateRequest,
        target: &Path,
    ) -> Result<()> {
        let mut attempted = Vec::new();
        for name in request.names() {
            let archive_path = format!("{}/{}.zip", REPO_TEMPLATES_DIR, name);
            let url = match self.fetcher.raw_url(repo, &archive_path, branch) {
                Some(url) => url,
                None => break,
            };
            match self.fetcher.fetch_bytes(&url).await {
                Some(bytes) => return extract_download(&bytes, target),
                None => attempted.push(url),
            }
        }
        Err(Error::template_not_found(&request.locator, attempted))
    }
}

/// Copy `<root>/<locator>`, or `<root>/<legacy_name>` when that is absent
fn acquire_local(root: &Path, request: &TemplateRequest, target: &Path) -> Result<()> {
    let mut attempted = Vec::new();
    for name in request.names() {
        let dir = root.join(name);
        if dir.is_dir() {
            copy_dir_all(&dir, target)?;
            return Ok(());
        }
        attempted.push(dir.display().to_string());
    }
    Err(Error::template_not_found(&request.locator, attempted))
}

/// Spool the download to a temporary file and extract it; the file is
/// removed when it goes out of scope
fn extract_download(bytes: &[u8], target: &Path) -> Result<()> {
    let mut spool = tempfile::NamedTempFile::new()?;
    spool.write_all(bytes)?;
    spool.as_file_mut().seek(SeekFrom::Start(0))?;
    extract_zip(spool.as_file(), target)?;
    Ok(())
}

/// Point an existing shallow clone at the tip of `branch`
///
/// The cache entry is keyed by URL alone, so the branch may differ from the
/// one originally cloned.
async fn refresh_checkout(dir: &Path, branch: &str) -> std::result::Result<(), String> {
    let dir = dir.to_string_lossy();
    git(&["-C", &dir, "fetch", "--depth", "1", "origin", branch]).await?;
    git(&["-C", &dir, "checkout", "-q", "-f", "-B", branch, "FETCH_HEAD"]).await
}

/// Run git, returning trimmed stderr on failure
async fn git(args: &[&str]) -> std::result::Result<(), String> {
    let output = TokioCommand::new("git")
        .args(args)
        .output()
        .await
        .map_err(|e| format!("failed to run git: {}", e))?;
    if output.status.success() {
        Ok(())
    } else {
        Err(String::from_utf8_lossy(&output.stderr).trim().to_string())
    }
}
