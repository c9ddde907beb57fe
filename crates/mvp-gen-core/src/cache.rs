//! On-disk cache of repository checkouts

use crate::error::Result;
use crate::product::ProductConfig;
use directories::BaseDirs;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Prefix of cache entries holding a repository checkout
pub const REPO_PREFIX: &str = "repo-";

/// Environment variable npm exports with its own cache root
pub const NPM_CACHE_ENV: &str = "npm_config_cache";

/// Snapshot of the cache directory
#[derive(Debug, Clone)]
pub struct CacheInfo {
    pub dir: PathBuf,
    pub exists: bool,
    pub size_bytes: u64,
    /// Names of checkout entries, sorted
    pub repositories: Vec<String>,
}

impl CacheInfo {
    pub fn size_display(&self) -> String {
        format_size(self.size_bytes)
    }
}

/// Cache directory manager
#[derive(Debug, Clone)]
pub struct CacheManager {
    root: PathBuf,
}

impl CacheManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Locate the cache root for a product from the process environment
    pub fn discover<C: ProductConfig>(config: &C) -> Self {
        Self::discover_with(
            config.name(),
            |key| std::env::var(key).ok(),
            config.cache_dir_env(),
        )
    }

    /// Cache root precedence: explicit override, npm's cache root, the platform
    /// cache directory, then `~/.cache`
    pub fn discover_with<F>(name: &str, env: F, override_env: &str) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let root = if let Some(dir) = non_empty(override_env) {
            PathBuf::from(dir)
        } else if let Some(npm) = non_empty(NPM_CACHE_ENV) {
            PathBuf::from(npm).join(format!("_{}", name))
        } else if let Some(dirs) = BaseDirs::new() {
            dirs.cache_dir().join(name)
        } else {
            env("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir)
                .join(".cache")
                .join(name)
        };

        debug!("Cache directory: {}", root.display());
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stable entry name for a repository URL
    pub fn repo_key(repo_url: &str) -> String {
        let digest = Sha256::digest(repo_url.as_bytes());
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        format!("{}{}", REPO_PREFIX, &hex[..16])
    }

    /// Checkout directory for a repository URL
    pub fn repo_dir(&self, repo_url: &str) -> PathBuf {
        self.root.join(Self::repo_key(repo_url))
    }

    pub fn info(&self) -> Result<CacheInfo> {
        if !self.root.is_dir() {
            return Ok(CacheInfo {
                dir: self.root.clone(),
                exists: false,
                size_bytes: 0,
                repositories: Vec::new(),
            });
        }

        let mut repositories = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(REPO_PREFIX) && entry.file_type()?.is_dir() {
                repositories.push(name);
            }
        }
        repositories.sort();

        let size_bytes = WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| e.metadata().ok())
            .map(|m| m.len())
            .sum();

        Ok(CacheInfo {
            dir: self.root.clone(),
            exists: true,
            size_bytes,
            repositories,
        })
    }

    /// Remove the whole cache root; returns false if there was nothing to remove
    pub fn clean(&self) -> Result<bool> {
        if !self.root.exists() {
            return Ok(false);
        }
        std::fs::remove_dir_all(&self.root)?;
        debug!("Removed cache directory {}", self.root.display());
        Ok(true)
    }
}

/// Human readable byte count (`512 B`, `12.3 KB`)
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}
