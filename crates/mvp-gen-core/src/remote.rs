//! Direct raw-file downloads from GitHub repositories
//!
//! A repository reference is rewritten into a raw content URL so single files
//! (configuration documents, template archives) can be fetched without a full
//! checkout. Fetches degrade every failure to `None`: a missing file or
//! unreachable host is just one failed source among several for the callers.

use crate::error::{Error, Result};
use futures::future::join_all;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// The only hosting provider with raw-content support
pub const SUPPORTED_HOST: &str = "github.com";

/// Base URL for raw content downloads
pub const RAW_BASE_URL: &str = "https://raw.githubusercontent.com";

/// Branch used when none is given
pub const DEFAULT_BRANCH: &str = "main";

/// Timeout for single-file fetches
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for archive downloads
pub const ARCHIVE_TIMEOUT: Duration = Duration::from_secs(60);

/// Files probed to decide whether a repository/branch is reachable
const PROBE_FILES: &[&str] = &["README.md", "readme.md", "README.txt", "package.json"];

/// Owner and repository name parsed from a repository reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

/// Parse `git@github.com:owner/repo(.git)`, `https://github.com/owner/repo(.git)`
/// and `https://github.com/owner/repo/<suffix>` into owner/repo
pub fn parse_repo(repo_url: &str) -> Option<RepoRef> {
    let repo_url = repo_url.trim();

    if let Some(rest) = repo_url.strip_prefix(&format!("git@{}:", SUPPORTED_HOST)) {
        return split_owner_repo(rest);
    }

    let parsed = Url::parse(repo_url).ok()?;
    if !matches!(parsed.scheme(), "https" | "http" | "ssh" | "git") {
        return None;
    }
    let host = parsed.host_str()?;
    if host != SUPPORTED_HOST && host != "www.github.com" {
        return None;
    }
    split_owner_repo(parsed.path())
}

fn split_owner_repo(path: &str) -> Option<RepoRef> {
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let owner = segments.next()?;
    let repo = segments.next()?;
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if repo.is_empty() {
        return None;
    }
    Some(RepoRef {
        owner: owner.to_string(),
        repo: repo.to_string(),
    })
}

/// Check if a URL points at the supported hosting provider
pub fn is_supported_host(repo_url: &str) -> bool {
    parse_repo(repo_url).is_some()
}

/// Rewrite a repository reference into a raw content URL
pub fn to_raw_url(repo_url: &str, file_path: &str, branch: &str) -> Option<String> {
    build_raw_url(RAW_BASE_URL, repo_url, file_path, branch)
}

/// HTTPS clone URL for a supported repository reference
pub fn to_https_url(repo_url: &str) -> Option<String> {
    let r = parse_repo(repo_url)?;
    Some(format!("https://{}/{}/{}.git", SUPPORTED_HOST, r.owner, r.repo))
}

fn build_raw_url(base: &str, repo_url: &str, file_path: &str, branch: &str) -> Option<String> {
    let r = parse_repo(repo_url)?;
    Some(format!(
        "{}/{}/{}/{}/{}",
        base.trim_end_matches('/'),
        r.owner,
        r.repo,
        branch,
        file_path.trim_start_matches('/')
    ))
}

/// HTTP fetcher for raw repository content
#[derive(Debug, Clone)]
pub struct RemoteFetcher {
    client: reqwest::Client,
    raw_base: String,
    timeout: Duration,
    archive_timeout: Duration,
}

impl RemoteFetcher {
    /// Create a new fetcher with a custom user agent
    pub fn new(user_agent: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(user_agent)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            raw_base: RAW_BASE_URL.to_string(),
            timeout: FETCH_TIMEOUT,
            archive_timeout: ARCHIVE_TIMEOUT,
        }
    }

    /// Point raw downloads at a different base URL (mirrors, tests)
    pub fn with_raw_base(mut self, raw_base: impl Into<String>) -> Self {
        self.raw_base = raw_base.into();
        self
    }

    pub fn with_timeouts(mut self, fetch: Duration, archive: Duration) -> Self {
        self.timeout = fetch;
        self.archive_timeout = archive;
        self
    }

    /// Raw URL for a repository file using this fetcher's base
    pub fn raw_url(&self, repo_url: &str, file_path: &str, branch: &str) -> Option<String> {
        build_raw_url(&self.raw_base, repo_url, file_path, branch)
    }

    /// Fetch a single file as trimmed text; `None` when absent, empty or unreachable
    pub async fn fetch_raw(&self, repo_url: &str, file_path: &str, branch: &str) -> Option<String> {
        let Some(raw_url) = self.raw_url(repo_url, file_path, branch) else {
            debug!("Not a supported repository: {}", repo_url);
            return None;
        };

        debug!("Fetching raw content: {}", raw_url);
        let response = match self
            .client
            .get(&raw_url)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!("Request failed for {}: {}", raw_url, e);
                return None;
            }
        };

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => {
                debug!("File not found: {}", file_path);
                return None;
            }
            StatusCode::FORBIDDEN => {
                debug!("Access forbidden (private repo?): {}", file_path);
                return None;
            }
            status => {
                debug!("Fetch failed for {}: HTTP {}", raw_url, status);
                return None;
            }
        }

        match response.text().await {
            Ok(body) if !body.trim().is_empty() => {
                debug!("Fetched {} ({} bytes)", file_path, body.len());
                Some(body.trim().to_string())
            }
            Ok(_) => {
                debug!("Empty content returned for: {}", file_path);
                None
            }
            Err(e) => {
                debug!("Failed to read body from {}: {}", raw_url, e);
                None
            }
        }
    }

    /// Fetch several files concurrently; each file fails independently
    pub async fn fetch_many_raw(
        &self,
        repo_url: &str,
        file_paths: &[&str],
        branch: &str,
    ) -> HashMap<String, Option<String>> {
        let downloads = file_paths.iter().map(|path| async move {
            let content = self.fetch_raw(repo_url, path, branch).await;
            (path.to_string(), content)
        });
        let results: HashMap<_, _> = join_all(downloads).await.into_iter().collect();

        debug!(
            "Downloaded {}/{} files successfully",
            results.values().filter(|c| c.is_some()).count(),
            file_paths.len()
        );
        results
    }

    /// Download binary content (archives) with the longer archive timeout
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let failed = |message: String| Error::RemoteFetchFailed {
            url: url.to_string(),
            message,
        };

        debug!("Downloading archive: {}", url);
        let response = self
            .client
            .get(url)
            .timeout(self.archive_timeout)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("HTTP {}", status)));
        }

        let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
        if bytes.is_empty() {
            return Err(failed("empty response".to_string()));
        }
        Ok(bytes.to_vec())
    }

    /// Like [`download`](Self::download), with failures reduced to `None`
    pub async fn fetch_bytes(&self, url: &str) -> Option<Vec<u8>> {
        match self.download(url).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                debug!("{}", e);
                None
            }
        }
    }

    /// Check that a repository and branch are reachable via raw downloads
    pub async fn probe_repository(&self, repo_url: &str, branch: &str) -> bool {
        for file in PROBE_FILES {
            if self.fetch_raw(repo_url, file, branch).await.is_some() {
                debug!("Repository accessible: {} ({})", repo_url, branch);
                return true;
            }
        }
        debug!("Repository not accessible or empty: {} ({})", repo_url, branch);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPECTED: &str =
        "https://raw.githubusercontent.com/acme/starter/main/config/templates.json";

    #[test]
    fn test_all_url_shapes_yield_same_raw_url() {
        for url in [
            "git@github.com:acme/starter.git",
            "git@github.com:acme/starter",
            "https://github.com/acme/starter.git",
            "https://github.com/acme/starter",
            "https://github.com/acme/starter/tree/develop/templates",
        ] {
            assert_eq!(
                to_raw_url(url, "config/templates.json", "main").as_deref(),
                Some(EXPECTED),
                "shape: {}",
                url
            );
        }
    }

    #[test]
    fn test_unsupported_hosts_rejected() {
        for url in [
            "https://gitlab.com/acme/starter.git",
            "git@gitlab.com:acme/starter.git",
            "https://example.com/github.com/acme/starter",
            "not a url",
            "https://github.com/acme",
            "",
        ] {
            assert!(!is_supported_host(url), "url: {}", url);
            assert_eq!(to_raw_url(url, "a.json", "main"), None, "url: {}", url);
        }
    }

    #[test]
    fn test_leading_slash_in_file_path() {
        assert_eq!(
            to_raw_url("https://github.com/acme/starter", "/mvp-gen.yml", "dev").as_deref(),
            Some("https://raw.githubusercontent.com/acme/starter/dev/mvp-gen.yml")
        );
    }

    #[test]
    fn test_https_url_from_ssh() {
        assert_eq!(
            to_https_url("git@github.com:acme/starter.git").as_deref(),
            Some("https://github.com/acme/starter.git")
        );
    }

    #[tokio::test]
    async fn test_fetch_raw_short_circuits_unsupported_host() {
        // Unroutable base: any attempted request would fail slowly or error
        let fetcher = RemoteFetcher::new("test").with_raw_base("http://192.0.2.1:9");
        assert_eq!(
            fetcher
                .fetch_raw("https://gitlab.com/acme/starter", "a.json", "main")
                .await,
            None
        );
        assert!(fetcher.raw_url("https://gitlab.com/acme/starter", "a", "main").is_none());
    }
}
