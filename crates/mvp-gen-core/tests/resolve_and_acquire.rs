mod common;

use common::{route, serve, Routes};
use mvp_gen_core::config::{ConfigOrigin, ConfigResolver, ResolveRequest};
use mvp_gen_core::templates::{TemplateAcquirer, TemplateRequest, TemplateSource};
use mvp_gen_core::{CacheManager, Error, FunctionRegistry, RemoteFetcher};
use std::io::{Cursor, Write};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const REPO: &str = "git@github.com:acme/starter.git";

const REMOTE_WORKFLOW: &str = r#"
name: Remote Workflow
steps:
  - type: input
    name: projectName
    message: Project name?
    validate: isValidProjectName
"#;

const LOCAL_WORKFLOW: &str = r#"
name: Local Workflow
steps:
  - type: confirm
    name: typescript
    message: TypeScript?
"#;

const REMOTE_TEMPLATES: &str =
    r#"{ "templates": [{ "path": "remote-api", "name": "Remote API", "options": ["ts"] }] }"#;

fn request(prefer_local: bool) -> ResolveRequest {
    ResolveRequest {
        repo: Some(REPO.to_string()),
        prefer_local,
        ..ResolveRequest::default()
    }
}

async fn remote_config_server() -> String {
    let mut routes = Routes::new();
    route(&mut routes, "/acme/starter/main/mvp-gen.yml", 200, REMOTE_WORKFLOW);
    route(&mut routes, "/acme/starter/main/config/templates.json", 200, REMOTE_TEMPLATES);
    serve(routes).await
}

fn local_root() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(".mvp-gen.yml"), LOCAL_WORKFLOW).unwrap();
    dir
}

#[tokio::test]
async fn test_remote_documents_win_by_default() {
    let base = remote_config_server().await;
    let root = local_root();
    let fetcher = RemoteFetcher::new("mvp-gen-test").with_raw_base(base);
    let registry = FunctionRegistry::default();
    let resolver = ConfigResolver::new(&fetcher, &registry, root.path().to_path_buf());

    let resolved = resolver.resolve(&request(false)).await;
    assert_eq!(resolved.workflow.value.name, "Remote Workflow");
    assert!(matches!(resolved.workflow.origin, ConfigOrigin::Remote(_)));
    assert_eq!(resolved.templates.value.templates[0].path, "remote-api");
}

#[tokio::test]
async fn test_prefer_local_checks_disk_first() {
    let base = remote_config_server().await;
    let root = local_root();
    let fetcher = RemoteFetcher::new("mvp-gen-test").with_raw_base(base);
    let registry = FunctionRegistry::default();
    let resolver = ConfigResolver::new(&fetcher, &registry, root.path().to_path_buf());

    let resolved = resolver.resolve(&request(true)).await;
    assert_eq!(resolved.workflow.value.name, "Local Workflow");
    assert_eq!(
        resolved.workflow.origin,
        ConfigOrigin::Local(root.path().join(".mvp-gen.yml"))
    );
    // No local templates document, so the repository is probed next
    assert!(matches!(resolved.templates.origin, ConfigOrigin::Remote(_)));
}

#[tokio::test]
async fn test_unreachable_repository_falls_back_to_local() {
    let base = serve(Routes::new()).await;
    let root = local_root();
    let fetcher = RemoteFetcher::new("mvp-gen-test").with_raw_base(base);
    let registry = FunctionRegistry::default();
    let resolver = ConfigResolver::new(&fetcher, &registry, root.path().to_path_buf());

    let resolved = resolver.resolve(&request(false)).await;
    assert_eq!(resolved.workflow.value.name, "Local Workflow");
    assert_eq!(resolved.templates.origin, ConfigOrigin::BuiltIn);
    assert_eq!(resolved.templates.value.templates.len(), 4);
}

fn template_zip() -> Vec<u8> {
    let mut buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
        zip.start_file("package.json", SimpleFileOptions::default()).unwrap();
        zip.write_all(br#"{"name":"template"}"#).unwrap();
        zip.start_file("src/index.ts", SimpleFileOptions::default()).unwrap();
        zip.write_all(b"export {}").unwrap();
        zip.finish().unwrap();
    }
    buffer
}

#[tokio::test]
async fn test_archive_acquisition() {
    let mut routes = Routes::new();
    route(&mut routes, "/acme/starter/main/templates/express-api.zip", 200, template_zip());
    let base = serve(routes).await;

    let cache_dir = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    let cache = CacheManager::new(cache_dir.path());
    let fetcher = RemoteFetcher::new("mvp-gen-test").with_raw_base(base);
    let acquirer = TemplateAcquirer::new(&cache, &fetcher);

    let source = TemplateSource::Archive {
        repo: REPO.to_string(),
        branch: "main".to_string(),
    };
    acquirer
        .acquire(&source, &TemplateRequest::new("express-api"), target.path())
        .await
        .unwrap();

    assert!(target.path().join("package.json").is_file());
    assert!(target.path().join("src/index.ts").is_file());
}

#[tokio::test]
async fn test_archive_then_local_fallback() {
    let base = serve(Routes::new()).await;
    let templates = TempDir::new().unwrap();
    std::fs::create_dir_all(templates.path().join("node-cli")).unwrap();
    std::fs::write(templates.path().join("node-cli/index.js"), "").unwrap();

    let cache_dir = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    let cache = CacheManager::new(cache_dir.path());
    let fetcher = RemoteFetcher::new("mvp-gen-test").with_raw_base(base);
    let acquirer = TemplateAcquirer::new(&cache, &fetcher);

    let sources = vec![
        TemplateSource::Archive {
            repo: REPO.to_string(),
            branch: "main".to_string(),
        },
        TemplateSource::Local(templates.path().to_path_buf()),
    ];
    let used = acquirer
        .acquire_any(&sources, &TemplateRequest::new("node-cli"), target.path())
        .await
        .unwrap();
    assert_eq!(used, sources[1]);
    assert!(target.path().join("index.js").is_file());

    let err = acquirer
        .acquire_any(&sources, &TemplateRequest::new("rails"), target.path())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TemplateNotFound { ref attempted, .. } if attempted.len() == 2));
}
