mod common;

use common::{route, serve, Routes};
use mvp_gen_core::{Error, RemoteFetcher};

const REPO: &str = "https://github.com/acme/starter";

async fn fetcher_with(routes: Routes) -> RemoteFetcher {
    let base = serve(routes).await;
    RemoteFetcher::new("mvp-gen-test").with_raw_base(base)
}

#[tokio::test]
async fn test_fetch_raw_trims_success_body() {
    let mut routes = Routes::new();
    route(&mut routes, "/acme/starter/main/mvp-gen.yml", 200, "  name: demo \n\n");
    let fetcher = fetcher_with(routes).await;

    let content = fetcher.fetch_raw(REPO, "mvp-gen.yml", "main").await;
    assert_eq!(content.as_deref(), Some("name: demo"));
}

#[tokio::test]
async fn test_fetch_raw_absent_cases_are_none() {
    let mut routes = Routes::new();
    route(&mut routes, "/acme/starter/main/empty.json", 200, "   \n");
    route(&mut routes, "/acme/starter/main/private.json", 403, "denied");
    route(&mut routes, "/acme/starter/main/broken.json", 500, "oops");
    let fetcher = fetcher_with(routes).await;

    assert!(fetcher.fetch_raw(REPO, "missing.json", "main").await.is_none());
    assert!(fetcher.fetch_raw(REPO, "empty.json", "main").await.is_none());
    assert!(fetcher.fetch_raw(REPO, "private.json", "main").await.is_none());
    assert!(fetcher.fetch_raw(REPO, "broken.json", "main").await.is_none());
    assert!(fetcher
        .fetch_raw("https://gitlab.com/acme/starter", "mvp-gen.yml", "main")
        .await
        .is_none());
}

#[tokio::test]
async fn test_fetch_many_raw_fails_independently() {
    let mut routes = Routes::new();
    route(&mut routes, "/acme/starter/dev/a.txt", 200, "first");
    route(&mut routes, "/acme/starter/dev/c.txt", 200, "third");
    let fetcher = fetcher_with(routes).await;

    let results = fetcher
        .fetch_many_raw(REPO, &["a.txt", "b.txt", "c.txt"], "dev")
        .await;
    assert_eq!(results.len(), 3);
    assert_eq!(results["a.txt"].as_deref(), Some("first"));
    assert_eq!(results["b.txt"], None);
    assert_eq!(results["c.txt"].as_deref(), Some("third"));
}

#[tokio::test]
async fn test_probe_repository() {
    let mut routes = Routes::new();
    route(&mut routes, "/acme/starter/main/package.json", 200, "{}");
    let fetcher = fetcher_with(routes).await;

    assert!(fetcher.probe_repository(REPO, "main").await);
    assert!(!fetcher.probe_repository(REPO, "gone").await);
}

#[tokio::test]
async fn test_fetch_bytes() {
    let mut routes = Routes::new();
    route(&mut routes, "/blob.zip", 200, vec![1u8, 2, 3]);
    let base = serve(routes).await;
    let fetcher = RemoteFetcher::new("mvp-gen-test");

    assert_eq!(
        fetcher.fetch_bytes(&format!("{}/blob.zip", base)).await,
        Some(vec![1, 2, 3])
    );
    assert!(fetcher
        .fetch_bytes(&format!("{}/missing.zip", base))
        .await
        .is_none());
}

#[tokio::test]
async fn test_download_reports_status() {
    let mut routes = Routes::new();
    route(&mut routes, "/empty.zip", 200, Vec::<u8>::new());
    let base = serve(routes).await;
    let fetcher = RemoteFetcher::new("mvp-gen-test");

    let missing = format!("{}/missing.zip", base);
    match fetcher.download(&missing).await.unwrap_err() {
        Error::RemoteFetchFailed { url, message } => {
            assert_eq!(url, missing);
            assert!(message.contains("404"));
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(matches!(
        fetcher.download(&format!("{}/empty.zip", base)).await,
        Err(Error::RemoteFetchFailed { .. })
    ));
}
