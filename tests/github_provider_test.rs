//! End-to-end tests for the bulk-directory provider against a stub
//! repository API.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use iconhub::sources::github_directory::GitHubDirectoryProvider;
use iconhub::{AppError, HttpClient, IconProvider, ListingCache, ProviderIdentity, SourceLocator};

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn contents_fixture(base: &str) -> Value {
    json!([
        {
            "name": "star.svg",
            "path": "icons/star.svg",
            "type": "file",
            "download_url": format!("{base}/raw/star.svg"),
            "html_url": "https://github.com/mapbox/maki/blob/main/icons/star.svg"
        },
        {
            "name": "star-stroked.svg",
            "path": "icons/star-stroked.svg",
            "type": "file",
            "download_url": format!("{base}/raw/star-stroked.svg"),
            "html_url": "https://github.com/mapbox/maki/blob/main/icons/star-stroked.svg"
        },
        {
            "name": "album.svg",
            "path": "icons/album.svg",
            "type": "file",
            "download_url": format!("{base}/raw/album.svg"),
            "html_url": "https://github.com/mapbox/maki/blob/main/icons/album.svg"
        },
        {
            "name": "renders",
            "path": "icons/renders",
            "type": "dir",
            "download_url": null
        },
        {
            "name": "README.md",
            "path": "icons/README.md",
            "type": "file",
            "download_url": format!("{base}/raw/README.md")
        }
    ])
}

struct Stub {
    base: String,
    listing_calls: Arc<AtomicUsize>,
}

/// Stub repository API: one listing route with a call counter and one raw
/// file route.
async fn spawn_stub() -> Stub {
    let listing_calls = Arc::new(AtomicUsize::new(0));

    // The listing handler needs its own base URL for download links, so bind
    // first and route second.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base = format!("http://{addr}");

    let router_base = base.clone();
    let counter = listing_calls.clone();
    let router = Router::new()
        .route(
            "/repos/mapbox/maki/contents/icons",
            get(move |State(counter): State<Arc<AtomicUsize>>| {
                let base = router_base.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Json(contents_fixture(&base))
                }
            }),
        )
        .route("/raw/star.svg", get(|| async { "<svg>star</svg>" }))
        .with_state(counter);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    Stub {
        base,
        listing_calls,
    }
}

fn maki_identity(api_base: &str) -> ProviderIdentity {
    ProviderIdentity {
        name: "Maki".to_string(),
        requires_auth: false,
        credentials: None,
        source_locator: SourceLocator::GithubDirectory {
            repo: "mapbox/maki".to_string(),
            path: "icons".to_string(),
            api_base: api_base.to_string(),
            license: Some("CC0 1.0 Universal".to_string()),
            attribution: Some("Maki Icons by Mapbox".to_string()),
        },
    }
}

fn provider(api_base: &str, cache: Arc<ListingCache>) -> GitHubDirectoryProvider {
    GitHubDirectoryProvider::new(maki_identity(api_base), HttpClient::new(), cache).unwrap()
}

#[tokio::test]
async fn search_filters_the_fetched_listing() {
    let stub = spawn_stub().await;
    let provider = provider(&stub.base, Arc::new(ListingCache::new()));
    let cancel = CancellationToken::new();

    let result = provider.search("star", 1, 10, &cancel).await.unwrap();

    assert_eq!(result.total_count, 2);
    assert_eq!(result.items.len(), 2);
    assert_eq!(result.items[0].name, "star");
    assert_eq!(result.items[1].name, "star-stroked");
    assert!(!result.has_next);

    // Directories and non-icon files never become records.
    let everything = provider.search("", 1, 50, &cancel).await.unwrap();
    assert_eq!(everything.total_count, 3);
    assert_eq!(everything.items[0].license, "CC0 1.0 Universal");
    assert_eq!(
        everything.items[0].attribution_text.as_deref(),
        Some("Maki Icons by Mapbox")
    );
}

#[tokio::test]
async fn listing_is_fetched_once_per_process() {
    let stub = spawn_stub().await;
    let provider = provider(&stub.base, Arc::new(ListingCache::new()));
    let cancel = CancellationToken::new();

    provider.search("star", 1, 10, &cancel).await.unwrap();
    provider.search("album", 1, 10, &cancel).await.unwrap();
    provider.search("", 1, 10, &cancel).await.unwrap();

    assert_eq!(stub.listing_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn concurrent_first_searches_converge_on_one_listing() {
    let stub = spawn_stub().await;
    let cache = Arc::new(ListingCache::new());
    let provider = Arc::new(provider(&stub.base, cache.clone()));

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let provider = provider.clone();
            tokio::spawn(async move {
                let cancel = CancellationToken::new();
                provider.search("star", 1, 10, &cancel).await
            })
        })
        .collect();

    for task in tasks {
        let result = task.await.unwrap().unwrap();
        assert_eq!(result.total_count, 2);
    }

    // Both racers may fetch, but exactly one cache slot exists and later
    // calls are served from it.
    assert_eq!(cache.len().await, 1);
    let calls_after_race = stub.listing_calls.load(Ordering::SeqCst);
    let cancel = CancellationToken::new();
    provider.search("album", 1, 10, &cancel).await.unwrap();
    assert_eq!(stub.listing_calls.load(Ordering::SeqCst), calls_after_race);
}

#[tokio::test]
async fn invalidation_forces_a_refetch() {
    let stub = spawn_stub().await;
    let cache = Arc::new(ListingCache::new());
    let provider = provider(&stub.base, cache.clone());
    let cancel = CancellationToken::new();

    provider.search("star", 1, 10, &cancel).await.unwrap();
    assert_eq!(stub.listing_calls.load(Ordering::SeqCst), 1);

    cache.invalidate("Maki").await;
    provider.search("star", 1, 10, &cancel).await.unwrap();
    assert_eq!(stub.listing_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn fetch_asset_returns_raw_bytes() {
    let stub = spawn_stub().await;
    let provider = provider(&stub.base, Arc::new(ListingCache::new()));
    let cancel = CancellationToken::new();

    let bytes = provider
        .fetch_asset(&format!("{}/raw/star.svg", stub.base), &cancel)
        .await
        .unwrap();
    assert_eq!(bytes, b"<svg>star</svg>");
}

#[tokio::test]
async fn missing_asset_is_fetch_failed() {
    let stub = spawn_stub().await;
    let provider = provider(&stub.base, Arc::new(ListingCache::new()));
    let cancel = CancellationToken::new();

    let result = provider
        .fetch_asset(&format!("{}/raw/missing.svg", stub.base), &cancel)
        .await;
    assert!(matches!(result, Err(AppError::FetchFailed { .. })));
}

#[tokio::test]
async fn unreachable_upstream_is_provider_unavailable() {
    // Nothing listens here; connection is refused immediately.
    let provider = provider("http://127.0.0.1:1", Arc::new(ListingCache::new()));
    let cancel = CancellationToken::new();

    let result = provider.search("star", 1, 10, &cancel).await;
    assert!(matches!(result, Err(AppError::ProviderUnavailable { .. })));
}

#[tokio::test]
async fn truncated_listing_is_served_not_failed() {
    // Upstream returns a single entry where the real directory has many;
    // the provider must work on the subset it got.
    let router = Router::new().route(
        "/repos/mapbox/maki/contents/icons",
        get(|| async {
            Json(json!([
                {
                    "name": "star.svg",
                    "path": "icons/star.svg",
                    "type": "file",
                    "download_url": "https://raw.example.com/star.svg"
                }
            ]))
        }),
    );
    let base = serve(router).await;
    let provider = provider(&base, Arc::new(ListingCache::new()));
    let cancel = CancellationToken::new();

    let result = provider.search("", 1, 10, &cancel).await.unwrap();
    assert_eq!(result.total_count, 1);
    assert_eq!(result.items[0].name, "star");
}

#[tokio::test]
async fn cancelling_mid_listing_leaves_the_cache_clean() {
    let router = Router::new().route(
        "/repos/mapbox/maki/contents/icons",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!([]))
        }),
    );
    let base = serve(router).await;
    let cache = Arc::new(ListingCache::new());
    let provider = provider(&base, cache.clone());

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let started = std::time::Instant::now();
    let result = provider.search("star", 1, 10, &cancel).await;

    assert!(matches!(result, Err(AppError::Cancelled)));
    // Returned on cancellation, not on the 5s response.
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(cache.is_empty().await);
}
