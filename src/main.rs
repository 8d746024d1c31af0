use std::sync::Arc;

use axum::routing::get;
use axum_prometheus::PrometheusMetricLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use link_preview_proxy::config::Config;
use link_preview_proxy::handlers;
use link_preview_proxy::preview::{build_http_client, BatchResolver, PreviewFetcher};
use link_preview_proxy::state::AppState;
use link_preview_proxy::store::InMemoryStore;

#[tokio::main]
async fn main() {
    // Initialize tracing — JSON in production, human-readable in dev.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "link_preview_proxy=info,tower_http=info"
            .parse()
            .unwrap()
    });

    if std::env::var("APP_ENV").as_deref() == Ok("production") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("🚀 Link preview proxy starting...");

    let config = Config::from_env().expect("Failed to load configuration");
    info!("📝 Configuration loaded");

    let store = InMemoryStore::new(config.cache_max_entries);
    info!(capacity = config.cache_max_entries, "🗄️ In-memory preview store ready");

    let http_client =
        build_http_client(config.fetch_timeout).expect("Failed to build origin HTTP client");

    let fetcher = PreviewFetcher::new(Arc::new(store), http_client)
        .with_store_timeout(config.store_timeout);

    let app_state = AppState {
        resolver: BatchResolver::new(fetcher),
        allowed_origin: config.allowed_origin.clone(),
    };

    // Prometheus metrics layer
    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    let app = handlers::router(app_state)
        .route(
            "/metrics",
            get(move || async move { metric_handle.render() }),
        )
        .layer(prometheus_layer);

    let addr = config.server_addr();
    info!("🎧 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
