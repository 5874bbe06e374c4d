use std::net::SocketAddr;
use std::sync::Arc;

use catalog_cell::CatalogService;
use dotenv::dotenv;
use registry_cell::StoreRegistryService;
use reservation_cell::{EventSink, ReservationService};
use shared_config::AppConfig;
use shared_store::AppStore;
use shared_utils::rate_limit::ClientRateLimiter;
use timeslot_cell::TimeslotService;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use webhook_cell::{SubscriptionService, WebhookDispatcher, WorkerPool};

mod error_map;
mod handlers;
mod router;
mod state;

use state::AppState;

/// Deliveries this many events may queue before the dispatcher starts
/// dropping the newest one rather than blocking an admission transaction
/// (§5, §12.2).
const WEBHOOK_QUEUE_CAPACITY: usize = 1024;
const WEBHOOK_WORKER_COUNT: usize = 4;

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("starting reservation engine API");

    let config = Arc::new(AppConfig::from_env());
    let app_store = Arc::new(AppStore::new());

    let registry = Arc::new(StoreRegistryService::new(app_store.clone()));
    let catalog = Arc::new(CatalogService::new(app_store.clone()));
    let timeslots = Arc::new(TimeslotService::new(app_store.clone()));
    let subscriptions = Arc::new(SubscriptionService::new(app_store.clone()));

    let (tx, rx) = tokio::sync::mpsc::channel(WEBHOOK_QUEUE_CAPACITY);
    let dispatcher: Arc<dyn EventSink> = Arc::new(WebhookDispatcher::new(tx));
    let worker_pool = WorkerPool::spawn(WEBHOOK_WORKER_COUNT, rx, app_store.clone(), reqwest::Client::new());

    let reservations = Arc::new(ReservationService::new(
        app_store.clone(),
        catalog.clone(),
        timeslots.clone(),
        dispatcher.clone(),
    ));

    let state = AppState {
        config: config.clone(),
        registry,
        catalog,
        timeslots,
        events: dispatcher,
        reservations,
        subscriptions,
        rate_limiter: Arc::new(ClientRateLimiter::new()),
    };

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let app = router::create_router(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await.unwrap();

    // `app` (and every `Sender` clone it held via `state.reservations`) was
    // just dropped when `serve` returned, so the channel closes here: workers
    // drain whatever was already queued, then `recv()` returns `None`.
    worker_pool.shutdown().await;
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    info!("shutdown signal received");
}
