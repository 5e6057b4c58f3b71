use {
    audit_chain::{
        AppState,
        adapters::http::{list_audit, log_audit, verify_audit},
        infra::postgres::PgStore,
        services::{query::QueryConfig, sweep::run_sweep},
    },
    axum::{
        Router,
        extract::DefaultBodyLimit,
        routing::{get, post},
    },
    sqlx::postgres::PgPoolOptions,
    std::{env, sync::Arc, time::Duration},
    tokio::{signal, sync::watch},
    tower::ServiceBuilder,
    tower_http::timeout::TimeoutLayer,
};

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    let defaults = QueryConfig::default();
    let query_config = QueryConfig {
        default_page_size: env_u32("AUDIT_DEFAULT_PAGE_SIZE", defaults.default_page_size),
        max_page_size: env_u32("AUDIT_MAX_PAGE_SIZE", defaults.max_page_size),
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&database_url)
        .await
        .expect("failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");

    let store = Arc::new(PgStore::new(pool));
    let state = AppState {
        store: store.clone(),
        query_config,
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Opt-in scheduled integrity sweep; correctness never depends on it.
    let sweep_handle = env::var("AUDIT_SWEEP_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(|secs| {
            tokio::spawn(run_sweep(
                store.clone(),
                Duration::from_secs(secs),
                shutdown_rx,
            ))
        });

    let app = Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/tenants/{tenant_id}/audit", post(log_audit).get(list_audit))
        .route("/tenants/{tenant_id}/audit/verify", post(verify_audit))
        .layer(
            ServiceBuilder::new()
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(DefaultBodyLimit::max(256 * 1024)),
        )
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await.unwrap();
    tracing::info!("listening on {bind_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    shutdown_tx.send(true).ok();
    if let Some(handle) = sweep_handle {
        handle.await.ok();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl+c, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
