use std::net::SocketAddr;

use axum::{
    http::{HeaderValue, Request, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::{auth, config::AppConfig, episodes, medications, state::AppState, triggers, users};

const DEFAULT_LOG_FILTER: &str = "migraine_diary=debug,auth=debug,axum=info,tower_http=info";

/// `RUST_LOG` picks the filter, `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

/// The authentication service: `/api/auth/*` plus `/health`.
pub fn build_auth_app(state: AppState) -> Router {
    let config = state.config.clone();
    let router = Router::new()
        .nest("/api/auth", auth::router())
        .route("/health", get(health))
        .with_state(state);
    with_layers(router, &config)
}

/// The diary backend: users, episodes, triggers and medications.
pub fn build_api_app(state: AppState) -> Router {
    let config = state.config.clone();
    let router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/users", users::router())
        .nest("/api/episodes", episodes::router())
        .nest("/api/triggers", triggers::router())
        .nest("/api/medications", medications::router())
        .with_state(state);
    with_layers(router, &config)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Migraine Diary API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.is_production() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = ["http://localhost:3000", "http://frontend", config.frontend_url.as_str()]
        .into_iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin, "ignoring unparsable CORS origin");
                None
            }
        })
        .collect();

    // Wildcards are refused alongside credentials, so methods and headers mirror the preflight.
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

fn with_layers(router: Router, config: &AppConfig) -> Router {
    router.layer(cors_layer(config)).layer(
        TraceLayer::new_for_http()
            .make_span_with(|req: &Request<_>| {
                let method = req.method().clone();
                let uri = req.uri().clone();
                tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
            })
            .on_response(
                |res: &Response<_>, latency: std::time::Duration, span: &tracing::Span| {
                    let status = res.status();
                    span.record("status", tracing::field::display(status));
                    let latency_ms = latency.as_millis() as u64;
                    if status.is_server_error() {
                        tracing::error!(%status, latency_ms, "response");
                    } else {
                        tracing::info!(%status, latency_ms, "response");
                    }
                },
            ),
    )
}

/// Binds `APP_HOST:APP_PORT`, falling back to `0.0.0.0:default_port`.
pub async fn serve(app: Router, default_port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| default_port.to_string())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
