use anyhow::{Context, Result};
use axum::{routing::get, Router};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chainstate_common::{ChainDescriptor, ChainName};

mod error;
mod handlers;

pub struct AppState {
    pub pool: PgPool,
    pub chain: &'static ChainDescriptor,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "chainstate_api=info,tower_http=debug,sqlx=warn".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting chainstate API server");

    // Load configuration
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let chain: ChainName = std::env::var("CHAIN")
        .context("CHAIN must be set")?
        .parse()?;
    let host = std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("API_PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .context("Invalid API_PORT")?;

    // Create database pool
    let pool = chainstate_common::db::create_pool(&database_url, 20).await?;

    // Run migrations
    tracing::info!("Running database migrations");
    chainstate_common::db::run_migrations(&pool).await?;

    let state = Arc::new(AppState { pool, chain: chain.descriptor() });
    let app = router(state);

    let addr = format!("{}:{}", host, port);
    tracing::info!("Serving {} on {}", chain, addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Chain
        .route("/api/chain", get(handlers::chain::get_chain))
        .route("/api/status", get(handlers::chain::get_status))
        // Snapshots
        .route("/api/chain-state", get(handlers::snapshots::list_snapshots))
        .route("/api/chain-state/current", get(handlers::snapshots::get_current))
        // Accounts
        .route("/api/accounts", get(handlers::accounts::list_accounts))
        .route("/api/accounts/{id}", get(handlers::accounts::get_account))
        .route("/api/accounts/{id}/rank", get(handlers::accounts::get_account_rank))
        // Health
        .route("/health", get(|| async { "OK" }))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app(chain: ChainName) -> Router {
        // Never connects: these routes are answered before touching the database.
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://chainstate@localhost/chainstate")
            .unwrap();
        router(Arc::new(AppState { pool, chain: chain.descriptor() }))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(ChainName::Kusama)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_chain_descriptor() {
        let (status, body) = get_json(app(ChainName::Moonbeam), "/api/chain").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "moonbeam");
        assert_eq!(body["ss58_prefix"], serde_json::Value::Null);
        assert_eq!(body["para_id"], 2004);
        assert_eq!(body["relay_chain"], "polkadot");
        assert_eq!(body["tokens"][0]["symbol"], "GLMR");
        assert_eq!(body["tokens"][0]["decimals"], 18);
    }

    #[tokio::test]
    async fn test_invalid_account_id_is_bad_request() {
        let (status, body) = get_json(app(ChainName::Kusama), "/api/accounts/0x1234").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("0x1234"));

        let (status, _) = get_json(app(ChainName::Kusama), "/api/accounts/0OIl/rank").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
