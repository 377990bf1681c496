//! tipstats API server — backend for the peanut tipping stats frame.

mod auth;
mod frame;
mod image;
mod loaders;
mod manifest;
mod mint;
mod stats;

use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tipstats_core::{AppError, Settings, telemetry};
use tipstats_farcaster::NeynarClient;
use tipstats_storage::{self as storage, PgPool};

use crate::auth::AuthStore;

/// Shared application state.
pub struct AppState {
    pub pool: PgPool,
    pub neynar: NeynarClient,
    pub settings: Settings,
    pub auth: AuthStore,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    telemetry::init();
    let settings = Settings::from_env()?;

    tracing::info!(app_url = %settings.app_url, "Starting tipstats API server");

    let pool = storage::connect(&settings.database_url).await?;
    if settings.run_migrations {
        sqlx::migrate!("../../migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }
    tracing::info!("Database ready");

    let neynar = NeynarClient::new(
        &settings.neynar_api_url,
        &settings.neynar_api_key,
        Duration::from_secs(settings.http_timeout_secs),
    )?;

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.api_port));
    let state = Arc::new(AppState {
        pool,
        neynar,
        auth: AuthStore::new(chrono::Duration::seconds(settings.session_ttl_secs)),
        settings,
    });

    let app = router(state);

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped.");
    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(frame::home))
        .route(
            "/.well-known/farcaster.json",
            get(manifest::manifest).options(manifest::manifest_preflight),
        )
        .route("/opengraph-image", get(image::opengraph_image))
        .route("/api/og", get(image::og_image))
        .route("/api/share", get(frame::share))
        .route("/api/stats", get(stats::dashboard))
        .route("/api/tip-stats", get(stats::tip_stats))
        .route("/api/dune-stats", get(stats::dune_stats))
        .route("/api/nft-data", post(stats::nft_data))
        .route("/api/leaderboard", get(stats::leaderboard))
        .route("/api/mint/:collection", get(mint::mint_transaction))
        .route("/api/auth/nonce", get(auth::nonce))
        .route("/api/auth/signin", post(auth::sign_in))
        .route("/api/auth/session", get(auth::session))
        .route("/api/auth/signout", post(auth::sign_out))
        .route("/health", get(health))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down gracefully…");
}

// ─── Query Params ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct FidParams {
    fid: Option<String>,
}

impl FidParams {
    /// The raw `fid` parameter, if present and non-blank.
    pub fn raw(&self) -> Option<&str> {
        self.fid.as_deref().map(str::trim).filter(|f| !f.is_empty())
    }

    /// The `fid` parameter as a number.
    pub fn parse(&self) -> Result<u64, ApiError> {
        let raw = self
            .raw()
            .ok_or_else(|| json_err(StatusCode::BAD_REQUEST, "FID is required"))?;
        raw.parse()
            .map_err(|_| json_err(StatusCode::BAD_REQUEST, &format!("Invalid FID: {raw}")))
    }
}

// ─── Response Types ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    success: bool,
    data: T,
}

pub type ApiError = (StatusCode, Json<ApiResponse<String>>);

pub fn json_ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
    })
}

pub fn json_err(status: StatusCode, msg: &str) -> ApiError {
    (
        status,
        Json(ApiResponse {
            success: false,
            data: msg.to_string(),
        }),
    )
}

/// Map a service error onto an HTTP status.
pub fn app_err(e: &AppError) -> ApiError {
    let status = match e {
        AppError::Http(_) | AppError::Decode(_) => StatusCode::BAD_GATEWAY,
        AppError::Auth(_) => StatusCode::UNAUTHORIZED,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Database(_) | AppError::Config(_) | AppError::Other(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    json_err(status, &e.to_string())
}

// ─── Handlers ───────────────────────────────────────────────────────────────

async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn test_settings() -> Settings {
        Settings {
            database_url: "postgres://localhost/tipstats".into(),
            api_port: 3000,
            app_url: "https://tips.example.com".into(),
            run_migrations: false,
            neynar_api_url: "https://api.neynar.com".into(),
            neynar_api_key: "test-key".into(),
            neynar_client_id: None,
            http_timeout_secs: 15,
            search_query: "🥜".into(),
            search_page_size: 100,
            search_max_pages: 10,
            tip_marker: "🥜".into(),
            default_fid: 443855,
            leaderboard_size: 11,
            owner_fid: Some(443855),
            frame_name: "Peanut Tips".into(),
            frame_button_text: "Check your stats".into(),
            frame_metadata: None,
            account_association: None,
            seed_phrase: None,
            og_nft_contract: "0x8f7aa5ffd552e9cea4d0dd06a8bf97abaae9136e".into(),
            allowance_nft_contract: "0x8f7aa5ffd552e9cea4d0dd06a8bf97abaae9136e".into(),
            mint_chain_id: 8453,
            session_ttl_secs: 86_400,
        }
    }

    /// State whose pool never connects; only for paths that return before I/O.
    pub(crate) fn test_state() -> Arc<AppState> {
        let settings = test_settings();
        Arc::new(AppState {
            pool: sqlx::postgres::PgPoolOptions::new()
                .connect_lazy(&settings.database_url)
                .unwrap(),
            neynar: NeynarClient::new(
                &settings.neynar_api_url,
                &settings.neynar_api_key,
                Duration::from_secs(1),
            )
            .unwrap(),
            auth: AuthStore::new(chrono::Duration::hours(1)),
            settings,
        })
    }

    #[test]
    fn fid_params() {
        let params = FidParams {
            fid: Some(" 443855 ".into()),
        };
        assert_eq!(params.parse().ok(), Some(443855));

        let missing = FidParams { fid: Some("".into()) };
        assert_eq!(missing.raw(), None);
        assert_eq!(missing.parse().err().map(|e| e.0), Some(StatusCode::BAD_REQUEST));

        let bad = FidParams {
            fid: Some("alice".into()),
        };
        assert_eq!(bad.parse().err().map(|e| e.0), Some(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn error_statuses() {
        assert_eq!(app_err(&AppError::Auth("x".into())).0, StatusCode::UNAUTHORIZED);
        assert_eq!(app_err(&AppError::Http("x".into())).0, StatusCode::BAD_GATEWAY);
        assert_eq!(app_err(&AppError::NotFound("x".into())).0, StatusCode::NOT_FOUND);
        assert_eq!(
            app_err(&AppError::Database("x".into())).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
