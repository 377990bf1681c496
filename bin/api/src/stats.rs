use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tipstats_core::AppError;
use tipstats_stats::{LedgerStats, find_ledger_stats};
use tipstats_storage::{models::LedgerRow, repos};

use crate::{ApiError, AppState, FidParams, json_ok, loaders};

/// GET /api/stats?fid= — the full frame view for one account.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FidParams>,
) -> Result<impl IntoResponse, ApiError> {
    let fid = params.parse()?;
    tracing::info!(fid, "Loading dashboard");
    Ok(json_ok(loaders::load_dashboard(&state, fid).await))
}

/// GET /api/tip-stats?fid= — today's sent and received tips.
pub async fn tip_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FidParams>,
) -> Result<impl IntoResponse, ApiError> {
    let fid = params.parse()?;
    let mut tips = loaders::load_tips(&state, fid).await;
    loaders::name_tips(&state, &mut tips).await;
    Ok(json_ok(tips))
}

/// GET /api/leaderboard — top accounts by all-time earnings.
pub async fn leaderboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    json_ok(loaders::load_leaderboard(&state).await)
}

/// GET /api/dune-stats?fid= — all-time earnings and rank.
///
/// Answers with bare `{ allTimeEarning, rank }` for the frame client.
pub async fn dune_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FidParams>,
) -> Response {
    let Some(fid) = params.raw() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "FID is required" })),
        )
            .into_response();
    };

    tracing::info!(fid, "Fetching ledger stats");
    let rows = repos::get_ledger_rows(&state.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()));
    ledger_response(fid, rows)
}

fn ledger_response(fid: &str, rows: Result<Vec<LedgerRow>, AppError>) -> Response {
    let rows = match rows {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(fid, error = %e, "Failed to fetch ledger");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch data", "details": e.to_string() })),
            )
                .into_response();
        }
    };

    if rows.is_empty() {
        tracing::warn!(fid, "Ledger table is empty");
    }
    let stats = find_ledger_stats(&rows, fid).unwrap_or_else(|| {
        tracing::warn!(fid, "No ledger data for FID");
        LedgerStats::default()
    });

    (StatusCode::OK, Json(stats)).into_response()
}

#[derive(Debug, Deserialize)]
pub struct NftDataRequest {
    #[serde(default)]
    wallets: Vec<String>,
}

/// POST /api/nft-data — allowance and tier for a set of wallets.
///
/// Answers with bare `{ allowance, memberType }` for the frame client.
pub async fn nft_data(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NftDataRequest>,
) -> impl IntoResponse {
    Json(loaders::load_holdings(&state, &req.wallets).await)
}
