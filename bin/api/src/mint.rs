use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use std::sync::Arc;
use tipstats_core::Settings;
use tipstats_farcaster::{MintTransaction, NftCollection};

use crate::{ApiError, AppState, app_err, json_ok};

fn contract_for(settings: &Settings, collection: NftCollection) -> &str {
    match collection {
        NftCollection::Og => &settings.og_nft_contract,
        NftCollection::Allowance => &settings.allowance_nft_contract,
    }
}

/// GET /api/mint/:collection — unsigned `mint()` transaction.
pub async fn mint_transaction(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let collection: NftCollection = collection.parse().map_err(|e| app_err(&e))?;
    let contract = contract_for(&state.settings, collection);
    let tx = MintTransaction::new(contract, state.settings.mint_chain_id).map_err(|e| {
        tracing::error!(?collection, error = %e, "Failed to build mint transaction");
        app_err(&e)
    })?;
    Ok(json_ok(tx))
}
