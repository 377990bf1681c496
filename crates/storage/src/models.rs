use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ─── Ledger ─────────────────────────────────────────────────────────────────

/// One row of the externally computed `peanut_data` table.
///
/// Identifiers are stored as text; either column may carry the user's fid.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct LedgerRow {
    pub parent_fid: Option<String>,
    pub fid: Option<String>,
    pub all_time_peanut_count: Option<i64>,
    pub rank: Option<i64>,
}

// ─── Holders ────────────────────────────────────────────────────────────────

/// A wallet's token count in one of the NFT holder snapshots.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HolderRow {
    pub wallet: String,
    pub count: Option<i64>,
}

/// The two holder snapshots, read together.
#[derive(Debug, Clone, Default)]
pub struct HolderTables {
    /// `holders_nft`: the OG collection.
    pub og: Vec<HolderRow>,
    /// `holders_new_nft`: the allowance collection.
    pub allowance: Vec<HolderRow>,
}
