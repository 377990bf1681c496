use sqlx::PgPool;

use crate::models::*;

// ─── Ledger Queries ─────────────────────────────────────────────────────────

/// Read the whole ledger table. Matching by fid happens in the caller.
pub async fn get_ledger_rows(pool: &PgPool) -> Result<Vec<LedgerRow>, sqlx::Error> {
    let rows = sqlx::query_as::<_, LedgerRow>(
        "SELECT parent_fid, fid, all_time_peanut_count, rank FROM peanut_data",
    )
    .fetch_all(pool)
    .await?;

    tracing::debug!(rows = rows.len(), "Read ledger table");
    Ok(rows)
}

/// Top ranked ledger rows, best rank first.
pub async fn get_leaderboard_rows(pool: &PgPool, limit: i64) -> Result<Vec<LedgerRow>, sqlx::Error> {
    sqlx::query_as::<_, LedgerRow>(
        r#"
        SELECT parent_fid, fid, all_time_peanut_count, rank
        FROM peanut_data
        WHERE rank IS NOT NULL
        ORDER BY rank ASC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

// ─── Holder Queries ─────────────────────────────────────────────────────────

/// Holders of the OG collection.
pub async fn get_og_holders(pool: &PgPool) -> Result<Vec<HolderRow>, sqlx::Error> {
    sqlx::query_as::<_, HolderRow>("SELECT wallet, count FROM holders_nft")
        .fetch_all(pool)
        .await
}

/// Holders of the allowance collection.
pub async fn get_allowance_holders(pool: &PgPool) -> Result<Vec<HolderRow>, sqlx::Error> {
    sqlx::query_as::<_, HolderRow>("SELECT wallet, count FROM holders_new_nft")
        .fetch_all(pool)
        .await
}

/// Both holder snapshots.
pub async fn get_holder_tables(pool: &PgPool) -> Result<HolderTables, sqlx::Error> {
    let allowance = get_allowance_holders(pool).await?;
    let og = get_og_holders(pool).await?;

    tracing::debug!(
        og = og.len(),
        allowance = allowance.len(),
        "Read holder tables"
    );
    Ok(HolderTables { og, allowance })
}
