//! Lookups behind the stats endpoints.
//!
//! Every loader except the profile lookup degrades to a zero or placeholder
//! value on failure and logs the cause.

use serde::Serialize;
use tipstats_core::AppError;
use tipstats_farcaster::{User, collect_casts};
use tipstats_stats::{
    DayWindow, Holdings, LeaderboardEntry, LedgerStats, TipSummary, build_leaderboard,
    compute_holdings, find_ledger_stats, leaderboard_fids, summarize_tips,
};
use tipstats_storage::repos;

use crate::AppState;

pub async fn load_profile(state: &AppState, fid: u64) -> Result<Option<User>, AppError> {
    let user = state.neynar.fetch_user(fid).await?;
    if user.is_none() {
        tracing::warn!(fid, "User not found");
    }
    Ok(user)
}

/// Today's sent and received tips, sampled from the cast search.
pub async fn load_tips(state: &AppState, fid: u64) -> TipSummary {
    let s = &state.settings;
    let collected = collect_casts(
        &state.neynar,
        &s.search_query,
        s.search_page_size,
        s.search_max_pages,
    )
    .await;

    summarize_tips(&collected.casts, fid, &DayWindow::today(), &s.tip_marker)
}

/// Resolve the usernames of everyone in a tip summary.
pub async fn name_tips(state: &AppState, summary: &mut TipSummary) {
    let names = state
        .neynar
        .fetch_usernames(&summary.counterpart_fids())
        .await;
    summary.name_counterparts(&names);
}

pub async fn load_ledger(state: &AppState, fid: u64) -> LedgerStats {
    match repos::get_ledger_rows(&state.pool).await {
        Ok(rows) => find_ledger_stats(&rows, &fid.to_string()).unwrap_or_else(|| {
            tracing::warn!(fid, rows = rows.len(), "No ledger row for FID");
            LedgerStats::default()
        }),
        Err(e) => {
            tracing::error!(fid, error = %e, "Failed to read ledger");
            LedgerStats::default()
        }
    }
}

pub async fn load_holdings(state: &AppState, wallets: &[String]) -> Holdings {
    if wallets.is_empty() {
        tracing::debug!("No wallets to check for holdings");
        return Holdings::default();
    }

    match repos::get_holder_tables(&state.pool).await {
        Ok(tables) => {
            let holdings = compute_holdings(wallets, &tables);
            tracing::debug!(
                wallets = wallets.len(),
                allowance = %holdings.allowance,
                member_type = %holdings.member_type,
                "Computed holdings"
            );
            holdings
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to read holder tables");
            Holdings::default()
        }
    }
}

pub async fn load_leaderboard(state: &AppState) -> Vec<LeaderboardEntry> {
    let rows = match repos::get_leaderboard_rows(&state.pool, state.settings.leaderboard_size).await
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(error = %e, "Failed to read leaderboard");
            return Vec::new();
        }
    };
    if rows.is_empty() {
        tracing::warn!("Leaderboard is empty");
        return Vec::new();
    }

    let names = state.neynar.fetch_usernames(&leaderboard_fids(&rows)).await;
    build_leaderboard(&rows, &names)
}

/// Profile plus the wallet-dependent holdings lookup.
struct ProfileView {
    user: Option<User>,
    wallets: Vec<String>,
    holdings: Holdings,
    error: Option<String>,
}

async fn load_profile_view(state: &AppState, fid: u64) -> ProfileView {
    match load_profile(state, fid).await {
        Ok(Some(user)) => {
            let wallets = user.wallets();
            let holdings = load_holdings(state, &wallets).await;
            ProfileView {
                user: Some(user),
                wallets,
                holdings,
                error: None,
            }
        }
        Ok(None) => ProfileView {
            user: None,
            wallets: Vec::new(),
            holdings: Holdings::default(),
            error: Some("User not found".into()),
        },
        Err(e) => {
            tracing::error!(fid, error = %e, "Failed to fetch user data");
            ProfileView {
                user: None,
                wallets: Vec::new(),
                holdings: Holdings::default(),
                error: Some(format!("Failed to fetch user data: {e}")),
            }
        }
    }
}

/// Everything the frame shows for one account.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub fid: u64,
    pub user: Option<User>,
    pub wallets: Vec<String>,
    pub tips: TipSummary,
    pub ledger: LedgerStats,
    pub holdings: Holdings,
    pub leaderboard: Vec<LeaderboardEntry>,
    /// Set when the profile lookup failed.
    pub error: Option<String>,
}

/// Run all lookups for `fid` concurrently.
pub async fn load_dashboard(state: &AppState, fid: u64) -> Dashboard {
    let tips = async {
        let mut tips = load_tips(state, fid).await;
        name_tips(state, &mut tips).await;
        tips
    };

    let (profile, tips, ledger, leaderboard) = tokio::join!(
        load_profile_view(state, fid),
        tips,
        load_ledger(state, fid),
        load_leaderboard(state),
    );

    Dashboard {
        fid,
        user: profile.user,
        wallets: profile.wallets,
        tips,
        ledger,
        holdings: profile.holdings,
        leaderboard,
        error: profile.error,
    }
}

/// The subset of the dashboard drawn on the share image.
pub struct CardData {
    pub fid: u64,
    pub user: Option<User>,
    pub tips: TipSummary,
    pub ledger: LedgerStats,
    pub holdings: Holdings,
}

pub async fn load_card(state: &AppState, fid: u64) -> CardData {
    let (profile, tips, ledger) = tokio::join!(
        load_profile_view(state, fid),
        load_tips(state, fid),
        load_ledger(state, fid),
    );

    CardData {
        fid,
        user: profile.user,
        tips,
        ledger,
        holdings: profile.holdings,
    }
}
