//! Derived statistics. Everything here is a pure function of data fetched
//! at load time; nothing is cached or written back.

pub mod holdings;
pub mod ledger;
pub mod tips;

pub use holdings::{Allowance, Holdings, MemberType, compute_holdings};
pub use ledger::{
    LeaderboardEntry, LedgerStats, build_leaderboard, find_ledger_stats, leaderboard_fids,
};
pub use tips::{DayWindow, TipEntry, TipSummary, summarize_tips, tip_amount};
