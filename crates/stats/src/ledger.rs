use std::collections::HashMap;

use serde::Serialize;
use tipstats_storage::models::LedgerRow;

/// All-time earnings and rank for one account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerStats {
    pub all_time_earning: i64,
    pub rank: i64,
}

impl From<&LedgerRow> for LedgerStats {
    fn from(row: &LedgerRow) -> Self {
        Self {
            all_time_earning: row.all_time_peanut_count.unwrap_or(0),
            rank: row.rank.unwrap_or(0),
        }
    }
}

/// Find the row whose `parent_fid` or `fid` equals `fid`.
pub fn find_ledger_stats(rows: &[LedgerRow], fid: &str) -> Option<LedgerStats> {
    let fid = fid.trim();
    rows.iter()
        .find(|r| r.parent_fid.as_deref() == Some(fid) || r.fid.as_deref() == Some(fid))
        .map(LedgerStats::from)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub fid: u64,
    pub username: String,
    pub all_time_peanut_count: i64,
}

/// Fids of the rows that can appear on the leaderboard.
pub fn leaderboard_fids(rows: &[LedgerRow]) -> Vec<u64> {
    rows.iter().filter_map(row_fid).collect()
}

fn row_fid(row: &LedgerRow) -> Option<u64> {
    row.fid
        .as_deref()
        .and_then(|f| f.trim().parse::<u64>().ok())
        .filter(|&f| f > 0)
}

/// Shape ranked ledger rows into leaderboard entries.
///
/// Rows without a usable fid are dropped. Displayed ranks are the stored
/// rank minus one. Missing usernames become `user<fid>`.
pub fn build_leaderboard(
    rows: &[LedgerRow],
    usernames: &HashMap<u64, String>,
) -> Vec<LeaderboardEntry> {
    rows.iter()
        .filter_map(|row| {
            let fid = row_fid(row)?;
            Some(LeaderboardEntry {
                rank: row.rank.unwrap_or(0) - 1,
                fid,
                username: usernames
                    .get(&fid)
                    .cloned()
                    .unwrap_or_else(|| format!("user{fid}")),
                all_time_peanut_count: row.all_time_peanut_count.unwrap_or(0),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(parent: Option<&str>, fid: Option<&str>, count: i64, rank: i64) -> LedgerRow {
        LedgerRow {
            parent_fid: parent.map(str::to_string),
            fid: fid.map(str::to_string),
            all_time_peanut_count: Some(count),
            rank: Some(rank),
        }
    }

    #[test]
    fn matches_either_column() {
        let rows = vec![
            row(Some("100"), None, 500, 3),
            row(None, Some("200"), 900, 1),
        ];
        assert_eq!(
            find_ledger_stats(&rows, "100"),
            Some(LedgerStats {
                all_time_earning: 500,
                rank: 3
            })
        );
        assert_eq!(find_ledger_stats(&rows, "200").map(|s| s.rank), Some(1));
        assert_eq!(find_ledger_stats(&rows, "300"), None);
        assert_eq!(find_ledger_stats(&[], "100"), None);
    }

    #[test]
    fn null_columns_read_as_zero() {
        let rows = vec![LedgerRow {
            fid: Some("5".into()),
            ..LedgerRow::default()
        }];
        assert_eq!(find_ledger_stats(&rows, "5"), Some(LedgerStats::default()));
    }

    #[test]
    fn leaderboard_shapes_rows() {
        let rows = vec![
            row(None, Some("11"), 9000, 1),
            row(None, None, 8000, 2),
            row(None, Some("abc"), 7000, 3),
            row(None, Some("33"), 6000, 4),
        ];
        assert_eq!(leaderboard_fids(&rows), vec![11, 33]);

        let names = HashMap::from([(11, "alice".to_string())]);
        let board = build_leaderboard(&rows, &names);
        assert_eq!(
            board,
            vec![
                LeaderboardEntry {
                    rank: 0,
                    fid: 11,
                    username: "alice".into(),
                    all_time_peanut_count: 9000,
                },
                LeaderboardEntry {
                    rank: 3,
                    fid: 33,
                    username: "user33".into(),
                    all_time_peanut_count: 6000,
                },
            ]
        );
    }
}
