use std::fmt;

use serde::{Serialize, Serializer};
use tipstats_storage::models::{HolderRow, HolderTables};

/// Allowance granted per allowance-collection token.
pub const ALLOWANCE_NFT_WEIGHT: u64 = 30;
/// Allowance granted per OG-collection token.
pub const OG_NFT_WEIGHT: u64 = 150;
/// Shown in place of a zero allowance.
pub const ALLOWANCE_PLACEHOLDER: &str = "Mint your allowance";

/// Member tier derived from which collections an account holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MemberType {
    #[default]
    NotActive,
    /// Allowance collection only.
    Active,
    /// OG collection only.
    Og,
    /// Both collections.
    Hero,
}

impl MemberType {
    pub fn label(self) -> &'static str {
        match self {
            Self::NotActive => "Not Active",
            Self::Active => "Active",
            Self::Og => "OG",
            Self::Hero => "Hero",
        }
    }

    fn with_allowance_nft(self) -> Self {
        match self {
            Self::Og => Self::Hero,
            _ => Self::Active,
        }
    }

    fn with_og_nft(self) -> Self {
        match self {
            Self::Active => Self::Hero,
            _ => Self::Og,
        }
    }
}

impl fmt::Display for MemberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for MemberType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Allowance amount; zero is reported as [`ALLOWANCE_PLACEHOLDER`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Allowance {
    Amount(u64),
    #[default]
    Placeholder,
}

impl From<u64> for Allowance {
    fn from(amount: u64) -> Self {
        if amount > 0 {
            Self::Amount(amount)
        } else {
            Self::Placeholder
        }
    }
}

impl fmt::Display for Allowance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Amount(n) => write!(f, "{n}"),
            Self::Placeholder => f.write_str(ALLOWANCE_PLACEHOLDER),
        }
    }
}

impl Serialize for Allowance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Amount(n) => serializer.serialize_u64(*n),
            Self::Placeholder => serializer.serialize_str(ALLOWANCE_PLACEHOLDER),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Holdings {
    pub allowance: Allowance,
    pub member_type: MemberType,
}

fn holder_count(rows: &[HolderRow], wallet: &str) -> Option<u64> {
    rows.iter()
        .find(|h| h.wallet.eq_ignore_ascii_case(wallet))
        .map(|h| h.count.unwrap_or(0).max(0) as u64)
}

/// Combine per-wallet holdings into an allowance and a tier.
///
/// Wallets are visited in order. A wallet found in the allowance snapshot
/// moves the tier to `Active` (or `Hero` if it was `OG`); one found in the
/// OG snapshot moves it to `OG` (or `Hero` if it was `Active`). A later
/// single-collection match replaces an earlier `Hero`.
pub fn compute_holdings(wallets: &[String], tables: &HolderTables) -> Holdings {
    let mut amount: u64 = 0;
    let mut member_type = MemberType::NotActive;

    for wallet in wallets {
        if let Some(count) = holder_count(&tables.allowance, wallet) {
            amount = amount.saturating_add(count.saturating_mul(ALLOWANCE_NFT_WEIGHT));
            member_type = member_type.with_allowance_nft();
        }
        if let Some(count) = holder_count(&tables.og, wallet) {
            amount = amount.saturating_add(count.saturating_mul(OG_NFT_WEIGHT));
            member_type = member_type.with_og_nft();
        }
    }

    Holdings {
        allowance: Allowance::from(amount),
        member_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(wallet: &str, count: i64) -> HolderRow {
        HolderRow {
            wallet: wallet.into(),
            count: Some(count),
        }
    }

    fn tables(og: Vec<HolderRow>, allowance: Vec<HolderRow>) -> HolderTables {
        HolderTables { og, allowance }
    }

    fn wallets(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn no_holdings_is_inactive() {
        let t = tables(vec![row("0xother", 3)], vec![]);
        let h = compute_holdings(&wallets(&["0xme"]), &t);
        assert_eq!(h.allowance, Allowance::Placeholder);
        assert_eq!(h.member_type, MemberType::NotActive);

        let h = compute_holdings(&[], &t);
        assert_eq!(h, Holdings::default());
    }

    #[test]
    fn og_only() {
        let t = tables(vec![row("0xME", 1)], vec![]);
        let h = compute_holdings(&wallets(&["0xme"]), &t);
        assert_eq!(h.allowance, Allowance::Amount(150));
        assert_eq!(h.member_type, MemberType::Og);
    }

    #[test]
    fn allowance_only() {
        let t = tables(vec![], vec![row("0xme", 2)]);
        let h = compute_holdings(&wallets(&["0xme"]), &t);
        assert_eq!(h.allowance, Allowance::Amount(60));
        assert_eq!(h.member_type, MemberType::Active);
    }

    #[test]
    fn both_collections_make_hero() {
        let t = tables(vec![row("0xme", 1)], vec![row("0xme", 1)]);
        let h = compute_holdings(&wallets(&["0xme"]), &t);
        assert_eq!(h.allowance, Allowance::Amount(180));
        assert_eq!(h.member_type, MemberType::Hero);
    }

    #[test]
    fn hero_across_wallets() {
        let t = tables(vec![row("0xa", 1)], vec![row("0xb", 1)]);
        let h = compute_holdings(&wallets(&["0xa", "0xb"]), &t);
        assert_eq!(h.allowance, Allowance::Amount(180));
        assert_eq!(h.member_type, MemberType::Hero);
    }

    #[test]
    fn later_allowance_wallet_replaces_hero() {
        let t = tables(vec![row("0xa", 1)], vec![row("0xa", 1), row("0xb", 1)]);
        let h = compute_holdings(&wallets(&["0xa", "0xb"]), &t);
        assert_eq!(h.allowance, Allowance::Amount(150 + 30 + 30));
        assert_eq!(h.member_type, MemberType::Active);
    }

    #[test]
    fn later_og_wallet_replaces_hero() {
        let t = tables(vec![row("0xa", 1), row("0xc", 2)], vec![row("0xa", 1)]);
        let h = compute_holdings(&wallets(&["0xa", "0xc"]), &t);
        assert_eq!(h.allowance, Allowance::Amount(150 + 30 + 300));
        assert_eq!(h.member_type, MemberType::Og);
    }

    #[test]
    fn zero_count_still_sets_tier() {
        let t = tables(vec![], vec![HolderRow {
            wallet: "0xme".into(),
            count: None,
        }]);
        let h = compute_holdings(&wallets(&["0xme"]), &t);
        assert_eq!(h.allowance, Allowance::Placeholder);
        assert_eq!(h.member_type, MemberType::Active);
    }

    #[test]
    fn serializes_number_or_placeholder() {
        let json = serde_json::to_value(Holdings {
            allowance: Allowance::Amount(180),
            member_type: MemberType::Hero,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "allowance": 180, "memberType": "Hero" }));

        let json = serde_json::to_value(Holdings::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "allowance": "Mint your allowance", "memberType": "Not Active" })
        );
    }
}
