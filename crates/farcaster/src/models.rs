use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── User ───────────────────────────────────────────────────────────────────

/// A Farcaster account as returned by the profile API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub fid: u64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub pfp_url: Option<String>,
    #[serde(default)]
    pub custody_address: Option<String>,
    /// Verified wallet addresses.
    #[serde(default)]
    pub verifications: Vec<String>,
}

impl User {
    /// Every wallet tied to the account: verified addresses first, then the
    /// custody address unless it is already listed.
    pub fn wallets(&self) -> Vec<String> {
        let mut wallets: Vec<String> = Vec::with_capacity(self.verifications.len() + 1);
        for addr in self.verifications.iter().chain(self.custody_address.iter()) {
            if addr.is_empty() || wallets.iter().any(|w| w.eq_ignore_ascii_case(addr)) {
                continue;
            }
            wallets.push(addr.clone());
        }
        wallets
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkUsersResponse {
    #[serde(default)]
    pub users: Vec<User>,
}

// ─── Cast ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CastAuthor {
    pub fid: u64,
}

/// The author a reply points at. Top-level casts carry `{ "fid": null }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParentAuthor {
    #[serde(default)]
    pub fid: Option<u64>,
}

/// An immutable post returned by the search API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cast {
    pub hash: String,
    #[serde(default)]
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub author: CastAuthor,
    #[serde(default)]
    pub parent_author: Option<ParentAuthor>,
}

impl Cast {
    /// FID of the account this cast replies to, if any.
    pub fn parent_fid(&self) -> Option<u64> {
        self.parent_author.as_ref().and_then(|p| p.fid)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchCastsResponse {
    pub result: SearchResult,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResult {
    #[serde(default)]
    pub casts: Vec<Cast>,
    #[serde(default)]
    pub next: Option<NextCursor>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NextCursor {
    #[serde(default)]
    pub cursor: Option<String>,
}
