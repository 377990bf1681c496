use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tipstats_core::AppError;

use crate::models::{BulkUsersResponse, SearchCastsResponse, User};
use crate::search::{CastSource, SearchPage};

/// The bulk user endpoint accepts at most this many fids per call.
const BULK_USER_LIMIT: usize = 100;

/// Thin client over the Neynar v2 REST API.
#[derive(Debug, Clone)]
pub struct NeynarClient {
    http: reqwest::Client,
    base_url: String,
}

impl NeynarClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert("x-neynar-experimental", HeaderValue::from_static("false"));
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|e| AppError::Config(format!("invalid Neynar API key: {e}")))?;
        key.set_sensitive(true);
        headers.insert("x-api-key", key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, AppError> {
        let url = format!("{}{}", self.base_url, path);
        let res = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::Http(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            return Err(AppError::Http(format!("{path} responded with status {status}")));
        }

        res.json::<T>()
            .await
            .map_err(|e| AppError::Decode(format!("{path}: {e}")))
    }

    /// Look up profiles for a set of fids, batching to the API limit.
    pub async fn fetch_users(&self, fids: &[u64]) -> Result<Vec<User>, AppError> {
        let mut users = Vec::with_capacity(fids.len());
        for chunk in fids.chunks(BULK_USER_LIMIT) {
            let ids = chunk
                .iter()
                .map(u64::to_string)
                .collect::<Vec<_>>()
                .join(",");
            let res: BulkUsersResponse = self
                .get_json("/v2/farcaster/user/bulk", &[("fids", ids)])
                .await?;
            users.extend(res.users);
        }
        Ok(users)
    }

    /// Look up a single profile. `Ok(None)` when the fid is unknown.
    pub async fn fetch_user(&self, fid: u64) -> Result<Option<User>, AppError> {
        let users = self.fetch_users(&[fid]).await?;
        Ok(users.into_iter().find(|u| u.fid == fid))
    }

    /// Map fids to usernames. Lookup failures degrade to an empty map.
    pub async fn fetch_usernames(&self, fids: &[u64]) -> HashMap<u64, String> {
        if fids.is_empty() {
            return HashMap::new();
        }

        match self.fetch_users(fids).await {
            Ok(users) => users.into_iter().map(|u| (u.fid, u.username)).collect(),
            Err(e) => {
                tracing::error!(error = %e, count = fids.len(), "Failed to fetch usernames");
                HashMap::new()
            }
        }
    }
}

impl CastSource for NeynarClient {
    async fn search_page(
        &self,
        query: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<SearchPage, AppError> {
        let mut params = vec![("q", query.to_string()), ("limit", limit.to_string())];
        if let Some(cursor) = cursor {
            params.push(("cursor", cursor.to_string()));
        }

        let res: SearchCastsResponse = self.get_json("/v2/farcaster/cast/search", &params).await?;
        tracing::debug!(casts = res.result.casts.len(), "Fetched search page");

        Ok(SearchPage {
            casts: res.result.casts,
            next_cursor: res.result.next.and_then(|n| n.cursor),
        })
    }
}
