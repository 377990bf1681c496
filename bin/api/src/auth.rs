//! Sign In With Farcaster: nonces, verification and bearer sessions.

use std::{collections::HashMap, sync::Arc};

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use chrono::{DateTime, Duration, Utc};
use rand::{Rng, distributions::Alphanumeric};
use serde::{Deserialize, Serialize};
use tipstats_core::AppError;
use tipstats_farcaster::{SignInMessage, siwf};
use tokio::sync::Mutex;

use crate::{ApiError, AppState, app_err, json_err, json_ok};

const NONCE_TTL_MINUTES: i64 = 10;
const NONCE_LEN: usize = 16;
const TOKEN_LEN: usize = 48;

fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// A signed-in account.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub fid: u64,
    pub username: String,
    pub display_name: Option<String>,
    pub pfp_url: Option<String>,
    pub address: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    nonces: HashMap<String, DateTime<Utc>>,
    sessions: HashMap<String, Session>,
}

/// In-memory nonce and session store.
pub struct AuthStore {
    session_ttl: Duration,
    inner: Mutex<Inner>,
}

impl AuthStore {
    pub fn new(session_ttl: Duration) -> Self {
        Self {
            session_ttl,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub async fn issue_nonce(&self) -> String {
        self.issue_nonce_at(Utc::now()).await
    }

    async fn issue_nonce_at(&self, now: DateTime<Utc>) -> String {
        let nonce = random_token(NONCE_LEN);
        let mut inner = self.inner.lock().await;
        inner.nonces.retain(|_, expires| *expires > now);
        inner
            .nonces
            .insert(nonce.clone(), now + Duration::minutes(NONCE_TTL_MINUTES));
        nonce
    }

    /// Remove `nonce`, returning whether it was live. A nonce works once.
    pub async fn consume_nonce(&self, nonce: &str) -> bool {
        self.consume_nonce_at(nonce, Utc::now()).await
    }

    async fn consume_nonce_at(&self, nonce: &str, now: DateTime<Utc>) -> bool {
        let mut inner = self.inner.lock().await;
        inner
            .nonces
            .remove(nonce)
            .is_some_and(|expires| expires > now)
    }

    /// Open a session and return its bearer token.
    pub async fn create_session(&self, session: Session) -> String {
        self.create_session_at(session, Utc::now()).await
    }

    async fn create_session_at(&self, session: Session, now: DateTime<Utc>) -> String {
        let token = random_token(TOKEN_LEN);
        let mut inner = self.inner.lock().await;
        inner.sessions.retain(|_, s| s.expires_at > now);
        inner.sessions.insert(token.clone(), session);
        token
    }

    pub fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.session_ttl
    }

    pub async fn session(&self, token: &str) -> Option<Session> {
        self.session_at(token, Utc::now()).await
    }

    async fn session_at(&self, token: &str, now: DateTime<Utc>) -> Option<Session> {
        let mut inner = self.inner.lock().await;
        match inner.sessions.get(token) {
            Some(s) if s.expires_at > now => Some(s.clone()),
            Some(_) => {
                inner.sessions.remove(token);
                None
            }
            None => None,
        }
    }

    pub async fn revoke(&self, token: &str) -> bool {
        self.inner.lock().await.sessions.remove(token).is_some()
    }
}

/// Host (and port, when explicit) of the public app URL.
fn app_domain(app_url: &str) -> Result<String, AppError> {
    let url = reqwest::Url::parse(app_url)
        .map_err(|e| AppError::Config(format!("invalid APP_URL {app_url}: {e}")))?;
    let host = url
        .host_str()
        .ok_or_else(|| AppError::Config(format!("APP_URL {app_url} has no host")))?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[derive(Debug, Serialize)]
pub struct NonceResponse {
    nonce: String,
}

/// GET /api/auth/nonce
pub async fn nonce(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    json_ok(NonceResponse {
        nonce: state.auth.issue_nonce().await,
    })
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    message: String,
    signature: String,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    token: String,
    session: Session,
}

/// POST /api/auth/signin
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignInRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message: SignInMessage = req
        .message
        .parse()
        .map_err(|e: AppError| json_err(StatusCode::BAD_REQUEST, &e.to_string()))?;

    if !state.auth.consume_nonce(&message.nonce).await {
        tracing::warn!(nonce = %message.nonce, "Sign-in with unknown or expired nonce");
        return Err(json_err(StatusCode::UNAUTHORIZED, "Invalid or expired nonce"));
    }

    let domain = app_domain(&state.settings.app_url).map_err(|e| app_err(&e))?;
    let now = Utc::now();
    let verified =
        siwf::verify(&req.message, &req.signature, &domain, now).map_err(|e| {
            tracing::warn!(error = %e, "Sign-in verification failed");
            app_err(&e)
        })?;

    let user = state
        .neynar
        .fetch_user(verified.fid)
        .await
        .map_err(|e| app_err(&e))?
        .ok_or_else(|| json_err(StatusCode::UNAUTHORIZED, "Unknown FID"))?;

    let address = verified.address.to_string();
    let is_custody = user
        .custody_address
        .as_deref()
        .is_some_and(|c| c.eq_ignore_ascii_case(&address));
    if !is_custody {
        tracing::warn!(fid = verified.fid, %address, "Signer is not the custody address");
        return Err(json_err(
            StatusCode::UNAUTHORIZED,
            "Signer is not the custody address for this FID",
        ));
    }

    let session = Session {
        fid: user.fid,
        username: user.username,
        display_name: user.display_name,
        pfp_url: user.pfp_url,
        address,
        expires_at: state.auth.expiry_from(now),
    };
    let token = state.auth.create_session(session.clone()).await;
    tracing::info!(fid = session.fid, "Signed in");

    Ok(json_ok(SignInResponse { token, session }))
}

/// GET /api/auth/session
pub async fn session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| json_err(StatusCode::UNAUTHORIZED, "Missing bearer token"))?;
    let session = state
        .auth
        .session(token)
        .await
        .ok_or_else(|| json_err(StatusCode::UNAUTHORIZED, "Session expired or unknown"))?;
    Ok(json_ok(session))
}

/// POST /api/auth/signout
pub async fn sign_out(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| json_err(StatusCode::UNAUTHORIZED, "Missing bearer token"))?;
    Ok(json_ok(state.auth.revoke(token).await))
}
