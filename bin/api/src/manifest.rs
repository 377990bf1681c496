//! `/.well-known/farcaster.json`

use axum::{
    Json,
    extract::State,
    http::{HeaderName, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tipstats_core::{AccountAssociation, AppError, Settings};
use tipstats_farcaster::association::{sign_association, signer_from_mnemonic};

use crate::AppState;

const CORS_HEADERS: [(HeaderName, &str); 4] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, OPTIONS"),
    (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type, Authorization"),
    (header::CACHE_CONTROL, "public, max-age=3600"),
];

fn webhook_url(settings: &Settings) -> String {
    match &settings.neynar_client_id {
        Some(id) => format!("https://api.neynar.com/f/app/{id}/event"),
        None => format!("{}/api/webhook", settings.app_url),
    }
}

/// A configured association wins; otherwise one is signed from the seed
/// phrase. Signing failures are logged and leave the manifest unsigned.
fn account_association(settings: &Settings, owner_fid: u64) -> Option<AccountAssociation> {
    if let Some(association) = &settings.account_association {
        return Some(association.clone());
    }
    let phrase = settings.seed_phrase.as_deref()?;

    let signed = reqwest::Url::parse(&settings.app_url)
        .map_err(|e| AppError::Config(format!("invalid APP_URL: {e}")))
        .and_then(|url| {
            url.host_str()
                .map(str::to_string)
                .ok_or_else(|| AppError::Config("APP_URL has no host".into()))
        })
        .and_then(|domain| {
            let signer = signer_from_mnemonic(phrase)?;
            sign_association(&signer, owner_fid, &domain)
        });
    match signed {
        Ok(association) => Some(association),
        Err(e) => {
            tracing::error!(owner_fid, error = %e, "Failed to sign account association");
            None
        }
    }
}

pub fn build_manifest(settings: &Settings) -> Result<Value, AppError> {
    let owner_fid = settings
        .owner_fid
        .ok_or_else(|| AppError::Config("FID is not configured".into()))?;

    if let Some(raw) = &settings.frame_metadata {
        match serde_json::from_str::<Value>(raw) {
            Ok(metadata) => return Ok(metadata),
            Err(e) => tracing::warn!(error = %e, "FRAME_METADATA is not valid JSON, generating manifest"),
        }
    }

    let app = &settings.app_url;
    let mut manifest = json!({
        "frame": {
            "version": "1",
            "name": settings.frame_name,
            "iconUrl": format!("{app}/icon.png"),
            "homeUrl": app,
            "imageUrl": format!("{app}/opengraph-image"),
            "buttonTitle": settings.frame_button_text,
            "splashImageUrl": format!("{app}/splash.png"),
            "splashBackgroundColor": "#f7f7f7",
            "webhookUrl": webhook_url(settings),
        }
    });
    match account_association(settings, owner_fid) {
        Some(association) => manifest["accountAssociation"] = json!(association),
        None => tracing::warn!(owner_fid, "No account association configured"),
    }
    Ok(manifest)
}

/// GET /.well-known/farcaster.json
pub async fn manifest(State(state): State<Arc<AppState>>) -> Response {
    match build_manifest(&state.settings) {
        Ok(manifest) => (CORS_HEADERS, Json(manifest)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to build manifest");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                CORS_HEADERS,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// OPTIONS /.well-known/farcaster.json
pub async fn manifest_preflight() -> Response {
    (StatusCode::NO_CONTENT, CORS_HEADERS).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::test_settings;

    #[test]
    fn generates_frame_manifest() {
        let manifest = build_manifest(&test_settings()).unwrap();
        let frame = &manifest["frame"];
        assert_eq!(frame["version"], "1");
        assert_eq!(frame["homeUrl"], "https://tips.example.com");
        assert_eq!(frame["iconUrl"], "https://tips.example.com/icon.png");
        assert_eq!(frame["imageUrl"], "https://tips.example.com/opengraph-image");
        assert_eq!(frame["webhookUrl"], "https://tips.example.com/api/webhook");
        assert!(manifest.get("accountAssociation").is_none());
    }

    #[test]
    fn neynar_webhook_and_association() {
        let settings = Settings {
            neynar_client_id: Some("client-1".into()),
            account_association: Some(AccountAssociation {
                header: "h".into(),
                payload: "p".into(),
                signature: "s".into(),
            }),
            ..test_settings()
        };
        let manifest = build_manifest(&settings).unwrap();
        assert_eq!(
            manifest["frame"]["webhookUrl"],
            "https://api.neynar.com/f/app/client-1/event"
        );
        assert_eq!(manifest["accountAssociation"]["payload"], "p");
    }

    #[test]
    fn signs_association_from_seed_phrase() {
        let settings = Settings {
            seed_phrase: Some("test test test test test test test test test test test junk".into()),
            ..test_settings()
        };
        let manifest = build_manifest(&settings).unwrap();
        let association = &manifest["accountAssociation"];
        assert!(association["header"].as_str().is_some_and(|h| !h.is_empty()));
        assert!(association["signature"].as_str().is_some_and(|s| !s.is_empty()));

        let configured = Settings {
            account_association: Some(AccountAssociation {
                header: "h".into(),
                payload: "p".into(),
                signature: "s".into(),
            }),
            ..settings
        };
        assert_eq!(build_manifest(&configured).unwrap()["accountAssociation"]["header"], "h");

        let broken = Settings {
            seed_phrase: Some("not a real phrase".into()),
            ..test_settings()
        };
        assert!(build_manifest(&broken).unwrap().get("accountAssociation").is_none());
    }

    #[test]
    fn metadata_override_and_fallback() {
        let settings = Settings {
            frame_metadata: Some(r#"{"frame":{"name":"Custom"}}"#.into()),
            ..test_settings()
        };
        assert_eq!(build_manifest(&settings).unwrap()["frame"]["name"], "Custom");

        let settings = Settings {
            frame_metadata: Some("{not json".into()),
            ..test_settings()
        };
        assert_eq!(build_manifest(&settings).unwrap()["frame"]["version"], "1");
    }

    #[test]
    fn owner_fid_is_required() {
        let settings = Settings {
            owner_fid: None,
            ..test_settings()
        };
        assert!(matches!(build_manifest(&settings), Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn preflight_carries_cors() {
        let res = manifest_preflight().await;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_METHODS], "GET, OPTIONS");
    }
}
