use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse},
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tipstats_core::Settings;

use crate::{ApiError, AppState, FidParams, image::escape_xml, json_ok};

const COMPOSE_URL: &str = "https://warpcast.com/~/compose";
const SHARE_TEXT: &str = "Check out my Farcaster Tips Stats!";
const SPLASH_BACKGROUND: &str = "#f7f7f7";

/// The `fc:frame` embed advertised on the landing page.
fn frame_embed(settings: &Settings) -> serde_json::Value {
    let app = &settings.app_url;
    json!({
        "version": "next",
        "imageUrl": format!("{app}/opengraph-image"),
        "button": {
            "title": settings.frame_button_text,
            "action": {
                "type": "launch_frame",
                "name": settings.frame_name,
                "url": app,
                "splashImageUrl": format!("{app}/splash.png"),
                "splashBackgroundColor": SPLASH_BACKGROUND,
            }
        }
    })
}

fn home_page(settings: &Settings) -> String {
    let app = &settings.app_url;
    let name = escape_xml(&settings.frame_name);
    let embed = escape_xml(&frame_embed(settings).to_string());
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8"/>
<title>{name}</title>
<meta property="og:title" content="{name}"/>
<meta property="og:description" content="Your peanut tipping stats on Farcaster"/>
<meta property="og:image" content="{image}"/>
<meta name="fc:frame" content="{embed}"/>
</head>
<body><h1>{name}</h1></body>
</html>"#,
        image = escape_xml(&format!("{app}/opengraph-image")),
    )
}

/// GET / — landing page carrying the frame embed.
pub async fn home(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(home_page(&state.settings))
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShareLinks {
    pub image_url: String,
    pub compose_url: String,
}

pub fn share_links(app_url: &str, fid: u64) -> ShareLinks {
    let image_url = format!("{app_url}/api/og?fid={fid}");
    let compose_url = reqwest::Url::parse_with_params(
        COMPOSE_URL,
        [("text", SHARE_TEXT), ("embeds[]", image_url.as_str())],
    )
    .map(String::from)
    .unwrap_or_else(|_| COMPOSE_URL.to_string());

    ShareLinks {
        image_url,
        compose_url,
    }
}

/// GET /api/share?fid= — links for casting the stats card.
pub async fn share(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FidParams>,
) -> Result<impl IntoResponse, ApiError> {
    let fid = params.parse()?;
    Ok(json_ok(share_links(&state.settings.app_url, fid)))
}
