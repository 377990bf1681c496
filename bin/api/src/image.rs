//! The 1200×630 share card, drawn as SVG.

use axum::{
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::{
    AppState, FidParams,
    loaders::{self, CardData},
};

pub const WIDTH: u32 = 1200;
pub const HEIGHT: u32 = 630;

const PLACEHOLDER_AVATAR: &str = "https://via.placeholder.com/150";
const FONT: &str = "'Poetsen One', sans-serif";
const GOLD: &str = "#f5c542";
const CREDIT: &str = "Frame by: @arsalang.eth & @jeyloo.eth";

/// Escape text for use in XML/HTML content and attributes.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn is_http_url(url: &str) -> bool {
    reqwest::Url::parse(url).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}

fn background() -> String {
    format!(
        r##"<defs>
  <linearGradient id="bg" x1="0" y1="0" x2="1" y2="1">
    <stop offset="0%" stop-color="#2b1409"/>
    <stop offset="50%" stop-color="#4a2512"/>
    <stop offset="100%" stop-color="#6b3a1e"/>
  </linearGradient>
  <clipPath id="avatar"><circle cx="250" cy="130" r="60"/></clipPath>
</defs>
<rect width="{WIDTH}" height="{HEIGHT}" fill="url(#bg)"/>"##
    )
}

fn tile(x: u32, y: u32, label: &str, value: &str) -> String {
    let cx = x + 235;
    format!(
        r##"<rect x="{x}" y="{y}" width="470" height="100" rx="12" fill="#4a3a2a"/>
<text x="{cx}" y="{ly}" font-size="20" fill="{GOLD}" text-anchor="middle">{label}</text>
<text x="{cx}" y="{vy}" font-size="28" fill="#ffffff" text-anchor="middle">{value}</text>"##,
        ly = y + 38,
        vy = y + 80,
        label = escape_xml(label),
        value = escape_xml(value),
    )
}

/// Draw the stats card.
pub fn render_card(card: &CardData) -> String {
    let username = card
        .user
        .as_ref()
        .map(|u| u.username.as_str())
        .filter(|u| !u.is_empty())
        .unwrap_or("Unknown");
    let avatar = card
        .user
        .as_ref()
        .and_then(|u| u.pfp_url.as_deref())
        .filter(|url| is_http_url(url))
        .unwrap_or(PLACEHOLDER_AVATAR);

    let tiles = [
        ("Today Earning", format!("{} 🥜", card.tips.today_earning)),
        ("All-Time Earning", format!("{} 🥜", card.ledger.all_time_earning)),
        ("Tipped Today", format!("{} 🥜", card.tips.tipped_today)),
        ("Rank", format!("#{}", card.ledger.rank)),
        ("Allowance", card.holdings.allowance.to_string()),
        ("Member Type", card.holdings.member_type.to_string()),
    ];
    let tiles: String = tiles
        .iter()
        .enumerate()
        .map(|(i, (label, value))| {
            let col = (i % 2) as u32;
            let row = (i / 2) as u32;
            tile(120 + col * 490, 220 + row * 110, label, value)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="{FONT}">
{bg}
<rect x="100" y="40" width="1000" height="530" rx="24" fill="#3a2a1a" fill-opacity="0.85" stroke="#5a3a2a" stroke-opacity="0.5"/>
<image href="{avatar}" x="190" y="70" width="120" height="120" clip-path="url(#avatar)" preserveAspectRatio="xMidYMid slice"/>
<circle cx="250" cy="130" r="60" fill="none" stroke="#ffffff" stroke-width="4"/>
<text x="330" y="125" font-size="48" fill="{GOLD}">@{username}</text>
<text x="330" y="165" font-size="24" fill="#ffffff">FID: {fid}</text>
{tiles}
<text x="600" y="605" font-size="20" fill="{GOLD}" text-anchor="middle">{credit}</text>
</svg>"##,
        bg = background(),
        avatar = escape_xml(avatar),
        username = escape_xml(username),
        fid = card.fid,
        credit = escape_xml(CREDIT),
    )
}

/// A plain card carrying only a message.
pub fn render_error(message: &str) -> String {
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="{FONT}">
{bg}
<text x="600" y="300" font-size="32" fill="{GOLD}" text-anchor="middle">Error generating image</text>
<text x="600" y="350" font-size="24" fill="#ffffff" text-anchor="middle">{message}</text>
</svg>"##,
        bg = background(),
        message = escape_xml(message),
    )
}

fn svg_response(status: StatusCode, svg: String) -> Response {
    (
        status,
        [
            (header::CONTENT_TYPE, "image/svg+xml"),
            (
                header::CACHE_CONTROL,
                "no-cache, no-store, must-revalidate",
            ),
            (header::PRAGMA, "no-cache"),
            (header::EXPIRES, "0"),
        ],
        svg,
    )
        .into_response()
}

async fn card_response(state: &AppState, fid: u64) -> Response {
    tracing::info!(fid, "Rendering share image");
    let card = loaders::load_card(state, fid).await;
    svg_response(StatusCode::OK, render_card(&card))
}

/// GET /api/og?fid= — share image for an account.
pub async fn og_image(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FidParams>,
) -> Response {
    let fid = match params.raw() {
        None => state.settings.default_fid,
        Some(raw) => match raw.parse() {
            Ok(fid) => fid,
            Err(_) => {
                tracing::warn!(fid = raw, "Invalid FID for share image");
                return svg_response(StatusCode::BAD_REQUEST, render_error("Invalid FID"));
            }
        },
    };
    card_response(&state, fid).await
}

/// GET /opengraph-image — share image for the default account.
pub async fn opengraph_image(State(state): State<Arc<AppState>>) -> Response {
    card_response(&state, state.settings.default_fid).await
}
