use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::Serialize;
use tipstats_farcaster::Cast;

/// Username shown when a counterpart could not be resolved.
pub const UNKNOWN_USERNAME: &str = "Unknown";

/// Tip amount carried by a cast's text.
///
/// `"<digits>x<marker>"` counts as the digit run (first occurrence wins);
/// otherwise every literal marker counts as one.
pub fn tip_amount(text: &str, marker: &str) -> u64 {
    if marker.is_empty() {
        return 0;
    }

    let multiplied = format!("x{marker}");
    for (idx, _) in text.match_indices(&multiplied) {
        let prefix = &text[..idx];
        let digits = prefix.bytes().rev().take_while(u8::is_ascii_digit).count();
        if digits > 0 {
            return prefix[prefix.len() - digits..].parse().unwrap_or(u64::MAX);
        }
    }

    text.matches(marker).count() as u64
}

/// A UTC calendar day, `[00:00:00, next 00:00:00)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    /// The UTC day `now` falls in.
    pub fn containing(now: DateTime<Utc>) -> Self {
        // NaiveTime's default is midnight.
        let start = now.date_naive().and_time(NaiveTime::default()).and_utc();
        Self {
            start,
            end: start + Duration::days(1),
        }
    }

    pub fn today() -> Self {
        Self::containing(Utc::now())
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

/// One tip cast that contributed to a total.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TipEntry {
    pub hash: String,
    pub text: String,
    pub amount: u64,
    pub timestamp: DateTime<Utc>,
    /// Recipient for sent tips, tipper for received ones.
    pub counterpart_fid: u64,
    pub counterpart_username: Option<String>,
}

/// Today's tipping activity for one account.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TipSummary {
    /// Sum over tips the account sent today.
    pub tipped_today: u64,
    /// Sum over tips the account received today.
    pub today_earning: u64,
    pub tipped_today_casts: Vec<TipEntry>,
    pub today_earning_casts: Vec<TipEntry>,
}

impl TipSummary {
    /// Distinct counterpart fids across both lists.
    pub fn counterpart_fids(&self) -> Vec<u64> {
        self.tipped_today_casts
            .iter()
            .chain(&self.today_earning_casts)
            .map(|e| e.counterpart_fid)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Attach usernames, falling back to [`UNKNOWN_USERNAME`].
    pub fn name_counterparts(&mut self, names: &HashMap<u64, String>) {
        for entry in self
            .tipped_today_casts
            .iter_mut()
            .chain(self.today_earning_casts.iter_mut())
        {
            let name = names
                .get(&entry.counterpart_fid)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_USERNAME.to_string());
            entry.counterpart_username = Some(name);
        }
    }
}

/// Reduce a cast sample to today's sent and received totals for `fid`.
///
/// Sent: authored by `fid` as a reply to someone. Received: a reply to
/// `fid`. Both only count casts inside `window` that contain `marker`.
pub fn summarize_tips(casts: &[Cast], fid: u64, window: &DayWindow, marker: &str) -> TipSummary {
    let mut summary = TipSummary::default();
    if marker.is_empty() {
        return summary;
    }

    for cast in casts {
        if !window.contains(cast.timestamp) || !cast.text.contains(marker) {
            continue;
        }
        let amount = tip_amount(&cast.text, marker);
        let parent = cast.parent_fid();

        if cast.author.fid == fid {
            if let Some(recipient) = parent {
                summary.tipped_today = summary.tipped_today.saturating_add(amount);
                summary.tipped_today_casts.push(entry(cast, amount, recipient));
            }
        }
        if parent == Some(fid) {
            summary.today_earning = summary.today_earning.saturating_add(amount);
            summary
                .today_earning_casts
                .push(entry(cast, amount, cast.author.fid));
        }
    }

    tracing::debug!(
        fid,
        sampled = casts.len(),
        tipped_today = summary.tipped_today,
        today_earning = summary.today_earning,
        "Summarized tips"
    );
    summary
}

fn entry(cast: &Cast, amount: u64, counterpart_fid: u64) -> TipEntry {
    TipEntry {
        hash: cast.hash.clone(),
        text: cast.text.clone(),
        amount,
        timestamp: cast.timestamp,
        counterpart_fid,
        counterpart_username: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tipstats_farcaster::models::{CastAuthor, ParentAuthor};

    const PEANUT: &str = "🥜";

    fn at(d: u32, h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, d, h, m, s).unwrap()
    }

    fn cast(hash: &str, text: &str, ts: DateTime<Utc>, author: u64, parent: Option<u64>) -> Cast {
        Cast {
            hash: hash.into(),
            text: text.into(),
            timestamp: ts,
            author: CastAuthor { fid: author },
            parent_author: Some(ParentAuthor { fid: parent }),
        }
    }

    #[test]
    fn amount_rules() {
        assert_eq!(tip_amount("3x🥜 nice", PEANUT), 3);
        assert_eq!(tip_amount("🥜🥜", PEANUT), 2);
        assert_eq!(tip_amount("no marker", PEANUT), 0);
        assert_eq!(tip_amount("here you go 25x🥜", PEANUT), 25);
    }

    #[test]
    fn first_multiplier_wins() {
        assert_eq!(tip_amount("2x🥜 and 10x🥜", PEANUT), 2);
        // A bare `x🥜` without digits does not count as a multiplier.
        assert_eq!(tip_amount("x🥜 then 4x🥜", PEANUT), 4);
        assert_eq!(tip_amount("x🥜 x🥜", PEANUT), 2);
    }

    #[test]
    fn multiplier_overflow_saturates() {
        assert_eq!(tip_amount("99999999999999999999999x🥜", PEANUT), u64::MAX);
    }

    #[test]
    fn day_window_bounds() {
        let window = DayWindow::containing(at(5, 15, 30, 0));
        assert_eq!(window.start, at(5, 0, 0, 0));
        assert!(window.contains(at(5, 0, 0, 0)));
        assert!(window.contains(at(5, 23, 59, 59)));
        assert!(!window.contains(at(6, 0, 0, 0)));
        assert!(!window.contains(at(6, 23, 59, 59)));
        assert!(!window.contains(at(4, 23, 59, 59)));
    }

    #[test]
    fn splits_sent_and_received() {
        let window = DayWindow::containing(at(5, 12, 0, 0));
        let me = 42;
        let casts = vec![
            cast("a", "5x🥜 great post", at(5, 1, 0, 0), me, Some(7)),
            cast("b", "🥜🥜", at(5, 2, 0, 0), me, Some(8)),
            cast("c", "thanks 3x🥜", at(5, 3, 0, 0), 9, Some(me)),
            // Yesterday.
            cast("d", "10x🥜", at(4, 23, 0, 0), 9, Some(me)),
            // No marker.
            cast("e", "gm", at(5, 4, 0, 0), 9, Some(me)),
            // Top-level cast is not a tip.
            cast("f", "🥜", at(5, 5, 0, 0), me, None),
            // Someone else's tip.
            cast("g", "🥜", at(5, 6, 0, 0), 9, Some(10)),
        ];

        let summary = summarize_tips(&casts, me, &window, PEANUT);
        assert_eq!(summary.tipped_today, 7);
        assert_eq!(summary.today_earning, 3);
        assert_eq!(summary.tipped_today_casts.len(), 2);
        assert_eq!(summary.tipped_today_casts[0].counterpart_fid, 7);
        assert_eq!(summary.today_earning_casts.len(), 1);
        assert_eq!(summary.today_earning_casts[0].counterpart_fid, 9);
        assert_eq!(summary.counterpart_fids(), vec![7, 8, 9]);
    }

    #[test]
    fn names_fall_back_to_unknown() {
        let window = DayWindow::containing(at(5, 12, 0, 0));
        let casts = vec![
            cast("a", "🥜", at(5, 1, 0, 0), 1, Some(2)),
            cast("b", "🥜", at(5, 1, 0, 0), 3, Some(1)),
        ];
        let mut summary = summarize_tips(&casts, 1, &window, PEANUT);
        summary.name_counterparts(&HashMap::from([(2, "bob".to_string())]));

        assert_eq!(
            summary.tipped_today_casts[0].counterpart_username.as_deref(),
            Some("bob")
        );
        assert_eq!(
            summary.today_earning_casts[0].counterpart_username.as_deref(),
            Some(UNKNOWN_USERNAME)
        );
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(TipSummary::default()).unwrap();
        assert_eq!(json["tippedToday"], 0);
        assert_eq!(json["todayEarning"], 0);
        assert!(json["tippedTodayCasts"].as_array().unwrap().is_empty());
    }
}
