//! External roster feed: an HTTP-published CSV with one row per
//! authorized identity.
//!
//! Expected header columns: `Username`, `Member ID` (integer) and
//! `Active` (boolean-ish). Malformed rows are logged and skipped; a
//! failed fetch aborts the whole synchronization invocation instead.

use engine::FeedRow;
use reqwest::Client;
use serde::Deserialize;

use crate::error::BotError;

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Username")]
    username: String,
    #[serde(rename = "Member ID")]
    member_id: String,
    #[serde(rename = "Active")]
    active: String,
}

impl TryFrom<RawRow> for FeedRow {
    type Error = String;

    fn try_from(raw: RawRow) -> Result<Self, Self::Error> {
        let username = raw.username.trim();
        if username.is_empty() {
            return Err("empty username".to_string());
        }

        let user_id: i64 = raw
            .member_id
            .trim()
            .parse()
            .map_err(|_| format!("unparseable member id {:?}", raw.member_id))?;

        let active = parse_boolish(&raw.active)
            .ok_or_else(|| format!("unparseable active flag {:?}", raw.active))?;

        Ok(FeedRow {
            username: username.to_string(),
            user_id,
            active,
        })
    }
}

fn parse_boolish(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Fetch and parse the feed. Any network error or non-success status
/// is a [`BotError::FeedFetch`]; per-row problems never fail the
/// batch.
pub async fn fetch(client: &Client, url: &str) -> Result<Vec<FeedRow>, BotError> {
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|err| BotError::FeedFetch(err.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(BotError::FeedFetch(format!("feed returned {status}")));
    }

    let body = resp
        .text()
        .await
        .map_err(|err| BotError::FeedFetch(err.to_string()))?;

    Ok(parse(&body))
}

/// Parse CSV text into feed rows, skipping malformed records.
pub fn parse(raw: &str) -> Vec<FeedRow> {
    let mut reader = csv::Reader::from_reader(raw.as_bytes());
    let mut rows = Vec::new();

    for (index, record) in reader.deserialize::<RawRow>().enumerate() {
        let line = index + 2; // header is line 1
        match record {
            Ok(raw_row) => match FeedRow::try_from(raw_row) {
                Ok(row) => rows.push(row),
                Err(reason) => {
                    tracing::warn!(line, %reason, "skipping malformed feed row");
                }
            },
            Err(err) => {
                tracing::warn!(line, reason = %err, "skipping unreadable feed row");
            }
        }
    }

    rows
}
