//! Calls against the host's internal `api/jmuse` endpoint.

use reqwest::header::AUTHORIZATION;
use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Deserialize)]
struct JmuseResponse {
    info: JmuseInfo,
}

#[derive(Deserialize)]
struct JmuseInfo {
    url: String,
}

/// Resolve the download URL for one page image.
///
/// A non-success status is a soft signal that the page has no render
/// available; it yields `None` rather than an error so that a single
/// missing page cannot abort a whole document.
pub(crate) async fn page_url(
    client: &reqwest::Client,
    base_url: &str,
    score_id: u64,
    index: u32,
    sheet_token: &str,
) -> Result<Option<String>> {
    let response = client
        .get(format!("{base_url}/api/jmuse"))
        .query(&[
            ("id", score_id.to_string()),
            ("index", index.to_string()),
            ("type", "img".to_string()),
            ("v2", "1".to_string()),
        ])
        .header(AUTHORIZATION, sheet_token)
        .send()
        .await?;

    if !response.status().is_success() {
        tracing::warn!(score_id, index, status = %response.status(), "No url for page");
        return Ok(None);
    }

    let body: JmuseResponse = response.json().await?;
    Ok(Some(body.info.url))
}

/// Resolve the download URL for the synthesized audio render.
///
/// Unlike pages, a missing audio render is a hard failure carrying the
/// server's status reason verbatim.
pub(crate) async fn audio_url(
    client: &reqwest::Client,
    base_url: &str,
    score_id: u64,
    audio_token: &str,
) -> Result<String> {
    let response = client
        .get(format!("{base_url}/api/jmuse"))
        .query(&[
            ("id", score_id.to_string()),
            ("index", "0".to_string()),
            ("type", "mp3".to_string()),
            ("v2", "1".to_string()),
        ])
        .header(AUTHORIZATION, audio_token)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let reason = status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| status.as_u16().to_string());
        return Err(Error::AudioUnavailable(reason));
    }

    let body: JmuseResponse = response.json().await?;
    Ok(body.info.url)
}
