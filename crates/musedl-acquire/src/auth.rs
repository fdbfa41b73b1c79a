//! Recovery of the content API's bearer tokens.
//!
//! The host hardcodes its api keys in the client script loaded by a
//! score's embed page. The last script tag on that page is assumed to
//! be the one making the jmuse calls, and the last two 40-character
//! alphanumeric strings in its body are taken as the keys. Both
//! assumptions are reverse-engineered from the live site; script load
//! order or a new 40-character constant would break them. There is no
//! sturdier signal available, so the heuristic is kept exactly as
//! observed.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use crate::error::{Error, Result};

/// Bearer tokens for the jmuse content API. Not score-specific: one
/// set serves every score fetched within the same session.
#[derive(Debug, Clone)]
pub struct AuthTokens {
    /// Authorizes `type=mp3` requests.
    pub audio: String,
    /// Authorizes `type=img` requests.
    pub sheet: String,
}

static API_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[a-zA-Z0-9]{40}").expect("valid regex"));

/// The `src` of the last script tag on the embed page.
pub(crate) fn last_script_src(html: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("script[src]").expect("valid selector");

    let script = document
        .select(&selector)
        .last()
        .ok_or_else(|| Error::AuthResolution("embed page has no script tags".into()))?;
    let src = script.value().attr("src").expect("selector guarantees src");
    Ok(src.to_string())
}

/// Scan a script body for api keys.
///
/// Of the last two 40-character matches, the first authorizes audio
/// requests and the second sheet requests. That order is a convention
/// inferred from the host's script and is not cross-checked anywhere.
pub(crate) fn extract_api_keys(script: &str) -> Result<AuthTokens> {
    let keys: Vec<&str> = API_KEY_RE.find_iter(script).map(|m| m.as_str()).collect();

    if keys.len() < 2 {
        return Err(Error::AuthResolution(format!(
            "expected at least two 40-character api keys in script, found {}",
            keys.len()
        )));
    }

    Ok(AuthTokens {
        audio: keys[keys.len() - 2].to_string(),
        sheet: keys[keys.len() - 1].to_string(),
    })
}
