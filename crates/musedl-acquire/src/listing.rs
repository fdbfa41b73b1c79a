//! Extraction of score listings from the host's HTML pages.
//!
//! Search result pages and single-score pages both carry their data as
//! a JSON blob in the `data-content` attribute of a `div.js-store`
//! element. The blob is deserialized through typed envelope structs so
//! that any missing field fails with a named error instead of a panic
//! on attribute access.

use musedl_model::{ScoreListing, ScoreRecord};
use scraper::{Html, Selector};
use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Deserialize)]
struct JsStore {
    store: Store,
}

#[derive(Deserialize)]
struct Store {
    page: Page,
}

#[derive(Deserialize)]
struct Page {
    data: PageData,
}

#[derive(Deserialize)]
struct PageData {
    #[serde(default)]
    scores: Option<Vec<ScoreRecord>>,
    #[serde(default)]
    score: Option<ScoreRecord>,
}

/// Parse a search results page into its score listings.
pub fn parse_search(html: &str) -> Result<Vec<ScoreListing>> {
    let data = js_store_data(html)?;
    let records = data
        .scores
        .ok_or_else(|| Error::Parse("js-store carries no 'scores' array".into()))?;
    Ok(records.into_iter().map(ScoreListing::from).collect())
}

/// Parse a single score page into its listing.
pub fn parse_score(html: &str) -> Result<ScoreListing> {
    let data = js_store_data(html)?;
    let record = data
        .score
        .ok_or_else(|| Error::Parse("js-store carries no 'score' object".into()))?;
    Ok(ScoreListing::from(record))
}

fn js_store_data(html: &str) -> Result<PageData> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("div.js-store").expect("valid selector");

    let container = document
        .select(&selector)
        .next()
        .ok_or_else(|| Error::Parse("page has no div.js-store element".into()))?;
    let payload = container
        .value()
        .attr("data-content")
        .ok_or_else(|| Error::Parse("js-store element has no data-content attribute".into()))?;

    let parsed: JsStore = serde_json::from_str(payload)
        .map_err(|e| Error::Parse(format!("malformed js-store payload: {e}")))?;
    Ok(parsed.store.page.data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_json(id: u64, title: &str) -> String {
        format!(
            r#"{{
                "id": {id},
                "title": "{title}",
                "song_name": "Song {id}",
                "artist_name": "Artist {id}",
                "description": "",
                "url": "https://example.com/user/7/scores/{id}",
                "is_official": false,
                "pages_count": 3,
                "user": {{"id": 7}}
            }}"#
        )
    }

    fn page_with_store(store_json: &str) -> String {
        format!(
            "<html><body><div class=\"js-store\" data-content='{store_json}'></div></body></html>"
        )
    }

    #[test]
    fn parse_search_returns_all_records() {
        let store = format!(
            r#"{{"store":{{"page":{{"data":{{"scores":[{},{}]}}}}}}}}"#,
            record_json(1, "[b]First[/b] Song"),
            record_json(2, "Second Song"),
        );
        let listings = parse_search(&page_with_store(&store)).unwrap();

        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].title, "First Song");
        assert_eq!(listings[1].title, "Second Song");
    }

    #[test]
    fn parse_score_reads_single_object() {
        let store = format!(
            r#"{{"store":{{"page":{{"data":{{"score":{}}}}}}}}}"#,
            record_json(42, "Nocturne"),
        );
        let listing = parse_score(&page_with_store(&store)).unwrap();

        assert_eq!(listing.id, 42);
        assert_eq!(listing.owner_id, 7);
    }

    #[test]
    fn missing_container_is_a_parse_error() {
        let err = parse_search("<html><body><p>nothing here</p></body></html>").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn malformed_payload_is_a_parse_error() {
        let html = page_with_store("{not json");
        assert!(matches!(parse_search(&html).unwrap_err(), Error::Parse(_)));
    }

    #[test]
    fn search_page_without_scores_array_is_a_parse_error() {
        // A single-score page passed to the search parser.
        let store = format!(
            r#"{{"store":{{"page":{{"data":{{"score":{}}}}}}}}}"#,
            record_json(1, "Solo"),
        );
        assert!(matches!(
            parse_search(&page_with_store(&store)).unwrap_err(),
            Error::Parse(_)
        ));
    }
}
