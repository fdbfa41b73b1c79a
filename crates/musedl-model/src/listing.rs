use serde::Deserialize;

/// One score as it appears in the host's embedded js-store JSON.
///
/// Field names follow the wire format exactly. Every field here is
/// required: a record missing any of them signals an incompatible
/// change on the server side, which must surface as a parse failure
/// rather than a silently defaulted value.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreRecord {
    pub id: u64,
    pub title: String,
    pub song_name: String,
    pub artist_name: String,
    pub description: String,
    pub url: String,
    pub is_official: bool,
    pub pages_count: u32,
    pub user: UserRecord,
}

/// The owning user of a score; only the id is needed to build the
/// embed-page URL during token discovery.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub id: u64,
}

/// A score listing, built from a parsed [`ScoreRecord`].
///
/// Immutable once constructed; identity is the `id` field. The display
/// title has the host's `[b]`/`[/b]` bold markers stripped, all other
/// fields pass through verbatim.
#[derive(Debug, Clone)]
pub struct ScoreListing {
    pub id: u64,
    pub title: String,
    pub name: String,
    pub artist: String,
    pub description: String,
    pub owner_id: u64,
    pub page_count: u32,
    pub url: String,
    pub is_official: bool,
}

impl From<ScoreRecord> for ScoreListing {
    fn from(record: ScoreRecord) -> Self {
        ScoreListing {
            id: record.id,
            title: strip_bold_markers(&record.title),
            name: record.song_name,
            artist: record.artist_name,
            description: record.description,
            owner_id: record.user.id,
            page_count: record.pages_count,
            url: record.url,
            is_official: record.is_official,
        }
    }
}

/// Strip the literal `[b]` / `[/b]` markup the host embeds in search
/// result titles to highlight query matches.
fn strip_bold_markers(title: &str) -> String {
    title.replace("[b]", "").replace("[/b]", "")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record_json() -> &'static str {
        r#"{
            "id": 5105423,
            "title": "[b]Four[/b] Out Of [b]Five[/b]",
            "song_name": "Four Out Of Five",
            "artist_name": "Arctic Monkeys",
            "description": "Piano arrangement",
            "url": "https://musescore.com/user/28792/scores/5105423",
            "is_official": false,
            "pages_count": 5,
            "user": {"id": 28792}
        }"#
    }

    #[test]
    fn record_converts_to_listing() {
        let record: ScoreRecord = serde_json::from_str(sample_record_json()).unwrap();
        let listing = ScoreListing::from(record);

        assert_eq!(listing.id, 5105423);
        assert_eq!(listing.title, "Four Out Of Five");
        assert_eq!(listing.name, "Four Out Of Five");
        assert_eq!(listing.artist, "Arctic Monkeys");
        assert_eq!(listing.owner_id, 28792);
        assert_eq!(listing.page_count, 5);
        assert!(!listing.is_official);
    }

    #[test]
    fn bold_markers_stripped_from_title_only() {
        let json = r#"{
            "id": 1,
            "title": "[b]Aria[/b]",
            "song_name": "[b]Aria[/b]",
            "artist_name": "Anon",
            "description": "",
            "url": "https://example.com/score/1",
            "is_official": false,
            "pages_count": 1,
            "user": {"id": 2}
        }"#;
        let listing = ScoreListing::from(serde_json::from_str::<ScoreRecord>(json).unwrap());

        assert_eq!(listing.title, "Aria");
        // The song name field is not sanitized, only the display title.
        assert_eq!(listing.name, "[b]Aria[/b]");
    }

    #[test]
    fn missing_required_field_fails() {
        // No pages_count
        let json = r#"{
            "id": 1,
            "title": "Aria",
            "song_name": "Aria",
            "artist_name": "Anon",
            "description": "",
            "url": "https://example.com/score/1",
            "is_official": false,
            "user": {"id": 2}
        }"#;
        let err = serde_json::from_str::<ScoreRecord>(json).unwrap_err();
        assert!(err.to_string().contains("pages_count"));
    }
}
