//! The session: one HTTP client, one token cache, and the per-score
//! download operations.

use std::path::Path;
use std::time::Duration;

use musedl_model::ScoreListing;
use musedl_render::{SheetDocument, VectorPage};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::OnceCell;

use crate::auth::{self, AuthTokens};
use crate::error::Result;
use crate::{download, jmuse, listing};

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Host serving listings, embed pages, and the jmuse API.
    pub base_url: String,
    pub user_agent: String,
    /// No deadline by default: network calls block until the server
    /// answers. Set to opt in to a per-request timeout.
    pub timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            base_url: "https://musescore.com".to_string(),
            user_agent: "musedl/0.1 (sheet music tool)".to_string(),
            timeout: None,
        }
    }
}

/// Outcome of one sheet download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetReport {
    pub pages_committed: u32,
    /// Pages whose url the jmuse API would not return; they leave a
    /// gap in the document rather than failing the download.
    pub pages_skipped: u32,
}

/// A download session against one host.
///
/// Owns the HTTP client and the api-key cache. Keys are resolved at
/// most once per session: the cell guarantees a single in-flight
/// resolution, concurrent callers await that attempt, and a failed
/// attempt leaves the cell empty for the next caller.
pub struct Session {
    client: reqwest::Client,
    base_url: String,
    tokens: OnceCell<AuthTokens>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Session {
            client: builder.build()?,
            base_url: config.base_url,
            tokens: OnceCell::new(),
        })
    }

    /// Search the host for scores matching `query`.
    pub async fn search(&self, query: &str) -> Result<Vec<ScoreListing>> {
        let url = format!("{}/sheetmusic", self.base_url);
        tracing::info!(query, "Searching");
        let response = self
            .client
            .get(&url)
            .query(&[("text", query)])
            .send()
            .await?
            .error_for_status()?;
        let html = response.text().await?;

        let listings = listing::parse_search(&html)?;
        tracing::info!(results = listings.len(), "Search finished");
        Ok(listings)
    }

    /// Resolve a score directly by its page URL.
    pub async fn score_from_url(&self, url: &str) -> Result<ScoreListing> {
        tracing::info!(url = %url, "Resolving score");
        let html = self.fetch_text(url).await?;
        listing::parse_score(&html)
    }

    /// The api keys for this session, resolved on first use.
    ///
    /// Discovery goes through one score's embed page, but the keys are
    /// not score-specific; whichever listing triggers resolution, the
    /// cached set serves all later calls.
    pub async fn auth_tokens(&self, listing: &ScoreListing) -> Result<&AuthTokens> {
        self.tokens
            .get_or_try_init(|| self.resolve_tokens(listing))
            .await
    }

    async fn resolve_tokens(&self, listing: &ScoreListing) -> Result<AuthTokens> {
        let embed_url = format!(
            "{}/user/{}/scores/{}/embed",
            self.base_url, listing.owner_id, listing.id
        );
        tracing::info!(url = %embed_url, "Recovering api keys");

        let embed_html = self.fetch_text(&embed_url).await?;
        let script_url = auth::last_script_src(&embed_html)?;
        tracing::debug!(url = %script_url, "Scanning embed script");

        let script = self.fetch_text(&script_url).await?;
        auth::extract_api_keys(&script)
    }

    /// Download every available page of `listing`, composited into one
    /// A4 PDF, and write the document to `sink`.
    ///
    /// Pages are fetched and committed strictly in index order. A page
    /// without a url is skipped; an all-skipped score still produces a
    /// valid zero-page document.
    pub async fn download_sheet<W>(&self, listing: &ScoreListing, sink: &mut W) -> Result<SheetReport>
    where
        W: AsyncWrite + Unpin,
    {
        let tokens = self.auth_tokens(listing).await?;

        let mut document = SheetDocument::new(&listing.title);
        let mut skipped = 0u32;

        for index in 0..listing.page_count {
            let Some(url) =
                jmuse::page_url(&self.client, &self.base_url, listing.id, index, &tokens.sheet)
                    .await?
            else {
                skipped += 1;
                continue;
            };

            // Transient buffer: one page's bytes live only until decode.
            let mut buffer = Vec::new();
            download::copy_url(&self.client, &url, &mut buffer).await?;
            let page = VectorPage::decode(&buffer)?;
            document.push_page(&page)?;
        }

        let report = SheetReport {
            pages_committed: document.page_count() as u32,
            pages_skipped: skipped,
        };
        sink.write_all(&document.finish()).await?;
        sink.flush().await?;

        tracing::info!(
            score_id = listing.id,
            committed = report.pages_committed,
            skipped = report.pages_skipped,
            "Finished sheet document"
        );
        Ok(report)
    }

    /// Download the sheet PDF to a file path.
    pub async fn download_sheet_to(
        &self,
        listing: &ScoreListing,
        path: &Path,
    ) -> Result<SheetReport> {
        let mut file = tokio::fs::File::create(path).await?;
        self.download_sheet(listing, &mut file).await
    }

    /// Stream the synthesized audio render of `listing` into `sink`.
    pub async fn download_audio<W>(&self, listing: &ScoreListing, sink: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let tokens = self.auth_tokens(listing).await?;
        let url = jmuse::audio_url(&self.client, &self.base_url, listing.id, &tokens.audio).await?;
        download::copy_url(&self.client, &url, sink).await
    }

    /// Download the audio render to a file path.
    pub async fn download_audio_to(&self, listing: &ScoreListing, path: &Path) -> Result<u64> {
        let mut file = tokio::fs::File::create(path).await?;
        self.download_audio(listing, &mut file).await
    }

    async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}
