//! Chunked HTTP body streaming, shared by page and audio retrieval.

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::Result;

/// Stream the body of `url` into `sink`.
///
/// Chunks are written as they arrive off the wire; the body is never
/// materialized whole. Returns the number of bytes written.
pub async fn copy_url<W>(client: &reqwest::Client, url: &str, sink: &mut W) -> Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut response = client.get(url).send().await?.error_for_status()?;

    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await? {
        sink.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    sink.flush().await?;

    tracing::debug!(url = %url, bytes = written, "Streamed body");
    Ok(written)
}
