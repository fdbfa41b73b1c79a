use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The js-store payload was missing or malformed. The embedded JSON
    /// is the page's API contract; a mismatch means the server format
    /// changed and nothing downstream can be trusted.
    #[error("could not read js-store data: {0}")]
    Parse(String),

    /// Token discovery failed: no usable script on the embed page, or
    /// the script did not contain enough 40-character api keys.
    #[error("could not recover api keys: {0}")]
    AuthResolution(String),

    /// The audio render is not available. The message is the server's
    /// status reason, verbatim.
    #[error("{0}")]
    AudioUnavailable(String),

    #[error(transparent)]
    Network(#[from] reqwest::Error),

    #[error(transparent)]
    Render(#[from] musedl_render::RenderError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
