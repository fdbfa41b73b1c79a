pub mod auth;
pub mod download;
pub mod error;
pub mod jmuse;
pub mod listing;
pub mod session;

pub use auth::AuthTokens;
pub use error::{Error, Result};
pub use session::{Session, SessionConfig, SheetReport};
