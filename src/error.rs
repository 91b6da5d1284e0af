use thiserror::Error;

use crate::validation::ValidationError;

#[derive(Debug, Error)]
pub enum ShopError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(reqwest::StatusCode),

    /// The backend answered with `success: false`.
    #[error("{0}")]
    Api(String),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("not logged in")]
    NotLoggedIn,
}

pub type Result<T> = std::result::Result<T, ShopError>;
