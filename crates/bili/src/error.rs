use thiserror::Error;

use crate::playurl::MediaKind;

#[derive(Debug, Error)]
pub enum BiliError {
    #[error("no video id found in url: {0}")]
    IdentifierNotFound(String),
    #[error("api rejected request (code {code}): {message}")]
    UpstreamRejected { code: i64, message: String },
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("no {0} stream available")]
    NoStreamAvailable(MediaKind),
    #[error("other: {0}")]
    Other(String),
}
