use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("HTTP request failed: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    #[error("request failed with HTTP {status} for {url}")]
    HttpStatus { status: StatusCode, url: String },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("`{tool}` not found on PATH")]
    ToolMissing { tool: &'static str },

    #[error("`{tool}` exited with code {code}")]
    ToolFailed { tool: &'static str, code: i32 },
}

impl TransferError {
    pub fn http_status(status: StatusCode, url: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            url: url.into(),
        }
    }
}
