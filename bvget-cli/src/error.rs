use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("api error: {0}")]
    Api(#[from] bili_api::BiliError),

    #[error("transfer error: {0}")]
    Transfer(#[from] transfer_engine::TransferError),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
