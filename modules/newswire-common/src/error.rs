use thiserror::Error;

#[derive(Error, Debug)]
pub enum NewswireError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Normalization error: {0}")]
    Normalization(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
