//! Core error types for MapKit

#[derive(thiserror::Error, Debug)]
pub enum MapKitError {
    #[error("Binary error: {0}")]
    Binary(String),

    #[error("Raw code error: {0}")]
    RawCode(String),

    #[error("Trigger error: {0}")]
    Trigger(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, MapKitError>;
