//! Error types for durable storage

use std::fmt;

#[derive(Debug)]
pub enum StorageError {
    Io(Box<std::io::Error>),
    Serialization(serde_json::Error),
    /// Key contains characters that cannot be mapped to a storage slot
    InvalidKey(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(err) => write!(f, "IO error: {}", err),
            StorageError::Serialization(err) => write!(f, "Serialization error: {}", err),
            StorageError::InvalidKey(key) => write!(f, "Invalid storage key: {}", key),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(err) => Some(err.as_ref()),
            StorageError::Serialization(err) => Some(err),
            StorageError::InvalidKey(_) => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(Box::new(err))
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err)
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
