//! Error types for dictionary loading

use std::fmt;

/// Failure to produce a dictionary for a language.
///
/// These never escape the store: it logs them and keeps rendering keys.
#[derive(Debug)]
pub enum DictionaryError {
    /// No resource exists for the language
    NotFound(String),
    Io(Box<std::io::Error>),
    Http(Box<reqwest::Error>),
    /// Remote resource answered with a non-success status
    Status(u16),
    Parse(serde_json::Error),
    /// Parsed, but the root is not a mapping
    Malformed(String),
    InvalidUrl(String),
}

impl fmt::Display for DictionaryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(resource) => write!(f, "Dictionary not found: {}", resource),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::Http(err) => write!(f, "HTTP error: {}", err),
            Self::Status(status) => write!(f, "Dictionary request returned status {}", status),
            Self::Parse(err) => write!(f, "JSON parse error: {}", err),
            Self::Malformed(msg) => write!(f, "Malformed dictionary: {}", msg),
            Self::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
        }
    }
}

impl std::error::Error for DictionaryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err.as_ref()),
            Self::Http(err) => Some(err.as_ref()),
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DictionaryError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(Box::new(err))
    }
}

impl From<reqwest::Error> for DictionaryError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(Box::new(err))
    }
}

impl From<serde_json::Error> for DictionaryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err)
    }
}

impl From<url::ParseError> for DictionaryError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DictionaryError>;

/// A language tag outside the supported set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedLanguage(pub String);

impl fmt::Display for UnsupportedLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unsupported language: {}", self.0)
    }
}

impl std::error::Error for UnsupportedLanguage {}
