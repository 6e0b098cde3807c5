//! Where dictionaries come from

use crate::dictionary::Dictionary;
use crate::error::{DictionaryError, Result};
use crate::language::Language;
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;
use url::Url;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// A locale-keyed source of dictionary resources
#[async_trait]
pub trait DictionarySource: Send + Sync {
    async fn load(&self, language: Language) -> Result<Dictionary>;
}

/// Reads `<root>/<tag>.json`
pub struct FileDictionarySource {
    root: PathBuf,
}

impl FileDictionarySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, language: Language) -> PathBuf {
        self.root.join(format!("{}.json", language.as_str()))
    }
}

#[async_trait]
impl DictionarySource for FileDictionarySource {
    async fn load(&self, language: Language) -> Result<Dictionary> {
        let path = self.path_for(language);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(DictionaryError::NotFound(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        debug!(%language, path = %path.display(), bytes = raw.len(), "Read dictionary file");
        Dictionary::from_json_str(&raw)
    }
}

/// Fetches `<base_url>/locales/<tag>.json`
pub struct HttpDictionarySource {
    client: Client,
    base_url: Url,
}

impl HttpDictionarySource {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Self::with_client(client, base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self> {
        // Url::join drops the last path segment unless it ends with '/'
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Self {
            client,
            base_url: Url::parse(&base)?,
        })
    }

    pub fn resource_url(&self, language: Language) -> Result<Url> {
        Ok(self.base_url.join(&language.resource_name())?)
    }
}

#[async_trait]
impl DictionarySource for HttpDictionarySource {
    async fn load(&self, language: Language) -> Result<Dictionary> {
        let url = self.resource_url(language)?;
        let response = self
            .client
            .get(url.clone())
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(DictionaryError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(DictionaryError::Status(status.as_u16()));
        }

        let value: Value = response.json().await?;
        debug!(%language, %url, "Fetched dictionary");
        Dictionary::from_value(value)
    }
}

/// Dictionaries held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticDictionarySource {
    dictionaries: HashMap<Language, Dictionary>,
}

impl StaticDictionarySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, language: Language, dictionary: Dictionary) -> Self {
        self.dictionaries.insert(language, dictionary);
        self
    }

    /// Convenience for JSON literals; non-object roots are rejected
    pub fn with_value(self, language: Language, value: Value) -> Result<Self> {
        Ok(self.with(language, Dictionary::from_value(value)?))
    }
}

#[async_trait]
impl DictionarySource for StaticDictionarySource {
    async fn load(&self, language: Language) -> Result<Dictionary> {
        self.dictionaries
            .get(&language)
            .cloned()
            .ok_or_else(|| DictionaryError::NotFound(language.resource_name()))
    }
}

/// Load every supported language concurrently
pub async fn preload_all(source: &dyn DictionarySource) -> Vec<(Language, Result<Dictionary>)> {
    let loads = Language::ALL
        .into_iter()
        .map(|language| async move { (language, source.load(language).await) });
    join_all(loads).await
}
