//! Localization Store
//!
//! Owns the active [`Language`], the loaded [`Dictionary`] and a loading flag.
//! Text is looked up with [`LocalizationStore::t`], which never fails: keys
//! that do not resolve come back unchanged. Only the language selection is
//! persisted; dictionaries are loaded from a [`DictionarySource`] on every
//! start.

mod dictionary;
mod error;
mod language;
mod source;
mod store;

pub use dictionary::{diff_key_sets, Dictionary, KeySetDiff};
pub use error::{DictionaryError, Result, UnsupportedLanguage};
pub use language::Language;
pub use source::{
    preload_all, DictionarySource, FileDictionarySource, HttpDictionarySource,
    StaticDictionarySource,
};
pub use store::{
    persisted_projection, LanguageSnapshot, LoadOutcome, LoadState, LocalizationStore,
    PersistedLanguage, LANGUAGE_STORAGE_KEY,
};
