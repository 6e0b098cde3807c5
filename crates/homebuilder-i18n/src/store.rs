//! The localization store service object

use crate::dictionary::Dictionary;
use crate::language::Language;
use crate::source::DictionarySource;
use homebuilder_storage::{load_state, save_state, KeyValueStorage};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, info};

/// Storage slot for the persisted projection
pub const LANGUAGE_STORAGE_KEY: &str = "language-storage";

/// The persisted subset of language state: the selection only, never the
/// dictionary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedLanguage {
    pub language: Language,
}

pub fn persisted_projection(snapshot: &LanguageSnapshot) -> PersistedLanguage {
    PersistedLanguage {
        language: snapshot.language,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    /// No dictionary has been applied yet
    Uninitialized,
    /// The latest request is in flight
    Loading,
    Ready,
}

/// What became of a [`LocalizationStore::set_language`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadOutcome {
    /// Dictionary and language were applied
    Applied,
    /// A newer request was issued before this one resolved; result discarded
    Superseded,
    /// The source failed; previous language and dictionary kept
    Failed,
}

/// Point-in-time view of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageSnapshot {
    pub language: Language,
    pub is_loading: bool,
    pub load_state: LoadState,
    pub has_dictionary: bool,
}

struct LanguageState {
    language: Language,
    dictionary: Arc<Dictionary>,
    is_loading: bool,
    loaded_once: bool,
    /// Token of the most recent load request
    latest_request: u64,
}

impl LanguageState {
    fn new(language: Language) -> Self {
        Self {
            language,
            dictionary: Arc::new(Dictionary::empty()),
            is_loading: false,
            loaded_once: false,
            latest_request: 0,
        }
    }

    fn load_state(&self) -> LoadState {
        if self.is_loading {
            LoadState::Loading
        } else if self.loaded_once {
            LoadState::Ready
        } else {
            LoadState::Uninitialized
        }
    }

    fn begin_load(&mut self) -> u64 {
        self.latest_request += 1;
        self.is_loading = true;
        self.latest_request
    }
}

/// Clears `is_loading` for a load whose future is dropped before the source
/// resolves, provided no newer request has taken over
struct PendingLoad<'a> {
    store: &'a LocalizationStore,
    token: u64,
    resolved: bool,
}

impl Drop for PendingLoad<'_> {
    fn drop(&mut self) {
        if self.resolved {
            return;
        }
        let mut state = self.store.write();
        if state.latest_request == self.token {
            state.is_loading = false;
            debug!(token = self.token, "Dictionary load cancelled");
        }
    }
}

struct Inner {
    state: RwLock<LanguageState>,
    source: Arc<dyn DictionarySource>,
    storage: Option<Arc<dyn KeyValueStorage>>,
}

/// Active language, its dictionary, and key-path lookup.
///
/// Cheap to clone; clones share state. Only the most recently requested
/// language load is ever applied.
#[derive(Clone)]
pub struct LocalizationStore {
    inner: Arc<Inner>,
}

impl LocalizationStore {
    /// A store that starts on the default language and persists nothing
    pub fn new(source: Arc<dyn DictionarySource>) -> Self {
        Self::build(source, None, Language::default())
    }

    /// A store that restores its language from `storage` and writes every
    /// applied language back to it. Call [`LocalizationStore::init`] to load
    /// the dictionary.
    pub fn restore(source: Arc<dyn DictionarySource>, storage: Arc<dyn KeyValueStorage>) -> Self {
        let language = load_state::<PersistedLanguage>(storage.as_ref(), LANGUAGE_STORAGE_KEY)
            .map(|persisted| persisted.language)
            .unwrap_or_default();
        debug!(%language, "Restored language selection");
        Self::build(source, Some(storage), language)
    }

    /// [`LocalizationStore::restore`] followed by an immediate dictionary load
    pub async fn rehydrate(
        source: Arc<dyn DictionarySource>,
        storage: Arc<dyn KeyValueStorage>,
    ) -> Self {
        let store = Self::restore(source, storage);
        store.init().await;
        store
    }

    fn build(
        source: Arc<dyn DictionarySource>,
        storage: Option<Arc<dyn KeyValueStorage>>,
        language: Language,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(LanguageState::new(language)),
                source,
                storage,
            }),
        }
    }

    /// Load the dictionary for the current language before first use
    pub async fn init(&self) -> LoadOutcome {
        self.set_language(self.language()).await
    }

    /// Write the persisted projection one last time
    pub fn dispose(&self) {
        self.persist(&self.read());
        debug!("Localization store disposed");
    }

    /// Switch to `language`, loading its dictionary.
    ///
    /// Language and dictionary change together, and only if this is still the
    /// latest request when the load resolves. Failures are logged and leave
    /// the previous language and dictionary in place.
    pub async fn set_language(&self, language: Language) -> LoadOutcome {
        let token = self.write().begin_load();
        self.finish_load(language, token).await
    }

    async fn finish_load(&self, language: Language, token: u64) -> LoadOutcome {
        debug!(%language, token, "Loading dictionary");
        let mut pending = PendingLoad {
            store: self,
            token,
            resolved: false,
        };
        let result = self.inner.source.load(language).await;
        pending.resolved = true;
        drop(pending);

        let mut state = self.write();
        if state.latest_request != token {
            debug!(%language, token, latest = state.latest_request, "Discarding superseded dictionary load");
            return LoadOutcome::Superseded;
        }
        state.is_loading = false;

        match result {
            Ok(dictionary) => {
                state.language = language;
                state.dictionary = Arc::new(dictionary);
                state.loaded_once = true;
                self.persist(&state);
                info!(%language, "Dictionary loaded");
                LoadOutcome::Applied
            }
            Err(e) => {
                error!(%language, error = %e, "Failed to load dictionary");
                LoadOutcome::Failed
            }
        }
    }

    /// Translate a dot-separated key path.
    ///
    /// Always returns a string: the resolved leaf, or `key` itself when it
    /// does not resolve. With no dictionary loaded and nothing in flight, a
    /// background load of the current language is started; this call still
    /// returns `key` without waiting for it.
    pub fn t(&self, key: &str) -> String {
        let needs_load = {
            let state = self.read();
            if let Some(value) = state.dictionary.resolve(key) {
                return value.to_string();
            }
            state.dictionary.is_empty() && !state.is_loading
        };

        if needs_load {
            self.spawn_background_load();
        }
        key.to_string()
    }

    fn spawn_background_load(&self) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!("No async runtime available; skipping background dictionary load");
            return;
        };

        let (language, token) = {
            let mut state = self.write();
            // Another caller may have started a load since the read above
            if !state.dictionary.is_empty() || state.is_loading {
                return;
            }
            (state.language, state.begin_load())
        };

        debug!(%language, "Dictionary empty; loading in background");
        let store = self.clone();
        handle.spawn(async move {
            store.finish_load(language, token).await;
        });
    }

    pub fn language(&self) -> Language {
        self.read().language
    }

    pub fn is_loading(&self) -> bool {
        self.read().is_loading
    }

    pub fn has_dictionary(&self) -> bool {
        !self.read().dictionary.is_empty()
    }

    /// Shared handle to the dictionary currently in use
    pub fn dictionary(&self) -> Arc<Dictionary> {
        self.read().dictionary.clone()
    }

    /// Language and dictionary read together, so they always match
    pub fn active(&self) -> (Language, Arc<Dictionary>) {
        let state = self.read();
        (state.language, state.dictionary.clone())
    }

    pub fn snapshot(&self) -> LanguageSnapshot {
        let state = self.read();
        LanguageSnapshot {
            language: state.language,
            is_loading: state.is_loading,
            load_state: state.load_state(),
            has_dictionary: !state.dictionary.is_empty(),
        }
    }

    fn persist(&self, state: &LanguageState) {
        if let Some(storage) = &self.inner.storage {
            let projection = PersistedLanguage {
                language: state.language,
            };
            save_state(storage.as_ref(), LANGUAGE_STORAGE_KEY, &projection);
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, LanguageState> {
        self.inner
            .state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, LanguageState> {
        self.inner
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DictionaryError, Result};
    use crate::source::StaticDictionarySource;
    use async_trait::async_trait;
    use homebuilder_storage::MemoryStorage;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn source() -> Arc<StaticDictionarySource> {
        Arc::new(
            StaticDictionarySource::new()
                .with_value(
                    Language::En,
                    json!({
                        "hero": {"title1": "Welcome"},
                        "items": ["x", "y", "z"],
                        "a": {"b": "Hello"}
                    }),
                )
                .unwrap()
                .with_value(Language::Es, json!({"hero": {"title1": "Bienvenido"}}))
                .unwrap(),
        )
    }

    /// Source whose loads resolve only when the test releases them
    #[derive(Default)]
    struct GatedSource {
        gates: Mutex<HashMap<Language, oneshot::Receiver<Result<Dictionary>>>>,
    }

    impl GatedSource {
        fn gate(&self, language: Language) -> oneshot::Sender<Result<Dictionary>> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(language, rx);
            tx
        }
    }

    #[async_trait]
    impl DictionarySource for GatedSource {
        async fn load(&self, language: Language) -> Result<Dictionary> {
            let rx = self.gates.lock().unwrap().remove(&language);
            match rx {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(DictionaryError::NotFound("gate dropped".into()))),
                None => Err(DictionaryError::NotFound(language.resource_name())),
            }
        }
    }

    /// Source that counts calls and always fails
    #[derive(Default)]
    struct FailingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DictionarySource for FailingSource {
        async fn load(&self, language: Language) -> Result<Dictionary> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(DictionaryError::NotFound(language.resource_name()))
        }
    }

    fn dict(value: serde_json::Value) -> Dictionary {
        Dictionary::from_value(value).unwrap()
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn test_end_to_end_language_switch() {
        let store = LocalizationStore::new(source());
        assert_eq!(store.init().await, LoadOutcome::Applied);
        assert_eq!(store.t("hero.title1"), "Welcome");

        assert_eq!(store.set_language(Language::Es).await, LoadOutcome::Applied);
        assert_eq!(store.language(), Language::Es);
        assert_eq!(store.t("hero.title1"), "Bienvenido");
    }

    #[tokio::test]
    async fn test_active_pairs_language_with_dictionary() {
        let store = LocalizationStore::new(source());
        store.init().await;
        store.set_language(Language::Es).await;

        let (language, dictionary) = store.active();
        assert_eq!(language, Language::Es);
        assert_eq!(dictionary.resolve("hero.title1"), Some("Bienvenido"));
    }

    #[tokio::test]
    async fn test_resolution_and_fallback() {
        let store = LocalizationStore::new(source());
        store.init().await;

        assert_eq!(store.t("a.b"), "Hello");
        assert_eq!(store.t("items.1"), "y");
        assert_eq!(store.t("items.5"), "items.5");
        assert_eq!(store.t("nav.home"), "nav.home");
        assert_eq!(store.t("hero"), "hero");
    }

    #[tokio::test]
    async fn test_t_is_total() {
        let store = LocalizationStore::new(source());
        store.init().await;

        for key in ["", ".", "..", "a.b.c.d", "items.99999999999999999999999", "ñ.日本", "hero.title1."] {
            assert_eq!(store.t(key), key);
        }
    }

    #[test]
    fn test_t_without_runtime_returns_key() {
        let store = LocalizationStore::new(source());
        assert_eq!(store.t("hero.title1"), "hero.title1");
        assert!(!store.is_loading());
        assert_eq!(store.snapshot().load_state, LoadState::Uninitialized);
    }

    #[tokio::test]
    async fn test_t_triggers_background_load() {
        let store = LocalizationStore::new(source());
        assert_eq!(store.t("hero.title1"), "hero.title1");

        let watched = store.clone();
        wait_until(move || watched.has_dictionary()).await;
        assert_eq!(store.t("hero.title1"), "Welcome");
        assert_eq!(store.snapshot().load_state, LoadState::Ready);
    }

    #[tokio::test]
    async fn test_t_starts_at_most_one_background_load() {
        let source = Arc::new(GatedSource::default());
        let gate = source.gate(Language::En);
        let store = LocalizationStore::new(source.clone());

        store.t("hero.title1");
        store.t("hero.title1");
        assert!(store.is_loading());

        gate.send(Ok(dict(json!({"hero": {"title1": "Welcome"}}))))
            .unwrap();
        let watched = store.clone();
        wait_until(move || !watched.is_loading()).await;
        assert_eq!(store.t("hero.title1"), "Welcome");
        assert!(source.gates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_dictionary() {
        let source = Arc::new(GatedSource::default());
        let store = LocalizationStore::new(source.clone());

        let gate = source.gate(Language::En);
        gate.send(Ok(dict(json!({"hero": {"title1": "Welcome"}}))))
            .unwrap();
        assert_eq!(store.init().await, LoadOutcome::Applied);

        // No gate registered for Spanish: the load fails
        assert_eq!(store.set_language(Language::Es).await, LoadOutcome::Failed);
        assert_eq!(store.language(), Language::En);
        assert!(!store.is_loading());
        assert_eq!(store.t("hero.title1"), "Welcome");
    }

    #[tokio::test]
    async fn test_failed_initial_load_renders_keys() {
        let source = Arc::new(FailingSource::default());
        let store = LocalizationStore::new(source.clone());

        assert_eq!(store.init().await, LoadOutcome::Failed);
        assert!(!store.is_loading());
        assert_eq!(store.snapshot().load_state, LoadState::Uninitialized);
        assert_eq!(store.t("hero.title1"), "hero.title1");
        assert!(source.calls.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_stale_load_is_discarded() {
        let source = Arc::new(GatedSource::default());
        let es_gate = source.gate(Language::Es);
        let en_gate = source.gate(Language::En);
        let store = LocalizationStore::new(source.clone());

        let first = tokio::spawn({
            let store = store.clone();
            async move { store.set_language(Language::Es).await }
        });
        let watched = store.clone();
        wait_until(move || watched.is_loading()).await;
        // Let the Spanish load reach its gate before the English request
        tokio::time::sleep(Duration::from_millis(20)).await;

        let second = tokio::spawn({
            let store = store.clone();
            async move { store.set_language(Language::En).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        // The newer request resolves first, then the older one
        en_gate
            .send(Ok(dict(json!({"hero": {"title1": "Welcome"}}))))
            .unwrap();
        assert_eq!(second.await.unwrap(), LoadOutcome::Applied);

        es_gate
            .send(Ok(dict(json!({"hero": {"title1": "Bienvenido"}}))))
            .unwrap();
        assert_eq!(first.await.unwrap(), LoadOutcome::Superseded);

        assert_eq!(store.language(), Language::En);
        assert_eq!(store.t("hero.title1"), "Welcome");
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_loading_flag_tracks_latest_request() {
        let source = Arc::new(GatedSource::default());
        let gate = source.gate(Language::Es);
        let store = LocalizationStore::new(source.clone());

        let pending = tokio::spawn({
            let store = store.clone();
            async move { store.set_language(Language::Es).await }
        });
        let watched = store.clone();
        wait_until(move || watched.is_loading()).await;
        assert_eq!(store.snapshot().load_state, LoadState::Loading);

        gate.send(Ok(dict(json!({"a": "b"})))).unwrap();
        assert_eq!(pending.await.unwrap(), LoadOutcome::Applied);
        assert!(!store.is_loading());
        assert_eq!(store.snapshot().load_state, LoadState::Ready);
    }

    #[tokio::test]
    async fn test_cancelled_load_clears_loading_flag() {
        let source = Arc::new(GatedSource::default());
        // Held open and never sent: the Spanish load never resolves
        let _es_gate = source.gate(Language::Es);
        let store = LocalizationStore::new(source.clone());

        let cancelled =
            tokio::time::timeout(Duration::from_millis(10), store.set_language(Language::Es)).await;
        assert!(cancelled.is_err());

        assert!(!store.is_loading());
        assert_eq!(store.snapshot().load_state, LoadState::Uninitialized);
        assert_eq!(store.language(), Language::En);

        // With nothing in flight, t() can start a fresh load again
        let en_gate = source.gate(Language::En);
        assert_eq!(store.t("hero.title1"), "hero.title1");
        assert!(store.is_loading());
        en_gate
            .send(Ok(dict(json!({"hero": {"title1": "Welcome"}}))))
            .unwrap();
        let watched = store.clone();
        wait_until(move || watched.has_dictionary()).await;
        assert_eq!(store.t("hero.title1"), "Welcome");
    }

    #[tokio::test]
    async fn test_cancelled_stale_load_keeps_newer_flag() {
        let source = Arc::new(GatedSource::default());
        let _es_gate = source.gate(Language::Es);
        let en_gate = source.gate(Language::En);
        let store = LocalizationStore::new(source.clone());

        let stale = tokio::spawn({
            let store = store.clone();
            async move { store.set_language(Language::Es).await }
        });
        let watched = store.clone();
        wait_until(move || watched.is_loading()).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        let latest = tokio::spawn({
            let store = store.clone();
            async move { store.set_language(Language::En).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        stale.abort();
        assert!(stale.await.unwrap_err().is_cancelled());
        assert!(store.is_loading(), "newer request is still in flight");

        en_gate
            .send(Ok(dict(json!({"hero": {"title1": "Welcome"}}))))
            .unwrap();
        assert_eq!(latest.await.unwrap(), LoadOutcome::Applied);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_language_persisted_dictionary_not() {
        let storage = Arc::new(MemoryStorage::new());
        let store = LocalizationStore::restore(source(), storage.clone());
        store.init().await;
        store.set_language(Language::Es).await;

        let raw = storage.get_item(LANGUAGE_STORAGE_KEY).unwrap().unwrap();
        assert!(!raw.contains("Bienvenido"));
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["state"], json!({"language": "es"}));

        // Simulated restart: only the persisted fields come back
        let restarted = LocalizationStore::restore(source(), storage.clone());
        assert_eq!(restarted.language(), Language::Es);
        assert!(!restarted.has_dictionary());

        restarted.init().await;
        assert_eq!(restarted.t("hero.title1"), "Bienvenido");
    }

    #[tokio::test]
    async fn test_rehydrate_warms_dictionary() {
        let storage = Arc::new(MemoryStorage::new());
        save_state(
            storage.as_ref(),
            LANGUAGE_STORAGE_KEY,
            &PersistedLanguage {
                language: Language::Es,
            },
        );

        let store = LocalizationStore::rehydrate(source(), storage).await;
        assert_eq!(store.t("hero.title1"), "Bienvenido");
    }

    #[tokio::test]
    async fn test_restore_ignores_unknown_language() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set_item(LANGUAGE_STORAGE_KEY, r#"{"state":{"language":"fr"},"version":0}"#)
            .unwrap();

        let store = LocalizationStore::restore(source(), storage);
        assert_eq!(store.language(), Language::En);
    }

    #[tokio::test]
    async fn test_failed_load_does_not_persist() {
        let storage = Arc::new(MemoryStorage::new());
        let store = LocalizationStore::restore(Arc::new(FailingSource::default()), storage.clone());
        store.set_language(Language::Es).await;
        assert!(storage.get_item(LANGUAGE_STORAGE_KEY).unwrap().is_none());

        store.dispose();
        let persisted: Option<PersistedLanguage> =
            load_state(storage.as_ref(), LANGUAGE_STORAGE_KEY);
        assert_eq!(persisted.map(|p| p.language), Some(Language::En));
    }

    #[test]
    fn test_projection_is_language_only() {
        let snapshot = LanguageSnapshot {
            language: Language::Es,
            is_loading: true,
            load_state: LoadState::Loading,
            has_dictionary: true,
        };
        let projection = persisted_projection(&snapshot);
        assert_eq!(
            serde_json::to_value(projection).unwrap(),
            json!({"language": "es"})
        );
    }

    #[test]
    fn test_snapshot_serialization() {
        let store = LocalizationStore::new(source());
        let json = serde_json::to_value(store.snapshot()).unwrap();
        assert_eq!(json["language"], "en");
        assert_eq!(json["isLoading"], false);
        assert_eq!(json["loadState"], "uninitialized");
        assert_eq!(json["hasDictionary"], false);
    }
}
