//! Versioned envelopes around persisted store projections
//!
//! Stores hand a projection of their state to [`save_state`]; any failure is
//! logged here and never reaches the store's callers.

use crate::error::Result;
use crate::storage::KeyValueStorage;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Current envelope version
pub const PERSIST_VERSION: u32 = 0;

/// On-disk shape: `{"state": <projection>, "version": 0}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedEnvelope<T> {
    pub state: T,
    pub version: u32,
}

impl<T> PersistedEnvelope<T> {
    pub fn new(state: T) -> Self {
        Self {
            state,
            version: PERSIST_VERSION,
        }
    }
}

fn write_envelope<T: Serialize>(storage: &dyn KeyValueStorage, key: &str, state: &T) -> Result<()> {
    let payload = serde_json::to_string(&PersistedEnvelope::new(state))?;
    storage.set_item(key, &payload)
}

/// Persist `state` under `key`. Returns whether the write succeeded.
pub fn save_state<T: Serialize>(storage: &dyn KeyValueStorage, key: &str, state: &T) -> bool {
    match write_envelope(storage, key, state) {
        Ok(()) => true,
        Err(e) => {
            warn!(key, error = %e, "Failed to persist store state");
            false
        }
    }
}

/// Load the projection stored under `key`.
///
/// Missing slots, unreadable storage and payloads that fail to parse all
/// come back as `None`; the caller starts from defaults.
pub fn load_state<T: DeserializeOwned>(storage: &dyn KeyValueStorage, key: &str) -> Option<T> {
    let raw = match storage.get_item(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!(key, "No persisted state");
            return None;
        }
        Err(e) => {
            warn!(key, error = %e, "Failed to read persisted state");
            return None;
        }
    };

    match serde_json::from_str::<PersistedEnvelope<T>>(&raw) {
        Ok(envelope) => {
            if envelope.version != PERSIST_VERSION {
                debug!(key, version = envelope.version, "Persisted state has a different version");
            }
            Some(envelope.state)
        }
        Err(e) => {
            warn!(key, error = %e, "Discarding unparsable persisted state");
            None
        }
    }
}
