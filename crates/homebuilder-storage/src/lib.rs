//! Durable storage for the homebuilder site stores
//!
//! A small key/value abstraction in the shape of browser local storage, with
//! file-backed and in-memory implementations, plus helpers that wrap store
//! projections in a versioned envelope and absorb write failures.

mod error;
mod persist;
mod storage;

pub use error::{Result, StorageError};
pub use persist::{load_state, save_state, PersistedEnvelope, PERSIST_VERSION};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
