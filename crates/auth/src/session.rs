//! Session store abstraction (mechanics only).
//!
//! Session-backed collaborators keep their state under domain-namespaced keys
//! of a shared `SessionStore`. The store owns its own concurrency discipline;
//! the security context never locks anything itself.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use warden_core::{SecurityError, SessionFailureKind, SessionId};

#[derive(Debug, Error)]
pub enum SessionError {
    /// Access failed due to internal lock poisoning.
    #[error("session lock poisoned")]
    Poisoned,

    /// A stored value could not be (de)serialized.
    #[error("session value could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<SessionError> for SecurityError {
    fn from(value: SessionError) -> Self {
        let kind = match value {
            SessionError::Poisoned => SessionFailureKind::Poisoned,
            SessionError::Serialization(_) => SessionFailureKind::Serialization,
        };
        SecurityError::session(kind, value.to_string())
    }
}

/// Key/value session storage.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, SessionError>;

    fn set(&self, key: &str, value: Value) -> Result<(), SessionError>;

    fn remove(&self, key: &str) -> Result<(), SessionError>;
}

/// Typed read: deserializes the value under `key`, or returns `default` when
/// the key is absent.
pub fn get_or<T, S>(store: &S, key: &str, default: T) -> Result<T, SessionError>
where
    T: DeserializeOwned,
    S: SessionStore + ?Sized,
{
    match store.get(key)? {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Ok(default),
    }
}

/// Typed write.
pub fn put<T, S>(store: &S, key: &str, value: &T) -> Result<(), SessionError>
where
    T: Serialize + ?Sized,
    S: SessionStore + ?Sized,
{
    store.set(key, serde_json::to_value(value)?)
}

/// In-memory session for tests/dev.
///
/// - No IO
/// - One instance per session; share it behind an `Arc`
#[derive(Debug)]
pub struct InMemorySessionStore {
    id: SessionId,
    values: Mutex<HashMap<String, Value>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            values: Mutex::new(HashMap::new()),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Snapshot of the stored keys, sorted.
    pub fn keys(&self) -> Result<Vec<String>, SessionError> {
        let values = self.values.lock().map_err(|_| SessionError::Poisoned)?;
        let mut keys: Vec<String> = values.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<Value>, SessionError> {
        let values = self.values.lock().map_err(|_| SessionError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), SessionError> {
        let mut values = self.values.lock().map_err(|_| SessionError::Poisoned)?;
        values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        let mut values = self.values.lock().map_err(|_| SessionError::Poisoned)?;
        values.remove(key);
        Ok(())
    }
}
