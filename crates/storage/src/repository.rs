use quiz_core::model::{QuizSession, UserIdentity};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage lock poisoned: {0}")]
    Poisoned(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Synchronous string-keyed persistence, the shape of a browser's local storage.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Removing a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Simple in-memory store for testing and prototyping.
///
/// Clones share the same map, so a test can keep a handle and inspect what was written.
#[derive(Clone, Default)]
pub struct InMemoryKeyValueStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryKeyValueStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with raw entries.
    #[must_use]
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: Arc::new(Mutex::new(map)),
        }
    }

    /// Returns true if `key` currently holds a value.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .map(|guard| guard.contains_key(key))
            .unwrap_or(false)
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

/// Typed access to the three quiz slots of a key-value store.
#[derive(Clone)]
pub struct QuizStateRepository {
    store: Arc<dyn KeyValueStore>,
}

impl QuizStateRepository {
    pub const SESSION_KEY: &'static str = "session-state";
    pub const USER_KEY: &'static str = "user-identity";
    pub const STARTED_KEY: &'static str = "quiz-started";

    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryKeyValueStore::new()))
    }

    /// Read the persisted session, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the slot holds something that is not a session.
    pub fn load_session(&self) -> Result<Option<QuizSession>, StorageError> {
        self.load_json(Self::SESSION_KEY)
    }

    /// Overwrite the session slot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be encoded or written.
    pub fn save_session(&self, session: &QuizSession) -> Result<(), StorageError> {
        self.save_json(Self::SESSION_KEY, session)
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    pub fn clear_session(&self) -> Result<(), StorageError> {
        self.store.remove(Self::SESSION_KEY)
    }

    /// Read the persisted user, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the slot holds something that is not a user.
    pub fn load_user(&self) -> Result<Option<UserIdentity>, StorageError> {
        self.load_json(Self::USER_KEY)
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the user cannot be encoded or written.
    pub fn save_user(&self, user: &UserIdentity) -> Result<(), StorageError> {
        self.save_json(Self::USER_KEY, user)
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    pub fn clear_user(&self) -> Result<(), StorageError> {
        self.store.remove(Self::USER_KEY)
    }

    /// Only the literal `"true"` counts as started.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    pub fn load_started(&self) -> Result<bool, StorageError> {
        Ok(self
            .store
            .get(Self::STARTED_KEY)?
            .is_some_and(|raw| raw.trim() == "true"))
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    pub fn mark_started(&self) -> Result<(), StorageError> {
        self.store.set(Self::STARTED_KEY, "true")
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    pub fn clear_started(&self) -> Result<(), StorageError> {
        self.store.remove(Self::STARTED_KEY)
    }

    fn load_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.store.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn save_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        self.store.set(key, &raw)
    }
}
