//! Key-value persistence for client state.
//!
//! Models browser local storage: string keys mapping to string values, most
//! of them JSON-encoded. Reads are forgiving - a missing key, an unreadable
//! backend, or a value that no longer parses are all reported as absence.
//!
//! # Keys
//!
//! - [`keys::SESSION_ID`] - plain session id string
//! - [`keys::CURRENT_USER`] - `{email, name, userId}`
//! - [`keys::CART`] - product entries in cart order
//! - [`keys::USERS_DB`] - email to `{userId, email, name, createdAt}`

mod file;
mod memory;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Storage keys shared with the web storefront.
pub mod keys {
    /// Key for the browser-session id.
    pub const SESSION_ID: &str = "session_id";

    /// Key for the logged-in user.
    pub const CURRENT_USER: &str = "aixel_user";

    /// Key for the cart contents.
    pub const CART: &str = "aixel_cart";

    /// Key for the simulated user table.
    pub const USERS_DB: &str = "aixel_users_db";
}

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be encoded or decoded.
    #[error("storage encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// String key-value store.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored under `key`.
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

    /// Delete `key`. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Read and decode a JSON value, treating any failure as absence.
pub fn read_json<T, S>(store: &S, key: &str) -> Option<T>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "Unreadable stored value, treating as absent");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "Corrupt stored value, treating as absent");
            None
        }
    }
}

/// Encode and store a JSON value.
///
/// # Errors
///
/// Returns `StorageError` if encoding or the backend write fails.
pub fn write_json<T, S>(store: &S, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

/// Best-effort [`write_json`]: failures are logged and dropped.
pub fn persist_json<T, S>(store: &S, key: &str, value: &T)
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    if let Err(e) = write_json(store, key, value) {
        warn!(key, error = %e, "Failed to persist client state");
    }
}

/// Best-effort removal: failures are logged and dropped.
pub fn forget<S>(store: &S, key: &str)
where
    S: KeyValueStore + ?Sized,
{
    if let Err(e) = store.remove(key) {
        warn!(key, error = %e, "Failed to remove client state");
    }
}
