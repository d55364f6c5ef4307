//! Durable key-value storage for session credentials.
//!
//! DESIGN
//! ======
//! The session survives restarts through three string keys: `token`,
//! `refreshToken` and `user` (JSON). Backends only need synchronous
//! get/set/remove; everything session-specific lives in the helpers below so
//! the file, memory and browser backends stay trivial.

#[cfg(target_arch = "wasm32")]
mod browser;
#[cfg(not(target_arch = "wasm32"))]
mod file;
mod memory;


#[cfg(target_arch = "wasm32")]
pub use browser::BrowserStore;
#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;
pub use memory::MemoryStore;

use shared::models::User;
use thiserror::Error;
use tracing::warn;

/// Key holding the access token.
pub const TOKEN_KEY: &str = "token";
/// Key holding the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
/// Key holding the JSON-encoded user record.
pub const USER_KEY: &str = "user";
/// Older builds stored the access token here; it is removed on clear.
pub const LEGACY_ACCESS_TOKEN_KEY: &str = "accessToken";

const SESSION_KEYS: [&str; 4] = [
    TOKEN_KEY,
    REFRESH_TOKEN_KEY,
    USER_KEY,
    LEGACY_ACCESS_TOKEN_KEY,
];

/// Failure to read or write durable storage.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(String),
    #[error("failed to encode stored value: {0}")]
    Encode(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Synchronous string key-value store surviving restarts.
pub trait SessionStore: Send + Sync {
    /// Value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns an error if the value could not be persisted.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    /// Returns an error if the removal could not be persisted.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Credentials cached by a previous run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user: User,
}

impl PersistedSession {
    /// Read the cached session.
    ///
    /// Returns `None` unless both an access token and a decodable user record
    /// are present; a corrupt user record is logged and treated as absent.
    pub fn load(store: &dyn SessionStore) -> Option<Self> {
        let access_token = store.get(TOKEN_KEY).filter(|token| !token.is_empty())?;
        let raw_user = store.get(USER_KEY)?;
        let user = match serde_json::from_str::<User>(&raw_user) {
            Ok(user) => user,
            Err(err) => {
                warn!(error = %err, "cached user record is unreadable; ignoring it");
                return None;
            }
        };
        let refresh_token = store
            .get(REFRESH_TOKEN_KEY)
            .filter(|token| !token.is_empty());

        Some(Self {
            access_token,
            refresh_token,
            user,
        })
    }
}

/// Persist a complete login.
///
/// # Errors
/// Returns the first storage failure.
pub fn persist_login(
    store: &dyn SessionStore,
    user: &User,
    access_token: &str,
    refresh_token: &str,
) -> Result<(), StorageError> {
    store.set(TOKEN_KEY, access_token)?;
    store.set(REFRESH_TOKEN_KEY, refresh_token)?;
    persist_user(store, user)
}

/// Replace the stored access token.
///
/// # Errors
/// Returns an error if the token could not be written.
pub fn persist_access_token(store: &dyn SessionStore, access_token: &str) -> Result<(), StorageError> {
    store.set(TOKEN_KEY, access_token)
}

/// Replace the stored user record.
///
/// # Errors
/// Returns an error if the record could not be encoded or written.
pub fn persist_user(store: &dyn SessionStore, user: &User) -> Result<(), StorageError> {
    let encoded =
        serde_json::to_string(user).map_err(|err| StorageError::Encode(err.to_string()))?;
    store.set(USER_KEY, &encoded)
}

/// `true` if any session key is stored, readable or not.
#[must_use]
pub fn has_session_data(store: &dyn SessionStore) -> bool {
    SESSION_KEYS.iter().any(|key| store.get(key).is_some())
}

/// Remove every session key.
///
/// Every key is attempted even if an earlier removal fails.
///
/// # Errors
/// Returns the first failure encountered.
pub fn clear(store: &dyn SessionStore) -> Result<(), StorageError> {
    let mut first_error = None;
    for key in SESSION_KEYS {
        if let Err(err) = store.remove(key) {
            warn!(key, error = %err, "failed to remove stored session key");
            first_error.get_or_insert(err);
        }
    }
    first_error.map_or(Ok(()), Err)
}
