//! Session and user identity resolution.
//!
//! There is no real authentication: logging in with an email allocates a
//! user id the first time and hands the same id back on every later login,
//! using a [`UserDirectory`] as the stand-in for a backend user table.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use aixel_core::{Email, SessionId, UserId};

use crate::storage::{self, KeyValueStore, keys};

/// The logged-in shopper, as persisted under [`keys::CURRENT_USER`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub email: Email,
    pub name: String,
    pub user_id: UserId,
}

/// A user directory row, as persisted under [`keys::USERS_DB`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub user_id: UserId,
    pub email: Email,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Result of [`IdentityResolver::resolve_user`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub user: User,
    /// `true` when the email was already in the directory.
    pub returning: bool,
}

// =============================================================================
// Session
// =============================================================================

/// Return the persisted session id, creating and persisting one if needed.
///
/// The id is stored as a bare string. A missing, unreadable or malformed
/// value is replaced with a fresh v4 id; if that id cannot be persisted it is
/// still returned, so the call never fails.
pub fn session_id<S>(store: &S) -> SessionId
where
    S: KeyValueStore + ?Sized,
{
    match store.get(keys::SESSION_ID) {
        Ok(Some(raw)) => {
            if let Some(id) = SessionId::parse(&raw) {
                return id;
            }
            warn!(value = %raw, "Malformed session id in storage, regenerating");
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Session id unreadable, regenerating"),
    }

    let id = SessionId::generate();
    if let Err(e) = store.set(keys::SESSION_ID, &id.to_string()) {
        warn!(error = %e, "Failed to persist session id");
    }
    info!(session_id = %id, "Started new session");
    id
}

// =============================================================================
// Current user
// =============================================================================

/// The logged-in user, if any.
pub fn current_user<S>(store: &S) -> Option<User>
where
    S: KeyValueStore + ?Sized,
{
    storage::read_json(store, keys::CURRENT_USER)
}

/// Persist `user` as the logged-in user.
pub fn set_current_user<S>(store: &S, user: &User)
where
    S: KeyValueStore + ?Sized,
{
    storage::persist_json(store, keys::CURRENT_USER, user);
}

/// Forget the logged-in user.
pub fn clear_current_user<S>(store: &S)
where
    S: KeyValueStore + ?Sized,
{
    storage::forget(store, keys::CURRENT_USER);
}

// =============================================================================
// User directory
// =============================================================================

/// Email-keyed user table.
///
/// Implementations must not fail: a lookup that cannot be answered is a
/// miss, and a write that cannot be stored is dropped.
pub trait UserDirectory {
    /// Look up the record for `email`.
    fn get(&self, email: &Email) -> Option<UserRecord>;

    /// Insert or replace the record for `email`.
    fn put(&self, email: &Email, record: UserRecord);
}

/// [`UserDirectory`] kept as one JSON object in a [`KeyValueStore`].
#[derive(Debug, Clone)]
pub struct StoredUserDirectory<S> {
    store: S,
}

impl<S: KeyValueStore> StoredUserDirectory<S> {
    /// Create a directory over `store`.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    fn load(&self) -> BTreeMap<String, UserRecord> {
        storage::read_json(&self.store, keys::USERS_DB).unwrap_or_default()
    }
}

impl<S: KeyValueStore> UserDirectory for StoredUserDirectory<S> {
    fn get(&self, email: &Email) -> Option<UserRecord> {
        self.load().remove(email.as_str())
    }

    fn put(&self, email: &Email, record: UserRecord) {
        let mut users = self.load();
        users.insert(email.as_str().to_owned(), record);
        storage::persist_json(&self.store, keys::USERS_DB, &users);
    }
}

/// Allocates or recalls user identities.
#[derive(Debug, Clone)]
pub struct IdentityResolver<D> {
    directory: D,
}

impl<D: UserDirectory> IdentityResolver<D> {
    /// Create a resolver over `directory`.
    #[must_use]
    pub const fn new(directory: D) -> Self {
        Self { directory }
    }

    /// Resolve the identity for `email`.
    ///
    /// A known email keeps its user id. An unknown email gets a new id and a
    /// directory record. In both cases the returned name is `name` when it is
    /// non-blank, otherwise the email's local part.
    pub fn resolve_user(&self, email: &Email, name: Option<&str>) -> Resolution {
        let name = display_name(email, name);

        if let Some(record) = self.directory.get(email) {
            debug!(email = %email, user_id = %record.user_id, "Returning user");
            return Resolution {
                user: User {
                    email: email.clone(),
                    name,
                    user_id: record.user_id,
                },
                returning: true,
            };
        }

        let user_id = UserId::generate();
        self.directory.put(
            email,
            UserRecord {
                user_id: user_id.clone(),
                email: email.clone(),
                name: name.clone(),
                created_at: Utc::now(),
            },
        );
        info!(email = %email, user_id = %user_id, "New user created");

        Resolution {
            user: User {
                email: email.clone(),
                name,
                user_id,
            },
            returning: false,
        }
    }
}

fn display_name(email: &Email, name: Option<&str>) -> String {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| email.local_part())
        .to_owned()
}
