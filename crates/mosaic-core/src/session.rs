//! Authentication session state and the persisted session store.
//!
//! [`AuthSession`] is the in-process view of who is logged in (token, user,
//! accounts, installed apps). [`SessionStore`] is the cookie-like key/value
//! store that survives reloads; the gateway rewrites it when an
//! identity-affecting call succeeds.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::Principal;

/// Key under which the auth cookie (language, token) is persisted.
pub const AUTH_SESSION_KEY: &str = "mosaic-auth";

/// Cookie-like persisted key/value store.
pub trait SessionStore: Send + Sync {
    /// Read a JSON value.
    fn get(&self, key: &str) -> Option<Value>;

    /// Write a JSON value, replacing any previous one.
    fn set(&self, key: &str, value: Value);

    /// Remove a value. Returns `true` if it existed.
    fn remove(&self, key: &str) -> bool;
}

/// In-memory [`SessionStore`].
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: RwLock<HashMap<String, Value>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value.
    #[must_use]
    pub fn with_value(self, key: impl Into<String>, value: Value) -> Self {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value);
        self
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: Value) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) -> bool {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some()
    }
}

/// A stored installed-app record.
///
/// When present, `source_url` redirects where the app's code and assets are
/// loaded from and `api_url` replaces the default API root for its calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledApp {
    /// Application name.
    pub name: String,
    /// Alternate location of the app's code and assets.
    #[serde(default)]
    pub source_url: Option<String>,
    /// Alternate API root for the app's calls.
    #[serde(default)]
    pub api_url: Option<String>,
}

impl InstalledApp {
    /// Create a record with no overrides.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_url: None,
            api_url: None,
        }
    }

    /// Set the source URL override.
    #[must_use]
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Set the API root override.
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }
}

/// Snapshot of the authenticated identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthState {
    /// Current auth token.
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Logged-in user id.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Logged-in user document.
    #[serde(default)]
    pub current_user: Value,
    /// Account currently being acted on (may differ while masquerading).
    #[serde(default)]
    pub current_account: Value,
    /// Account the user logged in with.
    #[serde(default)]
    pub original_account: Value,
    /// Installed-app records for this account.
    #[serde(default)]
    pub installed_apps: Vec<InstalledApp>,
}

/// Shared, lock-protected [`AuthState`].
///
/// Accessors clone out of the lock so no guard is ever held across an
/// `.await`.
#[derive(Debug, Default)]
pub struct AuthSession {
    state: RwLock<AuthState>,
}

impl AuthSession {
    /// Create a session from an initial state.
    #[must_use]
    pub fn new(state: AuthState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Clone the whole state.
    #[must_use]
    pub fn snapshot(&self) -> AuthState {
        self.read(Clone::clone)
    }

    /// Current auth token.
    #[must_use]
    pub fn auth_token(&self) -> Option<String> {
        self.read(|s| s.auth_token.clone())
    }

    /// Logged-in user id.
    #[must_use]
    pub fn user_id(&self) -> Option<String> {
        self.read(|s| s.user_id.clone())
    }

    /// Logged-in user document.
    #[must_use]
    pub fn current_user(&self) -> Value {
        self.read(|s| s.current_user.clone())
    }

    /// Current account document.
    #[must_use]
    pub fn current_account(&self) -> Value {
        self.read(|s| s.current_account.clone())
    }

    /// Id of the current account, if known.
    #[must_use]
    pub fn current_account_id(&self) -> Option<String> {
        self.read(|s| doc_id(&s.current_account))
    }

    /// Id of the original (login) account, if known.
    #[must_use]
    pub fn original_account_id(&self) -> Option<String> {
        self.read(|s| doc_id(&s.original_account))
    }

    /// Original (login) account document.
    #[must_use]
    pub fn original_account(&self) -> Value {
        self.read(|s| s.original_account.clone())
    }

    /// Permission principal for the logged-in user.
    #[must_use]
    pub fn principal(&self) -> Principal {
        self.read(|s| Principal::from_user_doc(&s.current_user))
    }

    /// Installed-app record for `name`, if any.
    #[must_use]
    pub fn installed_app(&self, name: &str) -> Option<InstalledApp> {
        self.read(|s| s.installed_apps.iter().find(|a| a.name == name).cloned())
    }

    /// Replace the auth token.
    pub fn set_auth_token(&self, token: Option<String>) {
        self.write(|s| s.auth_token = token);
    }

    /// Replace the current user document.
    pub fn set_current_user(&self, user: Value) {
        self.write(|s| s.current_user = user);
    }

    /// Replace the current account document.
    pub fn set_current_account(&self, account: Value) {
        self.write(|s| s.current_account = account);
    }

    /// Replace the original account document.
    pub fn set_original_account(&self, account: Value) {
        self.write(|s| s.original_account = account);
    }

    /// Replace the installed-app records.
    pub fn set_installed_apps(&self, apps: Vec<InstalledApp>) {
        self.write(|s| s.installed_apps = apps);
    }

    fn read<T>(&self, f: impl FnOnce(&AuthState) -> T) -> T {
        f(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write(&self, f: impl FnOnce(&mut AuthState)) {
        f(&mut self.state.write().unwrap_or_else(PoisonError::into_inner));
    }
}

fn doc_id(doc: &Value) -> Option<String> {
    doc.get("id")
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemorySessionStore::new().with_value(AUTH_SESSION_KEY, json!({"language": "en-US"}));
        assert_eq!(store.get(AUTH_SESSION_KEY), Some(json!({"language": "en-US"})));

        store.set(AUTH_SESSION_KEY, json!({"language": "fr-FR"}));
        assert_eq!(store.get(AUTH_SESSION_KEY).unwrap()["language"], "fr-FR");

        assert!(store.remove(AUTH_SESSION_KEY));
        assert!(!store.remove(AUTH_SESSION_KEY));
        assert!(store.get(AUTH_SESSION_KEY).is_none());
    }

    #[test]
    fn test_auth_session_accessors() {
        let session = AuthSession::new(AuthState {
            auth_token: Some("tok".into()),
            user_id: Some("u1".into()),
            current_user: json!({"id": "u1", "priv_level": "admin"}),
            current_account: json!({"id": "acc-1"}),
            original_account: json!({"id": "acc-0"}),
            installed_apps: vec![InstalledApp::new("voip").with_api_url("https://api.example/")],
        });

        assert_eq!(session.auth_token().as_deref(), Some("tok"));
        assert_eq!(session.current_account_id().as_deref(), Some("acc-1"));
        assert_eq!(session.original_account_id().as_deref(), Some("acc-0"));
        assert!(session.principal().is_admin);
        assert!(session.installed_app("voip").is_some());
        assert!(session.installed_app("fax").is_none());

        session.set_current_account(json!({"id": "acc-2"}));
        assert_eq!(session.current_account_id().as_deref(), Some("acc-2"));
    }
}
