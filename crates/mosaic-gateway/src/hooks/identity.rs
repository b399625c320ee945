//! Keep the session's account and user documents in sync with updates
//! made through the API.

use mosaic_core::{AUTH_SESSION_KEY, AuthSession, SessionStore};
use mosaic_events::{EventBus, topics};
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use crate::intent::RequestIntent;

/// After an account update, replace the current and/or original account
/// when the updated account is one of them.
pub(crate) fn sync_account(
    request: &RequestIntent,
    doc: &Value,
    session: &AuthSession,
    bus: &EventBus,
) {
    let Some(account_id) = request.param_str("accountId") else {
        return;
    };

    if session.current_account_id().as_deref() == Some(account_id) {
        session.set_current_account(doc.clone());
        bus.publish(topics::CURRENT_ACCOUNT_UPDATED, doc.clone());
        debug!(account_id, "Current account replaced");
    }

    if session.original_account_id().as_deref() == Some(account_id) {
        session.set_original_account(doc.clone());
        bus.publish(topics::ORIGINAL_ACCOUNT_UPDATED, doc.clone());
        debug!(account_id, "Original account replaced");
    }
}

/// After a user update, mirror the logged-in user's new document.
pub(crate) fn sync_current_user(
    request: &RequestIntent,
    doc: &Value,
    session: &AuthSession,
    store: &dyn SessionStore,
    bus: &EventBus,
) {
    let (Some(user_id), Some(current)) = (request.param_str("userId"), session.user_id()) else {
        return;
    };
    if user_id != current {
        return;
    }

    session.set_current_user(doc.clone());
    bus.publish(topics::CURRENT_USER_UPDATED, doc.clone());

    if let Some(password) = request.body().and_then(|b| b.get("password")) {
        bus.publish(
            topics::CURRENT_USER_PASSWORD_UPDATED,
            json!({ "user": doc, "password": password }),
        );
    }

    sync_stored_language(doc.get("language"), store);
}

fn sync_stored_language(language: Option<&Value>, store: &dyn SessionStore) {
    let mut stored = match store.get(AUTH_SESSION_KEY) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    if stored.get("language") == language {
        return;
    }

    match language {
        Some(lang) => {
            stored.insert("language".to_string(), lang.clone());
        },
        None => {
            stored.remove("language");
        },
    }
    info!(language = ?language, "Session language updated");
    store.set(AUTH_SESSION_KEY, Value::Object(stored));
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_core::{AuthState, MemorySessionStore};

    fn session() -> AuthSession {
        AuthSession::new(AuthState {
            auth_token: Some("tok".into()),
            user_id: Some("user-1".into()),
            current_user: json!({"id": "user-1", "language": "en-US"}),
            current_account: json!({"id": "acc-sub", "name": "Sub"}),
            original_account: json!({"id": "acc-root", "name": "Root"}),
            installed_apps: Vec::new(),
        })
    }

    #[test]
    fn test_account_sync_current_only() {
        let session = session();
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let request = RequestIntent::new("account.update").with_param("accountId", json!("acc-sub"));
        let doc = json!({"id": "acc-sub", "name": "Renamed"});

        sync_account(&request, &doc, &session, &bus);

        assert_eq!(session.current_account(), doc);
        assert_eq!(session.original_account()["name"], "Root");
        let seen: Vec<_> = rx.drain().iter().map(|e| e.topic.clone()).collect();
        assert_eq!(seen, [topics::CURRENT_ACCOUNT_UPDATED]);
    }

    #[test]
    fn test_account_sync_other_account_ignored() {
        let session = session();
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let request = RequestIntent::new("account.update").with_param("accountId", json!("acc-x"));

        sync_account(&request, &json!({"id": "acc-x"}), &session, &bus);

        assert_eq!(session.current_account()["name"], "Sub");
        assert!(rx.drain().is_empty());
    }

    #[test]
    fn test_current_user_sync_with_password_and_language() {
        let session = session();
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let store = MemorySessionStore::new()
            .with_value(AUTH_SESSION_KEY, json!({"language": "en-US", "authToken": "tok"}));
        let request = RequestIntent::new("user.update")
            .with_param("userId", json!("user-1"))
            .with_param("data", json!({"password": "hunter2"}));
        let doc = json!({"id": "user-1", "language": "fr-FR"});

        sync_current_user(&request, &doc, &session, &store, &bus);

        assert_eq!(session.current_user(), doc);
        let events = rx.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].topic, topics::CURRENT_USER_PASSWORD_UPDATED);
        assert_eq!(events[1].payload["password"], "hunter2");

        let stored = store.get(AUTH_SESSION_KEY).unwrap();
        assert_eq!(stored["language"], "fr-FR");
        assert_eq!(stored["authToken"], "tok");
    }

    #[test]
    fn test_other_user_not_synced() {
        let session = session();
        let bus = EventBus::new();
        let store = MemorySessionStore::new();
        let request = RequestIntent::new("user.update").with_param("userId", json!("user-2"));

        sync_current_user(&request, &json!({"id": "user-2"}), &session, &store, &bus);

        assert_eq!(session.current_user()["id"], "user-1");
        assert!(store.get(AUTH_SESSION_KEY).is_none());
    }
}
