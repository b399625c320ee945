//! Per-user and per-account UI flags scoped by application name.
//!
//! Flags live in the user or account document under
//! `ui_flags.<app>.<flag>`. Setters work on a copy and return it; saving
//! the document is the caller's business.

use std::sync::Arc;

use mosaic_core::AuthSession;
use serde_json::{Map, Value};

const UI_FLAGS_KEY: &str = "ui_flags";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagSource {
    User,
    Account,
}

/// Flag accessors for one application.
#[derive(Debug, Clone)]
pub struct UiFlags {
    app: String,
    session: Arc<AuthSession>,
}

impl UiFlags {
    /// Flags for `app`, defaulting to the session's documents.
    #[must_use]
    pub fn new(app: impl Into<String>, session: Arc<AuthSession>) -> Self {
        Self {
            app: app.into(),
            session,
        }
    }

    /// Flags stored on the user document.
    #[must_use]
    pub fn user(&self) -> FlagScope<'_> {
        FlagScope {
            flags: self,
            source: FlagSource::User,
        }
    }

    /// Flags stored on the account document.
    #[must_use]
    pub fn account(&self) -> FlagScope<'_> {
        FlagScope {
            flags: self,
            source: FlagSource::Account,
        }
    }
}

/// Flag accessors bound to the user or the account document.
#[derive(Debug, Clone, Copy)]
pub struct FlagScope<'a> {
    flags: &'a UiFlags,
    source: FlagSource,
}

impl FlagScope<'_> {
    /// Read `flag` from the session document.
    #[must_use]
    pub fn get(&self, flag: &str) -> Option<Value> {
        self.get_in(&self.document(), flag)
    }

    /// Read `flag` from `doc`.
    #[must_use]
    pub fn get_in(&self, doc: &Value, flag: &str) -> Option<Value> {
        doc.get(UI_FLAGS_KEY)?.get(&self.flags.app)?.get(flag).cloned()
    }

    /// A copy of the session document with `flag` set to `value`.
    #[must_use]
    pub fn set(&self, flag: &str, value: Value) -> Value {
        self.set_in(self.document(), flag, value)
    }

    /// `doc` with `flag` set to `value`.
    #[must_use]
    pub fn set_in(&self, mut doc: Value, flag: &str, value: Value) -> Value {
        if let Some(flags) = app_flags(&mut doc, &self.flags.app) {
            flags.insert(flag.to_string(), value);
        }
        doc
    }

    /// A copy of the session document without `flag`.
    #[must_use]
    pub fn destroy(&self, flag: &str) -> Value {
        self.destroy_in(self.document(), flag)
    }

    /// `doc` without `flag`.
    #[must_use]
    pub fn destroy_in(&self, mut doc: Value, flag: &str) -> Value {
        if let Some(flags) = doc
            .get_mut(UI_FLAGS_KEY)
            .and_then(|all| all.get_mut(&self.flags.app))
            .and_then(Value::as_object_mut)
        {
            flags.remove(flag);
        }
        doc
    }

    fn document(&self) -> Value {
        match self.source {
            FlagSource::User => self.flags.session.current_user(),
            FlagSource::Account => self.flags.session.current_account(),
        }
    }
}

/// The `ui_flags.<app>` object of `doc`, created on demand.
/// `None` when `doc` is not an object.
fn app_flags<'a>(doc: &'a mut Value, app: &str) -> Option<&'a mut Map<String, Value>> {
    if doc.is_null() {
        *doc = Value::Object(Map::new());
    }
    let all = doc
        .as_object_mut()?
        .entry(UI_FLAGS_KEY)
        .or_insert_with(|| Value::Object(Map::new()));
    if !all.is_object() {
        *all = Value::Object(Map::new());
    }
    let scoped = all
        .as_object_mut()?
        .entry(app)
        .or_insert_with(|| Value::Object(Map::new()));
    if !scoped.is_object() {
        *scoped = Value::Object(Map::new());
    }
    scoped.as_object_mut()
}
