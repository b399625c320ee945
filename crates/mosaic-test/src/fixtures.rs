//! Test fixtures for common types.

use mosaic_apps::ModuleDefinition;
use mosaic_core::{AllowedUsers, AppCatalog, AuthState, ExtensionDescriptor};
use serde_json::{Value, json};

/// Id of [`test_user`].
pub const TEST_USER_ID: &str = "user-0001";

/// Id of [`test_admin`].
pub const TEST_ADMIN_ID: &str = "admin-0001";

/// Id of the account both test users belong to.
pub const TEST_ACCOUNT_ID: &str = "account-0001";

/// A regular user document.
#[must_use]
pub fn test_user() -> Value {
    json!({
        "id": TEST_USER_ID,
        "first_name": "Ada",
        "last_name": "Lovelace",
        "priv_level": "user",
    })
}

/// An administrator document.
#[must_use]
pub fn test_admin() -> Value {
    json!({
        "id": TEST_ADMIN_ID,
        "first_name": "Grace",
        "last_name": "Hopper",
        "priv_level": "admin",
    })
}

/// The test account document.
#[must_use]
pub fn test_account() -> Value {
    json!({
        "id": TEST_ACCOUNT_ID,
        "name": "Test Account",
    })
}

/// An auth state logged in as `user` on the test account.
#[must_use]
pub fn test_auth_state(user: Value) -> AuthState {
    AuthState {
        auth_token: Some("test-token".to_string()),
        user_id: user.get("id").and_then(Value::as_str).map(ToString::to_string),
        current_user: user,
        current_account: test_account(),
        original_account: test_account(),
        installed_apps: Vec::new(),
    }
}

/// A module declaring the default language.
#[must_use]
pub fn test_module() -> ModuleDefinition {
    ModuleDefinition::new().with_language("en-US", false)
}

/// A catalog where `voip` offers three extensions:
/// `recorder` (everyone), `reports` (admins) and `beta` (the test admin
/// only).
#[must_use]
pub fn test_catalog() -> AppCatalog {
    AppCatalog::new()
        .with_entry(
            ExtensionDescriptor::new("voip")
                .with_extension("recorder")
                .with_extension("reports")
                .with_extension("beta"),
        )
        .with_entry(ExtensionDescriptor::new("recorder"))
        .with_entry(ExtensionDescriptor::new("reports").with_allowed_users(AllowedUsers::Admins))
        .with_entry(
            ExtensionDescriptor::new("beta")
                .with_allowed_users(AllowedUsers::Specific)
                .with_user(TEST_ADMIN_ID),
        )
}
