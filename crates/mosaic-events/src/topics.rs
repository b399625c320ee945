//! Well-known topics published by the host.

/// An outbound request (asset fetch or API call) is starting.
pub const REQUEST_START: &str = "core.request.start";

/// An outbound request has finished, successfully or not.
pub const REQUEST_END: &str = "core.request.end";

/// An application finished loading and is ready.
pub const APP_READY: &str = "core.app.ready";

/// The app-specific keyboard shortcut set changed.
pub const SHORTCUTS_CHANGED: &str = "core.shortcuts.changed";

/// The upload progress indicator changed.
pub const UPLOAD_PROGRESS_CHANGED: &str = "core.upload_progress.changed";

/// The whitelabel document was updated.
pub const WHITELABEL_UPDATED: &str = "core.whitelabel.updated";

/// The current account document was replaced.
pub const CURRENT_ACCOUNT_UPDATED: &str = "auth.current_account_updated";

/// The original (login) account document was replaced.
pub const ORIGINAL_ACCOUNT_UPDATED: &str = "auth.original_account_updated";

/// The logged-in user document was replaced.
pub const CURRENT_USER_UPDATED: &str = "auth.current_user_updated";

/// The logged-in user changed their password.
pub const CURRENT_USER_PASSWORD_UPDATED: &str = "auth.current_user_password_updated";
