//! Application and extension catalog.
//!
//! The catalog is the host's directory of installable applications. Each
//! entry states who may load it and which extensions it offers. It is
//! read-only from the loader's point of view.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::Principal;

/// Who may load an extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllowedUsers {
    /// Every user.
    All,
    /// Only users with the `admin` privilege level.
    Admins,
    /// Only the users listed in [`ExtensionDescriptor::users`].
    Specific,
}

/// A catalog entry for an application or extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionDescriptor {
    /// Unique name of the application.
    pub name: String,
    /// Permission level. A missing level grants nobody.
    #[serde(default)]
    pub allowed_users: Option<AllowedUsers>,
    /// User ids allowed when `allowed_users` is [`AllowedUsers::Specific`].
    #[serde(default, deserialize_with = "user_ids")]
    pub users: BTreeSet<String>,
    /// Extensions offered for this application.
    #[serde(default)]
    pub extensions: Vec<String>,
}

impl ExtensionDescriptor {
    /// Create a descriptor open to all users.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            allowed_users: Some(AllowedUsers::All),
            users: BTreeSet::new(),
            extensions: Vec::new(),
        }
    }

    /// Set the permission level.
    #[must_use]
    pub fn with_allowed_users(mut self, level: AllowedUsers) -> Self {
        self.allowed_users = Some(level);
        self
    }

    /// Add a specifically allowed user.
    #[must_use]
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.users.insert(user_id.into());
        self
    }

    /// Add an offered extension.
    #[must_use]
    pub fn with_extension(mut self, name: impl Into<String>) -> Self {
        self.extensions.push(name.into());
        self
    }

    /// Whether `principal` may load this entry.
    #[must_use]
    pub fn permits(&self, principal: &Principal) -> bool {
        match self.allowed_users {
            Some(AllowedUsers::All) => true,
            Some(AllowedUsers::Admins) => principal.is_admin,
            Some(AllowedUsers::Specific) => principal
                .id
                .as_ref()
                .is_some_and(|id| self.users.contains(id)),
            None => false,
        }
    }
}

/// Accepts `["id", ...]` as well as `[{"id": "..."}, ...]`.
fn user_ids<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum UserRef {
        Id(String),
        Doc { id: String },
    }

    let refs = Vec::<UserRef>::deserialize(deserializer)?;
    Ok(refs
        .into_iter()
        .map(|r| match r {
            UserRef::Id(id) | UserRef::Doc { id } => id,
        })
        .collect())
}

/// The host's application directory, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct AppCatalog {
    entries: HashMap<String, ExtensionDescriptor>,
}

impl AppCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from descriptors. Later duplicates replace earlier ones.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = ExtensionDescriptor>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|entry| (entry.name.clone(), entry))
                .collect(),
        }
    }

    /// Parse a catalog from a JSON array of descriptors.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCatalog`] if the JSON does not describe
    /// a list of descriptors.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let entries: Vec<ExtensionDescriptor> =
            serde_json::from_str(json).map_err(|e| CoreError::InvalidCatalog(e.to_string()))?;
        Ok(Self::from_entries(entries))
    }

    /// Add or replace an entry.
    #[must_use]
    pub fn with_entry(mut self, entry: ExtensionDescriptor) -> Self {
        self.entries.insert(entry.name.clone(), entry);
        self
    }

    /// Look up an entry by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ExtensionDescriptor> {
        self.entries.get(name)
    }

    /// Whether the catalog lists `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Extensions offered for `app`, in declaration order.
    #[must_use]
    pub fn extensions_of(&self, app: &str) -> &[String] {
        self.entries
            .get(app)
            .map_or(&[], |entry| entry.extensions.as_slice())
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
