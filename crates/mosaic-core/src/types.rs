//! Common identifier types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// An API operation identifier: `<module>.<method>`.
///
/// This is the gateway's dispatch key. Both halves must be non-empty and
/// the identifier must contain exactly one dot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    module: String,
    method: String,
}

impl ResourceId {
    /// Parse a `<module>.<method>` identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidResourceId`] if the identifier does not
    /// split into exactly two non-empty segments.
    pub fn parse(id: &str) -> CoreResult<Self> {
        let mut parts = id.split('.');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(module), Some(method), None) if !module.is_empty() && !method.is_empty() => {
                Ok(Self {
                    module: module.to_string(),
                    method: method.to_string(),
                })
            },
            _ => Err(CoreError::InvalidResourceId(id.to_string())),
        }
    }

    /// Build an identifier from its parts.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidResourceId`] if either part is empty or
    /// contains a dot.
    pub fn new(module: impl Into<String>, method: impl Into<String>) -> CoreResult<Self> {
        let module = module.into();
        let method = method.into();
        Self::parse(&format!("{module}.{method}"))
    }

    /// The module half (e.g. `account`).
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// The method half (e.g. `update`).
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.method)
    }
}

impl FromStr for ResourceId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ResourceId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// The user a permission decision is made for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Principal {
    /// User id, if the session has a logged-in user.
    pub id: Option<String>,
    /// Whether the user has the `admin` privilege level.
    pub is_admin: bool,
}

impl Principal {
    /// Derive a principal from a user document (`{"id": .., "priv_level": ..}`).
    #[must_use]
    pub fn from_user_doc(user: &serde_json::Value) -> Self {
        Self {
            id: user
                .get("id")
                .and_then(serde_json::Value::as_str)
                .map(ToString::to_string),
            is_admin: user.get("priv_level").and_then(serde_json::Value::as_str) == Some("admin"),
        }
    }

    /// Anonymous principal (no id, not an admin).
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// Normalize a language tag by upper-casing everything after the first hyphen.
///
/// `en-us` becomes `en-US`; tags without a hyphen are returned unchanged.
#[must_use]
pub fn normalize_language(tag: &str) -> String {
    match tag.split_once('-') {
        Some((lang, region)) => format!("{lang}-{}", region.to_uppercase()),
        None => tag.to_string(),
    }
}
