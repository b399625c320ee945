//! Hook kinds and the per-resource hook table.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use mosaic_core::ResourceId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GatewayError, GatewayResult};
use crate::transport::Transport;

/// The interception applied to one resource.
///
/// Exactly one kind applies per resource; kinds do not stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    /// No interception.
    Passthrough,
    /// Mirror an updated current/original account into the session.
    AccountSync,
    /// Sort a user listing by first then last name.
    SortUsers,
    /// Migrate member numbers to conference numbers, then update.
    ConferenceNumbers,
    /// Mirror an updated logged-in user into the session.
    CurrentUserSync,
    /// Veto billing calls when billing is disabled.
    BillingGuard,
    /// Rename the legacy e911 field in responses.
    E911Read,
    /// Rename the legacy e911 field in request bodies.
    E911Write,
    /// Merge the host's whitelabel document into whitelabel state.
    WhitelabelSync,
    /// Drive the global upload progress indicator.
    UploadProgress,
}

impl HookKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Passthrough,
        Self::AccountSync,
        Self::SortUsers,
        Self::ConferenceNumbers,
        Self::CurrentUserSync,
        Self::BillingGuard,
        Self::E911Read,
        Self::E911Write,
        Self::WhitelabelSync,
        Self::UploadProgress,
    ];

    /// Configuration name of the kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passthrough => "passthrough",
            Self::AccountSync => "account_sync",
            Self::SortUsers => "sort_users",
            Self::ConferenceNumbers => "conference_numbers",
            Self::CurrentUserSync => "current_user_sync",
            Self::BillingGuard => "billing_guard",
            Self::E911Read => "e911_read",
            Self::E911Write => "e911_write",
            Self::WhitelabelSync => "whitelabel_sync",
            Self::UploadProgress => "upload_progress",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|k| k.as_str() == s).ok_or(())
    }
}

/// The standard resource → hook assignments.
const STANDARD_HOOKS: &[(&str, HookKind)] = &[
    ("account.update", HookKind::AccountSync),
    ("account.patch", HookKind::AccountSync),
    ("user.list", HookKind::SortUsers),
    ("conference.get", HookKind::ConferenceNumbers),
    ("user.update", HookKind::CurrentUserSync),
    ("user.patch", HookKind::CurrentUserSync),
    ("billing.get", HookKind::BillingGuard),
    ("billing.update", HookKind::BillingGuard),
    ("numbers.get", HookKind::E911Read),
    ("numbers.update", HookKind::E911Write),
    ("whitelabel.getByDomain", HookKind::WhitelabelSync),
    ("whitelabel.create", HookKind::WhitelabelSync),
    ("whitelabel.update", HookKind::WhitelabelSync),
    ("whitelabel.get", HookKind::WhitelabelSync),
    ("media.upload", HookKind::UploadProgress),
    ("port.createAttachment", HookKind::UploadProgress),
    ("port.updateAttachment", HookKind::UploadProgress),
    ("whitelabel.updateLogo", HookKind::UploadProgress),
    ("whitelabel.updateIcon", HookKind::UploadProgress),
];

/// Typed map from resource to hook kind. Unlisted resources pass through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookTable {
    entries: HashMap<ResourceId, HookKind>,
}

impl HookTable {
    /// A table with no hooks.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard hook table.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            entries: STANDARD_HOOKS
                .iter()
                .filter_map(|(id, kind)| ResourceId::parse(id).ok().map(|id| (id, *kind)))
                .collect(),
        }
    }

    /// Assign `kind` to `resource`. `Passthrough` removes any entry.
    #[must_use]
    pub fn with(mut self, resource: ResourceId, kind: HookKind) -> Self {
        self.set(resource, kind);
        self
    }

    fn set(&mut self, resource: ResourceId, kind: HookKind) {
        if kind == HookKind::Passthrough {
            self.entries.remove(&resource);
        } else {
            self.entries.insert(resource, kind);
        }
    }

    /// Layer `[gateway.hooks]` overrides onto this table.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnsupportedResource`] for a malformed
    /// resource id and [`GatewayError::InvalidHookKind`] for an unknown
    /// hook name.
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, String>) -> GatewayResult<Self> {
        for (resource, kind) in overrides {
            let id = ResourceId::parse(resource)
                .map_err(|_| GatewayError::UnsupportedResource(resource.clone()))?;
            let parsed: HookKind = kind.parse().map_err(|()| GatewayError::InvalidHookKind {
                resource: resource.clone(),
                kind: kind.clone(),
            })?;
            debug!(resource = %id, hook = %parsed, "Hook override applied");
            self.set(id, parsed);
        }
        Ok(self)
    }

    /// Hook kind for `resource`.
    #[must_use]
    pub fn get(&self, resource: &ResourceId) -> HookKind {
        self.entries
            .get(resource)
            .copied()
            .unwrap_or(HookKind::Passthrough)
    }

    /// Check every entry names a resource the transport offers.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnknownHookResource`] for the first entry the
    /// transport does not support.
    pub fn validate(&self, transport: &dyn Transport) -> GatewayResult<()> {
        let mut ids: Vec<&ResourceId> = self.entries.keys().collect();
        ids.sort();
        match ids.into_iter().find(|id| !transport.supports(id)) {
            Some(id) => Err(GatewayError::UnknownHookResource(id.to_string())),
            None => Ok(()),
        }
    }

    /// Number of hooked resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no resource is hooked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ResourceId {
        ResourceId::parse(s).unwrap()
    }

    #[test]
    fn test_kind_names_roundtrip() {
        for kind in HookKind::ALL {
            assert_eq!(kind.as_str().parse::<HookKind>(), Ok(kind));
        }
        assert!("nope".parse::<HookKind>().is_err());
    }

    #[test]
    fn test_standard_table() {
        let table = HookTable::standard();
        assert_eq!(table.len(), STANDARD_HOOKS.len());
        assert_eq!(table.get(&id("numbers.update")), HookKind::E911Write);
        assert_eq!(table.get(&id("media.upload")), HookKind::UploadProgress);
        assert_eq!(table.get(&id("device.list")), HookKind::Passthrough);
    }

    #[test]
    fn test_overrides_add_and_remove() {
        let overrides = BTreeMap::from([
            ("billing.get".to_string(), "passthrough".to_string()),
            ("media.update".to_string(), "upload_progress".to_string()),
        ]);
        let table = HookTable::standard().with_overrides(&overrides).unwrap();

        assert_eq!(table.get(&id("billing.get")), HookKind::Passthrough);
        assert_eq!(table.get(&id("billing.update")), HookKind::BillingGuard);
        assert_eq!(table.get(&id("media.update")), HookKind::UploadProgress);
    }

    #[test]
    fn test_overrides_reject_unknown_kind() {
        let overrides = BTreeMap::from([("user.get".to_string(), "teleport".to_string())]);
        assert!(matches!(
            HookTable::empty().with_overrides(&overrides),
            Err(GatewayError::InvalidHookKind { .. })
        ));
    }
}
