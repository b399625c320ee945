//! Extension visibility for the logged-in user.

use mosaic_core::{AppCatalog, Principal};

/// Decides which catalog extensions a principal may load.
#[derive(Debug, Clone, Copy)]
pub struct PermissionFilter<'a> {
    catalog: &'a AppCatalog,
    principal: &'a Principal,
}

impl<'a> PermissionFilter<'a> {
    /// Filter `catalog` entries for `principal`.
    #[must_use]
    pub fn new(catalog: &'a AppCatalog, principal: &'a Principal) -> Self {
        Self { catalog, principal }
    }

    /// Whether `extension` is in the catalog and visible to the principal.
    ///
    /// `all` admits everyone, `admins` admits administrators and
    /// `specific` admits the listed users.
    #[must_use]
    pub fn permits(&self, extension: &str) -> bool {
        self.catalog
            .get(extension)
            .is_some_and(|entry| entry.permits(self.principal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_core::{AllowedUsers, ExtensionDescriptor};

    fn catalog() -> AppCatalog {
        AppCatalog::new()
            .with_entry(ExtensionDescriptor::new("open"))
            .with_entry(ExtensionDescriptor::new("admin").with_allowed_users(AllowedUsers::Admins))
            .with_entry(
                ExtensionDescriptor::new("pilot")
                    .with_allowed_users(AllowedUsers::Specific)
                    .with_user("u1"),
            )
    }

    #[test]
    fn test_levels() {
        let catalog = catalog();
        let user = Principal {
            id: Some("u2".into()),
            is_admin: false,
        };
        let admin = Principal {
            id: Some("u3".into()),
            is_admin: true,
        };
        let listed = Principal {
            id: Some("u1".into()),
            is_admin: false,
        };

        let filter = PermissionFilter::new(&catalog, &user);
        assert!(filter.permits("open"));
        assert!(!filter.permits("admin"));
        assert!(!filter.permits("pilot"));
        assert!(!filter.permits("missing"));

        assert!(PermissionFilter::new(&catalog, &admin).permits("admin"));
        assert!(PermissionFilter::new(&catalog, &listed).permits("pilot"));
    }
}
