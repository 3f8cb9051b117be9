use std::sync::OnceLock;

use serde::{Serialize, Serializer};
use tracing::trace;

use rolegate_core::{LocalizedText, PermissionSpec, RoleConfigProvider, SharedRoleConfig};

use crate::inheritance::deep_inherited_role_names;
use crate::permissions::{matches_segments, permission_segments};

/// A named bundle of permissions plus the roles it inherits from.
///
/// A role reads its own record from the provider once, at construction.
/// Inherited roles are referenced by name only; they are re-read from the
/// provider whenever they are needed, so two roles built for the same name
/// are independent instances.
///
/// A role without a name is the *empty* role: it denies everything and
/// inherits nothing.
#[derive(Clone)]
pub struct Role {
    name: Option<String>,
    permissions: PermissionSpec,
    parents: Vec<String>,
    pub(crate) label: Option<LocalizedText>,
    pub(crate) description: Option<LocalizedText>,
    deep_inherited: OnceLock<Vec<String>>,
    config: SharedRoleConfig,
}

impl Role {
    /// Build the role called `name`. `None` and `""` build the empty role.
    pub fn new(config: SharedRoleConfig, name: Option<&str>) -> Self {
        let name = name.filter(|n| !n.is_empty()).map(str::to_string);
        let record = name
            .as_deref()
            .map(|n| config.role_record(n))
            .unwrap_or_default();

        Self {
            name,
            permissions: record.permissions,
            parents: record.parents,
            label: record.label,
            description: record.description,
            deep_inherited: OnceLock::new(),
            config,
        }
    }

    pub fn named(config: SharedRoleConfig, name: &str) -> Self {
        Self::new(config, Some(name))
    }

    pub fn empty(config: SharedRoleConfig) -> Self {
        Self::new(config, None)
    }

    /// Restore a role from its persisted attribute (a name or null).
    pub fn from_attribute(config: SharedRoleConfig, attribute: Option<&str>) -> Self {
        Self::new(config, attribute)
    }

    /// The persisted form of this role: its name, or `None` for the empty role.
    pub fn to_attribute(&self) -> Option<String> {
        self.name.clone()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
    }

    /// Whether the role's own permissions are the bare wildcard.
    ///
    /// Only the role's own specification counts; inheriting from a super-admin
    /// does not make a role a super-admin.
    pub fn is_super_admin(&self) -> bool {
        !self.is_empty() && self.permissions.is_wildcard()
    }

    /// The role's own (not inherited) permission specification.
    pub fn permissions(&self) -> &PermissionSpec {
        &self.permissions
    }

    pub fn config(&self) -> &SharedRoleConfig {
        &self.config
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        let Some(name) = self.name.as_deref() else {
            return false;
        };

        let separator = self.config.permission_separator();
        let segments = permission_segments(permission, &separator);
        if segments.is_empty() {
            return false;
        }

        if self.is_super_admin() {
            trace!(role = name, permission, "granted to super-admin");
            return true;
        }

        if matches_segments(&self.permissions, &segments) {
            trace!(role = name, permission, "granted by own permissions");
            return true;
        }

        // The inherited list is already transitive, so only each role's own
        // permissions are checked.
        let granted_by = self.deep_inherited_role_names().iter().find(|inherited| {
            self.config.check_role_permissions(inherited, &mut |spec: &PermissionSpec| {
                matches_segments(spec, &segments)
            })
        });

        match granted_by {
            Some(inherited) => {
                trace!(role = name, permission, granted_by = %inherited, "granted by inherited role");
                true
            }
            None => {
                trace!(role = name, permission, "denied");
                false
            }
        }
    }

    /// Names of the directly assigned parent roles.
    pub fn direct_inherited_role_names(&self) -> &[String] {
        &self.parents
    }

    /// Names of every role this role inherits from, transitively.
    ///
    /// Computed on first use and cached for the life of this instance.
    pub fn deep_inherited_role_names(&self) -> &[String] {
        self.deep_inherited.get_or_init(|| {
            let Some(name) = self.name.as_deref() else {
                return Vec::new();
            };

            deep_inherited_role_names(name, |role| {
                if role == name {
                    self.parents.clone()
                } else {
                    self.config.inherited_role_names(role)
                }
            })
        })
    }

    /// Inherited roles keyed by name: direct parents only, or the full
    /// closure. Both keep first-discovery order.
    pub fn inherited_roles(&self, deep: bool) -> Vec<(String, Role)> {
        let names = if deep {
            self.deep_inherited_role_names()
        } else {
            self.direct_inherited_role_names()
        };

        names
            .iter()
            .map(|name| (name.clone(), Role::named(self.config.clone(), name)))
            .collect()
    }

    /// Whether `name` is anywhere in this role's inheritance closure.
    pub fn inherits_role(&self, name: &str) -> bool {
        self.deep_inherited_role_names().iter().any(|n| n == name)
    }

    /// [`Role::inherits_role`] for a role instance; the empty role is never inherited.
    pub fn inherits(&self, role: &Role) -> bool {
        role.name().is_some_and(|name| self.inherits_role(name))
    }
}

impl PartialEq for Role {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Role {}

impl core::fmt::Debug for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Role")
            .field("name", &self.name)
            .field("permissions", &self.permissions)
            .field("parents", &self.parents)
            .finish_non_exhaustive()
    }
}

impl Serialize for Role {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.name.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rolegate_core::{
        InMemoryRoleConfig, PermissionsConfig, RoleConfigProvider, RoleRecord,
    };
    use serde_json::json;

    fn config(value: serde_json::Value) -> SharedRoleConfig {
        Arc::new(InMemoryRoleConfig::from_json_str(&value.to_string()).unwrap())
    }

    fn store_roles() -> SharedRoleConfig {
        config(json!({
            "roles": {
                "storeManager": {
                    "permissions": { "store": ["manage"], "items": ["create", "update"] },
                    "roles": ["storeClerk"]
                },
                "storeClerk": {
                    "permissions": { "items": ["arrange", "sell"] }
                }
            }
        }))
    }

    /// Counts record reads and lent permission checks.
    struct CountingConfig {
        inner: PermissionsConfig,
        reads: AtomicUsize,
        lent: AtomicUsize,
    }

    impl RoleConfigProvider for CountingConfig {
        fn role_record(&self, name: &str) -> RoleRecord {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.role_record(name)
        }

        fn inherited_role_names(&self, name: &str) -> Vec<String> {
            self.inner.inherited_role_names(name)
        }

        fn check_role_permissions(
            &self,
            name: &str,
            check: &mut dyn FnMut(&PermissionSpec) -> bool,
        ) -> bool {
            self.lent.fetch_add(1, Ordering::SeqCst);
            self.inner.check_role_permissions(name, check)
        }
    }

    #[test]
    fn store_manager_scenario() {
        let role = Role::named(store_roles(), "storeManager");

        assert_eq!(role.name(), Some("storeManager"));
        assert!(role.has_permission("store:manage"));
        assert!(role.has_permission("items:arrange"));
        assert!(!role.has_permission("items:delete"));
    }

    #[test]
    fn own_permission_edge_cases() {
        let role = Role::named(store_roles(), "storeManager");

        assert!(!role.has_permission("customers:manage"));
        assert!(!role.has_permission("customers"));
        assert!(!role.has_permission("store"));
        assert!(!role.has_permission("store.manage"));
        assert!(!role.has_permission(""));
        assert!(!role.has_permission(":"));
        assert!(!role.has_permission("*"));
    }

    #[test]
    fn empty_role_denies_everything() {
        let cfg = store_roles();
        for role in [Role::empty(cfg.clone()), Role::new(cfg.clone(), Some(""))] {
            assert!(role.is_empty());
            assert_eq!(role.name(), None);
            assert!(!role.is_super_admin());
            assert!(!role.has_permission("store:manage"));
            assert!(role.inherited_roles(true).is_empty());
            assert!(role.inherited_roles(false).is_empty());
        }
    }

    #[test]
    fn unknown_role_has_no_permissions() {
        let role = Role::named(store_roles(), "storeCustomer");

        assert!(!role.is_empty());
        assert!(!role.has_permission("store:manage"));
        assert!(!role.has_permission("any_other_permission"));
        assert!(role.deep_inherited_role_names().is_empty());
    }

    #[test]
    fn super_admin_grants_every_non_empty_permission() {
        let role = Role::named(config(json!({ "roles": { "root": { "permissions": "*" } } })), "root");

        assert!(role.is_super_admin());
        assert!(role.has_permission("store:manage"));
        assert!(role.has_permission("super:admin:has:any:permission"));
        assert!(role.has_permission("*"));
        assert!(!role.has_permission(""));
        assert!(!role.has_permission("::"));
    }

    #[test]
    fn inherited_super_admin_grants_without_the_flag() {
        let cfg = config(json!({
            "roles": {
                "deputy": { "permissions": ["wave"], "roles": ["root"] },
                "root": { "permissions": "*" }
            }
        }));
        let deputy = Role::named(cfg, "deputy");

        assert!(!deputy.is_super_admin());
        assert!(deputy.has_permission("anything:at:all"));
    }

    #[test]
    fn inheritance_is_transitive() {
        let cfg = config(json!({
            "roles": {
                "A": { "roles": ["B"] },
                "B": { "permissions": ["unrelated"], "inherits": ["C"] },
                "C": { "permissions": { "reports": ["export"] } }
            }
        }));

        let a = Role::named(cfg.clone(), "A");
        assert!(a.has_permission("reports:export"));
        assert!(!Role::named(cfg, "B").has_permission("unrelated:export"));
    }

    #[test]
    fn circular_inheritance_does_not_break_a_role() {
        let cfg = config(json!({
            "roles": {
                "storeManager": {
                    "permissions": { "store": ["manage"] },
                    "roles": ["storeClerk", "storeManager"]
                },
                "storeClerk": {
                    "permissions": { "items": ["create"] },
                    "inherits": ["storeOwner"]
                },
                "storeOwner": {
                    "permissions": { "customers": ["talkTo"] },
                    "roles": ["storeManager"]
                }
            }
        }));
        let role = Role::named(cfg, "storeManager");

        assert!(role.has_permission("store:manage"));
        assert!(role.has_permission("items:create"));
        assert!(role.has_permission("customers:talkTo"));
        assert!(!role.has_permission("store:setOnFire"));
        assert_eq!(role.deep_inherited_role_names(), ["storeClerk", "storeOwner"]);
        assert!(!role.inherits_role("storeManager"));
    }

    #[test]
    fn inherited_roles_direct_and_deep() {
        let role = Role::named(store_roles(), "storeManager");

        let direct = role.inherited_roles(false);
        assert_eq!(direct.len(), 1);
        assert_eq!(direct[0].0, "storeClerk");
        assert!(direct[0].1.has_permission("items:sell"));

        assert_eq!(role.inherited_roles(true).len(), 1);
        assert!(role.inherits_role("storeClerk"));
        assert!(role.inherits(&Role::named(role.config().clone(), "storeClerk")));
        assert!(!role.inherits(&Role::empty(role.config().clone())));
    }

    #[test]
    fn deep_inherited_roles_keep_discovery_order() {
        let cfg = config(json!({
            "roles": {
                "owner": { "roles": ["manager", "auditor"] },
                "manager": { "roles": ["clerk"] },
                "auditor": [],
                "clerk": []
            }
        }));
        let role = Role::named(cfg, "owner");

        let names: Vec<String> = role.inherited_roles(true).into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["manager", "auditor", "clerk"]);
        assert_eq!(role.inherited_roles(false)[1].1.name(), Some("auditor"));
    }

    #[test]
    fn separator_changes_apply_to_the_next_check() {
        let provider = Arc::new(InMemoryRoleConfig::new(PermissionsConfig::default().with_role(
            "clerk",
            RoleRecord::from_value(&json!({ "permissions": { "items": ["sell"] } })),
        )));
        let role = Role::named(provider.clone(), "clerk");

        assert!(role.has_permission("items:sell"));
        provider.set_permission_separator(".");
        assert!(!role.has_permission("items:sell"));
        assert!(role.has_permission("items.sell"));
    }

    #[test]
    fn construction_reads_the_provider_once() {
        let provider = Arc::new(CountingConfig {
            inner: PermissionsConfig::default()
                .with_role("A", RoleRecord::default().with_parents(["B"]))
                .with_role("B", RoleRecord::new(PermissionSpec::Wildcard)),
            reads: AtomicUsize::new(0),
            lent: AtomicUsize::new(0),
        });

        let role = Role::named(provider.clone(), "A");
        assert_eq!(provider.reads.load(Ordering::SeqCst), 1);

        assert!(role.has_permission("x"));
        assert_eq!(role.deep_inherited_role_names(), ["B"]);
    }

    #[test]
    fn inherited_checks_borrow_permissions_instead_of_records() {
        let provider = Arc::new(CountingConfig {
            inner: PermissionsConfig::default()
                .with_role("A", RoleRecord::default().with_parents(["B", "C"]))
                .with_role("B", RoleRecord::from_value(&json!({ "permissions": ["read"] })))
                .with_role("C", RoleRecord::from_value(&json!({ "permissions": ["write"] }))),
            reads: AtomicUsize::new(0),
            lent: AtomicUsize::new(0),
        });
        let role = Role::named(provider.clone(), "A");
        assert_eq!(role.deep_inherited_role_names(), ["B", "C"]);
        let before = provider.reads.load(Ordering::SeqCst);

        assert!(role.has_permission("write"));
        assert!(!role.has_permission("delete"));
        assert_eq!(provider.reads.load(Ordering::SeqCst), before);
        assert_eq!(provider.lent.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn equality_and_serialization_use_the_name() {
        let cfg = store_roles();

        assert_eq!(Role::named(cfg.clone(), "storeClerk"), Role::named(cfg.clone(), "storeClerk"));
        assert_ne!(Role::named(cfg.clone(), "storeClerk"), Role::empty(cfg.clone()));

        assert_eq!(serde_json::to_value(Role::named(cfg.clone(), "storeClerk")).unwrap(), json!("storeClerk"));
        assert_eq!(serde_json::to_value(Role::empty(cfg.clone())).unwrap(), json!(null));

        assert_eq!(Role::from_attribute(cfg.clone(), None).to_attribute(), None);
        assert_eq!(
            Role::from_attribute(cfg, Some("guest")).to_attribute().as_deref(),
            Some("guest")
        );
    }
}
