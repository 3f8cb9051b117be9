//! Actor capability facade.
//!
//! An actor (a user, a service account) holds one role plus a set of
//! *temporary* permissions granted in memory only. Temporary permissions are
//! never part of the persisted [`ActorRecord`] and never reach the role or
//! the configuration provider.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use rolegate_core::{ActorId, Entity, SharedRoleConfig};

use crate::Role;

/// Permission checks for anything holding a role.
pub trait ActorPermissions {
    fn role(&self) -> &Role;

    fn temporary_permissions(&self) -> &HashSet<String>;

    /// Granted by the role, or by a temporary permission.
    fn has_permission(&self, permission: &str) -> bool {
        self.role().has_permission(permission) || self.temporary_permissions().contains(permission)
    }

    /// Stops at the first missing permission. Vacuously true when empty.
    fn has_all_permissions<I>(&self, permissions: I) -> bool
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        Self: Sized,
    {
        permissions
            .into_iter()
            .all(|permission| self.has_permission(permission.as_ref()))
    }

    /// Stops at the first granted permission. False when empty.
    fn has_any_permission<I>(&self, permissions: I) -> bool
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        Self: Sized,
    {
        permissions
            .into_iter()
            .any(|permission| self.has_permission(permission.as_ref()))
    }
}

/// Persisted shape of an actor: identity and role name only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorRecord {
    pub id: ActorId,
    pub role: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Actor {
    id: ActorId,
    role: Role,
    temporary_permissions: HashSet<String>,
}

impl Actor {
    pub fn new(id: ActorId, role: Role) -> Self {
        Self {
            id,
            role,
            temporary_permissions: HashSet::new(),
        }
    }

    /// Restore an actor from storage. Starts without temporary permissions.
    pub fn from_record(config: SharedRoleConfig, record: &ActorRecord) -> Self {
        Self::new(record.id, Role::from_attribute(config, record.role.as_deref()))
    }

    pub fn to_record(&self) -> ActorRecord {
        ActorRecord {
            id: self.id,
            role: self.role.to_attribute(),
        }
    }

    /// Replace the role; `None` leaves the actor with the empty role.
    pub fn set_role(&mut self, role: Option<Role>) {
        self.role = role.unwrap_or_else(|| Role::empty(self.role.config().clone()));
    }

    pub fn assign_temporary_permission(&mut self, permission: impl Into<String>) {
        let permission = permission.into();
        debug!(actor = %self.id, permission = %permission, "assigned temporary permission");
        self.temporary_permissions.insert(permission);
    }

    /// Returns whether the permission was present.
    pub fn remove_temporary_permission(&mut self, permission: &str) -> bool {
        self.temporary_permissions.remove(permission)
    }

    pub fn clear_temporary_permissions(&mut self) {
        self.temporary_permissions.clear();
    }
}

impl Entity for Actor {
    type Id = ActorId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl ActorPermissions for Actor {
    fn role(&self) -> &Role {
        &self.role
    }

    fn temporary_permissions(&self) -> &HashSet<String> {
        &self.temporary_permissions
    }
}
