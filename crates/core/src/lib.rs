//! `rolegate-core`: role configuration boundary.
//!
//! This crate owns the shapes the permission engine reads: role records,
//! normalized permission specifications, localized text and the provider
//! trait. It never writes configuration back.

pub mod entity;
pub mod error;
pub mod id;
pub mod permission_spec;
pub mod provider;
pub mod record;

pub use entity::Entity;
pub use error::{ConfigError, ConfigResult};
pub use id::ActorId;
pub use permission_spec::{PermissionSpec, PermissionTree, WILDCARD};
pub use provider::{
    CONFIG_PATH_ENV, DEFAULT_SEPARATOR, InMemoryRoleConfig, PermissionsConfig, RoleConfigProvider,
    SharedRoleConfig,
};
pub use record::{DEFAULT_LOCALE, LocaleSettings, LocalizedText, RoleRecord};
