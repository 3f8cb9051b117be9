//! Role configuration providers.
//!
//! The permission engine only ever *reads* role configuration. Providers must
//! answer every lookup; an unknown role is the empty [`RoleRecord`].

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::permission_spec::PermissionSpec;
use crate::record::{DEFAULT_LOCALE, LocaleSettings, RoleRecord};

/// Separator used between permission segments unless configured otherwise.
pub const DEFAULT_SEPARATOR: &str = ":";

/// Environment variable naming the role configuration file.
pub const CONFIG_PATH_ENV: &str = "ROLEGATE_CONFIG";

/// Read-only source of role configuration.
pub trait RoleConfigProvider: Send + Sync {
    /// Configuration of `name`; the empty record for unknown roles.
    fn role_record(&self, name: &str) -> RoleRecord;

    /// Directly assigned parents of `name`.
    fn inherited_role_names(&self, name: &str) -> Vec<String> {
        self.role_record(name).parents
    }

    /// Run `check` against the permissions of `name` without handing out the
    /// whole record. Providers holding records in memory should lend them.
    fn check_role_permissions(
        &self,
        name: &str,
        check: &mut dyn FnMut(&PermissionSpec) -> bool,
    ) -> bool {
        check(&self.role_record(name).permissions)
    }

    /// Read on every match, so changes apply to the next check.
    fn permission_separator(&self) -> String {
        DEFAULT_SEPARATOR.to_string()
    }

    fn locale(&self) -> LocaleSettings {
        LocaleSettings::default()
    }
}

/// Shared handle to a provider, as held by roles.
pub type SharedRoleConfig = Arc<dyn RoleConfigProvider>;

impl<P> RoleConfigProvider for Arc<P>
where
    P: RoleConfigProvider + ?Sized,
{
    fn role_record(&self, name: &str) -> RoleRecord {
        (**self).role_record(name)
    }

    fn inherited_role_names(&self, name: &str) -> Vec<String> {
        (**self).inherited_role_names(name)
    }

    fn check_role_permissions(
        &self,
        name: &str,
        check: &mut dyn FnMut(&PermissionSpec) -> bool,
    ) -> bool {
        (**self).check_role_permissions(name, check)
    }

    fn permission_separator(&self) -> String {
        (**self).permission_separator()
    }

    fn locale(&self) -> LocaleSettings {
        (**self).locale()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration document
// ─────────────────────────────────────────────────────────────────────────────

/// The whole permissions configuration document.
#[derive(Debug, Clone, Deserialize)]
pub struct PermissionsConfig {
    #[serde(default = "default_separator", alias = "permissionSeparator")]
    pub permission_separator: String,

    #[serde(default = "default_locale")]
    pub locale: String,

    #[serde(default = "default_locale", alias = "fallbackLocale")]
    pub fallback_locale: String,

    #[serde(default, deserialize_with = "role_map")]
    pub roles: HashMap<String, RoleRecord>,
}

impl Default for PermissionsConfig {
    fn default() -> Self {
        Self {
            permission_separator: default_separator(),
            locale: default_locale(),
            fallback_locale: default_locale(),
            roles: HashMap::new(),
        }
    }
}

impl PermissionsConfig {
    pub fn with_role(mut self, name: impl Into<String>, record: RoleRecord) -> Self {
        self.roles.insert(name.into(), record);
        self
    }

    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        info!(
            roles = config.roles.len(),
            separator = %config.permission_separator,
            "loaded role configuration"
        );
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Self::from_json_str(&json)
    }

    /// Load from the file named by `ROLEGATE_CONFIG`.
    pub fn from_env() -> ConfigResult<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).map_err(|_| ConfigError::MissingEnv(CONFIG_PATH_ENV))?;
        Self::from_path(path)
    }

    pub fn locale_settings(&self) -> LocaleSettings {
        LocaleSettings::new(self.locale.clone(), self.fallback_locale.clone())
    }
}

impl RoleConfigProvider for PermissionsConfig {
    fn role_record(&self, name: &str) -> RoleRecord {
        self.roles.get(name).cloned().unwrap_or_default()
    }

    fn inherited_role_names(&self, name: &str) -> Vec<String> {
        self.roles
            .get(name)
            .map(|record| record.parents.clone())
            .unwrap_or_default()
    }

    fn check_role_permissions(
        &self,
        name: &str,
        check: &mut dyn FnMut(&PermissionSpec) -> bool,
    ) -> bool {
        match self.roles.get(name) {
            Some(record) => check(&record.permissions),
            None => check(&PermissionSpec::empty()),
        }
    }

    fn permission_separator(&self) -> String {
        self.permission_separator.clone()
    }

    fn locale(&self) -> LocaleSettings {
        self.locale_settings()
    }
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

fn role_map<'de, D>(deserializer: D) -> Result<HashMap<String, RoleRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(entries) => entries
            .iter()
            .map(|(name, entry)| (name.clone(), RoleRecord::from_value(entry)))
            .collect(),
        Value::Null => HashMap::new(),
        Value::Array(items) if items.is_empty() => HashMap::new(),
        other => {
            warn!(roles = %other, "role list is not an object; no roles are configured");
            HashMap::new()
        }
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory provider
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory provider whose settings can be changed at runtime.
///
/// Changes apply to the next lookup; roles already constructed keep the
/// records they read at construction time.
#[derive(Debug, Default)]
pub struct InMemoryRoleConfig {
    inner: RwLock<PermissionsConfig>,
}

impl InMemoryRoleConfig {
    pub fn new(config: PermissionsConfig) -> Self {
        Self {
            inner: RwLock::new(config),
        }
    }

    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        PermissionsConfig::from_json_str(json).map(Self::new)
    }

    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        PermissionsConfig::from_path(path).map(Self::new)
    }

    pub fn from_env() -> ConfigResult<Self> {
        PermissionsConfig::from_env().map(Self::new)
    }

    pub fn set_permission_separator(&self, separator: impl Into<String>) {
        self.write().permission_separator = separator.into();
    }

    pub fn set_locale(&self, locale: impl Into<String>) {
        self.write().locale = locale.into();
    }

    pub fn set_fallback_locale(&self, locale: impl Into<String>) {
        self.write().fallback_locale = locale.into();
    }

    pub fn insert_role(&self, name: impl Into<String>, record: RoleRecord) {
        self.write().roles.insert(name.into(), record);
    }

    /// A copy of the current configuration.
    pub fn snapshot(&self) -> PermissionsConfig {
        self.read().clone()
    }

    // Lookups never fail: a poisoned lock still holds a usable configuration.
    fn read(&self) -> RwLockReadGuard<'_, PermissionsConfig> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, PermissionsConfig> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<PermissionsConfig> for InMemoryRoleConfig {
    fn from(config: PermissionsConfig) -> Self {
        Self::new(config)
    }
}

impl RoleConfigProvider for InMemoryRoleConfig {
    fn role_record(&self, name: &str) -> RoleRecord {
        self.read().role_record(name)
    }

    fn inherited_role_names(&self, name: &str) -> Vec<String> {
        self.read().inherited_role_names(name)
    }

    fn check_role_permissions(
        &self,
        name: &str,
        check: &mut dyn FnMut(&PermissionSpec) -> bool,
    ) -> bool {
        self.read().check_role_permissions(name, check)
    }

    fn permission_separator(&self) -> String {
        self.read().permission_separator.clone()
    }

    fn locale(&self) -> LocaleSettings {
        self.read().locale_settings()
    }
}
