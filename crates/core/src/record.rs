//! Raw role configuration records.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::permission_spec::PermissionSpec;

/// Locale used when neither the current nor the fallback locale has a value.
pub const DEFAULT_LOCALE: &str = "en";

/// Configuration of a single role, as read from the provider.
///
/// Every field has a defensive default, so an unknown role is simply the
/// default record: no permissions, no parents, no label, no description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleRecord {
    pub permissions: PermissionSpec,
    /// Directly assigned parent roles, deduplicated, in configuration order.
    pub parents: Vec<String>,
    pub label: Option<LocalizedText>,
    pub description: Option<LocalizedText>,
}

impl RoleRecord {
    pub fn new(permissions: PermissionSpec) -> Self {
        Self {
            permissions,
            ..Self::default()
        }
    }

    pub fn with_parents<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parents = dedup(parents.into_iter().map(Into::into));
        self
    }

    pub fn with_label(mut self, label: LocalizedText) -> Self {
        self.label = Some(label);
        self
    }

    pub fn with_description(mut self, description: LocalizedText) -> Self {
        self.description = Some(description);
        self
    }

    /// Build a record from a raw configuration entry.
    ///
    /// `permissions` falls back to `actions`, and `roles` falls back to
    /// `inherits`. Anything that is not an object yields the empty record.
    pub fn from_value(value: &Value) -> Self {
        let Value::Object(entry) = value else {
            if !is_blank(value) {
                warn!(entry = %value, "role configuration entry is not an object; treating it as empty");
            }
            return Self::default();
        };

        Self {
            permissions: first_present(entry, "permissions", "actions")
                .map(PermissionSpec::from_value)
                .unwrap_or_default(),
            parents: first_present(entry, "roles", "inherits")
                .map(parent_names)
                .unwrap_or_default(),
            label: entry.get("label").and_then(LocalizedText::from_value),
            description: entry.get("description").and_then(LocalizedText::from_value),
        }
    }
}

impl<'de> Deserialize<'de> for RoleRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

/// A display string that is either plain or keyed by locale code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocalizedText {
    Plain(String),
    Localized(BTreeMap<String, String>),
}

impl LocalizedText {
    pub fn localized<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Localized(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Lenient conversion from raw configuration; unusable shapes are dropped.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Plain(s.clone())),
            Value::Object(entries) => Some(Self::Localized(
                entries
                    .iter()
                    .filter_map(|(locale, text)| Some((locale.clone(), text.as_str()?.to_string())))
                    .collect(),
            )),
            _ => None,
        }
    }

    /// Resolve against the current locale, then the fallback, then `"en"`.
    pub fn resolve(&self, locales: &LocaleSettings) -> Option<&str> {
        match self {
            Self::Plain(text) => Some(text.as_str()),
            Self::Localized(by_locale) => [
                locales.locale.as_str(),
                locales.fallback_locale.as_str(),
                DEFAULT_LOCALE,
            ]
            .into_iter()
            .find_map(|locale| by_locale.get(locale))
            .map(String::as_str),
        }
    }
}

/// Current and fallback locale used for label/description lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleSettings {
    pub locale: String,
    pub fallback_locale: String,
}

impl LocaleSettings {
    pub fn new(locale: impl Into<String>, fallback_locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            fallback_locale: fallback_locale.into(),
        }
    }
}

impl Default for LocaleSettings {
    fn default() -> Self {
        Self::new(DEFAULT_LOCALE, DEFAULT_LOCALE)
    }
}

fn first_present<'a>(entry: &'a Map<String, Value>, key: &str, alias: &str) -> Option<&'a Value> {
    entry
        .get(key)
        .filter(|v| !v.is_null())
        .or_else(|| entry.get(alias))
}

fn parent_names(value: &Value) -> Vec<String> {
    match value {
        Value::String(name) => vec![name.clone()],
        Value::Array(names) => dedup(names.iter().filter_map(|name| match name {
            Value::String(name) => Some(name.clone()),
            other => {
                warn!(entry = %other, "ignoring non-string parent role name");
                None
            }
        })),
        _ => Vec::new(),
    }
}

fn dedup(names: impl Iterator<Item = String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for name in names {
        if !unique.contains(&name) {
            unique.push(name);
        }
    }
    unique
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
