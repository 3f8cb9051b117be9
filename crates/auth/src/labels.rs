//! Human-readable role attributes.
//!
//! Labels and descriptions are stored as plain strings or per-locale maps and
//! resolved against the provider's current locale, its fallback, then `"en"`.

use core::str::FromStr;

use thiserror::Error;

use rolegate_core::{LocaleSettings, RoleConfigProvider};

use crate::Role;

/// Readable attributes of a role, addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleAttribute {
    Name,
    Label,
    Description,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role attribute '{0}'")]
pub struct UnknownAttribute(pub String);

impl FromStr for RoleAttribute {
    type Err = UnknownAttribute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "label" => Ok(Self::Label),
            "description" => Ok(Self::Description),
            other => Err(UnknownAttribute(other.to_string())),
        }
    }
}

impl Role {
    /// Label in the provider's current locale.
    ///
    /// Falls back to the role name; the empty role has no label.
    pub fn label(&self) -> Option<String> {
        self.label_in(&self.config().locale())
    }

    pub fn label_in(&self, locales: &LocaleSettings) -> Option<String> {
        let name = self.name()?;
        let label = self
            .label
            .as_ref()
            .and_then(|text| text.resolve(locales))
            .unwrap_or(name);
        Some(label.to_string())
    }

    /// Description in the provider's current locale, if one resolves.
    pub fn description(&self) -> Option<String> {
        self.description_in(&self.config().locale())
    }

    pub fn description_in(&self, locales: &LocaleSettings) -> Option<String> {
        self.name()?;
        self.description
            .as_ref()
            .and_then(|text| text.resolve(locales))
            .map(str::to_string)
    }

    pub fn get(&self, attribute: RoleAttribute) -> Option<String> {
        match attribute {
            RoleAttribute::Name => self.name().map(str::to_string),
            RoleAttribute::Label => self.label(),
            RoleAttribute::Description => self.description(),
        }
    }

    /// Look an attribute up by name; unknown names resolve to `None`.
    pub fn attribute(&self, name: &str) -> Option<String> {
        name.parse().ok().and_then(|attribute| self.get(attribute))
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label().as_deref().unwrap_or(""))
    }
}
