//! Normalized permission specifications.
//!
//! Role configuration carries permissions in a loose, mixed shape: a single
//! level may hold bare strings (leaf grants) next to `segment -> nested`
//! entries (namespace grants), and any level may be the wildcard `"*"`.
//! [`PermissionSpec`] is that shape normalized once, at load time, so matching
//! never has to re-inspect raw JSON.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

/// The wildcard marker. Grants everything that reaches it.
pub const WILDCARD: &str = "*";

/// Permission specification granted to a role (or to a namespace inside one).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionSpec {
    /// Matches any permission reaching this point, whatever segments remain.
    Wildcard,
    /// Leaf grants and namespace grants at one level of the tree.
    Tree(PermissionTree),
}

impl Default for PermissionSpec {
    fn default() -> Self {
        Self::Tree(PermissionTree::default())
    }
}

impl PermissionSpec {
    /// The specification that grants nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }

    /// Normalize a root-level raw permission value.
    ///
    /// At the root a bare string other than `"*"` is a single leaf grant.
    pub fn from_value(value: &Value) -> Self {
        normalize(value, true)
    }
}

impl From<PermissionTree> for PermissionSpec {
    fn from(tree: PermissionTree) -> Self {
        Self::Tree(tree)
    }
}

impl<'de> Deserialize<'de> for PermissionSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

/// One level of a permission tree: leaf segments plus nested namespaces.
///
/// A segment may be both a leaf and a namespace key; the two never shadow each
/// other because a permission's last segment is checked against the leaves and
/// every earlier segment against the namespaces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionTree {
    leaves: BTreeSet<String>,
    namespaces: BTreeMap<String, PermissionSpec>,
}

impl PermissionTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_leaf(mut self, segment: impl Into<String>) -> Self {
        self.leaves.insert(segment.into());
        self
    }

    pub fn with_namespace(mut self, segment: impl Into<String>, spec: impl Into<PermissionSpec>) -> Self {
        self.namespaces.insert(segment.into(), spec.into());
        self
    }

    pub fn has_leaf(&self, segment: &str) -> bool {
        self.leaves.contains(segment)
    }

    pub fn namespace(&self, segment: &str) -> Option<&PermissionSpec> {
        self.namespaces.get(segment)
    }

    pub fn leaves(&self) -> impl Iterator<Item = &str> {
        self.leaves.iter().map(String::as_str)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = (&str, &PermissionSpec)> {
        self.namespaces.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty() && self.namespaces.is_empty()
    }

    fn absorb_item(&mut self, item: &Value) {
        match item {
            Value::String(segment) => {
                self.leaves.insert(segment.clone());
            }
            Value::Object(entries) => {
                for (key, nested) in entries {
                    self.absorb_entry(key, nested);
                }
            }
            other => warn!(entry = %other, "ignoring unsupported permission list entry"),
        }
    }

    fn absorb_entry(&mut self, key: &str, value: &Value) {
        // A mixed list/map collection serialized to JSON keeps its list part
        // under list-index keys. A nested non-wildcard string is an empty
        // namespace, so only the leaf is kept.
        if let Value::String(segment) = value {
            if segment != WILDCARD && is_list_index(key) {
                self.leaves.insert(segment.clone());
                return;
            }
        }
        self.namespaces.insert(key.to_string(), normalize(value, false));
    }
}

/// `0`, `1`, `42`; not `+1`, `007` or `-3`.
fn is_list_index(key: &str) -> bool {
    match key.as_bytes() {
        [b'0'] => true,
        [b'1'..=b'9', rest @ ..] => rest.iter().all(u8::is_ascii_digit),
        _ => false,
    }
}

fn normalize(value: &Value, root: bool) -> PermissionSpec {
    match value {
        Value::String(s) if s == WILDCARD => PermissionSpec::Wildcard,
        Value::String(s) if root => PermissionTree::new().with_leaf(s.clone()).into(),
        Value::String(s) => {
            warn!(value = %s, "nested permission strings other than \"*\" grant nothing");
            PermissionSpec::empty()
        }
        Value::Array(items) => {
            let mut tree = PermissionTree::new();
            for item in items {
                tree.absorb_item(item);
            }
            tree.into()
        }
        Value::Object(entries) => {
            let mut tree = PermissionTree::new();
            for (key, nested) in entries {
                tree.absorb_entry(key, nested);
            }
            tree.into()
        }
        Value::Null => PermissionSpec::empty(),
        other => {
            warn!(value = %other, "ignoring non-collection permission value");
            PermissionSpec::empty()
        }
    }
}
