//! Permission matching.
//!
//! A permission such as `store:manage:items` is matched against a
//! [`PermissionSpec`] by descending one segment at a time: every segment but
//! the last is looked up as a namespace key, the last one must be a leaf of the
//! level it lands on. A wildcard reached on the way grants whatever remains.

use rolegate_core::PermissionSpec;

/// Split `permission` on `separator`, dropping empty segments.
///
/// Never fails. An empty separator leaves the permission as one opaque
/// segment. `""` and separator-only strings yield no segments.
pub fn permission_segments<'a>(permission: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return if permission.is_empty() {
            Vec::new()
        } else {
            vec![permission]
        };
    }

    permission
        .split(separator)
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Whether `permission` is covered by `spec`.
pub fn matches(spec: &PermissionSpec, permission: &str, separator: &str) -> bool {
    matches_segments(spec, &permission_segments(permission, separator))
}

/// [`matches`] over an already split permission.
///
/// An empty segment list never matches, not even a wildcard.
pub fn matches_segments(spec: &PermissionSpec, segments: &[&str]) -> bool {
    let tree = match spec {
        PermissionSpec::Wildcard => return !segments.is_empty(),
        PermissionSpec::Tree(tree) => tree,
    };

    match segments {
        [] => false,
        [last] => tree.has_leaf(last),
        [head, rest @ ..] => tree
            .namespace(head)
            .is_some_and(|nested| matches_segments(nested, rest)),
    }
}
