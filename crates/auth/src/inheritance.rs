//! Role inheritance resolution.
//!
//! Role graphs come from configuration and may contain cycles (a role listing
//! itself, or `A -> B -> A`). The traversal never trusts the graph to be
//! acyclic: one visited set is shared across the whole walk and a name is
//! expanded at most once.

use std::collections::HashSet;

use tracing::debug;

/// Transitive, deduplicated closure of the roles `role_name` inherits from.
///
/// Names are returned in order of first discovery: all direct parents of a
/// role, then each of those expanded depth-first. `role_name` itself is never
/// part of the result, even when a cycle leads back to it. Unknown parents are
/// expected to yield no parents of their own.
pub fn deep_inherited_role_names<F>(role_name: &str, mut fetch_direct_parents: F) -> Vec<String>
where
    F: FnMut(&str) -> Vec<String>,
{
    let mut visited: HashSet<String> = HashSet::from([role_name.to_string()]);
    let mut inherited: Vec<String> = Vec::new();
    let mut pending: Vec<String> = vec![role_name.to_string()];

    while let Some(current) = pending.pop() {
        let discovered: Vec<String> = fetch_direct_parents(&current)
            .into_iter()
            .filter(|parent| {
                let fresh = visited.insert(parent.clone());
                if !fresh {
                    debug!(role = %current, parent = %parent, "skipping already visited role");
                }
                fresh
            })
            .collect();

        inherited.extend(discovered.iter().cloned());
        // Reversed so the first discovered parent is expanded first.
        pending.extend(discovered.into_iter().rev());
    }

    inherited
}
