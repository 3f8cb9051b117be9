//! Entity trait: identity that survives state changes.

/// Something identified by its id rather than by its attributes.
///
/// Actors are entities: granting or revoking a transient permission changes
/// their state, never their identity.
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}
