//! `rolegate-auth`: role-based authorization over configured role graphs.
//!
//! This crate is intentionally decoupled from storage: role definitions come
//! from a [`rolegate_core::RoleConfigProvider`].

pub mod actor;
pub mod inheritance;
pub mod labels;
pub mod permissions;
pub mod roles;

pub use actor::{Actor, ActorPermissions, ActorRecord};
pub use inheritance::deep_inherited_role_names;
pub use labels::{RoleAttribute, UnknownAttribute};
pub use permissions::{matches, matches_segments, permission_segments};
pub use roles::Role;
