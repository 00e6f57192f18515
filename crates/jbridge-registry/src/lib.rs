//! Reflected type registry.
//!
//! This crate mirrors foreign classes into cached, identity-unique
//! [`ClassDescriptor`]s. A descriptor is built lazily on first reference by
//! reading the collaborator's reflection interface, registered before its
//! members are resolved (so self-referential classes terminate), and kept for
//! the life of the process until [`TypeRegistry::shutdown`] breaks its links
//! and releases its class handle.
//!
//! Lookup rules follow the foreign runtime, not common object-model habit:
//! instance members are visible through the superclass chain, static members
//! are visible only on the exact declaring class, and anonymous/local nested
//! classes are not addressable by name.

mod descriptor;
mod member;
mod modifiers;
mod registry;

pub use descriptor::{ClassDescriptor, ClassKind, ClassLinks, ClassMembers, Nesting};
pub use member::{FieldDescriptor, MethodDescriptor, MethodGroup};
pub use modifiers::{Modifiers, Protection};
pub use registry::TypeRegistry;
