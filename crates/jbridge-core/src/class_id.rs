//! Deterministic hash-based class identity.
//!
//! This module provides [`ClassId`], a 64-bit hash that uniquely identifies a
//! foreign class by its qualified name. Unlike sequential ids, hashes are
//! computed deterministically from names, enabling:
//!
//! - Forward references (the id exists before the class is resolved)
//! - No registration order dependencies
//! - Single map lookups (no secondary name-to-id maps)
//!
//! Identity follows the foreign runtime's rule: one class name, one class.
//! Array classes are named after their component (`int[]`, `java.lang.String[]`),
//! so an array's id is derivable from its component name with [`array_name_of`].

use std::fmt;

use xxhash_rust::xxh64::xxh64;

/// Domain-mixing constants for hash computation.
///
/// Class ids and member-group keys live in different hash domains so a class
/// and a method sharing a name can never collide.
pub mod hash_constants {
    /// Domain marker for class identity hashes.
    pub const CLASS: u64 = 0x6a2e914dc07f53b1;

    /// Domain marker for member-group hashes.
    pub const MEMBER: u64 = 0x3d58cf21b96a0e47;
}

/// A deterministic 64-bit hash identifying one foreign class.
///
/// Computed from the qualified class name; the same name always produces the
/// same id, so ids can be computed for parameter and field types before those
/// classes have ever been resolved.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ClassId(pub u64);

impl ClassId {
    /// Empty/invalid id constant.
    pub const EMPTY: ClassId = ClassId(0);

    /// Create a class id from a qualified class name.
    ///
    /// ```
    /// use jbridge_core::ClassId;
    ///
    /// let a = ClassId::from_name("java.lang.String");
    /// let b = ClassId::from_name("java.lang.String");
    /// assert_eq!(a, b);
    /// assert_ne!(a, ClassId::from_name("java.lang.Object"));
    /// ```
    pub fn from_name(name: &str) -> Self {
        ClassId(xxh64(name.as_bytes(), hash_constants::CLASS))
    }

    /// Create a member-group id from a declaring class and member name.
    pub fn from_member(class: ClassId, name: &str) -> Self {
        ClassId(xxh64(name.as_bytes(), hash_constants::MEMBER ^ class.0))
    }

    /// Whether this is the empty id.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({:#018x})", self.0)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Name of the array class whose component is `component`.
pub fn array_name_of(component: &str) -> String {
    format!("{component}[]")
}
