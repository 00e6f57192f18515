//! JVM access flags and the three-tier protection classification.

use bitflags::bitflags;

bitflags! {
    /// Raw JVM access-flag bits as reported by the reflection interface.
    ///
    /// The numeric values are the class-file constants, so provider
    /// implementations can pass modifier words through unchanged.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u32 {
        const PUBLIC       = 0x0001;
        const PRIVATE      = 0x0002;
        const PROTECTED    = 0x0004;
        const STATIC       = 0x0008;
        const FINAL        = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const VOLATILE     = 0x0040;
        /// On methods this bit means a variable-length parameter tail.
        const VARARGS      = 0x0080;
        const NATIVE       = 0x0100;
        const INTERFACE    = 0x0200;
        const ABSTRACT     = 0x0400;
        const SYNTHETIC    = 0x1000;
        const ENUM         = 0x4000;
    }
}

impl Modifiers {
    /// Whether the static bit is set.
    pub fn is_static(self) -> bool {
        self.contains(Modifiers::STATIC)
    }

    /// Whether the final bit is set.
    pub fn is_final(self) -> bool {
        self.contains(Modifiers::FINAL)
    }

    /// Whether the abstract bit is set.
    pub fn is_abstract(self) -> bool {
        self.contains(Modifiers::ABSTRACT)
    }

    /// The three-tier protection classification of these modifiers.
    pub fn protection(self) -> Protection {
        if self.contains(Modifiers::PUBLIC) {
            Protection::Public
        } else if self.contains(Modifiers::PROTECTED) {
            Protection::Protected
        } else {
            Protection::Private
        }
    }
}

/// Coarse visibility tier derived from the access flags.
///
/// The attribute-naming layer above the bridge mangles non-public member
/// names with a leading-underscore prefix to keep them out of the way;
/// package-private and private collapse into one tier because neither is
/// addressable across the bridge boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protection {
    Public,
    Protected,
    /// Private or package-private.
    Private,
}

impl Protection {
    /// The name-mangling prefix the attribute-naming layer applies.
    pub fn prefix(self) -> &'static str {
        match self {
            Protection::Public => "",
            Protection::Protected => "_",
            Protection::Private => "__",
        }
    }
}
