//! Opaque foreign-object handles.
//!
//! A [`Handle`] is a token for one reference the collaborating runtime layer
//! holds on a foreign object. The bridge never dereferences a handle; it only
//! passes handles back into the [`crate::vm::Vm`] trait, and releases the ones
//! it transiently acquired during marshalling. A released handle must never be
//! used again.

use std::fmt;

/// An opaque, lifetime-managed reference to a foreign-runtime object.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Handle(pub u64);

impl Handle {
    /// The null handle.
    pub const NULL: Handle = Handle(0);

    /// Whether this handle refers to nothing.
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Handle(null)")
        } else {
            write!(f, "Handle({:#x})", self.0)
        }
    }
}
