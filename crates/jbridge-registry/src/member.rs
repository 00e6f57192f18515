//! Member descriptors: fields, methods, and name-grouped overload sets.

use std::sync::Arc;

use jbridge_core::ClassId;
use jbridge_core::vm::{FieldId, MethodId};

use crate::Modifiers;

/// Immutable metadata for one foreign field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,
    /// Access flags.
    pub modifiers: Modifiers,
    /// Id of the field's declared type.
    pub ty: ClassId,
    /// Opaque identity used for reads and writes.
    pub id: FieldId,
    /// Id of the declaring class.
    pub declared_in: ClassId,
}

/// Immutable metadata for one foreign method or constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDescriptor {
    /// Method name; constructors use `<init>`.
    pub name: String,
    /// Access flags.
    pub modifiers: Modifiers,
    /// Ids of the declared parameter types, in order. For a variadic method
    /// the last entry is the array type of the tail.
    pub params: Vec<ClassId>,
    /// Id of the return type; `None` for constructors.
    pub ret: Option<ClassId>,
    /// Whether the last parameter is a variable-length tail.
    pub variadic: bool,
    /// Opaque identity used for invocation.
    pub id: MethodId,
    /// Id of the declaring class.
    pub declared_in: ClassId,
}

impl MethodDescriptor {
    /// Declared parameter count (the variadic tail counts as one).
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Whether this method is static.
    pub fn is_static(&self) -> bool {
        self.modifiers.is_static()
    }
}

/// All overloads sharing one name on one class.
///
/// Cheap to clone: overloads are shared `Arc`s. Inherited lookup merges
/// superclass groups into one, closest declaration first.
#[derive(Debug, Clone, Default)]
pub struct MethodGroup {
    /// Shared member name.
    pub name: String,
    /// The overloads, in declaration-then-inheritance order.
    pub overloads: Vec<Arc<MethodDescriptor>>,
}

impl MethodGroup {
    /// Create an empty group for `name`.
    pub fn new(name: impl Into<String>) -> Self {
        MethodGroup {
            name: name.into(),
            overloads: Vec::new(),
        }
    }

    /// Number of overloads.
    pub fn len(&self) -> usize {
        self.overloads.len()
    }

    /// Whether the group has no overloads.
    pub fn is_empty(&self) -> bool {
        self.overloads.is_empty()
    }

    /// Iterate the overloads.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<MethodDescriptor>> {
        self.overloads.iter()
    }

    /// Add an overload unless an identical parameter list is already present
    /// (a subclass override shadows the superclass declaration).
    pub fn push_unshadowed(&mut self, method: Arc<MethodDescriptor>) {
        let shadowed = self.overloads.iter().any(|m| m.params == method.params);
        if !shadowed {
            self.overloads.push(method);
        }
    }

    /// Explicit overload selection: the single signature whose parameter list
    /// matches `params` exactly. Bypasses ranked resolution entirely, so a
    /// caller can break an ambiguous tie by naming the signature.
    pub fn find_exact(&self, params: &[ClassId]) -> Option<Arc<MethodDescriptor>> {
        self.overloads
            .iter()
            .find(|m| m.params.as_slice() == params)
            .cloned()
    }
}
