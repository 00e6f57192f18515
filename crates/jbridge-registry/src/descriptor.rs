//! The cached metadata mirror of one foreign class.
//!
//! Exactly one [`ClassDescriptor`] exists per distinct class identity; the
//! registry enforces that. Descriptor-to-descriptor links are [`ClassId`]s
//! resolved back through the registry rather than owned pointers, and the
//! mutable link/member tables sit behind locks so construction can run in two
//! phases (register the shell, then install members) and teardown can break
//! every link before the runtime goes away.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use jbridge_core::{ClassId, Handle, PrimitiveKind};

use crate::member::{FieldDescriptor, MethodGroup};
use crate::modifiers::{Modifiers, Protection};

/// Structural kind of a mirrored class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    /// One of the nine primitive pseudo-classes.
    Primitive(PrimitiveKind),
    Interface,
    Array,
    Enum,
    Ordinary,
}

/// How a class nests in its enclosing context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nesting {
    TopLevel,
    Member,
    Local,
    Anonymous,
}

/// Links from one descriptor to related classes, broken at teardown.
#[derive(Debug, Clone, Default)]
pub struct ClassLinks {
    /// Superclass id; `None` for interfaces, primitives, and the root type.
    pub superclass: Option<ClassId>,
    /// Directly implemented interfaces.
    pub interfaces: Vec<ClassId>,
    /// Component type, for array classes.
    pub component: Option<ClassId>,
    /// Declaring class, for nested classes.
    pub declaring: Option<ClassId>,
    /// Addressable member classes (anonymous/local classes excluded).
    pub nested: Vec<ClassId>,
}

/// Declared members of one descriptor, split the way lookup needs them.
#[derive(Debug, Clone, Default)]
pub struct ClassMembers {
    /// Declared instance fields by name.
    pub fields: FxHashMap<String, Arc<FieldDescriptor>>,
    /// Declared static fields by name.
    pub static_fields: FxHashMap<String, Arc<FieldDescriptor>>,
    /// Declared instance methods grouped by name.
    pub methods: FxHashMap<String, MethodGroup>,
    /// Declared static methods grouped by name.
    pub static_methods: FxHashMap<String, MethodGroup>,
    /// Declared constructors.
    pub constructors: MethodGroup,
}

/// Cached metadata mirror of one foreign class.
#[derive(Debug)]
pub struct ClassDescriptor {
    id: ClassId,
    name: String,
    simple_name: String,
    kind: ClassKind,
    modifiers: Modifiers,
    nesting: Nesting,
    handle: Handle,
    links: RwLock<ClassLinks>,
    members: RwLock<ClassMembers>,
}

impl ClassDescriptor {
    /// Create the descriptor shell. Members and links are installed after the
    /// shell has been registered, so self-referential classes terminate.
    pub(crate) fn shell(
        name: String,
        kind: ClassKind,
        modifiers: Modifiers,
        nesting: Nesting,
        handle: Handle,
    ) -> Self {
        let simple_name = simple_name_of(&name);
        ClassDescriptor {
            id: ClassId::from_name(&name),
            name,
            simple_name,
            kind,
            modifiers,
            nesting,
            handle,
            links: RwLock::new(ClassLinks::default()),
            members: RwLock::new(ClassMembers::default()),
        }
    }

    pub(crate) fn install_links(&self, links: ClassLinks) {
        *self.links.write() = links;
    }

    pub(crate) fn install_members(&self, members: ClassMembers) {
        *self.members.write() = members;
    }

    /// Break every outgoing link and drop all members. Called once by the
    /// registry during teardown, before the class handle is released.
    pub(crate) fn dissolve(&self) {
        *self.links.write() = ClassLinks::default();
        *self.members.write() = ClassMembers::default();
    }

    /// Identity of this class.
    pub fn id(&self) -> ClassId {
        self.id
    }

    /// Qualified class name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Simple (unqualified) class name.
    pub fn simple_name(&self) -> &str {
        &self.simple_name
    }

    /// Structural kind.
    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    /// Access flags.
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Three-tier protection classification.
    pub fn protection(&self) -> Protection {
        self.modifiers.protection()
    }

    /// Nesting mode.
    pub fn nesting(&self) -> Nesting {
        self.nesting
    }

    /// Handle on the foreign class object; owned by the registry.
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Primitive kind, if this is a primitive pseudo-class.
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self.kind {
            ClassKind::Primitive(k) => Some(k),
            _ => None,
        }
    }

    /// Whether this is a reference (non-primitive) type.
    pub fn is_reference(&self) -> bool {
        !matches!(self.kind, ClassKind::Primitive(_))
    }

    /// Superclass id, if any.
    pub fn superclass(&self) -> Option<ClassId> {
        self.links.read().superclass
    }

    /// Directly implemented interfaces.
    pub fn interfaces(&self) -> Vec<ClassId> {
        self.links.read().interfaces.clone()
    }

    /// Component type id, for array classes.
    pub fn component(&self) -> Option<ClassId> {
        self.links.read().component
    }

    /// Declaring class id, for nested classes.
    pub fn declaring(&self) -> Option<ClassId> {
        self.links.read().declaring
    }

    /// Addressable member classes.
    pub fn nested(&self) -> Vec<ClassId> {
        self.links.read().nested.clone()
    }

    /// Declared instance method group for `name`.
    pub fn method_group(&self, name: &str) -> Option<MethodGroup> {
        self.members.read().methods.get(name).cloned()
    }

    /// Declared static method group for `name`.
    pub fn static_method_group(&self, name: &str) -> Option<MethodGroup> {
        self.members.read().static_methods.get(name).cloned()
    }

    /// Declared instance field for `name`.
    pub fn field(&self, name: &str) -> Option<Arc<FieldDescriptor>> {
        self.members.read().fields.get(name).cloned()
    }

    /// Declared static field for `name`.
    pub fn static_field(&self, name: &str) -> Option<Arc<FieldDescriptor>> {
        self.members.read().static_fields.get(name).cloned()
    }

    /// The constructor group.
    pub fn constructors(&self) -> MethodGroup {
        self.members.read().constructors.clone()
    }

    /// Names of declared instance methods.
    pub fn method_names(&self) -> Vec<String> {
        self.members.read().methods.keys().cloned().collect()
    }

    /// Names of declared static methods.
    pub fn static_method_names(&self) -> Vec<String> {
        self.members.read().static_methods.keys().cloned().collect()
    }
}

/// Derive the simple name from a qualified one (`java.util.Map.Entry` ->
/// `Entry`, `int[]` -> `int[]`).
fn simple_name_of(name: &str) -> String {
    if name.ends_with("[]") {
        return name.to_string();
    }
    match name.rsplit('.').next() {
        Some(last) => last.to_string(),
        None => name.to_string(),
    }
}
