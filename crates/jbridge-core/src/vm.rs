//! Collaborator interfaces to the foreign runtime.
//!
//! The bridge core never speaks to a JVM directly. Everything native comes
//! through two trait objects supplied by the embedding layer:
//!
//! - [`ClassProvider`] - the reflection read side: given a qualified class
//!   name, produce one [`RawClass`] record describing the class and its
//!   declared members, with opaque [`MethodId`]/[`FieldId`] tokens and a
//!   [`Handle`] on the class object itself.
//! - [`Vm`] - the call side: invoke methods and constructors over prepared
//!   [`RawValue`] buffers, allocate transient strings/arrays/boxes, and
//!   manage handle lifetime.
//!
//! Thread attachment is an ambient precondition: every thread that enters the
//! bridge must already be attached via [`Vm::attach_thread`] and detached
//! exactly once at thread exit. The core consumes that guarantee; it never
//! attaches threads itself.
//!
//! [`HostLock`] brackets a host-side global lock around long native calls so
//! other host threads can run while the foreign runtime works. The marshaller
//! releases it only for the duration of the native call itself and never
//! touches a host-managed value while it is released.

use crate::{Handle, PrimitiveKind, RawValue, Result};

/// Opaque identity of one foreign method or constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct MethodId(pub u64);

/// Opaque identity of one foreign field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct FieldId(pub u64);

/// Structural kind of a class as reported by the reflection interface.
#[derive(Debug, Clone, PartialEq)]
pub enum RawKind {
    /// One of the nine primitive pseudo-classes.
    Primitive(PrimitiveKind),
    Interface,
    /// An array class; `component` is the qualified component class name.
    Array {
        /// Qualified component class name.
        component: String,
    },
    Enum,
    Ordinary,
}

/// How a class is nested in its enclosing context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawNesting {
    TopLevel,
    Member,
    Local,
    Anonymous,
}

/// One declared field as read from the reflection interface.
#[derive(Debug, Clone, PartialEq)]
pub struct RawField {
    /// Field name.
    pub name: String,
    /// Raw JVM access-flag bits.
    pub access: u32,
    /// Qualified name of the field's type.
    pub ty: String,
    /// Opaque field identity for later reads/writes.
    pub id: FieldId,
}

/// One declared method or constructor as read from the reflection interface.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMethod {
    /// Method name; constructors use the conventional `<init>`.
    pub name: String,
    /// Raw JVM access-flag bits.
    pub access: u32,
    /// Qualified names of the parameter types, in order.
    pub params: Vec<String>,
    /// Qualified return type name; `None` for constructors.
    pub ret: Option<String>,
    /// Whether the last parameter is a variable-length tail.
    pub varargs: bool,
    /// Opaque method identity for later invocation.
    pub id: MethodId,
}

/// One nested class entry (name plus how it nests).
#[derive(Debug, Clone, PartialEq)]
pub struct RawNested {
    /// Qualified name of the nested class.
    pub name: String,
    /// Nesting mode; only `Member` entries are addressable by name.
    pub nesting: RawNesting,
}

/// The raw reflection record for one class.
#[derive(Debug, Clone, PartialEq)]
pub struct RawClass {
    /// Qualified class name.
    pub name: String,
    /// Raw JVM access-flag bits.
    pub access: u32,
    /// Structural kind.
    pub kind: RawKind,
    /// How this class nests in its enclosing context.
    pub nesting: RawNesting,
    /// Qualified superclass name; `None` for interfaces, primitives, and the
    /// root type.
    pub superclass: Option<String>,
    /// Qualified names of directly implemented interfaces.
    pub interfaces: Vec<String>,
    /// Qualified name of the declaring class, for nested classes.
    pub declaring: Option<String>,
    /// Declared fields (instance and static together; the registry splits
    /// them by the static access bit).
    pub fields: Vec<RawField>,
    /// Declared methods.
    pub methods: Vec<RawMethod>,
    /// Declared constructors.
    pub constructors: Vec<RawMethod>,
    /// Nested classes declared in this class.
    pub nested: Vec<RawNested>,
    /// Handle on the class object itself, owned by the registry until
    /// teardown.
    pub handle: Handle,
}

/// Pending foreign exception, taken after a native call.
#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionInfo {
    /// Qualified class name of the throwable.
    pub class: String,
    /// Its message, possibly empty.
    pub message: String,
}

/// Reflection read side of the foreign runtime.
pub trait ClassProvider: Send + Sync {
    /// Describe one class by qualified name.
    ///
    /// Fails with [`crate::BridgeError::NotFound`] when the class cannot be
    /// located; that failure propagates to the caller unchanged.
    fn describe(&self, name: &str) -> Result<RawClass>;
}

/// Call side of the foreign runtime.
///
/// Implementations own reference counting, thread attachment, and the real
/// native calling convention; the bridge core only prepares arguments and
/// consumes results.
pub trait Vm: ClassProvider {
    /// Attach the current thread to the runtime. Ambient precondition for
    /// every other operation; the core never calls this itself.
    fn attach_thread(&self) -> Result<()>;

    /// Detach the current thread. Must be called exactly once at thread exit.
    fn detach_thread(&self);

    /// Acquire an additional reference to the object behind `handle`.
    fn acquire_handle(&self, handle: Handle) -> Handle;

    /// Release one reference. The handle must not be used afterwards.
    fn release_handle(&self, handle: Handle);

    /// Invoke an instance method.
    fn invoke(&self, target: Handle, method: MethodId, args: &[RawValue]) -> Result<RawValue>;

    /// Invoke a static method on its declaring class.
    fn invoke_static(&self, class: Handle, method: MethodId, args: &[RawValue])
    -> Result<RawValue>;

    /// Invoke a constructor, returning a handle on the new object.
    fn construct(&self, class: Handle, ctor: MethodId, args: &[RawValue]) -> Result<Handle>;

    /// Allocate an object array of `len` elements of the given component
    /// class, initially all null.
    fn new_object_array(&self, component: Handle, len: usize) -> Result<Handle>;

    /// Store one element of an object array.
    fn set_object_array_element(
        &self,
        array: Handle,
        index: usize,
        value: Option<Handle>,
    ) -> Result<()>;

    /// Allocate a primitive array from prepared slots of the matching kind.
    fn new_primitive_array(&self, kind: PrimitiveKind, elems: &[RawValue]) -> Result<Handle>;

    /// Intern host text as a foreign string object.
    fn new_string(&self, text: &str) -> Result<Handle>;

    /// Box a primitive slot into its wrapper object.
    fn box_primitive(&self, kind: PrimitiveKind, value: RawValue) -> Result<Handle>;

    /// Unbox a wrapper object back to a primitive slot, if it is one.
    fn unbox(&self, object: Handle) -> Result<Option<RawValue>>;

    /// Read an instance field.
    fn get_field(&self, target: Handle, field: FieldId) -> Result<RawValue>;

    /// Write an instance field.
    fn set_field(&self, target: Handle, field: FieldId, value: RawValue) -> Result<()>;

    /// Read a static field on its declaring class.
    fn get_static_field(&self, class: Handle, field: FieldId) -> Result<RawValue>;

    /// Write a static field on its declaring class.
    fn set_static_field(&self, class: Handle, field: FieldId, value: RawValue) -> Result<()>;

    /// Qualified name of the runtime class of `object`.
    fn class_of(&self, object: Handle) -> Result<String>;

    /// Take the pending foreign exception, clearing it. Checked after every
    /// native call; a pending exception is never left across a subsequent
    /// core operation.
    fn take_pending_exception(&self) -> Option<ExceptionInfo>;
}

/// Host-side global lock bracket for long native calls.
///
/// The marshaller releases the lock just before the native call and
/// reacquires it immediately after (on every exit path). Implementations for
/// hosts without such a lock can use [`NoHostLock`].
pub trait HostLock: Send + Sync {
    /// Release the host lock held by the current thread.
    fn release(&self);

    /// Reacquire the host lock on the current thread.
    fn reacquire(&self);
}

/// A [`HostLock`] for hosts that have no global lock.
#[derive(Debug, Default)]
pub struct NoHostLock;

impl HostLock for NoHostLock {
    fn release(&self) {}
    fn reacquire(&self) {}
}
