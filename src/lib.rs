//! jbridge - call a reflected JVM from Rust as if its objects were values.
//!
//! The bridge mirrors foreign classes into a cached type registry, ranks
//! candidate overloads through an extensible conversion catalog, and marshals
//! host values into the exact native representation the chosen signature
//! requires - approximating foreign overload resolution (arity, implicit
//! widening, boxing, variadic packing) without the foreign compiler's
//! type-checker.
//!
//! The entry point is [`Bridge`], wired over the embedding layer's
//! [`jbridge_core::vm::Vm`] implementation:
//!
//! ```ignore
//! let bridge = Bridge::new(vm);
//! let list = bridge.construct("java.util.ArrayList", &[])?;
//! let Value::Object(list) = list else { unreachable!() };
//! bridge.call(&list, "add", &[Value::Str("first".into())])?;
//! ```

mod bridge;

pub use bridge::Bridge;

pub use jbridge_core::vm;
pub use jbridge_core::{
    BridgeError, Buffer, ClassId, Handle, ObjectRef, PrimitiveKind, RawValue, Result, Value,
    ValueKind, array_name_of, limits,
};
pub use jbridge_dispatch::{
    CallOptions, CallShape, CallTarget, CandidateMatch, Conversion, ConversionCatalog, ConvertOp,
    CustomConvertFn, DispatchCtx, ProbeCtx, Quality, SourceFilter, TailPlan, TargetFilter,
    marshal_and_invoke, resolve_overload,
};
pub use jbridge_registry::{
    ClassDescriptor, ClassKind, FieldDescriptor, MethodDescriptor, MethodGroup, Modifiers,
    Nesting, Protection, TypeRegistry,
};

/// Everything most embedders need.
pub mod prelude {
    pub use crate::Bridge;
    pub use jbridge_core::vm::{ClassProvider, HostLock, NoHostLock, Vm};
    pub use jbridge_core::{BridgeError, ObjectRef, Result, Value};
    pub use jbridge_dispatch::{CallOptions, Quality, SourceFilter, TargetFilter};
    pub use jbridge_registry::{ClassDescriptor, MethodGroup, TypeRegistry};
}
