//! Argument marshalling and native invocation.
//!
//! Executes the plan the resolver chose: fill a native argument buffer sized
//! to the declared parameter count, left to right, materialize the variadic
//! tail (reusing a directly supplied array or packing a fresh one), invoke,
//! check for a pending foreign exception, and convert the result back.
//!
//! Conversion is a two-phase commit. Each plan writes only the slot it owns,
//! and every handle transiently acquired along the way (interned strings,
//! boxes, tail arrays, fetched constants) is tracked by the buffer. The
//! buffer's drop releases every tracked handle exactly once, on success and
//! on every failure path alike - a conversion error halfway through, an
//! invocation error, or a pending foreign exception can never leak a slot.

use jbridge_core::vm::{HostLock, Vm};
use jbridge_core::{
    BridgeError, ClassId, Handle, ObjectRef, PrimitiveKind, RawValue, Result, Value,
};
use jbridge_registry::{ClassDescriptor, FieldDescriptor, TypeRegistry};

use crate::convert::ConvertOp;
use crate::overload::{CandidateMatch, DispatchCtx, TailPlan};

/// Per-call options.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallOptions {
    /// Release the host-side global lock for the duration of the native call
    /// so other host threads can run. Conversions always complete before the
    /// lock is released; no host-managed value is touched while it is.
    pub release_host_lock: bool,
}

/// What the prepared arguments are applied to.
#[derive(Debug, Clone, Copy)]
pub enum CallTarget<'a> {
    /// An instance method on a live object.
    Instance(&'a ObjectRef),
    /// A static method on its exact declaring class.
    Static(&'a ClassDescriptor),
    /// A constructor of the class.
    Constructor(&'a ClassDescriptor),
}

/// The native argument buffer with rollback tracking.
struct ArgBuffer<'a> {
    vm: &'a dyn Vm,
    slots: Vec<RawValue>,
    owned: Vec<Handle>,
}

impl<'a> ArgBuffer<'a> {
    fn new(vm: &'a dyn Vm, declared: usize) -> Self {
        ArgBuffer {
            vm,
            slots: Vec::with_capacity(declared),
            owned: Vec::new(),
        }
    }

    fn push(&mut self, slot: RawValue, owned: Option<Handle>) {
        if let Some(handle) = owned {
            self.owned.push(handle);
        }
        self.slots.push(slot);
    }

    /// Track a transient handle that is not itself a slot (tail array
    /// elements, the array before its slot is pushed).
    fn track(&mut self, handle: Handle) {
        self.owned.push(handle);
    }
}

impl Drop for ArgBuffer<'_> {
    fn drop(&mut self) {
        for handle in self.owned.drain(..) {
            self.vm.release_handle(handle);
        }
    }
}

/// RAII bracket releasing the host lock around a native call.
struct UnlockedHost<'a> {
    lock: &'a dyn HostLock,
}

impl<'a> UnlockedHost<'a> {
    fn new(lock: &'a dyn HostLock) -> Self {
        lock.release();
        UnlockedHost { lock }
    }
}

impl Drop for UnlockedHost<'_> {
    fn drop(&mut self) {
        self.lock.reacquire();
    }
}

/// Convert the chosen candidate's arguments, invoke, and convert the result.
pub fn marshal_and_invoke(
    candidate: &CandidateMatch,
    args: &[Value],
    target: CallTarget<'_>,
    ctx: &DispatchCtx<'_>,
    host_lock: &dyn HostLock,
    options: CallOptions,
) -> Result<Value> {
    let registry = ctx.registry;
    let vm: &dyn Vm = registry.vm().as_ref();
    let mut buffer = ArgBuffer::new(vm, candidate.method.arity());

    for (op, arg) in candidate.fixed_ops.iter().zip(args) {
        let (slot, owned) = execute_op(op, arg, vm, registry)?;
        buffer.push(slot, owned);
    }
    match &candidate.tail {
        TailPlan::None => {}
        TailPlan::Direct(op) => {
            let arg = args.last().ok_or_else(|| internal("direct tail without argument"))?;
            let (slot, owned) = execute_op(op, arg, vm, registry)?;
            buffer.push(slot, owned);
        }
        TailPlan::Packed { component, elems } => {
            let tail_args = &args[candidate.fixed_ops.len()..];
            let slot = pack_tail(vm, registry, *component, elems, tail_args, &mut buffer)?;
            buffer.push(slot, None);
        }
    }

    let raw = {
        let _unlocked = options
            .release_host_lock
            .then(|| UnlockedHost::new(host_lock));
        match target {
            CallTarget::Instance(obj) => {
                vm.invoke(obj.handle, candidate.method.id, &buffer.slots)?
            }
            CallTarget::Static(class) => {
                vm.invoke_static(class.handle(), candidate.method.id, &buffer.slots)?
            }
            CallTarget::Constructor(class) => RawValue::Object(Some(vm.construct(
                class.handle(),
                candidate.method.id,
                &buffer.slots,
            )?)),
        }
    };

    if let Some(ex) = vm.take_pending_exception() {
        if let Some(handle) = raw.as_object() {
            vm.release_handle(handle);
        }
        return Err(BridgeError::ForeignException {
            class: ex.class,
            message: ex.message,
        });
    }

    raw_to_value(raw, vm, registry)
}

/// Build the variadic tail array. A zero-length tail still allocates: the
/// foreign signature requires a non-absent trailing argument.
fn pack_tail(
    vm: &dyn Vm,
    registry: &TypeRegistry,
    component: ClassId,
    elems: &[ConvertOp],
    tail_args: &[Value],
    buffer: &mut ArgBuffer<'_>,
) -> Result<RawValue> {
    let comp = registry
        .get(component)
        .ok_or_else(|| internal("unresolved tail component"))?;

    if let Some(kind) = comp.primitive_kind() {
        let mut slots = Vec::with_capacity(elems.len());
        for (op, arg) in elems.iter().zip(tail_args) {
            let (slot, owned) = execute_op(op, arg, vm, registry)?;
            if let Some(handle) = owned {
                buffer.track(handle);
            }
            slots.push(slot);
        }
        let array = vm.new_primitive_array(kind, &slots)?;
        buffer.track(array);
        Ok(RawValue::Object(Some(array)))
    } else {
        let array = vm.new_object_array(comp.handle(), tail_args.len())?;
        buffer.track(array);
        for (index, (op, arg)) in elems.iter().zip(tail_args).enumerate() {
            let (slot, owned) = execute_op(op, arg, vm, registry)?;
            if let Some(handle) = owned {
                buffer.track(handle);
            }
            vm.set_object_array_element(array, index, slot.as_object())?;
        }
        Ok(RawValue::Object(Some(array)))
    }
}

/// Read an instance field through the superclass-resolved descriptor.
pub fn read_field(
    obj: &ObjectRef,
    field: &FieldDescriptor,
    ctx: &DispatchCtx<'_>,
) -> Result<Value> {
    let vm: &dyn Vm = ctx.registry.vm().as_ref();
    let raw = vm.get_field(obj.handle, field.id)?;
    check_pending(vm, raw)?;
    raw_to_value(raw, vm, ctx.registry)
}

/// Write an instance field, converting through the catalog into the field's
/// declared type.
pub fn write_field(
    obj: &ObjectRef,
    field: &FieldDescriptor,
    value: &Value,
    ctx: &DispatchCtx<'_>,
) -> Result<()> {
    let vm: &dyn Vm = ctx.registry.vm().as_ref();
    let (slot, owned) = convert_for_field(field, value, ctx)?;
    let outcome = vm.set_field(obj.handle, field.id, slot);
    if let Some(handle) = owned {
        vm.release_handle(handle);
    }
    outcome?;
    check_pending(vm, RawValue::Void)
}

/// Read a static field on its exact declaring class.
pub fn read_static_field(field: &FieldDescriptor, ctx: &DispatchCtx<'_>) -> Result<Value> {
    let vm: &dyn Vm = ctx.registry.vm().as_ref();
    let class = ctx
        .registry
        .get(field.declared_in)
        .ok_or_else(|| internal("static field without declaring class"))?;
    let raw = vm.get_static_field(class.handle(), field.id)?;
    check_pending(vm, raw)?;
    raw_to_value(raw, vm, ctx.registry)
}

/// Write a static field on its exact declaring class.
pub fn write_static_field(
    field: &FieldDescriptor,
    value: &Value,
    ctx: &DispatchCtx<'_>,
) -> Result<()> {
    let vm: &dyn Vm = ctx.registry.vm().as_ref();
    let class = ctx
        .registry
        .get(field.declared_in)
        .ok_or_else(|| internal("static field without declaring class"))?;
    let (slot, owned) = convert_for_field(field, value, ctx)?;
    let outcome = vm.set_static_field(class.handle(), field.id, slot);
    if let Some(handle) = owned {
        vm.release_handle(handle);
    }
    outcome?;
    check_pending(vm, RawValue::Void)
}

/// Unwrap a boxed primitive back to a host value; a non-box passes through
/// unchanged.
pub fn unbox(obj: &ObjectRef, ctx: &DispatchCtx<'_>) -> Result<Value> {
    let vm: &dyn Vm = ctx.registry.vm().as_ref();
    match vm.unbox(obj.handle)? {
        Some(raw) => raw_to_value(raw, vm, ctx.registry),
        None => Ok(Value::Object(*obj)),
    }
}

fn convert_for_field(
    field: &FieldDescriptor,
    value: &Value,
    ctx: &DispatchCtx<'_>,
) -> Result<(RawValue, Option<Handle>)> {
    let target = ctx
        .registry
        .get(field.ty)
        .ok_or_else(|| internal("unresolved field type"))?;
    let conv = ctx
        .catalog
        .best_conversion(value, &target, &ctx.probe_ctx());
    let Some(op) = conv.op else {
        return Err(BridgeError::NoMatch {
            name: field.name.clone(),
            args: value.render(),
        });
    };
    execute_op(&op, value, ctx.registry.vm().as_ref(), ctx.registry)
}

/// Execute one conversion plan into one slot. The returned handle, if any,
/// is a transient acquisition the caller must track for release.
fn execute_op(
    op: &ConvertOp,
    value: &Value,
    vm: &dyn Vm,
    registry: &TypeRegistry,
) -> Result<(RawValue, Option<Handle>)> {
    match op {
        ConvertOp::ToBool => match value {
            Value::Bool(b) => Ok((RawValue::Bool(*b), None)),
            Value::Int(v) => Ok((RawValue::Bool(*v != 0), None)),
            _ => Err(plan_mismatch(op, value)),
        },
        ConvertOp::ToByte => match value {
            Value::Int(v) if PrimitiveKind::Byte.fits(*v) => {
                Ok((RawValue::Byte(*v as i8), None))
            }
            Value::Int(_) => Err(overflow(value, PrimitiveKind::Byte)),
            _ => Err(plan_mismatch(op, value)),
        },
        ConvertOp::ToShort => match value {
            Value::Int(v) if PrimitiveKind::Short.fits(*v) => {
                Ok((RawValue::Short(*v as i16), None))
            }
            Value::Int(_) => Err(overflow(value, PrimitiveKind::Short)),
            _ => Err(plan_mismatch(op, value)),
        },
        ConvertOp::ToInt => match value {
            Value::Int(v) if PrimitiveKind::Int.fits(*v) => Ok((RawValue::Int(*v as i32), None)),
            Value::Int(_) => Err(overflow(value, PrimitiveKind::Int)),
            Value::Char(c) => Ok((RawValue::Int(*c as u32 as i32), None)),
            _ => Err(plan_mismatch(op, value)),
        },
        ConvertOp::ToLong => match value {
            Value::Int(v) => Ok((RawValue::Long(*v), None)),
            Value::Char(c) => Ok((RawValue::Long(i64::from(*c as u32)), None)),
            _ => Err(plan_mismatch(op, value)),
        },
        ConvertOp::ToChar => match value {
            Value::Char(c) if (*c as u32) <= 0xFFFF => {
                Ok((RawValue::Char(*c as u32 as u16), None))
            }
            Value::Str(s) => match s.chars().next() {
                Some(c) if s.chars().count() == 1 && (c as u32) <= 0xFFFF => {
                    Ok((RawValue::Char(c as u32 as u16), None))
                }
                _ => Err(plan_mismatch(op, value)),
            },
            Value::Int(v) if PrimitiveKind::Char.fits(*v) => {
                Ok((RawValue::Char(*v as u16), None))
            }
            Value::Int(_) => Err(overflow(value, PrimitiveKind::Char)),
            _ => Err(plan_mismatch(op, value)),
        },
        ConvertOp::ToFloat => match value {
            Value::Float(f) => {
                if f.is_finite() && f.abs() > jbridge_core::limits::FLOAT_MAX {
                    Err(overflow(value, PrimitiveKind::Float))
                } else {
                    Ok((RawValue::Float(*f as f32), None))
                }
            }
            Value::Int(v) => Ok((RawValue::Float(*v as f32), None)),
            _ => Err(plan_mismatch(op, value)),
        },
        ConvertOp::ToDouble => match value {
            Value::Float(f) => Ok((RawValue::Double(*f), None)),
            Value::Int(v) => Ok((RawValue::Double(*v as f64), None)),
            _ => Err(plan_mismatch(op, value)),
        },
        ConvertOp::Overflow(kind) => Err(overflow(value, *kind)),
        ConvertOp::NullRef => Ok((RawValue::null(), None)),
        ConvertOp::PassHandle => match value {
            // Borrowed: the caller's reference, never released here.
            Value::Object(obj) => Ok((RawValue::Object(Some(obj.handle)), None)),
            _ => Err(plan_mismatch(op, value)),
        },
        ConvertOp::NewString => {
            let text = match value {
                Value::Str(s) => s.clone(),
                Value::Char(c) => c.to_string(),
                _ => return Err(plan_mismatch(op, value)),
            };
            let handle = vm.new_string(&text)?;
            Ok((RawValue::Object(Some(handle)), Some(handle)))
        }
        ConvertOp::BoxPrimitive(kind) => {
            let (slot, _) = execute_op(&primitive_op(*kind)?, value, vm, registry)?;
            let handle = vm.box_primitive(*kind, slot)?;
            Ok((RawValue::Object(Some(handle)), Some(handle)))
        }
        ConvertOp::EnumConstant { class, field } => {
            let desc = registry
                .get(*class)
                .ok_or_else(|| internal("unresolved enum class"))?;
            let raw = vm.get_static_field(desc.handle(), *field)?;
            match raw.as_object() {
                Some(handle) => Ok((raw, Some(handle))),
                None => Err(internal("enum constant field was null")),
            }
        }
        ConvertOp::ByteArray => match value {
            Value::Bytes(bytes) => {
                let slots: Vec<RawValue> =
                    bytes.iter().map(|b| RawValue::Byte(*b as i8)).collect();
                let handle = vm.new_primitive_array(PrimitiveKind::Byte, &slots)?;
                Ok((RawValue::Object(Some(handle)), Some(handle)))
            }
            _ => Err(plan_mismatch(op, value)),
        },
        ConvertOp::BufferArray(kind) => match value {
            Value::Buffer(buffer) if buffer.elem == *kind => {
                let slots = decode_buffer(*kind, &buffer.data)?;
                let handle = vm.new_primitive_array(*kind, &slots)?;
                Ok((RawValue::Object(Some(handle)), Some(handle)))
            }
            _ => Err(plan_mismatch(op, value)),
        },
        ConvertOp::Custom(convert) => {
            let raw = convert(value, vm)?;
            let owned = raw.as_object();
            Ok((raw, owned))
        }
    }
}

/// The primitive-path plan producing the slot a boxing op wraps.
fn primitive_op(kind: PrimitiveKind) -> Result<ConvertOp> {
    Ok(match kind {
        PrimitiveKind::Boolean => ConvertOp::ToBool,
        PrimitiveKind::Byte => ConvertOp::ToByte,
        PrimitiveKind::Short => ConvertOp::ToShort,
        PrimitiveKind::Int => ConvertOp::ToInt,
        PrimitiveKind::Long => ConvertOp::ToLong,
        PrimitiveKind::Char => ConvertOp::ToChar,
        PrimitiveKind::Float => ConvertOp::ToFloat,
        PrimitiveKind::Double => ConvertOp::ToDouble,
        PrimitiveKind::Void => return Err(internal("cannot box void")),
    })
}

/// Reinterpret a fixed-width memory view as prepared slots, native
/// endianness.
fn decode_buffer(kind: PrimitiveKind, data: &[u8]) -> Result<Vec<RawValue>> {
    let width = kind.byte_width();
    if width == 0 || data.len() % width != 0 {
        return Err(internal("malformed buffer view"));
    }
    let mut out = Vec::with_capacity(data.len() / width);
    for chunk in data.chunks_exact(width) {
        out.push(match kind {
            PrimitiveKind::Boolean => RawValue::Bool(chunk[0] != 0),
            PrimitiveKind::Byte => RawValue::Byte(chunk[0] as i8),
            PrimitiveKind::Char => {
                RawValue::Char(u16::from_ne_bytes([chunk[0], chunk[1]]))
            }
            PrimitiveKind::Short => {
                RawValue::Short(i16::from_ne_bytes([chunk[0], chunk[1]]))
            }
            PrimitiveKind::Int => RawValue::Int(i32::from_ne_bytes([
                chunk[0], chunk[1], chunk[2], chunk[3],
            ])),
            PrimitiveKind::Long => RawValue::Long(i64::from_ne_bytes([
                chunk[0], chunk[1], chunk[2], chunk[3], chunk[4], chunk[5], chunk[6], chunk[7],
            ])),
            PrimitiveKind::Float => RawValue::Float(f32::from_ne_bytes([
                chunk[0], chunk[1], chunk[2], chunk[3],
            ])),
            PrimitiveKind::Double => RawValue::Double(f64::from_ne_bytes([
                chunk[0], chunk[1], chunk[2], chunk[3], chunk[4], chunk[5], chunk[6], chunk[7],
            ])),
            PrimitiveKind::Void => return Err(internal("void buffer view")),
        });
    }
    Ok(out)
}

/// Fixed foreign-to-host result conversion.
fn raw_to_value(raw: RawValue, vm: &dyn Vm, registry: &TypeRegistry) -> Result<Value> {
    Ok(match raw {
        RawValue::Void => Value::Null,
        RawValue::Bool(b) => Value::Bool(b),
        RawValue::Byte(v) => Value::Int(i64::from(v)),
        RawValue::Short(v) => Value::Int(i64::from(v)),
        RawValue::Int(v) => Value::Int(i64::from(v)),
        RawValue::Long(v) => Value::Int(v),
        RawValue::Char(c) => {
            Value::Char(char::from_u32(u32::from(c)).unwrap_or(char::REPLACEMENT_CHARACTER))
        }
        RawValue::Float(f) => Value::Float(f64::from(f)),
        RawValue::Double(f) => Value::Float(f),
        RawValue::Object(None) => Value::Null,
        RawValue::Object(Some(handle)) => {
            let class = vm
                .class_of(handle)
                .and_then(|name| registry.resolve(&name));
            match class {
                Ok(class) => Value::Object(ObjectRef {
                    handle,
                    class: class.id(),
                }),
                Err(err) => {
                    // The handle would otherwise leak with the error.
                    vm.release_handle(handle);
                    return Err(err);
                }
            }
        }
    })
}

fn check_pending(vm: &dyn Vm, raw: RawValue) -> Result<()> {
    if let Some(ex) = vm.take_pending_exception() {
        if let Some(handle) = raw.as_object() {
            vm.release_handle(handle);
        }
        return Err(BridgeError::ForeignException {
            class: ex.class,
            message: ex.message,
        });
    }
    Ok(())
}

fn overflow(value: &Value, kind: PrimitiveKind) -> BridgeError {
    BridgeError::Overflow {
        value: value.render(),
        target: kind.java_name(),
    }
}

fn plan_mismatch(op: &ConvertOp, value: &Value) -> BridgeError {
    internal(&format!(
        "conversion plan {op:?} executed against {}",
        value.render()
    ))
}

fn internal(message: &str) -> BridgeError {
    BridgeError::Internal {
        message: message.to_string(),
    }
}
