//! Built-in object-path conversion rules.
//!
//! Consulted in the order of `BUILTIN_RULES`; each rule either contributes a
//! [`Conversion`] or stays silent. The catalog keeps the best contribution,
//! so rule order only matters between equal qualities (the earlier rule
//! wins).

use jbridge_core::{PrimitiveKind, Value, limits};
use jbridge_registry::{ClassDescriptor, ClassKind};

use super::{Conversion, ConvertOp, ProbeCtx, Quality};

pub(crate) type BuiltinRule = fn(&Value, &ClassDescriptor, &ProbeCtx<'_>) -> Option<Conversion>;

/// The built-in rule ladder, highest priority first.
pub(crate) const BUILTIN_RULES: &[BuiltinRule] = &[
    null_to_reference,
    object_passthrough,
    enum_constant_by_name,
    text_to_string,
    text_to_character,
    boolean_box,
    integral_box,
    float_box,
    bytes_to_byte_array,
    buffer_to_primitive_array,
];

/// The null reference converts to every reference target.
fn null_to_reference(value: &Value, _: &ClassDescriptor, _: &ProbeCtx<'_>) -> Option<Conversion> {
    match value {
        Value::Null => Some(Conversion::new(Quality::Perfect, ConvertOp::NullRef)),
        _ => None,
    }
}

/// A live object passes through unchanged: exact class is perfect, a
/// subtype-to-supertype pass is merely great.
fn object_passthrough(
    value: &Value,
    target: &ClassDescriptor,
    ctx: &ProbeCtx<'_>,
) -> Option<Conversion> {
    let Value::Object(obj) = value else {
        return None;
    };
    if obj.class == target.id() {
        return Some(Conversion::new(Quality::Perfect, ConvertOp::PassHandle));
    }
    if ctx.registry.is_assignable(obj.class, target.id()) {
        return Some(Conversion::new(Quality::Great, ConvertOp::PassHandle));
    }
    None
}

/// Text naming a constant of the target enum fetches that constant.
fn enum_constant_by_name(
    value: &Value,
    target: &ClassDescriptor,
    _: &ProbeCtx<'_>,
) -> Option<Conversion> {
    let Value::Str(name) = value else {
        return None;
    };
    if target.kind() != ClassKind::Enum {
        return None;
    }
    let field = target.static_field(name)?;
    if field.ty != target.id() {
        return None;
    }
    Some(Conversion::new(
        Quality::Great,
        ConvertOp::EnumConstant {
            class: target.id(),
            field: field.id,
        },
    ))
}

/// Text interns as a foreign string: great into `String` itself, good into
/// any supertype of it.
fn text_to_string(
    value: &Value,
    target: &ClassDescriptor,
    ctx: &ProbeCtx<'_>,
) -> Option<Conversion> {
    if !matches!(value, Value::Str(_) | Value::Char(_)) {
        return None;
    }
    if target.name() == "java.lang.String" {
        return Some(Conversion::new(Quality::Great, ConvertOp::NewString));
    }
    if ctx.assignable_from("java.lang.String", target) {
        return Some(Conversion::new(Quality::Good, ConvertOp::NewString));
    }
    None
}

/// Length-one text boxes as a `Character`; anything longer is no character
/// at all.
fn text_to_character(
    value: &Value,
    target: &ClassDescriptor,
    ctx: &ProbeCtx<'_>,
) -> Option<Conversion> {
    let single = match value {
        Value::Char(c) => (*c as u32) <= limits::CHAR_MAX as u32,
        Value::Str(s) => {
            let mut chars = s.chars();
            matches!(
                (chars.next(), chars.next()),
                (Some(c), None) if (c as u32) <= limits::CHAR_MAX as u32
            )
        }
        _ => return None,
    };
    if !single {
        return None;
    }
    let quality = box_quality(target, PrimitiveKind::Char, Quality::Great, ctx)?;
    Some(Conversion::new(
        quality,
        ConvertOp::BoxPrimitive(PrimitiveKind::Char),
    ))
}

/// Canonical booleans box as `Boolean` (great); the boolean-like integrals
/// 0 and 1 are accepted at a distance (good).
fn boolean_box(value: &Value, target: &ClassDescriptor, ctx: &ProbeCtx<'_>) -> Option<Conversion> {
    let base = match value {
        Value::Bool(_) => Quality::Great,
        Value::Int(0) | Value::Int(1) => Quality::Good,
        _ => return None,
    };
    let quality = box_quality(target, PrimitiveKind::Boolean, base, ctx)?;
    Some(Conversion::new(
        quality,
        ConvertOp::BoxPrimitive(PrimitiveKind::Boolean),
    ))
}

/// Integral boxing across the five integer widths. A value that does not fit
/// the target width degrades to the raising overflow marker instead of
/// truncating.
fn integral_box(value: &Value, target: &ClassDescriptor, ctx: &ProbeCtx<'_>) -> Option<Conversion> {
    let Value::Int(v) = value else {
        return None;
    };
    let widths = [
        (PrimitiveKind::Byte, Quality::Good),
        (PrimitiveKind::Short, Quality::Good),
        (PrimitiveKind::Char, Quality::Good),
        (PrimitiveKind::Int, Quality::Great),
        (PrimitiveKind::Long, Quality::Great),
    ];
    for (kind, fit) in widths {
        if target.name() == kind.box_class() {
            return Some(if kind.fits(*v) {
                Conversion::new(fit, ConvertOp::BoxPrimitive(kind))
            } else {
                Conversion::new(Quality::Bad, ConvertOp::Overflow(kind))
            });
        }
    }
    // No exact wrapper asked for: box at the value's natural width into a
    // supertype (Number, Object, ...).
    let kind = if PrimitiveKind::Int.fits(*v) {
        PrimitiveKind::Int
    } else {
        PrimitiveKind::Long
    };
    if ctx.assignable_from(kind.box_class(), target) {
        return Some(Conversion::new(
            Quality::Good,
            ConvertOp::BoxPrimitive(kind),
        ));
    }
    None
}

/// Floating boxing, preferring the widest float type.
fn float_box(value: &Value, target: &ClassDescriptor, ctx: &ProbeCtx<'_>) -> Option<Conversion> {
    let Value::Float(f) = value else {
        return None;
    };
    if target.name() == "java.lang.Double" {
        return Some(Conversion::new(
            Quality::Great,
            ConvertOp::BoxPrimitive(PrimitiveKind::Double),
        ));
    }
    if target.name() == "java.lang.Float" {
        return Some(if !f.is_finite() || f.abs() <= limits::FLOAT_MAX {
            Conversion::new(Quality::Good, ConvertOp::BoxPrimitive(PrimitiveKind::Float))
        } else {
            Conversion::new(Quality::Bad, ConvertOp::Overflow(PrimitiveKind::Float))
        });
    }
    if ctx.assignable_from("java.lang.Double", target) {
        return Some(Conversion::new(
            Quality::Good,
            ConvertOp::BoxPrimitive(PrimitiveKind::Double),
        ));
    }
    None
}

/// A raw byte sequence fills a fresh `byte[]`.
fn bytes_to_byte_array(
    value: &Value,
    target: &ClassDescriptor,
    ctx: &ProbeCtx<'_>,
) -> Option<Conversion> {
    if !matches!(value, Value::Bytes(_)) {
        return None;
    }
    if array_component_kind(target, ctx) == Some(PrimitiveKind::Byte) {
        return Some(Conversion::new(Quality::Great, ConvertOp::ByteArray));
    }
    None
}

/// Structural fallback: a fixed-width memory view fills the primitive array
/// of its element kind.
fn buffer_to_primitive_array(
    value: &Value,
    target: &ClassDescriptor,
    ctx: &ProbeCtx<'_>,
) -> Option<Conversion> {
    let Value::Buffer(buffer) = value else {
        return None;
    };
    if !buffer.is_well_formed() {
        return None;
    }
    if array_component_kind(target, ctx) == Some(buffer.elem) {
        return Some(Conversion::new(
            Quality::Great,
            ConvertOp::BufferArray(buffer.elem),
        ));
    }
    None
}

/// Quality of boxing into `target`: the base quality for the exact wrapper
/// class, one step down for a supertype, nothing otherwise.
fn box_quality(
    target: &ClassDescriptor,
    kind: PrimitiveKind,
    base: Quality,
    ctx: &ProbeCtx<'_>,
) -> Option<Quality> {
    if target.name() == kind.box_class() {
        Some(base)
    } else if ctx.assignable_from(kind.box_class(), target) {
        Some(base.demote())
    } else {
        None
    }
}

/// The primitive component kind of an array target, if it has one.
fn array_component_kind(target: &ClassDescriptor, ctx: &ProbeCtx<'_>) -> Option<PrimitiveKind> {
    if target.kind() != ClassKind::Array {
        return None;
    }
    let component = target.component()?;
    ctx.registry.get(component)?.primitive_kind()
}
