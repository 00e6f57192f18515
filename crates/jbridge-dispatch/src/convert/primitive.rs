//! The primitive conversion path.
//!
//! Targets that are primitive kinds never go through the rule list: a small
//! fixed dispatch keyed on the kind performs the width-checked narrowing.
//!
//! The overflow policy distinguishes two situations:
//!
//! - the value has the right semantic kind but does not fit the width
//!   (300 into `byte`): quality degrades to [`Quality::Bad`] and the plan is
//!   the raising overflow marker, so the candidate stays eligible when no
//!   wider overload exists but executing it surfaces
//!   [`jbridge_core::BridgeError::Overflow`] instead of truncating;
//! - the value has the wrong semantic kind (a multi-character string into
//!   `char`, a float into an integral): [`Quality::Fail`].

use jbridge_core::{PrimitiveKind, Value, limits};

use super::{Conversion, ConvertOp, Quality};

/// Best conversion from a host value to a primitive target kind.
pub fn conversion(value: &Value, kind: PrimitiveKind) -> Conversion {
    match kind {
        PrimitiveKind::Boolean => to_boolean(value),
        PrimitiveKind::Char => to_char(value),
        PrimitiveKind::Byte => integral(value, kind, ConvertOp::ToByte, Quality::Good),
        PrimitiveKind::Short => integral(value, kind, ConvertOp::ToShort, Quality::Good),
        PrimitiveKind::Int => integral(value, kind, ConvertOp::ToInt, Quality::Great),
        PrimitiveKind::Long => to_long(value),
        PrimitiveKind::Float => to_float(value),
        PrimitiveKind::Double => to_double(value),
        // Nothing converts to void; it only occurs as a return type.
        PrimitiveKind::Void => Conversion::fail(),
    }
}

fn to_boolean(value: &Value) -> Conversion {
    match value {
        Value::Bool(_) => Conversion::new(Quality::Perfect, ConvertOp::ToBool),
        // Boolean-like integral: only the two canonical values qualify.
        Value::Int(0) | Value::Int(1) => Conversion::new(Quality::Good, ConvertOp::ToBool),
        _ => Conversion::fail(),
    }
}

fn to_char(value: &Value) -> Conversion {
    match value {
        Value::Char(c) if (*c as u32) <= limits::CHAR_MAX as u32 => {
            Conversion::new(Quality::Perfect, ConvertOp::ToChar)
        }
        // Characters outside the basic plane cannot be one UTF-16 unit.
        Value::Char(_) => Conversion::fail(),
        Value::Str(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if (c as u32) <= limits::CHAR_MAX as u32 => {
                    Conversion::new(Quality::Great, ConvertOp::ToChar)
                }
                // Multi-character text is the wrong semantic kind, not an
                // overflow.
                _ => Conversion::fail(),
            }
        }
        Value::Int(v) => {
            if PrimitiveKind::Char.fits(*v) {
                Conversion::new(Quality::Good, ConvertOp::ToChar)
            } else {
                Conversion::new(Quality::Bad, ConvertOp::Overflow(PrimitiveKind::Char))
            }
        }
        _ => Conversion::fail(),
    }
}

/// Integral targets narrower than the host integer: range-check, degrade to
/// the raising marker on overflow.
fn integral(value: &Value, kind: PrimitiveKind, op: ConvertOp, fit: Quality) -> Conversion {
    match value {
        Value::Int(v) => {
            if kind.fits(*v) {
                Conversion::new(fit, op)
            } else {
                Conversion::new(Quality::Bad, ConvertOp::Overflow(kind))
            }
        }
        Value::Char(_) => Conversion::new(Quality::Good, op),
        _ => Conversion::fail(),
    }
}

fn to_long(value: &Value) -> Conversion {
    match value {
        // The host integer is exactly the long width: no coercion at all.
        Value::Int(_) => Conversion::new(Quality::Perfect, ConvertOp::ToLong),
        Value::Char(_) => Conversion::new(Quality::Good, ConvertOp::ToLong),
        _ => Conversion::fail(),
    }
}

fn to_float(value: &Value) -> Conversion {
    match value {
        Value::Float(f) => {
            if !f.is_finite() || f.abs() <= limits::FLOAT_MAX {
                Conversion::new(Quality::Great, ConvertOp::ToFloat)
            } else {
                Conversion::new(Quality::Bad, ConvertOp::Overflow(PrimitiveKind::Float))
            }
        }
        Value::Int(_) => Conversion::new(Quality::Good, ConvertOp::ToFloat),
        _ => Conversion::fail(),
    }
}

fn to_double(value: &Value) -> Conversion {
    match value {
        // The host float is exactly the double width.
        Value::Float(_) => Conversion::new(Quality::Perfect, ConvertOp::ToDouble),
        Value::Int(_) => Conversion::new(Quality::Good, ConvertOp::ToDouble),
        _ => Conversion::fail(),
    }
}
