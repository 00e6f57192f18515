//! Ranked value conversion.
//!
//! Every argument of every call goes through [`ConversionCatalog::best_conversion`]:
//! given one host value and one target class, report how good the best
//! available conversion is (on the five-point [`Quality`] scale) and the plan
//! that performs it. The overload resolver ranks whole candidate signatures
//! by these qualities; the marshaller executes the plans.
//!
//! Two paths:
//!
//! - **primitive path** - the target is one of the primitive kinds; a small
//!   fixed dispatch performs width-checked numeric/character narrowing. An
//!   out-of-range integral degrades to [`Quality::Bad`] with a plan that
//!   raises [`jbridge_core::BridgeError::Overflow`] when executed, never a
//!   silent truncation.
//! - **object path** - the target is a reference type; the built-in rules in
//!   [`object`] are consulted in priority order, then every registered custom
//!   rule in registration order, keeping the best probe. The walk stops on a
//!   [`Quality::Perfect`] probe because nothing can beat it; removing that
//!   early exit changes nothing but speed.
//!
//! Custom rules are appended at runtime through
//! [`ConversionCatalog::register_rule`]. The list is append-only and
//! built-ins come first, so a custom rule displaces a built-in only by
//! reporting a strictly higher quality. Probe decisions are never cached;
//! only class descriptors are.

pub mod object;
pub mod primitive;

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use jbridge_core::vm::{FieldId, Vm};
use jbridge_core::{ClassId, PrimitiveKind, RawValue, Result, Value, ValueKind};
use jbridge_registry::{ClassDescriptor, TypeRegistry};

/// How good one value-to-type conversion is.
///
/// Total order; `Fail` means the conversion is impossible, `Perfect` means
/// the value already has the exact representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quality {
    Fail,
    Bad,
    Good,
    Great,
    Perfect,
}

impl Quality {
    /// Whether this is the impossible conversion.
    pub fn is_fail(self) -> bool {
        self == Quality::Fail
    }

    /// Numeric score for list ranking (`Fail` = 0 .. `Perfect` = 4).
    pub fn score(self) -> u32 {
        match self {
            Quality::Fail => 0,
            Quality::Bad => 1,
            Quality::Good => 2,
            Quality::Great => 3,
            Quality::Perfect => 4,
        }
    }

    /// One step down the scale, floored at `Bad`.
    ///
    /// Used as the variadic-element penalty: packing a lone argument into a
    /// variadic tail must never beat an equally good fixed-parameter match.
    /// The step size is a tunable heuristic, not a contract.
    pub fn demote(self) -> Quality {
        match self {
            Quality::Perfect => Quality::Great,
            Quality::Great => Quality::Good,
            Quality::Good | Quality::Bad => Quality::Bad,
            Quality::Fail => Quality::Fail,
        }
    }
}

/// A conversion closure registered by a custom rule.
pub type CustomConvertFn = dyn Fn(&Value, &dyn Vm) -> Result<RawValue> + Send + Sync;

/// The plan for converting one value into one native slot.
///
/// Plans are tagged variants rather than boxed closures so the rule set stays
/// an open, linearly consulted list; only runtime-registered rules carry a
/// closure.
#[derive(Clone)]
pub enum ConvertOp {
    // Primitive-path plans, one per target kind.
    ToBool,
    ToByte,
    ToShort,
    ToInt,
    ToLong,
    ToChar,
    ToFloat,
    ToDouble,
    /// Overflow marker: executing it always raises
    /// [`jbridge_core::BridgeError::Overflow`] for the given target kind.
    Overflow(PrimitiveKind),

    // Object-path plans.
    /// The null reference.
    NullRef,
    /// Pass the value's existing handle through (borrowed, never released by
    /// the marshaller).
    PassHandle,
    /// Intern host text as a foreign string.
    NewString,
    /// Box the value as the wrapper object of the given kind.
    BoxPrimitive(PrimitiveKind),
    /// Fetch an enum constant by name from its declaring class.
    EnumConstant {
        /// The enum class.
        class: ClassId,
        /// The constant's static field.
        field: FieldId,
    },
    /// Copy a byte sequence into a fresh `byte[]`.
    ByteArray,
    /// Copy a fixed-width memory view into the matching primitive array.
    BufferArray(PrimitiveKind),
    /// A registered rule's conversion closure.
    Custom(Arc<CustomConvertFn>),
}

impl fmt::Debug for ConvertOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertOp::ToBool => write!(f, "ToBool"),
            ConvertOp::ToByte => write!(f, "ToByte"),
            ConvertOp::ToShort => write!(f, "ToShort"),
            ConvertOp::ToInt => write!(f, "ToInt"),
            ConvertOp::ToLong => write!(f, "ToLong"),
            ConvertOp::ToChar => write!(f, "ToChar"),
            ConvertOp::ToFloat => write!(f, "ToFloat"),
            ConvertOp::ToDouble => write!(f, "ToDouble"),
            ConvertOp::Overflow(k) => write!(f, "Overflow({})", k.java_name()),
            ConvertOp::NullRef => write!(f, "NullRef"),
            ConvertOp::PassHandle => write!(f, "PassHandle"),
            ConvertOp::NewString => write!(f, "NewString"),
            ConvertOp::BoxPrimitive(k) => write!(f, "BoxPrimitive({})", k.java_name()),
            ConvertOp::EnumConstant { class, field } => {
                write!(f, "EnumConstant({class}, {})", field.0)
            }
            ConvertOp::ByteArray => write!(f, "ByteArray"),
            ConvertOp::BufferArray(k) => write!(f, "BufferArray({})", k.java_name()),
            ConvertOp::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Result of probing one (value, target) pair.
#[derive(Debug, Clone)]
pub struct Conversion {
    /// How good the conversion is; `Fail` means impossible.
    pub quality: Quality,
    /// The plan; absent exactly when the quality is `Fail`.
    pub op: Option<ConvertOp>,
}

impl Conversion {
    /// The impossible conversion.
    pub fn fail() -> Self {
        Conversion {
            quality: Quality::Fail,
            op: None,
        }
    }

    /// A viable conversion.
    pub fn new(quality: Quality, op: ConvertOp) -> Self {
        Conversion {
            quality,
            op: Some(op),
        }
    }
}

/// Source-value filter a custom rule declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFilter {
    /// Probe every value.
    Any,
    /// Probe only values of this kind.
    Kind(ValueKind),
}

impl SourceFilter {
    fn admits(self, value: &Value) -> bool {
        match self {
            SourceFilter::Any => true,
            SourceFilter::Kind(k) => value.kind() == k,
        }
    }
}

/// Target-type filter a custom rule declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFilter {
    /// Probe every reference target.
    Any,
    /// Probe only this exact target class.
    Class(ClassId),
}

impl TargetFilter {
    fn admits(self, target: &ClassDescriptor) -> bool {
        match self {
            TargetFilter::Any => true,
            TargetFilter::Class(id) => target.id() == id,
        }
    }
}

/// A custom rule's probe: quality plus the conversion closure, or `None` for
/// no opinion.
pub type ProbeFn =
    dyn Fn(&Value, &ClassDescriptor) -> Option<(Quality, Arc<CustomConvertFn>)> + Send + Sync;

struct CustomRule {
    source: SourceFilter,
    target: TargetFilter,
    probe: Box<ProbeFn>,
}

/// Context handed to conversion probes.
pub struct ProbeCtx<'a> {
    /// The registry answering subtype and descriptor queries.
    pub registry: &'a TypeRegistry,
}

impl ProbeCtx<'_> {
    /// Whether a value of the class named `source_class` is assignable to
    /// `target`, resolving the source class on demand. An unresolvable
    /// source simply reports not-assignable.
    pub fn assignable_from(&self, source_class: &str, target: &ClassDescriptor) -> bool {
        match self.registry.resolve(source_class) {
            Ok(source) => self.registry.is_assignable(source.id(), target.id()),
            Err(_) => false,
        }
    }
}

/// The process-wide, append-only conversion rule list.
#[derive(Default)]
pub struct ConversionCatalog {
    custom: RwLock<Vec<CustomRule>>,
}

impl ConversionCatalog {
    /// Create a catalog holding only the built-in rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a custom rule. Built-ins stay ahead of it, so it wins only by
    /// reporting a strictly higher quality than every earlier rule.
    ///
    /// The catalog pre-filters on the declared source and target filters;
    /// the probe only ever sees inputs it claimed to handle.
    pub fn register_rule(
        &self,
        source: SourceFilter,
        target: TargetFilter,
        probe: impl Fn(&Value, &ClassDescriptor) -> Option<(Quality, Arc<CustomConvertFn>)>
        + Send
        + Sync
        + 'static,
    ) {
        self.custom.write().push(CustomRule {
            source,
            target,
            probe: Box::new(probe),
        });
    }

    /// Number of registered custom rules.
    pub fn custom_rule_count(&self) -> usize {
        self.custom.read().len()
    }

    /// The best conversion from `value` to `target`.
    ///
    /// Total: always returns a conversion on the five-point scale, with
    /// `Fail` if and only if no rule reports better.
    pub fn best_conversion(
        &self,
        value: &Value,
        target: &ClassDescriptor,
        ctx: &ProbeCtx<'_>,
    ) -> Conversion {
        if let Some(kind) = target.primitive_kind() {
            return primitive::conversion(value, kind);
        }

        let mut best = Conversion::fail();
        for rule in object::BUILTIN_RULES {
            if let Some(found) = rule(value, target, ctx) {
                if found.quality > best.quality {
                    best = found;
                    if best.quality == Quality::Perfect {
                        return best;
                    }
                }
            }
        }
        for rule in self.custom.read().iter() {
            if !rule.source.admits(value) || !rule.target.admits(target) {
                continue;
            }
            if let Some((quality, convert)) = (rule.probe)(value, target) {
                if quality > best.quality {
                    best = Conversion::new(quality, ConvertOp::Custom(convert));
                    if best.quality == Quality::Perfect {
                        return best;
                    }
                }
            }
        }
        best
    }
}
