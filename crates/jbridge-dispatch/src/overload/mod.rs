//! Overload resolution.
//!
//! Given a name group of foreign signatures and a tuple of host arguments,
//! pick the signature that is meant:
//!
//! 1. Arity is a hard gate: a fixed-arity method matches only its exact
//!    argument count, a variadic method anything from one-less-than-declared
//!    upward.
//! 2. Every surviving candidate has each argument probed through the
//!    conversion catalog; a single [`Quality::Fail`] eliminates it.
//! 3. A variadic candidate whose call leaves exactly one trailing argument is
//!    probed under **both** interpretations - the value as the lone tail
//!    element (with a one-step quality demotion so packing never beats an
//!    equally good fixed match) and the value as the entire pre-built tail
//!    array. Both succeeding marks that candidate internally ambiguous; the
//!    resolution only fails if that candidate also wins.
//! 4. Survivors are ranked by [`ranking::find_best`]: fewer bad-or-worse
//!    argument qualities first, then the higher quality sum; a full tie is
//!    reported as ambiguous, distinct from no-match.
//! 5. A candidate scoring perfect on every argument ends the scan early;
//!    nothing can rank strictly better under this comparator.
//!
//! Zero-argument calls take a fast path: any zero-parameter candidate
//! matches directly; otherwise a single one-parameter variadic candidate
//! matches with a synthesized empty tail, and several such candidates are
//! ambiguous.

pub mod ranking;

use std::sync::Arc;

use jbridge_core::{BridgeError, ClassId, Result, Value, render_args};
use jbridge_registry::{ClassDescriptor, MethodDescriptor, MethodGroup, TypeRegistry};

use crate::convert::{ConversionCatalog, ConvertOp, ProbeCtx, Quality};

pub use ranking::format_signature;

/// Registry and catalog handed through one resolution.
pub struct DispatchCtx<'a> {
    pub registry: &'a TypeRegistry,
    pub catalog: &'a ConversionCatalog,
}

impl<'a> DispatchCtx<'a> {
    /// Probe context for catalog queries.
    pub fn probe_ctx(&self) -> ProbeCtx<'a> {
        ProbeCtx {
            registry: self.registry,
        }
    }
}

/// How the chosen candidate consumes its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallShape {
    /// Fixed arity, one argument per parameter.
    Exact,
    /// Variadic, trailing arguments packed into a fresh tail array.
    VarargPacked,
    /// Variadic, the caller supplied the tail array itself.
    VarargDirect,
    /// Variadic, a lone trailing argument satisfied both interpretations.
    /// Fatal only if this candidate wins the ranking.
    VarargAmbiguous,
}

/// Plan for the variadic tail slot.
#[derive(Debug, Clone)]
pub enum TailPlan {
    /// No tail (fixed-arity method).
    None,
    /// The trailing argument converts to the array parameter directly.
    Direct(ConvertOp),
    /// Convert each trailing argument into a fresh array of the component
    /// type. A zero-length tail still allocates the array: the foreign
    /// signature requires a non-absent argument.
    Packed {
        component: ClassId,
        elems: Vec<ConvertOp>,
    },
}

/// Result of resolving one method against one argument tuple.
#[derive(Debug, Clone)]
pub struct CandidateMatch {
    /// The chosen signature.
    pub method: Arc<MethodDescriptor>,
    /// Per-argument conversion quality, in call order.
    pub qualities: Vec<Quality>,
    /// Conversion plans for the fixed parameter slots, in order.
    pub fixed_ops: Vec<ConvertOp>,
    /// Plan for the tail slot.
    pub tail: TailPlan,
    /// How the arguments map onto the parameters.
    pub shape: CallShape,
}

impl CandidateMatch {
    fn all_perfect(&self) -> bool {
        self.qualities.iter().all(|q| *q == Quality::Perfect)
    }
}

/// Resolve a call against a method group.
///
/// `NoMatch` (no candidate accepts the arguments) and `Ambiguous` (several
/// tie for best) are distinct, user-diagnosable outcomes.
pub fn resolve_overload(
    group: &MethodGroup,
    args: &[Value],
    ctx: &DispatchCtx<'_>,
) -> Result<CandidateMatch> {
    if group.is_empty() {
        return Err(no_match(group, args));
    }
    if args.is_empty() {
        return resolve_zero_args(group, ctx);
    }

    let mut viable = Vec::new();
    for method in group.iter() {
        if let Some(candidate) = match_candidate(method, args, ctx) {
            // A perfect score on every argument cannot be beaten; stop
            // scanning. Dropping this early exit changes nothing but speed.
            if candidate.all_perfect() && candidate.shape != CallShape::VarargAmbiguous {
                return Ok(candidate);
            }
            viable.push(candidate);
        }
    }

    ranking::find_best(viable, group, args, ctx)
}

/// Zero-argument fast path.
fn resolve_zero_args(group: &MethodGroup, ctx: &DispatchCtx<'_>) -> Result<CandidateMatch> {
    if let Some(method) = group.iter().find(|m| !m.variadic && m.params.is_empty()) {
        return Ok(CandidateMatch {
            method: method.clone(),
            qualities: Vec::new(),
            fixed_ops: Vec::new(),
            tail: TailPlan::None,
            shape: CallShape::Exact,
        });
    }

    let eligible: Vec<_> = group
        .iter()
        .filter(|m| m.variadic && m.params.len() == 1)
        .collect();
    match eligible.as_slice() {
        [] => Err(no_match(group, &[])),
        [method] => {
            let component = tail_component(method, ctx)
                .ok_or_else(|| no_match(group, &[]))?;
            Ok(CandidateMatch {
                method: (*method).clone(),
                qualities: Vec::new(),
                fixed_ops: Vec::new(),
                tail: TailPlan::Packed {
                    component,
                    elems: Vec::new(),
                },
                shape: CallShape::VarargPacked,
            })
        }
        several => Err(BridgeError::Ambiguous {
            name: group.name.clone(),
            args: String::new(),
            candidates: several
                .iter()
                .map(|m| format_signature(m, ctx.registry))
                .collect::<Vec<_>>()
                .join(" and "),
        }),
    }
}

/// Probe one candidate against the argument tuple.
fn match_candidate(
    method: &Arc<MethodDescriptor>,
    args: &[Value],
    ctx: &DispatchCtx<'_>,
) -> Option<CandidateMatch> {
    if method.variadic {
        match_variadic(method, args, ctx)
    } else {
        match_fixed(method, args, ctx)
    }
}

fn match_fixed(
    method: &Arc<MethodDescriptor>,
    args: &[Value],
    ctx: &DispatchCtx<'_>,
) -> Option<CandidateMatch> {
    if args.len() != method.params.len() {
        return None;
    }
    let mut qualities = Vec::with_capacity(args.len());
    let mut fixed_ops = Vec::with_capacity(args.len());
    for (arg, &param) in args.iter().zip(&method.params) {
        let (quality, op) = probe_one(arg, param, ctx)?;
        qualities.push(quality);
        fixed_ops.push(op);
    }
    Some(CandidateMatch {
        method: method.clone(),
        qualities,
        fixed_ops,
        tail: TailPlan::None,
        shape: CallShape::Exact,
    })
}

fn match_variadic(
    method: &Arc<MethodDescriptor>,
    args: &[Value],
    ctx: &DispatchCtx<'_>,
) -> Option<CandidateMatch> {
    // A well-formed variadic method always declares the tail array itself.
    let fixed_count = method.params.len().checked_sub(1)?;
    if args.len() < fixed_count {
        return None;
    }

    let mut qualities = Vec::with_capacity(args.len());
    let mut fixed_ops = Vec::with_capacity(fixed_count);
    for (arg, &param) in args.iter().zip(&method.params[..fixed_count]) {
        let (quality, op) = probe_one(arg, param, ctx)?;
        qualities.push(quality);
        fixed_ops.push(op);
    }

    let array_param = method.params[fixed_count];
    let component = tail_component(method, ctx)?;
    let tail_args = &args[fixed_count..];

    match tail_args {
        [] => Some(CandidateMatch {
            method: method.clone(),
            qualities,
            fixed_ops,
            tail: TailPlan::Packed {
                component,
                elems: Vec::new(),
            },
            shape: CallShape::VarargPacked,
        }),
        [lone] => {
            // Both interpretations are tried: the value as the lone tail
            // element (demoted one step) and the value as the whole array.
            let element = probe_one(lone, component, ctx)
                .map(|(q, op)| (q.demote(), op));
            let direct = probe_one(lone, array_param, ctx);
            match (element, direct) {
                (Some((eq, eop)), Some((dq, dop))) => {
                    // Rank by the better interpretation; the conflict is
                    // fatal only if this candidate wins.
                    let (quality, tail) = if dq >= eq {
                        (dq, TailPlan::Direct(dop))
                    } else {
                        (
                            eq,
                            TailPlan::Packed {
                                component,
                                elems: vec![eop],
                            },
                        )
                    };
                    qualities.push(quality);
                    Some(CandidateMatch {
                        method: method.clone(),
                        qualities,
                        fixed_ops,
                        tail,
                        shape: CallShape::VarargAmbiguous,
                    })
                }
                (Some((eq, eop)), None) => {
                    qualities.push(eq);
                    Some(CandidateMatch {
                        method: method.clone(),
                        qualities,
                        fixed_ops,
                        tail: TailPlan::Packed {
                            component,
                            elems: vec![eop],
                        },
                        shape: CallShape::VarargPacked,
                    })
                }
                (None, Some((dq, dop))) => {
                    qualities.push(dq);
                    Some(CandidateMatch {
                        method: method.clone(),
                        qualities,
                        fixed_ops,
                        tail: TailPlan::Direct(dop),
                        shape: CallShape::VarargDirect,
                    })
                }
                (None, None) => None,
            }
        }
        several => {
            // Two or more trailing values force element-wise packing.
            let mut elems = Vec::with_capacity(several.len());
            for arg in several {
                let (quality, op) = probe_one(arg, component, ctx)?;
                qualities.push(quality.demote());
                elems.push(op);
            }
            Some(CandidateMatch {
                method: method.clone(),
                qualities,
                fixed_ops,
                tail: TailPlan::Packed { component, elems },
                shape: CallShape::VarargPacked,
            })
        }
    }
}

/// Probe one (argument, parameter-type) pair; `None` on `Fail`.
fn probe_one(
    arg: &Value,
    param: ClassId,
    ctx: &DispatchCtx<'_>,
) -> Option<(Quality, ConvertOp)> {
    let target: Arc<ClassDescriptor> = ctx.registry.get(param)?;
    let conv = ctx.catalog.best_conversion(arg, &target, &ctx.probe_ctx());
    if conv.quality.is_fail() {
        return None;
    }
    conv.op.map(|op| (conv.quality, op))
}

/// Component type of a variadic method's tail array.
fn tail_component(method: &MethodDescriptor, ctx: &DispatchCtx<'_>) -> Option<ClassId> {
    let array = *method.params.last()?;
    ctx.registry.get(array)?.component()
}

fn no_match(group: &MethodGroup, args: &[Value]) -> BridgeError {
    BridgeError::NoMatch {
        name: group.name.clone(),
        args: render_args(args),
    }
}
