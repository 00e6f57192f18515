//! Dispatch engine: conversion catalog, overload resolver, argument
//! marshaller.
//!
//! This crate answers the hard question of the bridge: given a host call with
//! N dynamic [`jbridge_core::Value`]s and a name group of foreign signatures,
//! which signature is meant, how does each argument become the exact native
//! representation that signature requires, and how are transient foreign
//! handles kept leak-free when something fails halfway.
//!
//! ## Pipeline
//!
//! 1. The [`convert`] catalog scores one (value, target-type) pair on the
//!    five-point [`convert::Quality`] scale and plans the conversion.
//! 2. The [`overload`] resolver scans a [`jbridge_registry::MethodGroup`],
//!    gates by arity, probes every argument, handles the variadic dual
//!    interpretation, and ranks surviving candidates.
//! 3. The [`marshal`] module executes the chosen plan into a native argument
//!    buffer, invokes, and converts the result back.

pub mod convert;
pub mod marshal;
pub mod overload;

#[cfg(test)]
pub(crate) mod testvm;

pub use convert::{
    Conversion, ConversionCatalog, ConvertOp, CustomConvertFn, ProbeCtx, Quality, SourceFilter,
    TargetFilter,
};
pub use marshal::{CallOptions, CallTarget, marshal_and_invoke};
pub use overload::{CallShape, CandidateMatch, DispatchCtx, TailPlan, resolve_overload};
