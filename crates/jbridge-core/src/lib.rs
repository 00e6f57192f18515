//! Core value model and collaborator interfaces for the jbridge runtime.
//!
//! This crate holds the pieces every other jbridge crate builds on:
//!
//! - [`Value`] - the dynamic host-side value a caller hands to the bridge
//! - [`RawValue`] - the prepared native call slot the JVM consumes
//! - [`PrimitiveKind`] - the nine JVM primitive kinds with their exact limits
//! - [`ClassId`] - deterministic 64-bit class identity hashes
//! - [`BridgeError`] - the unified error taxonomy
//! - the [`vm`] module - traits for the external collaborators (reflection
//!   reads, native invocation, handle lifetime, host-lock bracketing)
//!
//! Nothing in this crate talks to a real JVM; the native side is reached only
//! through the trait objects in [`vm`].

mod class_id;
mod error;
mod handle;
mod primitive;
mod raw;
mod value;
pub mod vm;

pub use class_id::{ClassId, array_name_of, hash_constants};
pub use error::{BridgeError, Result};
pub use handle::Handle;
pub use primitive::{PrimitiveKind, limits};
pub use raw::RawValue;
pub use value::{Buffer, ObjectRef, Value, ValueKind, render_args};
