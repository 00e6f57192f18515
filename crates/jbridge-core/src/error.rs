//! Unified error types for the bridge.
//!
//! Every fallible bridge operation returns [`BridgeError`]. The taxonomy is
//! deliberately small and user-diagnosable:
//!
//! - [`BridgeError::NotFound`] - a class or member lookup failed
//! - [`BridgeError::NoMatch`] - no overload accepts the given arguments
//! - [`BridgeError::Ambiguous`] - two or more overloads tie for best
//! - [`BridgeError::Overflow`] - a numeric value does not fit its target width
//! - [`BridgeError::ForeignException`] - the native call itself raised
//!
//! `NoMatch` and `Ambiguous` are distinct so a caller can react differently:
//! an ambiguous call is broken by selecting an overload explicitly, a no-match
//! call by fixing the arguments. The bridge never retries on its own.

use thiserror::Error;

/// Result alias used throughout the bridge crates.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors surfaced by the bridge core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    /// A class or member could not be located in the foreign runtime.
    #[error("not found: {what}")]
    NotFound {
        /// The class or member that failed to resolve.
        what: String,
    },

    /// No candidate signature accepts the given arguments.
    #[error("no overload of {name} accepts ({args})")]
    NoMatch {
        /// Method or constructor name.
        name: String,
        /// Rendered argument tuple.
        args: String,
    },

    /// Two or more candidate signatures tie for best match.
    #[error("call to {name}({args}) is ambiguous between {candidates}")]
    Ambiguous {
        /// Method or constructor name.
        name: String,
        /// Rendered argument tuple.
        args: String,
        /// Rendered tied signatures.
        candidates: String,
    },

    /// A numeric value does not fit the narrowest acceptable target width.
    #[error("value {value} does not fit in {target}")]
    Overflow {
        /// Rendered offending value.
        value: String,
        /// Java name of the target type.
        target: &'static str,
    },

    /// The native call raised a foreign exception.
    #[error("{class}: {message}")]
    ForeignException {
        /// Qualified class name of the foreign throwable.
        class: String,
        /// Foreign exception message.
        message: String,
    },

    /// The registry has been torn down; no further calls are possible.
    #[error("bridge has been shut down")]
    ShutDown,

    /// An internal invariant was violated. Seeing this is a bug in the
    /// bridge, not in the caller.
    #[error("internal error: {message}")]
    Internal {
        /// What went wrong.
        message: String,
    },
}

impl BridgeError {
    /// Convenience constructor for [`BridgeError::NotFound`].
    pub fn not_found(what: impl Into<String>) -> Self {
        BridgeError::NotFound { what: what.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_failing_lookup() {
        let err = BridgeError::not_found("java.lang.Missing");
        assert_eq!(err.to_string(), "not found: java.lang.Missing");
    }

    #[test]
    fn no_match_and_ambiguous_are_distinct() {
        let no_match = BridgeError::NoMatch {
            name: "f".into(),
            args: "int(1)".into(),
        };
        let ambiguous = BridgeError::Ambiguous {
            name: "f".into(),
            args: "int(1)".into(),
            candidates: "f(int) and f(long)".into(),
        };
        assert_ne!(no_match, ambiguous);
        assert!(ambiguous.to_string().contains("ambiguous"));
    }

    #[test]
    fn overflow_names_value_and_target() {
        let err = BridgeError::Overflow {
            value: "int(300)".into(),
            target: "byte",
        };
        assert_eq!(err.to_string(), "value int(300) does not fit in byte");
    }
}
