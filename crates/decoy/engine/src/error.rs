//! Error types for the interception engine

use crate::assertion::AssertionFailure;
use decoy_types::{Fault, InterceptedCall, TypesError};
use thiserror::Error;

/// Engine errors
///
/// Every kind is surfaced to the caller; the engine never retries or masks a
/// failure.
#[derive(Debug, Error)]
pub enum FakeError {
    /// Malformed rule configuration, reported while the rule is built
    #[error("Invalid fake configuration: {reason}")]
    Configuration { reason: String },

    /// A predicate or behaviour failed while a call was being dispatched
    #[error("Dispatch of {call} failed: {reason}")]
    Dispatch { call: String, reason: String },

    /// A repeat expectation was not met
    #[error(transparent)]
    Assertion(#[from] AssertionFailure),

    /// A scope was exited while it was not the current frame
    #[error("Scope discipline violated: {reason}")]
    ScopeDiscipline { reason: String },

    /// A configured fault reached a caller that expected a value
    #[error("Call raised a configured fault: {0}")]
    Faulted(Fault),

    #[error(transparent)]
    Types(#[from] TypesError),
}

impl FakeError {
    /// Configuration error with `reason`.
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Dispatch error for `call`.
    pub fn dispatch(call: &InterceptedCall, reason: impl Into<String>) -> Self {
        Self::Dispatch {
            call: call.to_string(),
            reason: reason.into(),
        }
    }

    pub fn scope_discipline(reason: impl Into<String>) -> Self {
        Self::ScopeDiscipline {
            reason: reason.into(),
        }
    }

    /// Whether this is an unmet repeat expectation.
    pub fn is_assertion(&self) -> bool {
        matches!(self, Self::Assertion(_))
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    pub fn is_dispatch(&self) -> bool {
        matches!(self, Self::Dispatch { .. })
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, FakeError>;
