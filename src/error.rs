//! Error taxonomy for the packing engine.
//!
//! Infeasibility is never an error: an item that does not fit lands on an
//! `unfitted` list and a request with no workable candidate yields an empty
//! recommendation plus a diagnostic. `PackError` covers only contract
//! violations (bad input, missing catalog data), resource exhaustion, and
//! internal invariant failures.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured context attached to an error: which entity and which invariant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Offending item id, if known
    pub item_id: Option<String>,
    /// Offending container id, if known
    pub container_id: Option<String>,
    /// Violated invariant, if known (e.g. "overlap", "bounds", "support")
    pub invariant: Option<String>,
}

impl ErrorContext {
    /// Context referencing an item.
    pub fn item(id: impl Into<String>) -> Self {
        Self {
            item_id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Context referencing a container.
    pub fn container(id: impl Into<String>) -> Self {
        Self {
            container_id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Attach the violated invariant name.
    #[must_use]
    pub fn with_invariant(mut self, invariant: impl Into<String>) -> Self {
        self.invariant = Some(invariant.into());
        self
    }
}

/// Errors surfaced by the packing engine.
#[derive(Debug, Clone, Error)]
pub enum PackError {
    /// Negative/zero dimension, negative mass, malformed multiset, negative distance.
    #[error("invalid input: {message}")]
    InvalidInput {
        message: String,
        context: Option<ErrorContext>,
    },

    /// A referenced snapshot lacks a required field and no default applies.
    #[error("catalog snapshot incomplete: {message}")]
    CatalogMissing {
        message: String,
        context: Option<ErrorContext>,
    },

    /// The worker pool queue is at capacity; the caller should retry with backoff.
    #[error("engine overloaded: {in_flight} requests in flight (queue depth {queue_depth})")]
    Overloaded { in_flight: usize, queue_depth: usize },

    /// An invariant violation was detected post-hoc; the offending result is discarded.
    #[error("internal invariant violated: {message}")]
    Internal {
        message: String,
        context: Option<ErrorContext>,
    },
}

impl PackError {
    /// Build an `InvalidInput` error without context.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            context: None,
        }
    }

    /// Build an `InvalidInput` error with structured context.
    pub fn invalid_input_ctx(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::InvalidInput {
            message: message.into(),
            context: Some(context),
        }
    }

    /// Build a `CatalogMissing` error with structured context.
    pub fn catalog_missing(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::CatalogMissing {
            message: message.into(),
            context: Some(context),
        }
    }

    /// Build an `Internal` error without context.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            context: None,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type PackResult<T> = Result<T, PackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_message() {
        let err = PackError::invalid_input("distance_km must be >= 0");
        assert!(err.to_string().contains("distance_km"));
    }

    #[test]
    fn context_builder_sets_fields() {
        let ctx = ErrorContext::item("CRT-9").with_invariant("bounds");
        assert_eq!(ctx.item_id.as_deref(), Some("CRT-9"));
        assert_eq!(ctx.invariant.as_deref(), Some("bounds"));
        assert!(ctx.container_id.is_none());
    }

    #[test]
    fn overloaded_reports_depth() {
        let err = PackError::Overloaded {
            in_flight: 64,
            queue_depth: 64,
        };
        assert!(err.to_string().contains("64"));
    }
}
