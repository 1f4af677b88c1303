//! Failure taxonomy.
//!
//! Two distinct notions of "going wrong" flow through an exchange:
//!
//! - a **fault** is a business-level negative result that the target service
//!   delivered successfully; it is carried as a message payload and surfaced
//!   as [`ExchangeError::Fault`],
//! - a **failure** is a technical error raised while executing the route; it
//!   carries a hierarchical [`FailureKind`] that error handlers match on.
//!
//! Kinds form an explicit hierarchy through dot-separated paths:
//! `technical.invalid-argument` is-a `technical`. Handler matching walks this
//! hierarchy instead of inspecting runtime types, so the set of kinds is open
//! and matching stays a pure string-segment comparison.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::message::Message;
use crate::qname::QName;

// ---------------------------------------------------------------------------
// FailureKind
// ---------------------------------------------------------------------------

/// Hierarchical discriminator for technical failures.
///
/// A kind is a dot-separated path; each segment refines its parent. Depth is
/// the measure of specificity used when several handlers match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FailureKind(String);

impl FailureKind {
    /// Create a kind from a dot-separated path such as
    /// `"technical.invalid-argument"`. Empty segments are collapsed.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let cleaned: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
        Self(cleaned.join("."))
    }

    /// Root kind for all technical failures.
    #[must_use]
    pub fn technical() -> Self {
        Self::new("technical")
    }

    /// A malformed or unacceptable input value.
    #[must_use]
    pub fn invalid_argument() -> Self {
        Self::new("technical.invalid-argument")
    }

    /// An operation attempted in a state that does not permit it.
    #[must_use]
    pub fn invalid_state() -> Self {
        Self::new("technical.invalid-state")
    }

    /// A required value was absent.
    #[must_use]
    pub fn missing_value() -> Self {
        Self::new("technical.missing-value")
    }

    /// Dispatch was cancelled before reaching a natural terminal status.
    #[must_use]
    pub fn cancelled() -> Self {
        Self::new("cancelled")
    }

    /// Path segments, most general first.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Number of segments; deeper kinds are more specific.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// True when `ancestor` is this kind or one of its ancestors.
    ///
    /// Comparison is segment-wise: `technical.invalid-argument` is-a
    /// `technical`, but not an `technical.invalid`.
    #[must_use]
    pub fn is_a(&self, ancestor: &FailureKind) -> bool {
        let mut mine = self.segments();
        ancestor.segments().all(|seg| mine.next() == Some(seg))
    }

    /// Immediate parent kind, or `None` at the root.
    #[must_use]
    pub fn parent(&self) -> Option<FailureKind> {
        self.0.rsplit_once('.').map(|(head, _)| Self(head.to_string()))
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Failure
// ---------------------------------------------------------------------------

/// A technical failure raised by a route step or target service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Failure {
    kind: FailureKind,
    message: String,
}

impl Failure {
    /// Create a failure of the given kind with a human-readable message.
    #[must_use]
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The kind used for handler matching.
    #[must_use]
    pub fn kind(&self) -> &FailureKind {
        &self.kind
    }

    /// Human-readable description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

// ---------------------------------------------------------------------------
// ExchangeError
// ---------------------------------------------------------------------------

/// The error attached to an exchange whose terminal status is `Error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ExchangeError {
    /// The target service delivered a business-level fault. Faults are never
    /// retried and never suppressed by handlers; they always surface here.
    #[error("fault returned by {service}")]
    Fault { service: QName, fault: Message },

    /// A technical failure exhausted its handling options unhandled.
    #[error(transparent)]
    Failed(#[from] Failure),

    /// Dispatch was cancelled (e.g. by a timeout layer) before completing.
    #[error("dispatch cancelled after {timeout_ms}ms")]
    Cancelled { timeout_ms: u64 },
}

impl ExchangeError {
    /// True for fault-kind errors (business failure, delivered successfully).
    #[must_use]
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Fault { .. })
    }

    /// The failure kind, when this error wraps a technical failure.
    #[must_use]
    pub fn failure_kind(&self) -> Option<&FailureKind> {
        match self {
            Self::Failed(failure) => Some(failure.kind()),
            Self::Fault { .. } | Self::Cancelled { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
