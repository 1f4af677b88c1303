//! The exchange: one unit of work moving from `Active` to a terminal status.
//!
//! An exchange is created by the caller with a target service and an inbound
//! message, mutated exclusively by the router while in flight, and treated as
//! immutable once `Done` or `Error`. The out-message, fault-message, and error
//! slots are mutually exclusive at a terminal status for one-way exchanges: a
//! fault is a successfully-delivered business error, a technical failure is a
//! failed delivery, and they are never both present.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::failure::ExchangeError;
use crate::message::Message;
use crate::qname::QName;

// ---------------------------------------------------------------------------
// Identity, pattern, status
// ---------------------------------------------------------------------------

/// Opaque identifier, unique per unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeId(Uuid);

impl ExchangeId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Message-exchange pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExchangePattern {
    /// One-way: the caller expects no out-message, only a terminal status.
    InOnly,
    /// Request/response: a successful exchange carries an out-message.
    InOut,
}

/// Exchange lifecycle status. `Active` while in flight; `Done` and `Error`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExchangeStatus {
    Active,
    Done,
    Error,
}

// ---------------------------------------------------------------------------
// Exchange
// ---------------------------------------------------------------------------

/// Unit-of-work envelope carrying a message and a status through routing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exchange {
    id: ExchangeId,
    pattern: ExchangePattern,
    target_service: QName,
    in_message: Message,
    out_message: Option<Message>,
    fault_message: Option<Message>,
    status: ExchangeStatus,
    error: Option<ExchangeError>,
}

impl Exchange {
    fn new(pattern: ExchangePattern, target_service: QName, in_message: Message) -> Self {
        Self {
            id: ExchangeId::generate(),
            pattern,
            target_service,
            in_message,
            out_message: None,
            fault_message: None,
            status: ExchangeStatus::Active,
            error: None,
        }
    }

    /// Create a one-way exchange in `Active` status.
    #[must_use]
    pub fn in_only(target_service: QName, in_message: Message) -> Self {
        Self::new(ExchangePattern::InOnly, target_service, in_message)
    }

    /// Create a request/response exchange in `Active` status.
    #[must_use]
    pub fn in_out(target_service: QName, in_message: Message) -> Self {
        Self::new(ExchangePattern::InOut, target_service, in_message)
    }

    #[must_use]
    pub fn id(&self) -> ExchangeId {
        self.id
    }

    #[must_use]
    pub fn pattern(&self) -> ExchangePattern {
        self.pattern
    }

    #[must_use]
    pub fn target_service(&self) -> &QName {
        &self.target_service
    }

    #[must_use]
    pub fn in_message(&self) -> &Message {
        &self.in_message
    }

    #[must_use]
    pub fn out_message(&self) -> Option<&Message> {
        self.out_message.as_ref()
    }

    #[must_use]
    pub fn fault_message(&self) -> Option<&Message> {
        self.fault_message.as_ref()
    }

    #[must_use]
    pub fn status(&self) -> ExchangeStatus {
        self.status
    }

    #[must_use]
    pub fn error(&self) -> Option<&ExchangeError> {
        self.error.as_ref()
    }

    /// True once the exchange has reached `Done` or `Error`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self.status, ExchangeStatus::Active)
    }

    /// Populate the out-message slot. The fault slot must be empty.
    pub fn set_out_message(&mut self, message: Message) {
        debug_assert!(self.fault_message.is_none(), "out and fault are exclusive");
        self.out_message = Some(message);
    }

    /// Populate the fault slot. The out slot must be empty.
    pub fn set_fault_message(&mut self, message: Message) {
        debug_assert!(self.out_message.is_none(), "out and fault are exclusive");
        self.fault_message = Some(message);
    }

    /// Conclude successfully. Valid only while `Active`.
    pub fn mark_done(&mut self) {
        debug_assert!(!self.is_terminal(), "exchange already terminal");
        self.status = ExchangeStatus::Done;
    }

    /// Conclude with an error. Valid only while `Active`.
    pub fn mark_error(&mut self, error: ExchangeError) {
        debug_assert!(!self.is_terminal(), "exchange already terminal");
        self.status = ExchangeStatus::Error;
        self.error = Some(error);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
