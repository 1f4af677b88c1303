//! Switchyard Core — qualified names, message envelopes, exchanges, and the
//! failure taxonomy shared by every routing front-end and engine.

pub mod exchange;
pub mod failure;
pub mod message;
pub mod qname;

pub use exchange::{Exchange, ExchangeId, ExchangePattern, ExchangeStatus};
pub use failure::{ExchangeError, Failure, FailureKind};
pub use message::Message;
pub use qname::QName;
