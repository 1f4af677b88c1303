//! Message envelope: opaque content plus headers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// An opaque payload with string headers.
///
/// The router treats messages as immutable once dispatched: redelivery always
/// re-runs the route against a clone of the original inbound message, and
/// steps produce new messages rather than mutating in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    content: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    headers: HashMap<String, String>,
}

impl Message {
    /// Create a message with the given content and no headers.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            headers: HashMap::new(),
        }
    }

    /// Attach a header, consuming and returning the message (builder style).
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Payload content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Header value, if present.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// All headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }
}
