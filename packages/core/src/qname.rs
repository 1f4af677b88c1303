//! Qualified service names.
//!
//! A `QName` identifies a destination by namespace plus local name. Route
//! tables and the service registry are keyed by it, so it is cheap to clone,
//! hashable, and round-trips through the XML-qualified string form
//! `{namespace}local`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Qualified name of a service: namespace URI plus local part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QName {
    namespace: String,
    local: String,
}

impl QName {
    /// Create a qualified name from a namespace and a local part.
    #[must_use]
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local: local.into(),
        }
    }

    /// Namespace URI component.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Local name component.
    #[must_use]
    pub fn local(&self) -> &str {
        &self.local
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}{}", self.namespace, self.local)
    }
}

/// Error parsing a qualified name from its `{namespace}local` string form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid qualified name: {input}")]
pub struct ParseQNameError {
    input: String,
}

impl FromStr for QName {
    type Err = ParseQNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseQNameError {
            input: s.to_string(),
        };
        let rest = s.strip_prefix('{').ok_or_else(invalid)?;
        let (namespace, local) = rest.split_once('}').ok_or_else(invalid)?;
        if namespace.is_empty() || local.is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(namespace, local))
    }
}
