//! Strong type definitions shared across the clearance crates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier issued by the remote service for a session, a submitted
/// item, or an asynchronous operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceNumber(String);

impl ReferenceNumber {
    /// Wrap a reference number returned by the remote service.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReferenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReferenceNumber {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for ReferenceNumber {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for ReferenceNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Describes which document schema a session accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormCode {
    /// System code, e.g. `FA (3)`.
    pub system_code: String,
    /// Schema version, e.g. `1-0E`.
    pub schema_version: String,
    /// Form value, e.g. `FA`.
    pub value: String,
}

impl FormCode {
    /// Create a form code.
    pub fn new(
        system_code: impl Into<String>,
        schema_version: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            system_code: system_code.into(),
            schema_version: schema_version.into(),
            value: value.into(),
        }
    }

    /// Structured invoice, schema FA(3).
    pub fn fa3() -> Self {
        Self::new("FA (3)", "1-0E", "FA")
    }
}

impl Default for FormCode {
    fn default() -> Self {
        Self::fa3()
    }
}

impl fmt::Display for FormCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.system_code, self.schema_version, self.value)
    }
}
