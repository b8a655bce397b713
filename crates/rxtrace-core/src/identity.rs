//! # Identifier Newtypes
//!
//! String-backed identifiers for the three keyed record families. They are
//! stable keys chosen by the caller (`B-1`, `act-alice`, `ALRT-0042`), not
//! generated UUIDs, because batch numbers come printed on the goods.
//!
//! A production batch and the shipment it becomes share one [`BatchId`]: the
//! two phases live in a single identifier space.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Maximum identifier length in characters.
pub const MAX_IDENTIFIER_LEN: usize = 128;

fn validate_identifier(kind: &'static str, raw: String) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyIdentifier { kind });
    }
    let len = trimmed.chars().count();
    if len > MAX_IDENTIFIER_LEN {
        return Err(ValidationError::IdentifierTooLong {
            kind,
            max: MAX_IDENTIFIER_LEN,
            len,
        });
    }
    if trimmed.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::IdentifierCharset {
            kind,
            value: trimmed.to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Identifier of a trackable item: a production batch before it ships and
/// the shipment it becomes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BatchId(String);

/// Identifier of an actor in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActorId(String);

/// Identifier of an externally reported alert.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AlertId(String);

impl BatchId {
    /// Create a validated batch identifier. Surrounding whitespace is trimmed.
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        validate_identifier("batch id", s.into()).map(Self)
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ActorId {
    /// Create a validated actor identifier.
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        validate_identifier("actor id", s.into()).map(Self)
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AlertId {
    /// Create a validated alert identifier.
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        validate_identifier("alert id", s.into()).map(Self)
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BatchId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for ActorId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for AlertId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BatchId> for String {
    fn from(id: BatchId) -> Self {
        id.0
    }
}

impl From<ActorId> for String {
    fn from(id: ActorId) -> Self {
        id.0
    }
}

impl From<AlertId> for String {
    fn from(id: AlertId) -> Self {
        id.0
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for AlertId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for BatchId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::str::FromStr for ActorId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
