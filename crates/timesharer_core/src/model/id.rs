//! Document identifier and shape validation.
//!
//! # Responsibility
//! - Decide whether a caller-supplied string can be a store document key.
//! - Mint new identifiers for inserted documents.
//!
//! # Invariants
//! - A `DocumentId` always holds 24 lowercase hexadecimal characters.
//! - Validation never fails loudly; malformed input is simply rejected.

use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Returns whether `candidate` has the shape of a native store identifier.
///
/// Accepts upper or lower case hex. Surrounding whitespace is not trimmed.
pub fn is_valid_id(candidate: &str) -> bool {
    ObjectId::parse_str(candidate).is_ok()
}

/// Store-assigned document identifier in canonical (lowercase hex) form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

impl DocumentId {
    /// Parses and canonicalizes a candidate identifier.
    ///
    /// Returns `None` when the candidate fails the shape check.
    pub fn parse(candidate: &str) -> Option<Self> {
        ObjectId::parse_str(candidate)
            .ok()
            .map(|oid| Self(oid.to_hex()))
    }

    /// Mints a fresh identifier for a new document.
    pub fn generate() -> Self {
        Self(ObjectId::new().to_hex())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for DocumentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DocumentId {
    type Error = InvalidDocumentId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or(InvalidDocumentId(value))
    }
}

impl From<DocumentId> for String {
    fn from(value: DocumentId) -> Self {
        value.0
    }
}

/// Raised when a string cannot be converted into a `DocumentId`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDocumentId(pub String);

impl Display for InvalidDocumentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid document id `{}`", self.0)
    }
}

impl std::error::Error for InvalidDocumentId {}
