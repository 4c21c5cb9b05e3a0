//! Service-level failure taxonomy.
//!
//! # Invariants
//! - Malformed identifiers surface as `NotFound` with
//!   `LookupMiss::InvalidIdentifier`; they never reach the store.
//! - Store failures are always surfaced, never folded into `NotFound`.
//! - Undecodable stored data is `DataIntegrity`, not `StoreUnavailable`.

use crate::model::document::EntityKind;
use crate::model::id::DocumentId;
use crate::repo::document_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Why a lookup produced no document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMiss {
    /// Identifier failed the shape check; the store was not contacted.
    InvalidIdentifier,
    /// Identifier is well formed but no document matches.
    NoDocument,
}

/// Errors from entity services and the cross-reference linker.
#[derive(Debug)]
pub enum ServiceError {
    NotFound {
        kind: EntityKind,
        id: String,
        reason: LookupMiss,
    },
    /// Store connectivity or protocol failure.
    StoreUnavailable(RepoError),
    /// Stored data could not be decoded, or a request named a field the
    /// entity kind does not carry.
    DataIntegrity(RepoError),
    /// Store accepted the write but reported no document changed.
    WriteNotConfirmed {
        kind: EntityKind,
        id: DocumentId,
        operation: &'static str,
    },
    /// The user side of a user/volunteer link was written, the volunteer side was not.
    PartialLinkFailure {
        volunteer_id: DocumentId,
        user_id: DocumentId,
        /// Whether the user side was restored to its previous value.
        compensated: bool,
        cause: Box<ServiceError>,
    },
}

impl ServiceError {
    pub(crate) fn invalid_id(kind: EntityKind, id: &str) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
            reason: LookupMiss::InvalidIdentifier,
        }
    }

    pub(crate) fn missing(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
            reason: LookupMiss::NoDocument,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound {
                reason: LookupMiss::InvalidIdentifier,
                ..
            } => "invalid_identifier",
            Self::NotFound { .. } => "not_found",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::DataIntegrity(_) => "data_integrity",
            Self::WriteNotConfirmed { .. } => "write_not_confirmed",
            Self::PartialLinkFailure { .. } => "partial_link_failure",
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound {
                kind,
                id,
                reason: LookupMiss::InvalidIdentifier,
            } => write!(f, "{} id `{id}` could not be parsed", kind.label()),
            Self::NotFound { kind, id, .. } => {
                write!(f, "{} with id {id} does not exist", kind.label())
            }
            Self::StoreUnavailable(err) => write!(f, "store unavailable: {err}"),
            Self::DataIntegrity(err) => write!(f, "data integrity failure: {err}"),
            Self::WriteNotConfirmed {
                kind,
                id,
                operation,
            } => write!(
                f,
                "{operation} of {} {id} completed but no record was modified",
                kind.label()
            ),
            Self::PartialLinkFailure {
                volunteer_id,
                user_id,
                compensated,
                cause,
            } => {
                let state = if *compensated {
                    "user link rolled back"
                } else {
                    "user link left one-sided"
                };
                write!(
                    f,
                    "linking volunteer {volunteer_id} and user {user_id} failed part way ({state}): {cause}"
                )
            }
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StoreUnavailable(err) | Self::DataIntegrity(err) => Some(err),
            Self::PartialLinkFailure { cause, .. } => Some(cause.as_ref()),
            Self::NotFound { .. } | Self::WriteNotConfirmed { .. } => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Db(_) => Self::StoreUnavailable(value),
            RepoError::Serialization(_)
            | RepoError::InvalidData(_)
            | RepoError::UnsupportedField { .. } => Self::DataIntegrity(value),
        }
    }
}
