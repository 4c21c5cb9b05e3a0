//! Shared document shape for every entity kind.
//!
//! # Responsibility
//! - Define the base record (`id`, `updated_at`, `details`).
//! - Describe which targeted fields each entity kind exposes to partial updates.
//!
//! # Invariants
//! - `id` and `updated_at` are never part of `details`.
//! - `updated_at` is owned by the store; callers never set it.

use crate::model::id::DocumentId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// The four entity kinds tracked by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Volunteer,
    Organisation,
    Opportunity,
    User,
}

impl EntityKind {
    /// Display label used in envelope messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Volunteer => "Volunteer",
            Self::Organisation => "Organisation",
            Self::Opportunity => "Opportunity",
            Self::User => "User",
        }
    }

    /// Stable lowercase name used in log events.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Volunteer => "volunteer",
            Self::Organisation => "organisation",
            Self::Opportunity => "opportunity",
            Self::User => "user",
        }
    }
}

/// Mutable payload of one entity kind.
///
/// Implementors are plain value objects. The hooks let each kind protect the
/// reference fields that only the cross-reference linker may write.
pub trait EntityDetails:
    Debug + Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: EntityKind;

    /// Adjusts caller input before the first insert.
    fn prepare_for_create(&mut self) {}

    /// Carries store-managed fields from `current` into a replacement payload.
    fn carry_managed_fields(&mut self, _current: &Self) {}
}

/// Persisted document: identity, timestamp and entity payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document<D> {
    pub id: DocumentId,
    /// Unix epoch milliseconds of the last successful mutation.
    pub updated_at: i64,
    pub details: D,
}

/// Fields addressable by targeted partial updates and lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentField {
    /// Volunteer -> User back-reference.
    AssociatedUserId,
    /// User -> Volunteer back-reference.
    AssociatedVolunteerId,
    /// User external-auth identifier.
    AuthId,
    /// Organisation-owned opportunity ids.
    Opportunities,
    /// Opportunity-assigned volunteer ids.
    AssignedVolunteers,
    /// User-assigned organisation ids.
    AssignedOrganisations,
    /// Volunteer-assigned opportunity ids.
    AssignedOpportunities,
}

/// Value shape stored under a `DocumentField`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    /// Nullable single identifier.
    Reference,
    /// List of identifiers.
    ReferenceList,
    /// Plain string value.
    Text,
}

impl DocumentField {
    pub fn owner(self) -> EntityKind {
        match self {
            Self::AssociatedUserId | Self::AssignedOpportunities => EntityKind::Volunteer,
            Self::AssociatedVolunteerId | Self::AuthId | Self::AssignedOrganisations => {
                EntityKind::User
            }
            Self::Opportunities => EntityKind::Organisation,
            Self::AssignedVolunteers => EntityKind::Opportunity,
        }
    }

    pub fn shape(self) -> FieldShape {
        match self {
            Self::AssociatedUserId | Self::AssociatedVolunteerId => FieldShape::Reference,
            Self::AuthId => FieldShape::Text,
            Self::Opportunities
            | Self::AssignedVolunteers
            | Self::AssignedOrganisations
            | Self::AssignedOpportunities => FieldShape::ReferenceList,
        }
    }

    /// JSON path of the field inside the serialized `details` payload.
    pub fn json_path(self) -> &'static str {
        match self {
            Self::AssociatedUserId => "$.associatedUserId",
            Self::AssociatedVolunteerId => "$.associatedVolunteerId",
            Self::AuthId => "$.authId",
            Self::Opportunities => "$.opportunities",
            Self::AssignedVolunteers => "$.assignedVolunteers",
            Self::AssignedOrganisations => "$.assignedOrganisations",
            Self::AssignedOpportunities => "$.assignedOpportunities",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AssociatedUserId => "associated_user_id",
            Self::AssociatedVolunteerId => "associated_volunteer_id",
            Self::AuthId => "auth_id",
            Self::Opportunities => "opportunities",
            Self::AssignedVolunteers => "assigned_volunteers",
            Self::AssignedOrganisations => "assigned_organisations",
            Self::AssignedOpportunities => "assigned_opportunities",
        }
    }
}
