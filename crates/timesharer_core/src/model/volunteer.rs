//! Volunteer entity.
//!
//! # Invariants
//! - `associated_user_id` is written only by the cross-reference linker;
//!   create clears it and update keeps the stored value.

use crate::model::document::{Document, EntityDetails, EntityKind};
use crate::model::id::DocumentId;
use serde::{Deserialize, Serialize};

pub type Volunteer = Document<VolunteerDetails>;

/// Mutable volunteer payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VolunteerDetails {
    pub name: String,
    /// Free-form date string as supplied by the client.
    pub date_of_birth: String,
    pub town: String,
    /// Unordered skill tags. Duplicates are kept as supplied.
    pub skills: Vec<String>,
    pub assigned_opportunities: Vec<DocumentId>,
    pub orgs_sharing_data_with: Vec<DocumentId>,
    pub associated_user_id: Option<DocumentId>,
    pub opted_in_all_processing: bool,
    pub opted_in_all_marketing: bool,
    pub taking_a_break: bool,
    pub asked_to_delete: bool,
}

impl VolunteerDetails {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl EntityDetails for VolunteerDetails {
    const KIND: EntityKind = EntityKind::Volunteer;

    fn prepare_for_create(&mut self) {
        self.associated_user_id = None;
    }

    fn carry_managed_fields(&mut self, current: &Self) {
        self.associated_user_id = current.associated_user_id.clone();
    }
}
