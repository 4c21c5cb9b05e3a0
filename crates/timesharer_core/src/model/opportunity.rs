//! Opportunity entity.

use crate::model::document::{Document, EntityDetails, EntityKind};
use crate::model::id::DocumentId;
use serde::{Deserialize, Serialize};

pub type Opportunity = Document<OpportunityDetails>;

/// Mutable opportunity payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpportunityDetails {
    pub title: String,
    pub town: String,
    /// Whether the opportunity is open for volunteers.
    pub live: bool,
    pub assigned_volunteers: Vec<DocumentId>,
}

impl EntityDetails for OpportunityDetails {
    const KIND: EntityKind = EntityKind::Opportunity;
}
