//! Organisation entity.

use crate::model::document::{Document, EntityDetails, EntityKind};
use crate::model::id::DocumentId;
use serde::{Deserialize, Serialize};

pub type Organisation = Document<OrganisationDetails>;

/// Mutable organisation payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrganisationDetails {
    pub name: String,
    pub town: String,
    /// Ids of opportunities this organisation owns.
    pub opportunities: Vec<DocumentId>,
}

impl EntityDetails for OrganisationDetails {
    const KIND: EntityKind = EntityKind::Organisation;
}
