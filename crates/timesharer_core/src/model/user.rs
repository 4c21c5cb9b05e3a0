//! User entity.
//!
//! # Invariants
//! - `associated_volunteer_id` is written only by the cross-reference linker;
//!   create clears it and update keeps the stored value.

use crate::model::document::{Document, EntityDetails, EntityKind};
use crate::model::id::DocumentId;
use serde::{Deserialize, Serialize};

pub type User = Document<UserDetails>;

/// Mutable user payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserDetails {
    /// Identifier issued by the external auth provider.
    pub auth_id: String,
    pub assigned_organisations: Vec<DocumentId>,
    pub associated_volunteer_id: Option<DocumentId>,
}

impl UserDetails {
    pub fn with_auth_id(auth_id: impl Into<String>) -> Self {
        Self {
            auth_id: auth_id.into(),
            ..Self::default()
        }
    }
}

impl EntityDetails for UserDetails {
    const KIND: EntityKind = EntityKind::User;

    fn prepare_for_create(&mut self) {
        self.associated_volunteer_id = None;
    }

    fn carry_managed_fields(&mut self, current: &Self) {
        self.associated_volunteer_id = current.associated_volunteer_id.clone();
    }
}
