//! Entity use-case service shared by all four entity kinds.
//!
//! # Responsibility
//! - Validate identifiers before any store access.
//! - Provide list/get/create/update/delete with existence checks.
//! - Apply each kind's managed-field rules on create and update.
//!
//! # Invariants
//! - A malformed id never reaches the adapter.
//! - `update` and `delete` read before they write; a missing document is
//!   `NotFound` and the write path is not touched.
//! - `update` succeeds only when the store confirms a modified document;
//!   `delete` only when exactly one document was removed.
//! - The check-then-write window is not closed here; a document removed in
//!   between surfaces as `WriteNotConfirmed`.

use crate::model::document::{Document, DocumentField, EntityDetails};
use crate::model::id::DocumentId;
use crate::model::opportunity::OpportunityDetails;
use crate::model::organisation::OrganisationDetails;
use crate::model::user::{User, UserDetails};
use crate::model::volunteer::VolunteerDetails;
use crate::repo::document_repo::{DocumentRepository, SqliteDocumentRepository};
use crate::service::error::{ServiceError, ServiceResult};
use log::{debug, error, info, warn};
use std::marker::PhantomData;

pub type VolunteerService<R = SqliteDocumentRepository<VolunteerDetails>> =
    EntityService<VolunteerDetails, R>;
pub type OrganisationService<R = SqliteDocumentRepository<OrganisationDetails>> =
    EntityService<OrganisationDetails, R>;
pub type OpportunityService<R = SqliteDocumentRepository<OpportunityDetails>> =
    EntityService<OpportunityDetails, R>;
pub type UserService<R = SqliteDocumentRepository<UserDetails>> = EntityService<UserDetails, R>;

/// Service facade over one entity collection.
pub struct EntityService<D, R> {
    repo: R,
    _details: PhantomData<fn() -> D>,
}

impl<D: EntityDetails, R: DocumentRepository<D>> EntityService<D, R> {
    /// Creates a service using the provided adapter.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            _details: PhantomData,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Returns every document of this kind. An empty collection is not an error.
    pub fn get_all(&self) -> ServiceResult<Vec<Document<D>>> {
        let kind = D::KIND.as_str();
        match self.repo.list() {
            Ok(documents) => {
                info!(
                    "event=entity_list module=service status=ok kind={} count={}",
                    kind,
                    documents.len()
                );
                Ok(documents)
            }
            Err(err) => {
                error!(
                    "event=entity_list module=service status=error kind={} error={}",
                    kind, err
                );
                Err(err.into())
            }
        }
    }

    /// Gets one document by id.
    pub fn get_by_id(&self, id: &str) -> ServiceResult<Document<D>> {
        let id = parse_id::<D>(id)?;
        find_existing(&self.repo, &id)
    }

    /// Inserts `details` under a store-assigned id and returns the stored document.
    pub fn create(&self, mut details: D) -> ServiceResult<Document<D>> {
        let kind = D::KIND.as_str();
        details.prepare_for_create();
        match self.repo.insert(&details) {
            Ok(document) => {
                info!(
                    "event=entity_create module=service status=ok kind={} id={}",
                    kind, document.id
                );
                Ok(document)
            }
            Err(err) => {
                error!(
                    "event=entity_create module=service status=error kind={} error={}",
                    kind, err
                );
                Err(err.into())
            }
        }
    }

    /// Replaces the whole `details` of an existing document.
    ///
    /// Linker-managed reference fields keep their stored values.
    pub fn update(&self, id: &str, mut details: D) -> ServiceResult<Document<D>> {
        let kind = D::KIND.as_str();
        let id = parse_id::<D>(id)?;
        let current = find_existing(&self.repo, &id)?;
        details.carry_managed_fields(&current.details);

        let outcome = self.repo.replace_details(&id, &details).map_err(|err| {
            error!(
                "event=entity_update module=service status=error kind={} id={} error={}",
                kind, id, err
            );
            ServiceError::from(err)
        })?;

        match outcome.updated_at {
            Some(updated_at) if outcome.is_modified() => {
                info!(
                    "event=entity_update module=service status=ok kind={} id={}",
                    kind, id
                );
                Ok(Document {
                    id,
                    updated_at,
                    details,
                })
            }
            _ => {
                warn!(
                    "event=entity_update module=service status=error kind={} id={} error_code=write_not_confirmed",
                    kind, id
                );
                Err(ServiceError::WriteNotConfirmed {
                    kind: D::KIND,
                    id,
                    operation: "update",
                })
            }
        }
    }

    /// Permanently removes an existing document.
    pub fn delete(&self, id: &str) -> ServiceResult<()> {
        let kind = D::KIND.as_str();
        let id = parse_id::<D>(id)?;
        find_existing(&self.repo, &id)?;

        let removed = self.repo.delete_by_id(&id).map_err(|err| {
            error!(
                "event=entity_delete module=service status=error kind={} id={} error={}",
                kind, id, err
            );
            ServiceError::from(err)
        })?;

        if removed != 1 {
            warn!(
                "event=entity_delete module=service status=error kind={} id={} removed={} error_code=write_not_confirmed",
                kind, id, removed
            );
            return Err(ServiceError::WriteNotConfirmed {
                kind: D::KIND,
                id,
                operation: "delete",
            });
        }

        info!(
            "event=entity_delete module=service status=ok kind={} id={}",
            kind, id
        );
        Ok(())
    }
}

impl<R: DocumentRepository<UserDetails>> EntityService<UserDetails, R> {
    /// Gets the user registered under an external-auth identifier.
    pub fn find_by_auth_id(&self, auth_id: &str) -> ServiceResult<User> {
        let found = self.repo.find_one_by(DocumentField::AuthId, auth_id)?;
        found.ok_or_else(|| {
            debug!("event=user_find_by_auth module=service status=miss");
            ServiceError::missing(UserDetails::KIND, auth_id)
        })
    }
}

/// Validates and canonicalizes an incoming id for entity kind `D`.
pub(crate) fn parse_id<D: EntityDetails>(id: &str) -> ServiceResult<DocumentId> {
    DocumentId::parse(id).ok_or_else(|| {
        debug!(
            "event=id_parse module=service status=error kind={} error_code=invalid_identifier",
            D::KIND.as_str()
        );
        ServiceError::invalid_id(D::KIND, id)
    })
}

/// Loads a document that must exist.
pub(crate) fn find_existing<D: EntityDetails, R: DocumentRepository<D>>(
    repo: &R,
    id: &DocumentId,
) -> ServiceResult<Document<D>> {
    match repo.find_by_id(id) {
        Ok(Some(document)) => Ok(document),
        Ok(None) => {
            debug!(
                "event=entity_get module=service status=miss kind={} id={}",
                D::KIND.as_str(),
                id
            );
            Err(ServiceError::missing(D::KIND, id.as_str()))
        }
        Err(err) => {
            error!(
                "event=entity_get module=service status=error kind={} id={} error={}",
                D::KIND.as_str(),
                id,
                err
            );
            Err(err.into())
        }
    }
}
