//! Envelope-producing entry points for the request layer.
//!
//! # Responsibility
//! - Run one service call per request and translate its outcome into a fresh
//!   `Response`.
//! - Keep outcome messages stable for clients.
//!
//! # Invariants
//! - Every function builds and returns a new envelope; none is cached.
//! - `success` is true only when the service call reported no failure.

use crate::model::document::{Document, EntityDetails};
use crate::model::opportunity::OpportunityDetails;
use crate::model::organisation::OrganisationDetails;
use crate::model::user::UserDetails;
use crate::model::volunteer::VolunteerDetails;
use crate::repo::document_repo::DocumentRepository;
use crate::response::Response;
use crate::service::entity_service::EntityService;
use crate::service::error::ServiceError;
use crate::service::linker::{ReferenceLinker, UserVolunteerLink};

/// Lists every document of one kind.
pub fn list<D: EntityDetails, R: DocumentRepository<D>>(
    service: &EntityService<D, R>,
) -> Response<Document<D>> {
    match service.get_all() {
        Ok(documents) => Response::success("Search completed.", documents),
        Err(err) => Response::failure(format!(
            "Error: could not get list of {} records. {err}",
            D::KIND.label()
        )),
    }
}

/// Gets one document by id.
pub fn get<D: EntityDetails, R: DocumentRepository<D>>(
    service: &EntityService<D, R>,
    id: &str,
) -> Response<Document<D>> {
    let label = D::KIND.label();
    match service.get_by_id(id) {
        Ok(document) => Response::single(format!("Found {label} {}.", document.id), document),
        Err(err) if err.is_not_found() => {
            Response::failure(format!("Error: {label} with id {id} cannot be found."))
        }
        Err(err) => Response::failure(format!("Error: {err}")),
    }
}

/// Creates one document from submitted details.
pub fn create<D: EntityDetails, R: DocumentRepository<D>>(
    service: &EntityService<D, R>,
    details: D,
) -> Response<Document<D>> {
    let label = D::KIND.label();
    match service.create(details) {
        Ok(document) => Response::single(format!("{label} record created"), document),
        Err(err) => Response::failure(format!("Error: could not create {label} record. {err}")),
    }
}

/// Replaces the details of one document.
pub fn update<D: EntityDetails, R: DocumentRepository<D>>(
    service: &EntityService<D, R>,
    id: &str,
    details: D,
) -> Response<Document<D>> {
    let label = D::KIND.label();
    match service.update(id, details) {
        Ok(document) => Response::single(format!("{label} record updated"), document),
        Err(err) if err.is_not_found() => Response::failure(format!("{label} record not found")),
        Err(err @ ServiceError::WriteNotConfirmed { .. }) => {
            Response::failure(format!("Update didn't work. {err}"))
        }
        Err(err) => Response::failure(format!("Error: {err}")),
    }
}

/// Removes one document.
pub fn delete<D: EntityDetails, R: DocumentRepository<D>>(
    service: &EntityService<D, R>,
    id: &str,
) -> Response<Document<D>> {
    let label = D::KIND.label();
    match service.delete(id) {
        Ok(()) => Response::empty(format!("{label} record removed")),
        Err(err) if err.is_not_found() => {
            Response::failure(format!("{label} record not found. Cannot delete."))
        }
        Err(err @ ServiceError::WriteNotConfirmed { .. }) => {
            Response::failure(format!("{label} record not deleted. {err}"))
        }
        Err(err) => Response::failure(format!("Error: {err}")),
    }
}

/// Links a user and a volunteer to each other.
pub fn link_user_and_volunteer<VR, UR, OR, PR>(
    linker: &ReferenceLinker<VR, UR, OR, PR>,
    volunteer_id: &str,
    user_id: &str,
) -> Response<UserVolunteerLink>
where
    VR: DocumentRepository<VolunteerDetails>,
    UR: DocumentRepository<UserDetails>,
    OR: DocumentRepository<OrganisationDetails>,
    PR: DocumentRepository<OpportunityDetails>,
{
    match linker.link_user_and_volunteer(volunteer_id, user_id) {
        Ok(link) => Response::single(
            format!(
                "Volunteer {} linked to User {}",
                link.volunteer_id, link.user_id
            ),
            link,
        ),
        Err(err) if err.is_not_found() => {
            Response::failure(format!("Error. Entity does not exist. {err}"))
        }
        Err(err) => Response::failure(format!("Error: {err}")),
    }
}
