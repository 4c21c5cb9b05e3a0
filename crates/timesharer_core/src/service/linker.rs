//! Cross-reference linker.
//!
//! # Responsibility
//! - Set identifier references between entities with targeted partial updates.
//! - Keep the user/volunteer pair consistent on both sides, best effort.
//! - Offer a repair path from either side for one-sided or dangling
//!   user/volunteer links.
//!
//! # Invariants
//! - Both documents of a link must exist before anything is written.
//! - The user side is written first; if the volunteer side then fails, the
//!   user side is restored to its previous value and `PartialLinkFailure`
//!   reports whether that restore worked.
//! - List reference updates touch exactly one document.
//! - There is no multi-document transaction; concurrent writers can still
//!   interleave between the existence checks and the writes.

use crate::db::Store;
use crate::model::document::{DocumentField, EntityDetails};
use crate::model::id::DocumentId;
use crate::model::opportunity::OpportunityDetails;
use crate::model::organisation::OrganisationDetails;
use crate::model::user::UserDetails;
use crate::model::volunteer::VolunteerDetails;
use crate::repo::document_repo::{DocumentRepository, SqliteDocumentRepository, WriteOutcome};
use crate::service::entity_service::{find_existing, parse_id};
use crate::service::error::{ServiceError, ServiceResult};
use log::{error, info, warn};
use serde::Serialize;

/// Linker wired to the SQLite collections of one store.
pub type SqliteReferenceLinker = ReferenceLinker<
    SqliteDocumentRepository<VolunteerDetails>,
    SqliteDocumentRepository<UserDetails>,
    SqliteDocumentRepository<OrganisationDetails>,
    SqliteDocumentRepository<OpportunityDetails>,
>;

/// Result of a successful user/volunteer link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserVolunteerLink {
    pub volunteer_id: DocumentId,
    pub user_id: DocumentId,
}

/// Effect of a list reference update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListChange {
    Changed,
    /// Already present on add, or absent on remove.
    Unchanged,
}

/// Outcome of a user/volunteer link repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRepair {
    /// Starting document has no link.
    NoLink,
    /// Both sides already agree.
    InSync,
    /// Counterpart back-reference was rewritten to point at the starting document.
    Repaired,
    /// Counterpart no longer exists; the starting document's reference was cleared.
    ClearedDangling,
}

/// Writes reference fields across the four entity collections.
pub struct ReferenceLinker<VR, UR, OR, PR> {
    volunteers: VR,
    users: UR,
    organisations: OR,
    opportunities: PR,
}

impl SqliteReferenceLinker {
    pub fn from_store(store: &Store) -> Self {
        Self::new(
            SqliteDocumentRepository::new(store),
            SqliteDocumentRepository::new(store),
            SqliteDocumentRepository::new(store),
            SqliteDocumentRepository::new(store),
        )
    }
}

impl<VR, UR, OR, PR> ReferenceLinker<VR, UR, OR, PR>
where
    VR: DocumentRepository<VolunteerDetails>,
    UR: DocumentRepository<UserDetails>,
    OR: DocumentRepository<OrganisationDetails>,
    PR: DocumentRepository<OpportunityDetails>,
{
    pub fn new(volunteers: VR, users: UR, organisations: OR, opportunities: PR) -> Self {
        Self {
            volunteers,
            users,
            organisations,
            opportunities,
        }
    }

    /// Points the user at the volunteer and the volunteer at the user.
    pub fn link_user_and_volunteer(
        &self,
        volunteer_id: &str,
        user_id: &str,
    ) -> ServiceResult<UserVolunteerLink> {
        let volunteer_id = parse_id::<VolunteerDetails>(volunteer_id)?;
        let user_id = parse_id::<UserDetails>(user_id)?;
        let volunteer = find_existing(&self.volunteers, &volunteer_id)?;
        let user = find_existing(&self.users, &user_id)?;

        info!(
            "event=link_user_volunteer module=linker status=start volunteer_id={} user_id={}",
            volunteer_id, user_id
        );

        let previous_volunteer = user.details.associated_volunteer_id.clone();
        let user_write = self.users.set_reference(
            &user_id,
            DocumentField::AssociatedVolunteerId,
            Some(&volunteer_id),
        )?;
        confirm::<UserDetails>(user_write, &user_id, "link")?;

        let volunteer_result = self
            .volunteers
            .set_reference(
                &volunteer_id,
                DocumentField::AssociatedUserId,
                Some(&user_id),
            )
            .map_err(ServiceError::from)
            .and_then(|outcome| confirm::<VolunteerDetails>(outcome, &volunteer_id, "link"));

        if let Err(cause) = volunteer_result {
            let rollback = self.users.set_reference(
                &user_id,
                DocumentField::AssociatedVolunteerId,
                previous_volunteer.as_ref(),
            );
            let compensated = match rollback {
                Ok(outcome) if outcome.is_modified() => true,
                Ok(_) => {
                    error!(
                        "event=link_rollback module=linker status=error user_id={} error_code=write_not_confirmed",
                        user_id
                    );
                    false
                }
                Err(err) => {
                    error!(
                        "event=link_rollback module=linker status=error user_id={} error={}",
                        user_id, err
                    );
                    false
                }
            };
            error!(
                "event=link_user_volunteer module=linker status=error volunteer_id={} user_id={} compensated={} error_code={} error={}",
                volunteer_id,
                user_id,
                compensated,
                cause.code(),
                cause
            );
            return Err(ServiceError::PartialLinkFailure {
                volunteer_id,
                user_id,
                compensated,
                cause: Box::new(cause),
            });
        }

        self.detach_stale_user(
            &volunteer_id,
            volunteer.details.associated_user_id.as_ref(),
            &user_id,
        );
        self.detach_stale_volunteer(&user_id, previous_volunteer.as_ref(), &volunteer_id);

        info!(
            "event=link_user_volunteer module=linker status=ok volunteer_id={} user_id={}",
            volunteer_id, user_id
        );
        Ok(UserVolunteerLink {
            volunteer_id,
            user_id,
        })
    }

    /// Re-applies the user back-reference from the volunteer side.
    pub fn repair_user_volunteer_link(&self, volunteer_id: &str) -> ServiceResult<LinkRepair> {
        let volunteer_id = parse_id::<VolunteerDetails>(volunteer_id)?;
        let volunteer = find_existing(&self.volunteers, &volunteer_id)?;
        let Some(user_id) = volunteer.details.associated_user_id else {
            return Ok(LinkRepair::NoLink);
        };

        let Some(user) = self.users.find_by_id(&user_id)? else {
            let outcome = self.volunteers.set_reference(
                &volunteer_id,
                DocumentField::AssociatedUserId,
                None,
            )?;
            confirm::<VolunteerDetails>(outcome, &volunteer_id, "repair")?;
            warn!(
                "event=link_repair module=linker status=ok volunteer_id={} user_id={} action=cleared_dangling",
                volunteer_id, user_id
            );
            return Ok(LinkRepair::ClearedDangling);
        };

        if user.details.associated_volunteer_id.as_ref() == Some(&volunteer_id) {
            return Ok(LinkRepair::InSync);
        }

        let outcome = self.users.set_reference(
            &user_id,
            DocumentField::AssociatedVolunteerId,
            Some(&volunteer_id),
        )?;
        confirm::<UserDetails>(outcome, &user_id, "repair")?;
        info!(
            "event=link_repair module=linker status=ok volunteer_id={} user_id={} action=repaired",
            volunteer_id, user_id
        );
        Ok(LinkRepair::Repaired)
    }

    /// Re-applies the volunteer back-reference from the user side.
    ///
    /// Clears the user's link when the volunteer it names no longer exists.
    pub fn repair_volunteer_user_link(&self, user_id: &str) -> ServiceResult<LinkRepair> {
        let user_id = parse_id::<UserDetails>(user_id)?;
        let user = find_existing(&self.users, &user_id)?;
        let Some(volunteer_id) = user.details.associated_volunteer_id else {
            return Ok(LinkRepair::NoLink);
        };

        let Some(volunteer) = self.volunteers.find_by_id(&volunteer_id)? else {
            let outcome = self.users.set_reference(
                &user_id,
                DocumentField::AssociatedVolunteerId,
                None,
            )?;
            confirm::<UserDetails>(outcome, &user_id, "repair")?;
            warn!(
                "event=link_repair module=linker status=ok user_id={} volunteer_id={} action=cleared_dangling",
                user_id, volunteer_id
            );
            return Ok(LinkRepair::ClearedDangling);
        };

        if volunteer.details.associated_user_id.as_ref() == Some(&user_id) {
            return Ok(LinkRepair::InSync);
        }

        let outcome = self.volunteers.set_reference(
            &volunteer_id,
            DocumentField::AssociatedUserId,
            Some(&user_id),
        )?;
        confirm::<VolunteerDetails>(outcome, &volunteer_id, "repair")?;
        info!(
            "event=link_repair module=linker status=ok user_id={} volunteer_id={} action=repaired",
            user_id, volunteer_id
        );
        Ok(LinkRepair::Repaired)
    }

    /// Adds an opportunity id to the organisation's owned list.
    pub fn add_opportunity_to_organisation(
        &self,
        organisation_id: &str,
        opportunity_id: &str,
    ) -> ServiceResult<ListChange> {
        let organisation_id = parse_id::<OrganisationDetails>(organisation_id)?;
        let opportunity_id = parse_id::<OpportunityDetails>(opportunity_id)?;
        find_existing(&self.organisations, &organisation_id)?;
        find_existing(&self.opportunities, &opportunity_id)?;
        add_reference(
            &self.organisations,
            &organisation_id,
            DocumentField::Opportunities,
            &opportunity_id,
        )
    }

    /// Removes an opportunity id from the organisation's owned list.
    pub fn remove_opportunity_from_organisation(
        &self,
        organisation_id: &str,
        opportunity_id: &str,
    ) -> ServiceResult<ListChange> {
        let organisation_id = parse_id::<OrganisationDetails>(organisation_id)?;
        let opportunity_id = parse_id::<OpportunityDetails>(opportunity_id)?;
        find_existing(&self.organisations, &organisation_id)?;
        remove_reference(
            &self.organisations,
            &organisation_id,
            DocumentField::Opportunities,
            &opportunity_id,
        )
    }

    /// Adds a volunteer id to the opportunity's assigned list.
    pub fn assign_volunteer_to_opportunity(
        &self,
        opportunity_id: &str,
        volunteer_id: &str,
    ) -> ServiceResult<ListChange> {
        let opportunity_id = parse_id::<OpportunityDetails>(opportunity_id)?;
        let volunteer_id = parse_id::<VolunteerDetails>(volunteer_id)?;
        find_existing(&self.opportunities, &opportunity_id)?;
        find_existing(&self.volunteers, &volunteer_id)?;
        add_reference(
            &self.opportunities,
            &opportunity_id,
            DocumentField::AssignedVolunteers,
            &volunteer_id,
        )
    }

    /// Removes a volunteer id from the opportunity's assigned list.
    pub fn unassign_volunteer_from_opportunity(
        &self,
        opportunity_id: &str,
        volunteer_id: &str,
    ) -> ServiceResult<ListChange> {
        let opportunity_id = parse_id::<OpportunityDetails>(opportunity_id)?;
        let volunteer_id = parse_id::<VolunteerDetails>(volunteer_id)?;
        find_existing(&self.opportunities, &opportunity_id)?;
        remove_reference(
            &self.opportunities,
            &opportunity_id,
            DocumentField::AssignedVolunteers,
            &volunteer_id,
        )
    }

    /// Adds an organisation id to the user's assigned list.
    pub fn assign_organisation_to_user(
        &self,
        user_id: &str,
        organisation_id: &str,
    ) -> ServiceResult<ListChange> {
        let user_id = parse_id::<UserDetails>(user_id)?;
        let organisation_id = parse_id::<OrganisationDetails>(organisation_id)?;
        find_existing(&self.users, &user_id)?;
        find_existing(&self.organisations, &organisation_id)?;
        add_reference(
            &self.users,
            &user_id,
            DocumentField::AssignedOrganisations,
            &organisation_id,
        )
    }

    /// Removes an organisation id from the user's assigned list.
    pub fn unassign_organisation_from_user(
        &self,
        user_id: &str,
        organisation_id: &str,
    ) -> ServiceResult<ListChange> {
        let user_id = parse_id::<UserDetails>(user_id)?;
        let organisation_id = parse_id::<OrganisationDetails>(organisation_id)?;
        find_existing(&self.users, &user_id)?;
        remove_reference(
            &self.users,
            &user_id,
            DocumentField::AssignedOrganisations,
            &organisation_id,
        )
    }

    // Old counterpart of the volunteer still pointing back at it.
    fn detach_stale_user(
        &self,
        volunteer_id: &DocumentId,
        previous_user: Option<&DocumentId>,
        new_user: &DocumentId,
    ) {
        let Some(stale) = previous_user.filter(|previous| *previous != new_user) else {
            return;
        };
        let points_back = matches!(
            self.users.find_by_id(stale),
            Ok(Some(user)) if user.details.associated_volunteer_id.as_ref() == Some(volunteer_id)
        );
        if !points_back {
            return;
        }
        if let Err(err) = self
            .users
            .set_reference(stale, DocumentField::AssociatedVolunteerId, None)
        {
            warn!(
                "event=link_detach module=linker status=error kind=user id={} error={}",
                stale, err
            );
        }
    }

    fn detach_stale_volunteer(
        &self,
        user_id: &DocumentId,
        previous_volunteer: Option<&DocumentId>,
        new_volunteer: &DocumentId,
    ) {
        let Some(stale) = previous_volunteer.filter(|previous| *previous != new_volunteer) else {
            return;
        };
        let points_back = matches!(
            self.volunteers.find_by_id(stale),
            Ok(Some(volunteer)) if volunteer.details.associated_user_id.as_ref() == Some(user_id)
        );
        if !points_back {
            return;
        }
        if let Err(err) = self
            .volunteers
            .set_reference(stale, DocumentField::AssociatedUserId, None)
        {
            warn!(
                "event=link_detach module=linker status=error kind=volunteer id={} error={}",
                stale, err
            );
        }
    }
}

fn confirm<D: EntityDetails>(
    outcome: WriteOutcome,
    id: &DocumentId,
    operation: &'static str,
) -> ServiceResult<()> {
    if outcome.is_modified() {
        return Ok(());
    }
    Err(ServiceError::WriteNotConfirmed {
        kind: D::KIND,
        id: id.clone(),
        operation,
    })
}

fn add_reference<D: EntityDetails, R: DocumentRepository<D>>(
    repo: &R,
    owner: &DocumentId,
    field: DocumentField,
    value: &DocumentId,
) -> ServiceResult<ListChange> {
    let outcome = repo.add_to_list(owner, field, value)?;
    list_change(repo, owner, field, outcome, "add")
}

fn remove_reference<D: EntityDetails, R: DocumentRepository<D>>(
    repo: &R,
    owner: &DocumentId,
    field: DocumentField,
    value: &DocumentId,
) -> ServiceResult<ListChange> {
    let outcome = repo.remove_from_list(owner, field, value)?;
    list_change(repo, owner, field, outcome, "remove")
}

fn list_change<D: EntityDetails, R: DocumentRepository<D>>(
    repo: &R,
    owner: &DocumentId,
    field: DocumentField,
    outcome: WriteOutcome,
    operation: &'static str,
) -> ServiceResult<ListChange> {
    if outcome.is_modified() {
        info!(
            "event=list_reference module=linker status=ok kind={} id={} field={} op={}",
            D::KIND.as_str(),
            owner,
            field.as_str(),
            operation
        );
        return Ok(ListChange::Changed);
    }
    // Zero modified is a no-op only while the owner still exists.
    if repo.find_by_id(owner)?.is_none() {
        return Err(ServiceError::WriteNotConfirmed {
            kind: D::KIND,
            id: owner.clone(),
            operation,
        });
    }
    Ok(ListChange::Unchanged)
}
