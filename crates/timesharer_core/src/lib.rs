//! Entity service layer for the TimeSharer volunteering platform.
//! This crate is the single source of truth for identifier validation and
//! cross-entity reference consistency.

pub mod api;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod response;
pub mod service;

pub use config::{ConfigError, DatabaseSettings};
pub use db::{open_store, DbError, Store};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::document::{Document, DocumentField, EntityDetails, EntityKind};
pub use model::id::{is_valid_id, DocumentId};
pub use model::opportunity::{Opportunity, OpportunityDetails};
pub use model::organisation::{Organisation, OrganisationDetails};
pub use model::user::{User, UserDetails};
pub use model::volunteer::{Volunteer, VolunteerDetails};
pub use repo::document_repo::{
    DocumentRepository, RepoError, RepoResult, SqliteDocumentRepository, WriteOutcome,
};
pub use response::Response;
pub use service::entity_service::{
    EntityService, OpportunityService, OrganisationService, UserService, VolunteerService,
};
pub use service::error::{LookupMiss, ServiceError, ServiceResult};
pub use service::linker::{
    LinkRepair, ListChange, ReferenceLinker, SqliteReferenceLinker, UserVolunteerLink,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
