mod common;

use common::{memory_store, CountingRepository, Fault, FaultyRepository};
use timesharer_core::{
    DbError, DocumentId, EntityService, LookupMiss, OpportunityDetails, OrganisationDetails,
    OrganisationService, ServiceError, SqliteDocumentRepository, UserDetails, UserService,
    VolunteerDetails, VolunteerService,
};

const MISSING_ID: &str = "5f8d0d55b54764421b7156c9";

fn volunteers(store: &timesharer_core::Store) -> VolunteerService {
    VolunteerService::new(SqliteDocumentRepository::new(store))
}

fn sample_volunteer() -> VolunteerDetails {
    VolunteerDetails {
        name: "Ana".to_string(),
        date_of_birth: "1990-04-01".to_string(),
        town: "Leeds".to_string(),
        skills: vec!["driving".to_string(), "first-aid".to_string(), "driving".to_string()],
        opted_in_all_processing: true,
        ..VolunteerDetails::default()
    }
}

#[test]
fn get_all_on_empty_collection_returns_empty_list() {
    let store = memory_store();
    let service = volunteers(&store);

    let all = service.get_all().unwrap();
    assert!(all.is_empty());
}

#[test]
fn create_then_get_returns_same_details_with_id_and_timestamp() {
    let store = memory_store();
    let service = volunteers(&store);

    let created = service.create(sample_volunteer()).unwrap();
    let loaded = service.get_by_id(created.id.as_str()).unwrap();

    assert_eq!(loaded.id, created.id);
    assert_eq!(loaded.details, sample_volunteer());
    assert!(loaded.updated_at > 0);
    assert_eq!(loaded.updated_at, created.updated_at);
}

#[test]
fn get_by_id_accepts_upper_case_hex() {
    let store = memory_store();
    let service = volunteers(&store);

    let created = service.create(sample_volunteer()).unwrap();
    let upper = created.id.as_str().to_ascii_uppercase();

    assert_eq!(service.get_by_id(&upper).unwrap().id, created.id);
}

#[test]
fn create_ignores_link_fields_supplied_by_caller() {
    let store = memory_store();
    let service = volunteers(&store);

    let mut details = sample_volunteer();
    details.associated_user_id = Some(DocumentId::generate());
    let created = service.create(details).unwrap();

    assert_eq!(created.details.associated_user_id, None);
    let loaded = service.get_by_id(created.id.as_str()).unwrap();
    assert_eq!(loaded.details.associated_user_id, None);
}

#[test]
fn get_all_returns_documents_in_insert_order() {
    let store = memory_store();
    let service = OrganisationService::new(SqliteDocumentRepository::new(&store));

    let first = service
        .create(OrganisationDetails {
            name: "Food Bank".to_string(),
            ..OrganisationDetails::default()
        })
        .unwrap();
    let second = service
        .create(OrganisationDetails {
            name: "Library".to_string(),
            ..OrganisationDetails::default()
        })
        .unwrap();

    let ids: Vec<_> = service.get_all().unwrap().into_iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
}

#[test]
fn collections_are_isolated_per_entity_kind() {
    let store = memory_store();
    let volunteer_service = volunteers(&store);
    let organisation_service = OrganisationService::new(SqliteDocumentRepository::new(&store));

    let volunteer = volunteer_service.create(sample_volunteer()).unwrap();

    assert!(organisation_service.get_all().unwrap().is_empty());
    let err = organisation_service
        .get_by_id(volunteer.id.as_str())
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn update_replaces_details_and_advances_timestamp() {
    let store = memory_store();
    let service = volunteers(&store);
    let created = service.create(sample_volunteer()).unwrap();

    let replacement = VolunteerDetails {
        name: "Ana Maria".to_string(),
        town: "York".to_string(),
        taking_a_break: true,
        ..VolunteerDetails::default()
    };
    let updated = service
        .update(created.id.as_str(), replacement.clone())
        .unwrap();
    let loaded = service.get_by_id(created.id.as_str()).unwrap();

    assert_eq!(loaded.details, replacement);
    assert!(loaded.details.skills.is_empty(), "update must not merge fields");
    assert!(loaded.updated_at > created.updated_at);
    assert_eq!(loaded.updated_at, updated.updated_at);
}

#[test]
fn repeated_updates_strictly_increase_timestamp() {
    let store = memory_store();
    let service = volunteers(&store);
    let created = service.create(sample_volunteer()).unwrap();

    let mut previous = created.updated_at;
    for _ in 0..5 {
        let updated = service
            .update(created.id.as_str(), sample_volunteer())
            .unwrap();
        assert!(updated.updated_at > previous);
        previous = updated.updated_at;
    }
}

#[test]
fn update_keeps_stored_user_link() {
    let store = memory_store();
    let service = volunteers(&store);
    let created = service.create(sample_volunteer()).unwrap();
    let user_id = DocumentId::generate();
    store
        .with_connection(|conn| {
            conn.execute(
                "UPDATE documents SET details = json_set(details, '$.associatedUserId', ?1) WHERE id = ?2;",
                [user_id.as_str(), created.id.as_str()],
            )
            .map_err(DbError::from)
        })
        .unwrap();

    let mut replacement = sample_volunteer();
    replacement.associated_user_id = None;
    let updated = service.update(created.id.as_str(), replacement).unwrap();

    assert_eq!(updated.details.associated_user_id, Some(user_id));
}

#[test]
fn update_missing_document_is_not_found_and_skips_write() {
    let store = memory_store();
    let repo = CountingRepository::new(SqliteDocumentRepository::<VolunteerDetails>::new(&store));
    let service = EntityService::new(&repo);

    let err = service.update(MISSING_ID, sample_volunteer()).unwrap_err();

    assert!(matches!(
        err,
        ServiceError::NotFound {
            reason: LookupMiss::NoDocument,
            ..
        }
    ));
    assert_eq!(repo.calls(), 1);
    assert_eq!(repo.writes(), 0);
}

#[test]
fn malformed_ids_never_reach_the_store() {
    let store = memory_store();
    let repo = CountingRepository::new(SqliteDocumentRepository::<VolunteerDetails>::new(&store));
    let service: VolunteerService<_> = EntityService::new(&repo);

    for id in ["not-a-valid-id", "", "123", "5f8d0d55b54764421b7156cz"] {
        let get_err = service.get_by_id(id).unwrap_err();
        let update_err = service.update(id, sample_volunteer()).unwrap_err();
        let delete_err = service.delete(id).unwrap_err();
        for err in [get_err, update_err, delete_err] {
            assert!(matches!(
                err,
                ServiceError::NotFound {
                    reason: LookupMiss::InvalidIdentifier,
                    ..
                }
            ));
        }
    }

    assert_eq!(repo.calls(), 0);
}

#[test]
fn update_with_zero_modified_is_write_not_confirmed() {
    let store = memory_store();
    let inner = SqliteDocumentRepository::<OpportunityDetails>::new(&store);
    let seed = EntityService::new(&inner)
        .create(OpportunityDetails {
            title: "Litter pick".to_string(),
            ..OpportunityDetails::default()
        })
        .unwrap();
    let service = EntityService::new(FaultyRepository::new(&inner, Fault::ZeroModified));

    let err = service
        .update(seed.id.as_str(), OpportunityDetails::default())
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::WriteNotConfirmed {
            operation: "update",
            ..
        }
    ));
    let unchanged = EntityService::<OpportunityDetails, _>::new(&inner)
        .get_by_id(seed.id.as_str())
        .unwrap();
    assert_eq!(unchanged.updated_at, seed.updated_at);
}

#[test]
fn store_failure_on_update_is_surfaced() {
    let store = memory_store();
    let inner = SqliteDocumentRepository::<VolunteerDetails>::new(&store);
    let seed = EntityService::new(&inner).create(sample_volunteer()).unwrap();
    let service = EntityService::new(FaultyRepository::new(&inner, Fault::StoreError));

    let err = service
        .update(seed.id.as_str(), sample_volunteer())
        .unwrap_err();

    assert!(matches!(err, ServiceError::StoreUnavailable(_)));
    assert_eq!(err.code(), "store_unavailable");
}

#[test]
fn corrupted_stored_row_is_data_integrity_not_store_failure() {
    let store = memory_store();
    let service = volunteers(&store);
    let id = DocumentId::generate();
    store
        .with_connection(|conn| {
            conn.execute(
                "INSERT INTO documents (collection, id, details, updated_at)
                 VALUES ('Volunteers', ?1, '{\"skills\": \"driving\"}', 1);",
                [id.as_str()],
            )
            .map_err(DbError::from)
        })
        .unwrap();

    let list_err = service.get_all().unwrap_err();
    let get_err = service.get_by_id(id.as_str()).unwrap_err();

    for err in [list_err, get_err] {
        assert!(matches!(err, ServiceError::DataIntegrity(_)));
        assert_eq!(err.code(), "data_integrity");
    }
}

#[test]
fn delete_then_get_is_not_found_and_second_delete_is_not_found() {
    let store = memory_store();
    let service = volunteers(&store);
    let created = service.create(sample_volunteer()).unwrap();

    service.delete(created.id.as_str()).unwrap();

    assert!(service.get_by_id(created.id.as_str()).unwrap_err().is_not_found());
    let second = service.delete(created.id.as_str()).unwrap_err();
    assert!(second.is_not_found());
    assert!(!matches!(second, ServiceError::WriteNotConfirmed { .. }));
}

#[test]
fn delete_with_zero_removed_is_write_not_confirmed() {
    let store = memory_store();
    let inner = SqliteDocumentRepository::<VolunteerDetails>::new(&store);
    let seed = EntityService::new(&inner).create(sample_volunteer()).unwrap();
    let service = EntityService::new(FaultyRepository::new(&inner, Fault::ZeroModified));

    let err = service.delete(seed.id.as_str()).unwrap_err();

    assert!(matches!(
        err,
        ServiceError::WriteNotConfirmed {
            operation: "delete",
            ..
        }
    ));
}

#[test]
fn find_user_by_auth_id() {
    let store = memory_store();
    let service = UserService::new(SqliteDocumentRepository::new(&store));
    service
        .create(UserDetails::with_auth_id("auth0|other"))
        .unwrap();
    let created = service
        .create(UserDetails::with_auth_id("auth0|ana"))
        .unwrap();

    let found = service.find_by_auth_id("auth0|ana").unwrap();
    assert_eq!(found.id, created.id);

    let err = service.find_by_auth_id("auth0|nobody").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn services_share_one_store_across_threads() {
    let store = memory_store();
    let handles: Vec<_> = (0..4)
        .map(|index| {
            let store = store.clone();
            std::thread::spawn(move || {
                let service = volunteers(&store);
                service
                    .create(VolunteerDetails::named(format!("volunteer-{index}")))
                    .unwrap()
                    .id
            })
        })
        .collect();

    let mut ids: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();
    ids.sort();
    ids.dedup();

    assert_eq!(ids.len(), 4);
    assert_eq!(volunteers(&store).get_all().unwrap().len(), 4);
}
