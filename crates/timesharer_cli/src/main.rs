//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `timesharer_core` linkage and store bootstrap.
//! - Print one record-count summary per collection as JSON lines.
//!
//! Usage: `timesharer_cli [appsettings.json]`. Without a settings file the
//! store is in-memory. Set `TIMESHARER_LOG_DIR` to an absolute path to enable
//! file logging.

use std::process::ExitCode;
use timesharer_core::{
    api, core_version, default_log_level, init_logging, open_store, DatabaseSettings,
    EntityDetails, EntityService, OpportunityDetails, OrganisationDetails,
    SqliteDocumentRepository, Store, UserDetails, VolunteerDetails,
};

const LOG_DIR_ENV: &str = "TIMESHARER_LOG_DIR";

fn main() -> ExitCode {
    println!("timesharer_core version={}", core_version());

    if let Ok(log_dir) = std::env::var(LOG_DIR_ENV) {
        if let Err(err) = init_logging(default_log_level(), &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let settings = match std::env::args().nth(1) {
        Some(path) => match DatabaseSettings::from_json_file(&path) {
            Ok(settings) => settings,
            Err(err) => {
                eprintln!("error: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => DatabaseSettings::in_memory(),
    };

    let store = match open_store(&settings) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let all_ok = [
        print_summary::<VolunteerDetails>(&store),
        print_summary::<OrganisationDetails>(&store),
        print_summary::<OpportunityDetails>(&store),
        print_summary::<UserDetails>(&store),
    ]
    .into_iter()
    .all(|ok| ok);

    if all_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_summary<D: EntityDetails>(store: &Store) -> bool {
    let repo = SqliteDocumentRepository::<D>::new(store);
    let collection = repo.collection().to_string();
    let response = api::list(&EntityService::new(repo));
    let summary = serde_json::json!({
        "collection": collection,
        "kind": D::KIND,
        "success": response.success,
        "message": response.message,
        "numberOfRecordsFound": response.number_of_records_found,
    });
    println!("{summary}");
    response.success
}
