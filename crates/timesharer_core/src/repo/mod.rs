//! Document store adapters.
//!
//! # Responsibility
//! - Define the per-collection data access contract.
//! - Isolate SQLite and JSON path details from service orchestration.
//!
//! # Invariants
//! - Adapter APIs distinguish "no record" (`Ok(None)` / zero counts) from
//!   store failures (`Err`).

pub mod document_repo;
