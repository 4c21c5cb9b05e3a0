//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate adapter calls into entity-level operations.
//! - Own identifier validation and read-before-write existence checks.
//! - Maintain cross-entity identifier references.

pub mod entity_service;
pub mod error;
pub mod linker;
