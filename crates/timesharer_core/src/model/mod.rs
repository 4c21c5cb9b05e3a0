//! Domain model for the volunteering platform.
//!
//! # Responsibility
//! - Define the document shape shared by volunteers, organisations,
//!   opportunities and users.
//! - Own identifier shape validation.
//!
//! # Invariants
//! - Relationships are identifier references, never ownership.
//! - Deletion is permanent; there are no tombstones.

pub mod document;
pub mod id;
pub mod opportunity;
pub mod organisation;
pub mod user;
pub mod volunteer;
