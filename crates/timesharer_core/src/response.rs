//! Uniform response envelope.
//!
//! # Responsibility
//! - Wrap every service outcome in one success/message/data/count shape.
//!
//! # Invariants
//! - `data` is always a sequence, empty when no records apply.
//! - `number_of_records_found == data.len()`.
//! - Envelopes are plain values built per operation; nothing is shared or
//!   reused between calls.

use serde::{Deserialize, Serialize};

/// Outcome envelope returned for every operation kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response<T> {
    /// Whether the underlying call completed without a reported failure.
    pub success: bool,
    /// Human-readable outcome summary.
    pub message: String,
    pub data: Vec<T>,
    pub number_of_records_found: usize,
}

impl<T> Response<T> {
    pub fn success(message: impl Into<String>, data: Vec<T>) -> Self {
        Self {
            success: true,
            message: message.into(),
            number_of_records_found: data.len(),
            data,
        }
    }

    /// Successful outcome carrying exactly one record.
    pub fn single(message: impl Into<String>, item: T) -> Self {
        Self::success(message, vec![item])
    }

    /// Successful outcome with no records to return.
    pub fn empty(message: impl Into<String>) -> Self {
        Self::success(message, Vec::new())
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: Vec::new(),
            number_of_records_found: 0,
        }
    }
}
