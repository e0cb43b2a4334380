//! Process-level screening run ID.
//!
//! Each process gets a unique ULID at startup. Every result row written by
//! this process carries it as `screening_run_id`, so a bulk run can be
//! audited as a unit and separate runs stay distinguishable even on the same
//! day.

use once_cell::sync::Lazy;
use ulid::Ulid;

static RUN_ID: Lazy<String> = Lazy::new(|| Ulid::new().to_string());

/// Returns the process-level run ID (same value for the process lifetime).
/// ULIDs are time-ordered and 26 characters, URL-safe.
#[inline]
pub fn get() -> &'static str {
    &RUN_ID
}

/// Generates a fresh ULID for sub-operations that need their own identity.
#[inline]
pub fn generate() -> String {
    Ulid::new().to_string()
}
