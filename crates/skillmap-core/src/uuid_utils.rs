//! UUID helpers.

use uuid::Uuid;

/// Generate a time-ordered UUIDv7.
///
/// Used for all pipeline-created rows so index locality follows insertion
/// order on large imports.
pub fn new_v7() -> Uuid {
    Uuid::now_v7()
}

/// Check whether a UUID is version 7.
pub fn is_v7(id: &Uuid) -> bool {
    id.get_version_num() == 7
}
