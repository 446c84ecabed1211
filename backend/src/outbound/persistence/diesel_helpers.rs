//! Shared helpers for Diesel repository implementations.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Extract a readable message from a pool error.
pub(super) fn pool_error_message(error: PoolError) -> String {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    }
}

/// Extract a readable message from a Diesel error and emit debug context.
pub(super) fn diesel_error_message(error: DieselError, operation: &str) -> String {
    let message = error.to_string();
    debug!(%message, %operation, "diesel operation failed");
    message
}

/// Whether the error is a unique violation on a constraint whose name
/// contains `fragment`.
pub(super) fn is_unique_violation_on(error: &DieselError, fragment: &str) -> bool {
    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => info
            .constraint_name()
            .is_some_and(|name| name.contains(fragment)),
        _ => false,
    }
}

/// Collect row conversion results, mapping the first failure through
/// `map_err`. Conversion failures indicate schema drift.
pub(super) fn collect_rows<T, E>(
    results: impl Iterator<Item = Result<T, String>>,
    map_err: impl FnOnce(String) -> E,
) -> Result<Vec<T>, E> {
    results.collect::<Result<Vec<_>, _>>().map_err(map_err)
}
