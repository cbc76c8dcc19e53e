//! Data operations grouped by resource. Every call takes the caller's
//! [`Session`](crate::session::Session) and only ever sees rows owned by it.

pub mod accounts;
pub mod budgets;
pub mod categories;
pub mod rules;
pub mod transactions;

use crate::error::{PocketbookError, Result};

/// Turn an `UPDATE`/`DELETE` row count into a not-found error when it hit nothing.
pub(crate) fn expect_affected(affected: usize, kind: &'static str, id: i64) -> Result<()> {
    if affected == 0 {
        Err(PocketbookError::NotFound { kind, id })
    } else {
        Ok(())
    }
}

/// Map `QueryReturnedNoRows` from a single-row lookup to a not-found error.
pub(crate) fn not_found(kind: &'static str, id: i64) -> impl FnOnce(rusqlite::Error) -> PocketbookError {
    move |e| match e {
        rusqlite::Error::QueryReturnedNoRows => PocketbookError::NotFound { kind, id },
        other => PocketbookError::Db(other),
    }
}
