//! The runner contract consumed from the environment: executes rendered SQL
//! text against a backing engine and returns rows, possibly deferred.

use crate::error::Error;
use crate::maybe_deferred::MaybeDeferred;
use crate::row::Row;

/// Executes a rendered SQL string and returns its result rows.
///
/// The runner may complete synchronously (e.g. a cached in-memory result)
/// or defer to an executor; [`MaybeDeferred`] lets the query value preserve
/// synchrony in the former case.
pub trait Runner: Send + Sync {
    fn run(&self, sql: &str, label: &str) -> MaybeDeferred<Result<Vec<Row>, Error>>;
}
