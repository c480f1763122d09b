//! Construction options for a [`crate::query_value::QueryValue`].
//!
//! A builder-style struct rather than an ad hoc options bag: a caller
//! passing only an id writes `QueryOptions::new().id("label")`, with each
//! option independently typed and chainable.

use std::sync::Arc;

use crate::error::Error;
use crate::row::{ColumnDescriptor, Row};

/// Options accepted by [`crate::cache::create_with_options`] and
/// [`crate::query_value::QueryValue::new`].
#[derive(Default, Clone)]
pub struct QueryOptions {
    pub(crate) id: Option<String>,
    pub(crate) initial_data: Option<Vec<Row>>,
    pub(crate) known_columns: Option<Arc<[ColumnDescriptor]>>,
    pub(crate) initial_error: Option<Arc<Error>>,
    pub(crate) disable_cache: bool,
    pub(crate) no_resolve: bool,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// A caller-supplied diagnostic label. Falls back to the query's
    /// fingerprint when absent.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Seeds the data facet, bypassing the data fetch entirely.
    pub fn initial_data(mut self, rows: Vec<Row>) -> Self {
        self.initial_data = Some(rows);
        self
    }

    /// Seeds the columns facet with a schema already known by a caller
    /// (typically the value this one was derived from), suppressing the
    /// DESCRIBE fetch.
    pub fn known_columns(mut self, columns: Arc<[ColumnDescriptor]>) -> Self {
        self.known_columns = Some(columns);
        self
    }

    /// Marks the query as already terminally failed; no fetches are ever
    /// scheduled.
    pub fn initial_error(mut self, error: Arc<Error>) -> Self {
        self.initial_error = Some(error);
        self
    }

    /// Constructs without consulting or populating the process-wide cache.
    pub fn disable_cache(mut self, disable: bool) -> Self {
        self.disable_cache = disable;
        self
    }

    /// Refuses every fetch unconditionally, as if an error were already
    /// set, without surfacing one.
    pub fn no_resolve(mut self, no_resolve: bool) -> Self {
        self.no_resolve = no_resolve;
        self
    }
}
