//! The array-shaped handle returned to callers: an indexable view that
//! triggers lazy loads, plus the explicit reactive-store / event-emitter /
//! fluent-builder API, both forwarded straight through to [`QueryValue`]
//! rather than intercepted through a proxy.

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::error::Error;
use crate::event::{EventKind, EventPayload, HandlerId};
use crate::fingerprint::Fingerprint;
use crate::query_value::QueryValue;
use crate::row::{ColumnDescriptor, Row};
use crate::runner::Runner;

/// A cheaply-cloned handle to a [`QueryValue`], behaving as an array-like
/// sequence of result rows as well as a reactive store / event emitter /
/// fluent query builder.
#[derive(Clone)]
pub struct QueryFacade(Arc<QueryValue>);

impl From<Arc<QueryValue>> for QueryFacade {
    fn from(inner: Arc<QueryValue>) -> Self {
        Self(inner)
    }
}

impl QueryFacade {
    pub(crate) fn inner(&self) -> &Arc<QueryValue> {
        &self.0
    }

    // -- array-like access -------------------------------------------------

    /// Triggers the data fetch on first call (facade rule 1), then returns
    /// the row at `index`: the resolved row once data has settled, the
    /// placeholder [`Row`] built from known columns while still pending and
    /// `index` is within the known length, or `None` past it.
    ///
    /// Panics if the query value's sticky error is set: per spec, "for
    /// synchronous callers, errors propagate via throw", so a caller must
    /// never silently see a fabricated null row in place of the failure
    /// that produced it.
    pub fn get(&self, index: usize) -> Option<Row> {
        drop(self.0.ensure_data_fetch());
        if let Some(rows) = self.0.data() {
            return rows.get(index).cloned();
        }
        if let Some(error) = self.0.error() {
            panic!("{error}");
        }
        let length = self.len();
        if (index as u64) < length {
            return self.0.mock_row().cloned();
        }
        None
    }

    /// Triggers the length fetch on first call (facade rule 2).
    pub fn len(&self) -> u64 {
        drop(self.0.ensure_length_fetch());
        self.0.length().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates the currently-known rows without forcing a fetch per item;
    /// call [`QueryFacade::get`] (or [`QueryFacade::fetch`]) first to ensure
    /// data has been requested.
    pub fn iter(&self) -> impl Iterator<Item = Row> + '_ {
        let len = self.0.length().unwrap_or(0);
        (0..len).filter_map(move |i| self.get(i as usize))
    }

    // -- identity & text -------------------------------------------------

    pub fn original_text(&self) -> &str {
        self.0.original_text()
    }

    pub fn text(&self) -> String {
        self.0.text()
    }

    pub fn id(&self) -> &str {
        self.0.id()
    }

    pub fn hash(&self) -> &Fingerprint {
        self.0.hash()
    }

    // -- facet state -------------------------------------------------

    pub fn columns(&self) -> Option<Arc<[ColumnDescriptor]>> {
        self.0.columns()
    }

    pub fn data(&self) -> Option<Arc<[Row]>> {
        self.0.data()
    }

    pub fn error(&self) -> Option<Arc<Error>> {
        self.0.error()
    }

    pub fn ready(&self) -> bool {
        self.0.ready()
    }

    pub fn loading(&self) -> bool {
        self.0.loading()
    }

    pub fn data_loaded(&self) -> bool {
        self.0.data_loaded()
    }

    pub fn data_loading(&self) -> bool {
        self.0.data_loading()
    }

    pub fn length_loaded(&self) -> bool {
        self.0.length_loaded()
    }

    pub fn length_loading(&self) -> bool {
        self.0.length_loading()
    }

    pub fn columns_loaded(&self) -> bool {
        self.0.columns_loaded()
    }

    pub fn columns_loading(&self) -> bool {
        self.0.columns_loading()
    }

    // -- fetch / store / events -------------------------------------------------

    pub fn fetch(&self) -> BoxFuture<'static, Result<(), Arc<Error>>> {
        self.0.fetch()
    }

    pub fn subscribe<F>(&self, f: F) -> impl FnOnce() + Send + Sync + 'static
    where
        F: Fn(&QueryFacade) + Send + Sync + 'static,
    {
        self.0.subscribe(f)
    }

    pub fn on<F>(&self, kind: EventKind, handler: F) -> HandlerId
    where
        F: Fn(EventPayload<'_>) + Send + Sync + 'static,
    {
        self.0.on(kind, handler)
    }

    pub fn off(&self, kind: EventKind, id: HandlerId) {
        self.0.off(kind, id);
    }

    pub fn add_event_listener<F>(&self, kind: EventKind, handler: F) -> HandlerId
    where
        F: Fn(EventPayload<'_>) + Send + Sync + 'static,
    {
        self.on(kind, handler)
    }

    pub fn remove_event_listener(&self, kind: EventKind, id: HandlerId) {
        self.off(kind, id);
    }

    // -- fluent builder -------------------------------------------------

    pub fn where_(&self, predicate: &str, runner: Arc<dyn Runner>) -> QueryFacade {
        self.0.where_(predicate, runner)
    }

    pub fn limit(&self, n: u64, runner: Arc<dyn Runner>) -> QueryFacade {
        self.0.limit(n, runner)
    }

    pub fn offset(&self, n: u64, runner: Arc<dyn Runner>) -> QueryFacade {
        self.0.offset(n, runner)
    }

    pub fn paginate(&self, offset: u64, n: u64, runner: Arc<dyn Runner>) -> QueryFacade {
        self.0.paginate(offset, n, runner)
    }

    /// An identity predicate, trivial here since [`QueryFacade`] is a
    /// concrete type rather than a structurally-probed proxy.
    pub fn is_query(_value: &QueryFacade) -> bool {
        true
    }
}
