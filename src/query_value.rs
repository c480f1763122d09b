//! The main entity: a reactive, lazily-evaluated query value composed of
//! three independently-fetched facets (columns, length, data), each behind
//! its own coalescing [`SharedPromise`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Once, OnceLock, Weak};

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use parking_lot::Mutex;

use crate::builder::{QueryBuilder, TextQuery};
use crate::error::{Error, Facet};
use crate::event::{EventKind, EventPayload, HandlerId, HandlerMap};
use crate::facade::QueryFacade;
use crate::fingerprint::Fingerprint;
use crate::hash::FxHashMap;
use crate::maybe_deferred::{resolve_maybe_deferred, MaybeDeferred, Resolved};
use crate::nonce;
use crate::options::QueryOptions;
use crate::row::{CellValue, ColumnDescriptor, Row};
use crate::runner::Runner;
use crate::shared_promise::SharedPromise;

/// The input a query value is constructed from: raw SQL text, or an
/// already-built [`QueryBuilder`].
///
/// Expressed as a closed enum rather than validated dynamically at
/// construction: the choice between text and builder is a compile-time
/// type, not a runtime error path (see DESIGN.md for the rationale).
pub enum QueryInput {
    Text(String),
    Builder(Box<dyn QueryBuilder>),
}

impl From<String> for QueryInput {
    fn from(text: String) -> Self {
        QueryInput::Text(text)
    }
}

impl From<&str> for QueryInput {
    fn from(text: &str) -> Self {
        QueryInput::Text(text.to_string())
    }
}

impl From<Box<dyn QueryBuilder>> for QueryInput {
    fn from(builder: Box<dyn QueryBuilder>) -> Self {
        QueryInput::Builder(builder)
    }
}

static DIRECT_CONSTRUCTION_WARNED: Once = Once::new();

/// A fetch in flight beyond its synchronous kickoff: the future that still
/// needs polling to completion once the runner's `Deferred` future settles.
type Driver = Mutex<Option<BoxFuture<'static, ()>>>;

/// One SQL result viewed through three lazily-fetched facets: columns,
/// length, and data. See `crate` docs for the reactive-store, event-emitter,
/// and fluent-builder contracts layered on top via [`QueryFacade`].
pub struct QueryValue {
    original_text: String,
    query: Box<dyn QueryBuilder>,
    id: String,
    hash: Fingerprint,
    runner: Arc<dyn Runner>,

    columns: Arc<SharedPromise<Arc<[ColumnDescriptor]>>>,
    columns_driver: Driver,
    mock_row: OnceLock<Row>,

    length: Arc<SharedPromise<u64>>,
    length_driver: Driver,

    data: Arc<SharedPromise<Arc<[Row]>>>,
    data_driver: Driver,

    error: OnceLock<Arc<Error>>,
    no_resolve: bool,

    subscribers: Mutex<FxHashMap<u64, Arc<dyn Fn(&QueryFacade) + Send + Sync>>>,
    next_subscriber: AtomicU64,
    handlers: Mutex<HandlerMap>,
    publish_count: AtomicU64,

}

/// The sanity limit on publications to a single query value: a loop where
/// a subscriber re-enters the facade and mutates observable state would
/// otherwise spin forever.
const PUBLISH_LIMIT: u64 = 100_000;

impl QueryValue {
    /// Constructs a query value directly, bypassing the process-wide cache.
    ///
    /// Prefer [`crate::cache::create`] / [`crate::cache::create_with_options`]
    /// so identical query texts share one instance; calling this directly
    /// emits a one-time `tracing::warn!` under the `direct-construction-warns`
    /// feature, guarded by a latch so it fires at most once per process.
    pub fn new(
        input: impl Into<QueryInput>,
        runner: Arc<dyn Runner>,
        options: QueryOptions,
    ) -> Arc<Self> {
        warn_on_direct_construction();

        let (original_text, query) = match input.into() {
            QueryInput::Text(text) => {
                let suffix = nonce::next_suffix();
                let wrapped = format!("SELECT * FROM ({text}) AS inputQuery-{suffix}");
                let builder: Box<dyn QueryBuilder> = Box::new(TextQuery::new(wrapped));
                (text, builder)
            }
            QueryInput::Builder(builder) => {
                let text = builder.to_sql();
                (text, builder)
            }
        };

        let hash = Fingerprint::of(&original_text);
        let id = options.id.clone().unwrap_or_else(|| hash.to_string());
        let no_resolve = options.no_resolve;

        let arc = Arc::new_cyclic(|weak: &Weak<QueryValue>| {
            let columns = Arc::new(SharedPromise::new(publish_on_change(
                "columns",
                weak.clone(),
            )));
            let length = Arc::new(SharedPromise::new(publish_on_change(
                "length",
                weak.clone(),
            )));
            let data = Arc::new(SharedPromise::new(publish_on_change("data", weak.clone())));

            let mut qv = QueryValue {
                original_text,
                query,
                id,
                hash,
                runner,
                columns,
                columns_driver: Mutex::new(None),
                mock_row: OnceLock::new(),
                length,
                length_driver: Mutex::new(None),
                data,
                data_driver: Mutex::new(None),
                error: OnceLock::new(),
                no_resolve,
                subscribers: Mutex::new(FxHashMap::default()),
                next_subscriber: AtomicU64::new(0),
                handlers: Mutex::new(HandlerMap::new()),
                publish_count: AtomicU64::new(0),
            };

            if let Some(error) = options.initial_error {
                let _ = qv.error.set(error);
                return qv;
            }

            if let Some(rows) = options.initial_data {
                let rows: Arc<[Row]> = rows.into();
                qv.length = Arc::new(SharedPromise::resolved(
                    rows.len() as u64,
                    publish_on_change("length", weak.clone()),
                ));
                qv.data = Arc::new(SharedPromise::resolved(
                    rows,
                    publish_on_change("data", weak.clone()),
                ));
            }

            if let Some(known_columns) = options.known_columns {
                let _ = qv.mock_row.set(Row::mock_from_columns(&known_columns));
                qv.columns = Arc::new(SharedPromise::resolved(
                    known_columns,
                    publish_on_change("columns", weak.clone()),
                ));
            }

            qv
        });

        // Schedule the columns fetch unless known_columns already satisfied
        // it, and always schedule the length fetch (which itself
        // short-circuits if data is already resolved). Neither runs if an
        // initial error was set above. The returned driving futures are
        // dropped here: their side effects already ran synchronously for an
        // immediate runner; for a deferred runner the driver is parked in
        // `*_driver` until something awaits `fetch()`.
        if arc.error.get().is_none() {
            drop(arc.ensure_columns_fetch());
            drop(arc.ensure_length_fetch());
        }

        arc
    }

    // -- identity & text -------------------------------------------------

    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    /// The text actually executed: the builder's rendered form, which
    /// differs from `original_text` when the input was raw text, wrapped as
    /// `SELECT * FROM (originalText) AS inputQuery-<rand>`.
    pub fn text(&self) -> String {
        self.query.to_sql()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn hash(&self) -> &Fingerprint {
        &self.hash
    }

    // -- facet state -------------------------------------------------

    pub fn columns(&self) -> Option<Arc<[ColumnDescriptor]>> {
        self.columns.value()
    }

    pub fn length(&self) -> Option<u64> {
        self.length.value()
    }

    pub fn data(&self) -> Option<Arc<[Row]>> {
        self.data.value()
    }

    pub fn mock_row(&self) -> Option<&Row> {
        self.mock_row.get()
    }

    pub fn error(&self) -> Option<Arc<Error>> {
        self.error.get().cloned()
    }

    pub fn columns_loaded(&self) -> bool {
        self.columns.is_settled()
    }

    pub fn columns_loading(&self) -> bool {
        self.columns.is_loading()
    }

    pub fn length_loaded(&self) -> bool {
        self.length.is_settled()
    }

    pub fn length_loading(&self) -> bool {
        self.length.is_loading()
    }

    pub fn data_loaded(&self) -> bool {
        self.data.is_settled()
    }

    pub fn data_loading(&self) -> bool {
        self.data.is_loading()
    }

    /// `ready ⇔ columns, length, data all resolved`.
    pub fn ready(&self) -> bool {
        matches!(
            (self.columns.state(), self.length.state(), self.data.state()),
            (
                crate::shared_promise::SharedPromiseState::Resolved(_),
                crate::shared_promise::SharedPromiseState::Resolved(_),
                crate::shared_promise::SharedPromiseState::Resolved(_),
            )
        )
    }

    /// `loading ⇔ any facet is loading`.
    pub fn loading(&self) -> bool {
        self.columns_loading() || self.length_loading() || self.data_loading()
    }

    // -- fetches -------------------------------------------------

    fn refused(&self) -> bool {
        self.no_resolve || self.error.get().is_some()
    }

    /// Sets the sticky terminal error (at most one per query value), emits
    /// the `error` event, and returns it as a shareable `Arc` for rejecting
    /// the failed facet's `SharedPromise`. A no-op, returning the existing
    /// error, if one is already set.
    fn set_error(self: &Arc<Self>, facet: Facet, message: impl Into<String>) -> Arc<Error> {
        if let Some(existing) = self.error.get() {
            return existing.clone();
        }
        let error = Arc::new(Error::runner(facet, message));
        match self.error.set(error.clone()) {
            Ok(()) => {
                self.emit(EventKind::Error, EventPayload::Error(&error));
                error
            }
            Err(_) => self.error.get().expect("just failed to set").clone(),
        }
    }

    fn render_columns_query(&self) -> (String, String) {
        let label = format!("Columns {} ({})", self.id, self.hash);
        let sql = format!("-- {label}\nDESCRIBE {}\n", self.text());
        (sql, label)
    }

    fn render_length_query(&self) -> (String, String) {
        let label = format!("Length {} ({})", self.id, self.hash);
        let sql = format!(
            "-- {label}\nSELECT COUNT(*) AS rowCount FROM ({})\n",
            self.text()
        );
        (sql, label)
    }

    fn render_data_query(&self) -> (String, String) {
        let label = format!("Data {} {}", self.id, self.hash);
        let sql = format!("-- {label}\n{}\n", self.text());
        (sql, label)
    }

    /// Delivers the facade to every subscriber. Called from the
    /// `on_change` callback wired into each `SharedPromise` at construction,
    /// the single point every facet transition funnels through.
    fn publish(self: &Arc<Self>, reason: &str) {
        let count = self.publish_count.fetch_add(1, Ordering::Relaxed) + 1;
        if count > PUBLISH_LIMIT {
            panic!(
                "query value {} published more than {PUBLISH_LIMIT} times ({reason}); \
                 a subscriber is likely re-entering the facade and mutating observable state",
                self.hash
            );
        }
        tracing::trace!(hash = %self.hash, reason, "publish");

        let facade = QueryFacade::from(self.clone());
        let subs: Vec<_> = self.subscribers.lock().values().cloned().collect();
        for sub in subs {
            sub(&facade);
        }
    }

    /// Ensures the columns fetch has started (idempotent: a no-op if
    /// already loading/settled, or if refused) and returns a future that
    /// drives any still-pending runner future and then awaits settlement.
    pub(crate) fn ensure_columns_fetch(
        self: &Arc<Self>,
    ) -> BoxFuture<'static, Result<(), Arc<Error>>> {
        if self.columns.is_init() && !self.refused() {
            self.columns.start();
            let (sql, label) = self.render_columns_query();
            let this_ok = self.clone();
            let this_err = self.clone();
            match resolve_maybe_deferred(
                self.runner.run(&sql, &label),
                move |rows, _was_deferred| this_ok.complete_columns(Ok(rows)),
                move |err, _was_deferred| this_err.complete_columns(Err(err)),
            ) {
                Resolved::Now(()) => {}
                Resolved::Later(fut) => *self.columns_driver.lock() = Some(fut),
            }
        }
        let this = self.clone();
        async move {
            if let Some(driver) = this.columns_driver.lock().take() {
                driver.await;
            }
            this.columns.clone().wait().await.map(|_| ())
        }
        .boxed()
    }

    fn complete_columns(self: &Arc<Self>, result: Result<Vec<Row>, Error>) {
        match result {
            Ok(rows) => {
                let columns: Arc<[ColumnDescriptor]> = rows
                    .iter()
                    .map(|row| {
                        ColumnDescriptor::new(
                            cell_text(row.get("column_name")),
                            cell_text(row.get("column_type")),
                        )
                    })
                    .collect::<Vec<_>>()
                    .into();
                let _ = self.mock_row.set(Row::mock_from_columns(&columns));
                self.columns.resolve(columns);
            }
            Err(err) => {
                let shared = self.set_error(Facet::Columns, err.to_string());
                self.columns.reject(shared);
            }
        }
    }

    /// Ensures the length fetch has started. Short-circuits to `data.len()`
    /// without invoking the runner when data has already resolved, so no
    /// separate `COUNT(*)` is ever issued once the rows themselves are in
    /// hand.
    pub(crate) fn ensure_length_fetch(
        self: &Arc<Self>,
    ) -> BoxFuture<'static, Result<(), Arc<Error>>> {
        if self.length.is_init() && !self.refused() {
            if let Some(rows) = self.data.value() {
                self.length.start();
                self.length.resolve(rows.len() as u64);
            } else {
                self.length.start();
                let (sql, label) = self.render_length_query();
                let this_ok = self.clone();
                let this_err = self.clone();
                match resolve_maybe_deferred(
                    self.runner.run(&sql, &label),
                    move |rows, _was_deferred| this_ok.complete_length(Ok(rows)),
                    move |err, _was_deferred| this_err.complete_length(Err(err)),
                ) {
                    Resolved::Now(()) => {}
                    Resolved::Later(fut) => *self.length_driver.lock() = Some(fut),
                }
            }
        }
        let this = self.clone();
        async move {
            if let Some(driver) = this.length_driver.lock().take() {
                driver.await;
            }
            this.length.clone().wait().await.map(|_| ())
        }
        .boxed()
    }

    fn complete_length(self: &Arc<Self>, result: Result<Vec<Row>, Error>) {
        match result {
            Ok(rows) => {
                let count = rows
                    .first()
                    .and_then(|row| row.get("rowCount"))
                    .map(cell_to_u64)
                    .unwrap_or(0);
                self.length.resolve(count);
            }
            Err(err) => {
                let shared = self.set_error(Facet::Length, err.to_string());
                self.length.reject(shared);
            }
        }
    }

    /// Ensures the data fetch has started. Unlike columns/length this is
    /// never called at construction; it is triggered by facade access or by
    /// the public [`QueryValue::fetch`].
    pub(crate) fn ensure_data_fetch(self: &Arc<Self>) -> BoxFuture<'static, Result<(), Arc<Error>>> {
        if self.data.is_init() && !self.refused() {
            self.data.start();
            let (sql, label) = self.render_data_query();
            let this_ok = self.clone();
            let this_err = self.clone();
            match resolve_maybe_deferred(
                self.runner.run(&sql, &label),
                move |rows, _was_deferred| this_ok.complete_data(Ok(rows)),
                move |err, _was_deferred| this_err.complete_data(Err(err)),
            ) {
                Resolved::Now(()) => {}
                Resolved::Later(fut) => *self.data_driver.lock() = Some(fut),
            }
        }
        let this = self.clone();
        async move {
            if let Some(driver) = this.data_driver.lock().take() {
                driver.await;
            }
            this.data.clone().wait().await.map(|_| ())
        }
        .boxed()
    }

    fn complete_data(self: &Arc<Self>, result: Result<Vec<Row>, Error>) {
        match result {
            Ok(rows) => {
                self.data.resolve(rows.into());
                self.emit(EventKind::DataReady, EventPayload::DataReady);
            }
            Err(err) => {
                let shared = self.set_error(Facet::Data, err.to_string());
                self.data.reject(shared);
            }
        }
    }

    /// Forces the data facet to begin fetching (if it has not already) and
    /// drives it, along with any still-pending columns/length fetch, to
    /// settlement. The explicit counterpart of the facade's "accessing an
    /// index triggers a fetch" rule, for callers that want to `.await`
    /// completion directly.
    ///
    /// There is no ambient event loop driving construction-scheduled
    /// columns/length fetches forward on its own; awaiting this future is
    /// what makes that progress happen for a deferred runner (see
    /// DESIGN.md for why).
    pub fn fetch(self: &Arc<Self>) -> BoxFuture<'static, Result<(), Arc<Error>>> {
        let columns = self.ensure_columns_fetch();
        let length = self.ensure_length_fetch();
        let data = self.ensure_data_fetch();
        async move {
            let (c, l, d) = futures_util::future::join3(columns, length, data).await;
            c.and(l).and(d)
        }
        .boxed()
    }

    // -- reactive store / event emitter -------------------------------------------------

    /// Registers a subscriber; returns a token that removes it when
    /// invoked.
    pub fn subscribe<F>(self: &Arc<Self>, f: F) -> impl FnOnce() + Send + Sync + 'static
    where
        F: Fn(&QueryFacade) + Send + Sync + 'static,
    {
        let id = self.next_subscriber.fetch_add(1, Ordering::Relaxed);
        self.subscribers.lock().insert(id, Arc::new(f));
        let this = self.clone();
        move || {
            this.subscribers.lock().remove(&id);
        }
    }

    pub fn on<F>(&self, kind: EventKind, handler: F) -> HandlerId
    where
        F: Fn(EventPayload<'_>) + Send + Sync + 'static,
    {
        self.handlers.lock().on(kind, handler)
    }

    pub fn off(&self, kind: EventKind, id: HandlerId) {
        self.handlers.lock().off(kind, id);
    }

    fn emit(&self, kind: EventKind, payload: EventPayload<'_>) {
        self.handlers.lock().emit(kind, payload);
    }

    // -- fluent builder -------------------------------------------------

    /// Clones the underlying builder and applies a refinement to it; the
    /// new value inherits `self`'s columns as `known_columns` whenever they
    /// have already been observed, suppressing a redundant DESCRIBE.
    fn derive(
        self: &Arc<Self>,
        refine: impl FnOnce(&mut dyn QueryBuilder),
    ) -> (Box<dyn QueryBuilder>, QueryOptions) {
        let mut builder = self.query.clone_box();
        refine(builder.as_mut());

        let mut options = QueryOptions::new();
        if let Some(columns) = self.columns() {
            options = options.known_columns(columns);
        }
        (builder, options)
    }

    /// Each derived query delegates to [`crate::cache::create_with_options`]
    /// rather than constructing directly, so two callers deriving the same
    /// refinement off the same parent (e.g. two `.limit(10)` calls) share
    /// one cached `QueryValue` and one fetch set instead of each paying for
    /// their own.
    pub fn where_(self: &Arc<Self>, predicate: &str, runner: Arc<dyn Runner>) -> QueryFacade {
        let (builder, options) = self.derive(|b| b.where_(predicate));
        crate::cache::create_with_options(builder, runner, options)
    }

    pub fn limit(self: &Arc<Self>, n: u64, runner: Arc<dyn Runner>) -> QueryFacade {
        let (builder, options) = self.derive(|b| b.limit(n));
        crate::cache::create_with_options(builder, runner, options)
    }

    pub fn offset(self: &Arc<Self>, n: u64, runner: Arc<dyn Runner>) -> QueryFacade {
        let (builder, options) = self.derive(|b| b.offset(n));
        crate::cache::create_with_options(builder, runner, options)
    }

    pub fn paginate(
        self: &Arc<Self>,
        offset: u64,
        n: u64,
        runner: Arc<dyn Runner>,
    ) -> QueryFacade {
        let (builder, options) = self.derive(|b| {
            b.offset(offset);
            b.limit(n);
        });
        crate::cache::create_with_options(builder, runner, options)
    }
}

fn warn_on_direct_construction() {
    #[cfg(feature = "direct-construction-warns")]
    {
        DIRECT_CONSTRUCTION_WARNED.call_once(|| {
            tracing::warn!(
                "QueryValue constructed directly; prefer cache::create so identical \
                 query texts are coalesced and cached"
            );
        });
    }
    #[cfg(not(feature = "direct-construction-warns"))]
    {
        let _ = &DIRECT_CONSTRUCTION_WARNED;
    }
}

/// Builds the `on_change` callback threaded into a facet's `SharedPromise`
/// at construction, the single per-facet hook used to trigger publish.
/// `weak` upgrades to `None` while still inside `Arc::new_cyclic` (no
/// subscribers can exist yet, so there is nothing to publish to);
/// afterwards it upgrades normally.
fn publish_on_change<T: Clone>(
    facet: &'static str,
    weak: Weak<QueryValue>,
) -> impl Fn(&crate::shared_promise::SharedPromiseState<T>) + Send + Sync + 'static {
    move |state| {
        if let Some(qv) = weak.upgrade() {
            let kind = match state {
                crate::shared_promise::SharedPromiseState::Init => "init",
                crate::shared_promise::SharedPromiseState::Loading => "loading",
                crate::shared_promise::SharedPromiseState::Resolved(_) => "resolved",
                crate::shared_promise::SharedPromiseState::Rejected(_) => "rejected",
            };
            qv.publish(&format!("{facet} promise ({kind})"));
        }
    }
}

fn cell_text(value: Option<&CellValue>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn cell_to_u64(value: &CellValue) -> u64 {
    match value {
        CellValue::Integer(n) => (*n).max(0) as u64,
        CellValue::Float(f) => f.max(0.0) as u64,
        CellValue::Text(s) => s.parse().unwrap_or(0),
        CellValue::Bool(_) | CellValue::Null => 0,
    }
}
