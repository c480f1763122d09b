//! The process-wide, fingerprint-keyed query cache and the public
//! constructor path. A plain insert-only map: there is no eviction
//! contract and, since there is no parallelism across fetches for a single
//! query value, no finer-grained locking is needed than one mutex around
//! the whole map.

use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::facade::QueryFacade;
use crate::fingerprint::Fingerprint;
use crate::hash::FxHashMap;
use crate::options::QueryOptions;
use crate::query_value::{QueryInput, QueryValue};
use crate::runner::Runner;

static CACHE: OnceLock<Mutex<FxHashMap<Fingerprint, QueryFacade>>> = OnceLock::new();

fn cache() -> &'static Mutex<FxHashMap<Fingerprint, QueryFacade>> {
    CACHE.get_or_init(|| Mutex::new(FxHashMap::default()))
}

/// Builds (or reuses) the [`QueryFacade`] for `query`, using default
/// options. The query's fingerprint is computed from its textual form
/// regardless of whether `query` is raw text or a builder.
pub fn create(query: impl Into<QueryInput>, runner: Arc<dyn Runner>) -> QueryFacade {
    create_with_options(query, runner, QueryOptions::new())
}

/// The full factory algorithm: fingerprint the query text, consult the
/// cache unless `disable_cache` is set, and on a miss construct and
/// (unless disabled) cache a new [`QueryValue`].
pub fn create_with_options(
    query: impl Into<QueryInput>,
    runner: Arc<dyn Runner>,
    options: QueryOptions,
) -> QueryFacade {
    let input = query.into();
    let fingerprint = Fingerprint::of(input_text(&input).as_str());

    if !options.disable_cache {
        if let Some(existing) = cache().lock().get(&fingerprint) {
            tracing::debug!(hash = %fingerprint, "query cache hit");
            return existing.clone();
        }
    }

    let disable_cache = options.disable_cache;
    let query_value = QueryValue::new(input, runner, options);
    let facade = QueryFacade::from(query_value);

    if !disable_cache {
        cache().lock().insert(fingerprint, facade.clone());
    }

    facade
}

fn input_text(input: &QueryInput) -> String {
    match input {
        QueryInput::Text(text) => text.clone(),
        QueryInput::Builder(builder) => builder.to_sql(),
    }
}
