//! A reactive, lazily-evaluated query value over an in-process analytical
//! engine.
//!
//! [`QueryFacade`] is the object callers hold: it behaves simultaneously as
//! (a) an array-like sequence of result rows, (b) a subscribable reactive
//! store, (c) an event emitter, and (d) a fluent query builder. Underneath,
//! the three facets of a query — its column schema, row count, and data
//! rows — are fetched on demand through a [`Runner`], coalesced across
//! concurrent callers by [`SharedPromise`], and shared across textually
//! identical queries by the process-wide [`cache`].
//!
//! ```ignore
//! use std::sync::Arc;
//! use reactive_query::cache;
//!
//! let facade = cache::create("SELECT * FROM widgets", my_runner);
//! if facade.ready() {
//!     for row in facade.iter() {
//!         // ...
//!     }
//! }
//! ```

mod builder;
pub mod cache;
mod error;
mod event;
mod facade;
mod fingerprint;
mod hash;
mod maybe_deferred;
mod nonce;
mod options;
mod query_value;
mod row;
mod runner;
mod shared_promise;

pub use builder::QueryBuilder;
pub use cache::{create, create_with_options};
pub use error::{Error, Facet, Result};
pub use event::{EventKind, EventPayload, HandlerId};
pub use facade::QueryFacade;
pub use fingerprint::Fingerprint;
pub use maybe_deferred::{resolve_maybe_deferred, MaybeDeferred, Resolved};
pub use options::QueryOptions;
pub use query_value::{QueryInput, QueryValue};
pub use row::{CellValue, ColumnDescriptor, Row};
pub use runner::Runner;
pub use shared_promise::{SharedPromise, SharedPromiseState};
