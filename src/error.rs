//! Error taxonomy for the crate's public, fallible surface.
//!
//! Modeled on a closed `Error`/`ErrorKind` pair rather than `thiserror`/
//! `anyhow`: a small, fixed set of failure modes that the caller is expected
//! to match on, not an open extensible hierarchy.

use std::fmt;
use std::sync::Arc;

/// The crate's `Result` alias for fallible public operations.
pub type Result<T> = std::result::Result<T, Error>;

/// An error produced while constructing or fetching a query value.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    /// The query input was neither raw text nor a builder.
    pub fn construction(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Construction(message.into()),
        }
    }

    /// The runner reported a failure while fetching a facet.
    pub fn runner(facet: Facet, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Runner {
                facet,
                message: message.into(),
            },
        }
    }

    /// Wraps this error so it can be shared cheaply between every rejected
    /// `SharedPromise` and every subscriber notification it feeds.
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Which facet produced this error, if it came from a fetch.
    pub fn facet(&self) -> Option<Facet> {
        match self.kind {
            ErrorKind::Runner { facet, .. } => Some(facet),
            ErrorKind::Construction(_) => None,
        }
    }
}

/// One of the three independently-fetched views of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Columns,
    Length,
    Data,
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Facet::Columns => "columns",
            Facet::Length => "length",
            Facet::Data => "data",
        })
    }
}

#[derive(Debug, Clone)]
enum ErrorKind {
    Construction(String),
    Runner { facet: Facet, message: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::Construction(message) => {
                write!(f, "invalid query construction: {message}")
            }
            ErrorKind::Runner { facet, message } => {
                write!(f, "{facet} fetch failed: {message}")
            }
        }
    }
}

impl std::error::Error for Error {}
