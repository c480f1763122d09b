//! A scriptable [`Runner`] shared by the integration tests: responds to
//! `DESCRIBE`/`COUNT(*)`/plain-select text with whichever [`Script`] was
//! configured for that facet, and counts invocations so a test can assert
//! coalescing (a fetch started once stays started, however many callers
//! await it).

use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::FutureExt;
use reactive_query::{CellValue, Error, Facet, MaybeDeferred, Row, Runner};

#[derive(Clone)]
pub enum Script {
    Rows(Vec<Row>),
    DeferredRows(Vec<Row>),
    Fail(String),
    DeferredFail(String),
}

pub struct StubRunner {
    columns: Script,
    length: Script,
    data: Script,
    pub columns_calls: AtomicUsize,
    pub length_calls: AtomicUsize,
    pub data_calls: AtomicUsize,
}

impl StubRunner {
    pub fn new(columns: Script, length: Script, data: Script) -> Self {
        Self {
            columns,
            length,
            data,
            columns_calls: AtomicUsize::new(0),
            length_calls: AtomicUsize::new(0),
            data_calls: AtomicUsize::new(0),
        }
    }
}

impl Runner for StubRunner {
    fn run(&self, sql: &str, _label: &str) -> MaybeDeferred<Result<Vec<Row>, Error>> {
        let (script, counter) = if sql.contains("DESCRIBE") {
            (&self.columns, &self.columns_calls)
        } else if sql.contains("COUNT(*)") {
            (&self.length, &self.length_calls)
        } else {
            (&self.data, &self.data_calls)
        };
        counter.fetch_add(1, Ordering::SeqCst);

        match script.clone() {
            Script::Rows(rows) => MaybeDeferred::immediate(Ok(rows)),
            Script::Fail(message) => {
                MaybeDeferred::immediate(Err(Error::runner(Facet::Data, message)))
            }
            Script::DeferredRows(rows) => {
                MaybeDeferred::Deferred(async move { Ok(rows) }.boxed())
            }
            Script::DeferredFail(message) => MaybeDeferred::Deferred(
                async move { Err(Error::runner(Facet::Data, message)) }.boxed(),
            ),
        }
    }
}

pub fn describe_row(name: &str, ty: &str) -> Row {
    Row::from_pairs([
        ("column_name".to_string(), CellValue::Text(name.to_string())),
        ("column_type".to_string(), CellValue::Text(ty.to_string())),
    ])
}

pub fn count_row(n: i64) -> Row {
    Row::from_pairs([("rowCount".to_string(), CellValue::Integer(n))])
}

pub fn data_row(value: i64) -> Row {
    Row::from_pairs([("a".to_string(), CellValue::Integer(value))])
}
