mod common;

use std::sync::{atomic::Ordering, Arc};

use reactive_query::QueryOptions;

use common::{count_row, data_row, describe_row, Script, StubRunner};

#[test]
fn deferred_runner_settles_only_once_fetch_is_awaited() {
    let runner = Arc::new(StubRunner::new(
        Script::Rows(vec![describe_row("a", "INTEGER")]),
        Script::Rows(vec![count_row(1)]),
        Script::DeferredRows(vec![data_row(7)]),
    ));

    let facade = reactive_query::create_with_options(
        "SELECT a FROM deferred_t",
        runner.clone(),
        QueryOptions::new().disable_cache(true),
    );

    // The data fetch hasn't even started yet (nothing has touched the
    // facade past construction).
    assert!(!facade.data_loading());
    assert!(!facade.data_loaded());

    let result = futures_executor::block_on(facade.fetch());
    assert!(result.is_ok());
    assert!(facade.data_loaded());
    assert_eq!(facade.get(0).unwrap().get("a").unwrap().to_string(), "7");
    assert_eq!(runner.data_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn in_range_reads_return_a_mock_row_before_data_settles() {
    let runner = Arc::new(StubRunner::new(
        Script::Rows(vec![describe_row("a", "INTEGER")]),
        Script::Rows(vec![count_row(2)]),
        Script::DeferredRows(vec![data_row(1), data_row(2)]),
    ));

    let facade = reactive_query::create_with_options(
        "SELECT a FROM deferred_t3",
        runner.clone(),
        QueryOptions::new().disable_cache(true),
    );

    assert_eq!(facade.len(), 2);
    // The data fetch is now in flight (triggered by `get`) but nothing has
    // driven it to completion yet, so this must be the placeholder row
    // rather than a real one.
    let mock = facade.get(0).expect("index within the known length");
    assert!(!facade.data_loaded());
    assert_eq!(mock.get("a"), Some(&reactive_query::CellValue::Null));
    assert_eq!(runner.data_calls.load(Ordering::SeqCst), 1);

    // Out of range is still `None`.
    assert_eq!(facade.get(2), None);

    let result = futures_executor::block_on(facade.fetch());
    assert!(result.is_ok());
    assert_eq!(
        facade.get(0).unwrap().get("a").unwrap().to_string(),
        "1"
    );
    // No second invocation: the in-flight fetch from `get` above was the
    // same one `fetch` awaited.
    assert_eq!(runner.data_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn concurrent_fetches_coalesce_onto_one_runner_invocation() {
    let runner = Arc::new(StubRunner::new(
        Script::Rows(vec![describe_row("a", "INTEGER")]),
        Script::Rows(vec![count_row(1)]),
        Script::DeferredRows(vec![data_row(1)]),
    ));

    let facade = reactive_query::create_with_options(
        "SELECT a FROM deferred_t2",
        runner.clone(),
        QueryOptions::new().disable_cache(true),
    );

    let (a, b, c) = futures_executor::block_on(futures_util::future::join3(
        facade.fetch(),
        facade.fetch(),
        facade.fetch(),
    ));
    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    assert_eq!(runner.data_calls.load(Ordering::SeqCst), 1);
}
