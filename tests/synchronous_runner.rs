mod common;

use std::sync::{atomic::Ordering, Arc};

use reactive_query::QueryOptions;

use common::{count_row, data_row, describe_row, Script, StubRunner};

#[test]
fn synchronous_runner_resolves_columns_and_length_at_construction() {
    let runner = Arc::new(StubRunner::new(
        Script::Rows(vec![describe_row("a", "INTEGER")]),
        Script::Rows(vec![count_row(1)]),
        Script::Rows(vec![data_row(42)]),
    ));

    let facade = reactive_query::create_with_options(
        "SELECT a FROM t",
        runner.clone(),
        QueryOptions::new().disable_cache(true),
    );

    // Columns and length are scheduled at construction (facet rules 3/4);
    // a synchronous runner settles them before `create_with_options` even
    // returns.
    assert!(facade.columns_loaded());
    assert!(facade.length_loaded());
    assert_eq!(runner.columns_calls.load(Ordering::SeqCst), 1);
    assert_eq!(runner.length_calls.load(Ordering::SeqCst), 1);

    // Data is never scheduled at construction (facet rule 5).
    assert!(!facade.data_loaded());
    assert_eq!(runner.data_calls.load(Ordering::SeqCst), 0);

    // First indexed access triggers it.
    assert_eq!(facade.len(), 1);
    let row = facade.get(0).expect("row at index 0");
    assert_eq!(row.get("a"), Some(&reactive_query::CellValue::Integer(42)));
    assert_eq!(runner.data_calls.load(Ordering::SeqCst), 1);

    // A second access coalesces onto the already-settled facet rather than
    // re-invoking the runner.
    let _ = facade.get(0);
    assert_eq!(runner.data_calls.load(Ordering::SeqCst), 1);
}
