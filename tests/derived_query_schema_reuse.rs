mod common;

use std::sync::{atomic::Ordering, Arc};

use reactive_query::QueryOptions;

use common::{count_row, data_row, describe_row, Script, StubRunner};

#[test]
fn a_derived_query_reuses_the_parents_already_known_columns() {
    let runner = Arc::new(StubRunner::new(
        Script::Rows(vec![describe_row("a", "INTEGER")]),
        Script::Rows(vec![count_row(3)]),
        Script::Rows(vec![data_row(1)]),
    ));

    let parent = reactive_query::create_with_options(
        "SELECT a FROM t",
        runner.clone(),
        QueryOptions::new().disable_cache(true),
    );
    assert!(parent.columns_loaded());
    assert_eq!(runner.columns_calls.load(Ordering::SeqCst), 1);

    let page = parent.limit(10, runner.clone());
    assert!(page.columns_loaded());
    assert_eq!(page.columns(), parent.columns());
    // No second DESCRIBE was issued for the derived query.
    assert_eq!(runner.columns_calls.load(Ordering::SeqCst), 1);

    let narrowed = page.where_("a > 0", runner.clone()).offset(5, runner);
    assert!(narrowed.columns_loaded());
    assert_eq!(runner.columns_calls.load(Ordering::SeqCst), 1);
}
