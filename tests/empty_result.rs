mod common;

use std::sync::Arc;

use reactive_query::QueryOptions;

use common::{describe_row, Script, StubRunner};

#[test]
fn empty_result_set_reports_zero_length_and_no_rows() {
    let runner: Arc<dyn reactive_query::Runner> = Arc::new(StubRunner::new(
        Script::Rows(vec![describe_row("a", "INTEGER")]),
        Script::Rows(vec![common::count_row(0)]),
        Script::Rows(vec![]),
    ));

    let facade = reactive_query::create_with_options(
        "SELECT a FROM empty_table",
        runner,
        QueryOptions::new().disable_cache(true),
    );

    assert!(facade.columns_loaded());
    assert!(facade.length_loaded());
    assert_eq!(facade.len(), 0);
    assert!(facade.is_empty());
    assert_eq!(facade.get(0), None);
    assert_eq!(facade.iter().count(), 0);
}
