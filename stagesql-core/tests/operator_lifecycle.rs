//! Lifecycle tests for the staging operator against the recording engine.

use stagesql_core::operator::qualified_table;
use stagesql_core::prelude::*;
use stagesql_core::test_utils::{CollectingEmitter, EngineCall, RecordingEngine};
use stagesql_core::{
    IngestError, LifecycleError, SetupError, TransactionError, WindowState,
};

const QUERY: &str = "SELECT SUM(amount) AS total FROM SESSION.orders";

fn registry() -> SchemaRegistry {
    SchemaRegistry::new()
        .with_source(
            SourceDescriptor::new("orders")
                .column("id", "INT")
                .column("amount", "DECIMAL"),
        )
        .with_source(SourceDescriptor::new("empty"))
        .with_absent()
        .with_source(
            SourceDescriptor::new("pairs")
                .column("a", "INT")
                .column("b", "VARCHAR(10)"),
        )
}

fn setup(engine: RecordingEngine) -> StagingOperator<RecordingEngine> {
    StagingOperator::setup(engine, registry(), QUERY, OperatorConfig::default()).unwrap()
}

fn orders_table() -> String {
    qualified_table("SESSION", "orders")
}

#[test]
fn test_setup_creates_tables_for_non_empty_sources() {
    let engine = RecordingEngine::new();
    let log = engine.log();
    let op = setup(engine);

    let tables: Vec<_> = op.staging_tables().map(|t| t.name().to_string()).collect();
    assert_eq!(tables, vec!["SESSION.orders", "SESSION.pairs"]);
    assert!(op.staging_table(1).is_none());
    assert!(op.staging_table(2).is_none());

    let calls = log.calls();
    assert_eq!(calls[0], EngineCall::Namespace("SESSION".to_string()));
    assert!(calls.contains(&EngineCall::Batch(
        "DECLARE GLOBAL TEMPORARY TABLE \"SESSION\".\"orders\" (\"id\" INT, \"amount\" DECIMAL) NOT LOGGED"
            .to_string()
    )));
    assert!(calls.contains(&EngineCall::Prepare(QUERY.to_string())));

    let namespaces = calls
        .iter()
        .filter(|c| matches!(c, EngineCall::Namespace(_)))
        .count();
    assert_eq!(namespaces, 1);
}

#[test]
fn test_insert_placeholders_match_bound_columns() {
    let registry = SchemaRegistry::new().with_source(
        SourceDescriptor::new("events")
            .column("kind", "VARCHAR(16)")
            .column_with_default("seen", "TIMESTAMP", "CURRENT_TIMESTAMP")
            .column("size", "INT"),
    );
    let mut op = StagingOperator::setup(
        RecordingEngine::new(),
        registry,
        "SELECT * FROM SESSION.events",
        OperatorConfig::default(),
    )
    .unwrap();

    let table = op.staging_table(0).unwrap().clone();
    assert_eq!(table.columns(), ["kind", "seen", "size"]);
    assert_eq!(table.placeholder_count(), 2);
    assert_eq!(
        op.engine_mut()
            .parameter_count(table.insert_statement())
            .unwrap(),
        2
    );
    assert_eq!(
        op.engine_mut()
            .parameter_count(table.delete_statement())
            .unwrap(),
        0
    );
}

#[test]
fn test_window_cycle_order_and_purge() {
    let engine = RecordingEngine::new()
        .with_rows("SUM(amount)", vec![ResultRow::new().with("total", 30.5)]);
    let log = engine.log();
    let mut op = setup(engine);
    log.clear();

    op.begin_window(1).unwrap();
    assert_eq!(op.engine().staged_rows(&orders_table()), 0);

    op.process(0, &record([("id", Value::from(1)), ("amount", Value::from(10.5))]))
        .unwrap();
    op.process(0, &record([("id", Value::from(2)), ("amount", Value::from(20.0))]))
        .unwrap();
    assert_eq!(op.engine().staged_rows(&orders_table()), 2);

    let mut out = CollectingEmitter::new();
    let summary = op.end_window(&mut out).unwrap();

    assert_eq!(summary.window_id, 1);
    assert_eq!(summary.rows_staged, 2);
    assert_eq!(summary.rows_emitted, 1);
    assert_eq!(out.rows, vec![ResultRow::new().with("total", 30.5)]);
    assert_eq!(op.engine().staged_rows(&orders_table()), 0);
    assert_eq!(op.state(), WindowState::Idle);

    // Begin, two inserts, query, commit, then one delete per staging table
    let kinds: Vec<&str> = log
        .calls()
        .iter()
        .map(|c| match c {
            EngineCall::Begin => "begin",
            EngineCall::Update { sql, .. } if sql.starts_with("INSERT") => "insert",
            EngineCall::Update { sql, .. } if sql.starts_with("DELETE") => "delete",
            EngineCall::Query { .. } => "query",
            EngineCall::Commit => "commit",
            _ => "other",
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["begin", "insert", "insert", "query", "commit", "delete", "delete"]
    );
}

#[test]
fn test_unmapped_fields_are_ignored_by_default() {
    let engine = RecordingEngine::new();
    let log = engine.log();
    let mut op = setup(engine);

    op.begin_window(1).unwrap();
    op.process(
        3,
        &record([
            ("a", Value::from(5)),
            ("b", Value::from("x")),
            ("c", Value::from("ignored")),
        ]),
    )
    .unwrap();

    let staged = log
        .calls()
        .into_iter()
        .find_map(|c| match c {
            EngineCall::Update { sql, params } if sql.contains("pairs") => Some(params),
            _ => None,
        })
        .unwrap();
    assert_eq!(staged, vec![Value::Integer(5), Value::Text("x".into())]);
}

#[test]
fn test_unmapped_fields_rejected_by_policy() {
    let config = OperatorConfig::default().with_unmapped_fields(UnmappedFieldPolicy::Reject);
    let mut op = StagingOperator::setup(RecordingEngine::new(), registry(), QUERY, config).unwrap();

    op.begin_window(1).unwrap();
    let err = op
        .process(
            3,
            &record([("a", Value::from(5)), ("b", Value::from("x")), ("c", Value::from(1))]),
        )
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Ingest(IngestError::UnmappedField { ref field, .. }) if field == "c"
    ));
    assert_eq!(op.state(), WindowState::Failed { window_id: 1 });
}

#[test]
fn test_text_bind_mode_binds_strings() {
    let engine = RecordingEngine::new();
    let log = engine.log();
    let config = OperatorConfig::default().with_bind_mode(BindMode::Text);
    let mut op = StagingOperator::setup(engine, registry(), QUERY, config).unwrap();

    op.begin_window(1).unwrap();
    op.process(0, &record([("id", Value::from(1)), ("amount", Value::Null)]))
        .unwrap();

    let params = log
        .calls()
        .into_iter()
        .find_map(|c| match c {
            EngineCall::Update { params, .. } => Some(params),
            _ => None,
        })
        .unwrap();
    assert_eq!(params, vec![Value::Text("1".into()), Value::Null]);
}

#[test]
fn test_missing_bound_value_fails() {
    let mut op = setup(RecordingEngine::new());

    op.begin_window(1).unwrap();
    let err = op.process(0, &record([("id", Value::from(1))])).unwrap_err();
    assert!(matches!(
        err,
        Error::Ingest(IngestError::MissingValue { ref column, .. }) if column == "amount"
    ));
}

#[test]
fn test_emission_preserves_cursor_order() {
    let rows = vec![
        ResultRow::new().with("r", 1i64),
        ResultRow::new().with("r", 2i64),
        ResultRow::new().with("r", 3i64),
    ];
    let mut op = setup(RecordingEngine::new().with_rows("SESSION.orders", rows.clone()));

    op.begin_window(7).unwrap();
    let mut seen = Vec::new();
    let summary = op.end_window(&mut |row: ResultRow| seen.push(row)).unwrap();

    assert_eq!(seen, rows);
    assert_eq!(summary.rows_emitted, 3);
}

#[test]
fn test_bindings_are_passed_once() {
    let engine = RecordingEngine::new();
    let log = engine.log();
    let mut op = StagingOperator::setup(
        engine,
        registry(),
        "SELECT * FROM SESSION.orders WHERE id = ?",
        OperatorConfig::default(),
    )
    .unwrap();

    op.set_bindings(vec![Value::from(2)]);
    op.begin_window(1).unwrap();
    op.end_window(&mut CollectingEmitter::new()).unwrap();
    assert!(op.pending_bindings().is_none());

    let params = log
        .calls()
        .into_iter()
        .find_map(|c| match c {
            EngineCall::Query { params, .. } => Some(params),
            _ => None,
        })
        .unwrap();
    assert_eq!(params, vec![Value::Integer(2)]);

    // Next window without bindings: the placeholder is left unbound
    op.begin_window(2).unwrap();
    let err = op.end_window(&mut CollectingEmitter::new()).unwrap_err();
    assert!(matches!(err, Error::Query(_)));
}

#[test]
fn test_ingest_into_source_without_table_fails_fast() {
    let mut op = setup(RecordingEngine::new());

    op.begin_window(1).unwrap();
    let err = op.process(1, &record([("x", Value::from(1))])).unwrap_err();
    assert!(matches!(
        err,
        Error::Ingest(IngestError::NoStagingTable { index: 1, .. })
    ));

    let err = op.begin_window(2).unwrap_err();
    assert!(matches!(
        err,
        Error::Lifecycle(LifecycleError::WindowFailed { window_id: 1 })
    ));
}

#[test]
fn test_ingest_unknown_source() {
    let mut op = setup(RecordingEngine::new());
    op.begin_window(1).unwrap();

    let err = op.process(42, &record([("x", Value::from(1))])).unwrap_err();
    assert!(matches!(err, Error::Ingest(IngestError::UnknownSource(42))));

    op.abort_window().unwrap();
    op.begin_window(2).unwrap();
    let err = op
        .process_named("nope", &record([("x", Value::from(1))]))
        .unwrap_err();
    assert!(matches!(err, Error::Ingest(IngestError::UnknownSourceName(_))));
}

#[test]
fn test_process_named_resolves_index() {
    let mut op = setup(RecordingEngine::new());
    op.begin_window(1).unwrap();
    op.process_named("PAIRS", &record([("a", Value::from(1)), ("b", Value::from("y"))]))
        .unwrap();
    assert_eq!(op.engine().staged_rows(&qualified_table("SESSION", "pairs")), 1);
}

#[test]
fn test_lifecycle_violations() {
    let mut op = setup(RecordingEngine::new());

    let err = op.process(0, &record([("id", Value::from(1))])).unwrap_err();
    assert!(matches!(
        err,
        Error::Lifecycle(LifecycleError::NoOpenWindow { operation: "process" })
    ));
    assert!(matches!(
        op.end_window(&mut CollectingEmitter::new()).unwrap_err(),
        Error::Lifecycle(LifecycleError::NoOpenWindow { .. })
    ));

    op.begin_window(1).unwrap();
    let err = op.begin_window(2).unwrap_err();
    assert!(matches!(
        err,
        Error::Lifecycle(LifecycleError::WindowAlreadyOpen {
            current: 1,
            requested: 2
        })
    ));
    // A lifecycle violation does not poison the open window
    assert_eq!(op.state(), WindowState::Open { window_id: 1 });
}

#[test]
fn test_abort_window_rolls_back_and_purges() {
    let engine = RecordingEngine::new().fail_execute("SUM(amount)");
    let log = engine.log();
    let mut op = setup(engine);

    op.begin_window(1).unwrap();
    op.process(0, &record([("id", Value::from(1)), ("amount", Value::from(1.0))]))
        .unwrap();
    let err = op.end_window(&mut CollectingEmitter::new()).unwrap_err();
    assert!(matches!(err, Error::Query(_)));
    assert!(err.aborts_window());
    assert!(!log.calls().contains(&EngineCall::Commit));

    op.abort_window().unwrap();
    assert_eq!(op.state(), WindowState::Idle);
    assert_eq!(op.engine().staged_rows(&orders_table()), 0);
    assert!(!op.engine().in_transaction());
    assert!(log.calls().contains(&EngineCall::Rollback));

    // Aborting again is a no-op
    op.abort_window().unwrap();
    op.begin_window(2).unwrap();
}

#[test]
fn test_purge_is_idempotent() {
    let mut op = setup(RecordingEngine::new());
    op.begin_window(1).unwrap();
    op.process(0, &record([("id", Value::from(1)), ("amount", Value::from(2))]))
        .unwrap();

    op.purge().unwrap();
    op.purge().unwrap();
    assert_eq!(op.engine().staged_rows(&orders_table()), 0);
}

#[test]
fn test_commit_failure_fails_window() {
    let mut op = setup(RecordingEngine::new().fail_commit());
    op.begin_window(1).unwrap();

    let err = op.end_window(&mut CollectingEmitter::new()).unwrap_err();
    assert!(matches!(
        err,
        Error::Transaction(TransactionError::Commit { window_id: 1, .. })
    ));
    assert_eq!(op.state(), WindowState::Failed { window_id: 1 });
}

#[test]
fn test_begin_failure_fails_window() {
    let mut op = setup(RecordingEngine::new().fail_begin());
    let err = op.begin_window(5).unwrap_err();
    assert!(matches!(
        err,
        Error::Transaction(TransactionError::Begin { window_id: 5, .. })
    ));
    op.abort_window().unwrap();
    assert_eq!(op.state(), WindowState::Idle);
}

#[test]
fn test_setup_failures() {
    let err = StagingOperator::setup(
        RecordingEngine::new().fail_prepare("INSERT INTO \"SESSION\".\"orders\""),
        registry(),
        QUERY,
        OperatorConfig::default(),
    )
    .err()
    .unwrap();
    assert!(matches!(
        err,
        Error::Setup(SetupError::PrepareStatement { kind: "insert", .. })
    ));

    let err = StagingOperator::setup(
        RecordingEngine::new().fail_prepare("SUM"),
        registry(),
        QUERY,
        OperatorConfig::default(),
    )
    .err()
    .unwrap();
    assert!(matches!(err, Error::Setup(SetupError::PrepareQuery(_))));

    let err = StagingOperator::setup(
        RecordingEngine::new().fail_execute("DECLARE GLOBAL TEMPORARY TABLE"),
        registry(),
        QUERY,
        OperatorConfig::default(),
    )
    .err()
    .unwrap();
    assert!(matches!(err, Error::Setup(SetupError::CreateTable { .. })));

    let bad_type = SchemaRegistry::new()
        .with_source(SourceDescriptor::new("t").column("a", "INT); DROP TABLE x; --"));
    let err = StagingOperator::setup(
        RecordingEngine::new(),
        bad_type,
        QUERY,
        OperatorConfig::default(),
    )
    .err()
    .unwrap();
    assert!(matches!(err, Error::Setup(SetupError::InvalidColumnType { .. })));

    let duplicate = SchemaRegistry::new()
        .with_source(SourceDescriptor::new("t").column("a", "INT"))
        .with_source(SourceDescriptor::new("T").column("b", "INT"));
    let err = StagingOperator::setup(
        RecordingEngine::new(),
        duplicate,
        QUERY,
        OperatorConfig::default(),
    )
    .err()
    .unwrap();
    assert!(matches!(err, Error::Setup(SetupError::DuplicateTable { .. })));
}

#[test]
fn test_teardown_closes_engine() {
    let engine = RecordingEngine::new();
    let log = engine.log();
    setup(engine).teardown().unwrap();
    assert_eq!(log.calls().last(), Some(&EngineCall::Close));

    let err = setup(RecordingEngine::new().fail_close())
        .teardown()
        .unwrap_err();
    assert!(matches!(err, Error::Teardown(_)));
}

#[test]
fn test_custom_namespace() {
    let config = OperatorConfig::default().with_namespace("STAGE");
    let op = StagingOperator::setup(
        RecordingEngine::new(),
        registry(),
        "SELECT * FROM STAGE.orders",
        config,
    )
    .unwrap();
    assert_eq!(op.staging_table(0).unwrap().name(), "STAGE.orders");
}
