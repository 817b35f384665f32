mod common;

use common::{MockClient, config, connect, connect_with};
use oxide_sqlsrv::Connection;
use oxide_sqlsrv::connection::INSERT_ID_QUERY;
use oxide_sqlsrv::quoting::QUOTED_IDENTIFIER_PROBE;
use oxide_sqlsrv_core::{
    ConnectionConfig, Credentials, DatabaseError, Encoding, ErrorInfo, NativeError, QuotingMode,
    TransactionState, Transactional, Value,
};

#[test]
fn test_probe_runs_right_after_connect() {
    let conn = connect(MockClient::new().quoted());
    assert_eq!(conn.client().executed, vec![QUOTED_IDENTIFIER_PROBE.to_string()]);
    assert!(conn.is_connected());
}

#[test]
fn test_quoted_identifier_on_selects_double_quotes() {
    let conn = connect(MockClient::new().quoted());
    assert_eq!(conn.quoting_mode(), QuotingMode::Quoted);
    assert_eq!(conn.escaper().identifier("users"), "\"users\"");
}

#[test]
fn test_quoted_identifier_off_selects_brackets() {
    let client = MockClient::new().respond("@@OPTIONS", &["qi"], vec![vec![Value::Int(0)]]);
    let conn = connect(client);
    assert_eq!(conn.quoting_mode(), QuotingMode::Bracketed);
    assert_eq!(conn.escaper().identifier("users"), "[users]");
}

#[test]
fn test_failed_probe_selects_brackets() {
    let client = MockClient::new().fail("@@OPTIONS", vec![NativeError::new("42000", 102, "x")]);
    let conn = connect(client);
    assert_eq!(conn.quoting_mode(), QuotingMode::Bracketed);
}

#[test]
fn test_empty_credentials_use_integrated_auth() {
    let conn = connect_with(ConnectionConfig::new("db.local"), MockClient::new());
    let (server, params) = &conn.client().connects[0];
    assert_eq!(server, "db.local");
    assert_eq!(params.credentials, None);
    assert!(params.return_dates_as_strings);
}

#[test]
fn test_credentials_and_port_are_passed_through() {
    let conn = connect_with(config().with_port(1433), MockClient::new());
    let (server, params) = &conn.client().connects[0];
    assert_eq!(server, "db.local,1433");
    assert_eq!(
        params.credentials,
        Some(Credentials {
            uid: "app".into(),
            pwd: "secret".into(),
        })
    );
    assert_eq!(params.database, "shop");
}

#[test]
fn test_charset_selects_transfer_encoding() {
    let conn = connect(MockClient::new());
    assert_eq!(conn.client().connects[0].1.character_set, Encoding::Utf8);

    let conn = connect_with(config().with_charset("latin1"), MockClient::new());
    assert_eq!(conn.client().connects[0].1.character_set, Encoding::Char);
}

#[test]
fn test_refused_connection_reports_translated_error() {
    let client = MockClient::new().refuse(vec![NativeError::new(
        "08001",
        53,
        "Named Pipes Provider: Could not open a connection",
    )]);
    let mut conn = Connection::new(config(), client);
    let err = conn.initialize().unwrap_err();
    match err {
        DatabaseError::Connection(info) => {
            assert_eq!(info.code, "08001/53");
            assert!(info.message.starts_with("Named Pipes Provider"));
        }
        other => panic!("expected connection error, got {other:?}"),
    }
    assert!(!conn.is_connected());
}

#[test]
fn test_unopened_connection_defaults_to_brackets() {
    let conn = Connection::new(config(), MockClient::new().quoted());
    assert_eq!(conn.quoting_mode(), QuotingMode::Bracketed);
    assert!(conn.client().executed.is_empty());
}

#[test]
fn test_session_escaper_probes_before_escaping() {
    let mut conn = Connection::new(config(), MockClient::new().quoted());
    let escaper = conn.session_escaper().unwrap();
    assert_eq!(escaper.identifier("users"), "\"users\"");
    assert_eq!(conn.client().executed, vec![QUOTED_IDENTIFIER_PROBE.to_string()]);
}

#[test]
fn test_query_connects_lazily() {
    let mut conn = Connection::new(config(), MockClient::new().quoted());
    assert!(!conn.is_connected());
    assert!(conn.execute("SELECT 1"));
    assert!(conn.is_connected());
    assert_eq!(conn.client().statements(), vec!["SELECT 1"]);
}

#[test]
fn test_version_is_read_once() {
    let mut conn = connect(MockClient::new().with_version("16.00.1000"));
    assert_eq!(conn.version().as_deref(), Some("16.00.1000"));
    assert_eq!(conn.version().as_deref(), Some("16.00.1000"));
    assert_eq!(conn.client().server_info_calls, 1);
    assert_eq!(conn.cache().version.as_deref(), Some("16.00.1000"));
}

#[test]
fn test_version_without_connection_is_none() {
    let mut conn = Connection::new(config(), MockClient::new().with_version("16.0"));
    assert_eq!(conn.version(), None);
    assert_eq!(conn.client().server_info_calls, 0);
}

#[test]
fn test_failed_query_leaves_error_for_caller() {
    let client = MockClient::new().fail(
        "missing_table",
        vec![NativeError::new("42S02", 208, "Invalid object name 'missing_table'.")],
    );
    let mut conn = connect(client);
    assert!(conn.query("SELECT * FROM missing_table").is_none());

    let error = conn.error();
    assert_eq!(error.code, "42S02/208");
    assert_eq!(error.message, "Invalid object name 'missing_table'.");
    assert!(error.is_error());
}

#[test]
fn test_no_error_is_sentinel() {
    let mut conn = connect(MockClient::new());
    assert!(conn.execute("SELECT 1"));
    assert_eq!(conn.error(), ErrorInfo::none());
}

#[test]
fn test_insert_id() {
    let client = MockClient::new().respond(INSERT_ID_QUERY, &["insertID"], vec![vec![Value::Int(42)]]);
    let mut conn = connect(client);
    assert_eq!(conn.insert_id(), 42);
}

#[test]
fn test_insert_id_without_identity_is_zero() {
    let client = MockClient::new().respond(INSERT_ID_QUERY, &["insertID"], vec![vec![Value::Null]]);
    let mut conn = connect(client);
    assert_eq!(conn.insert_id(), 0);
}

#[test]
fn test_affected_rows_follow_last_statement() {
    let client = MockClient::new().respond_with(
        "UPDATE",
        common::MockStatement::new(&[], Vec::new()).with_affected(3),
    );
    let mut conn = connect(client);
    assert!(conn.execute("UPDATE users SET active = 0"));
    assert_eq!(conn.affected_rows(), 3);
    assert!(conn.execute("SELECT 1"));
    assert_eq!(conn.affected_rows(), 0);
}

#[test]
fn test_transaction_commit() {
    let mut conn = connect(MockClient::new());
    assert_eq!(conn.transaction_state(), TransactionState::Idle);
    assert!(conn.trans_begin());
    assert_eq!(conn.transaction_state(), TransactionState::Active);
    assert!(conn.trans_commit());
    assert_eq!(conn.transaction_state(), TransactionState::Committed);
    assert_eq!(conn.client().transactions, vec!["begin", "commit"]);
}

#[test]
fn test_transaction_rollback() {
    let mut conn = connect(MockClient::new());
    assert!(conn.trans_begin());
    assert!(conn.trans_rollback());
    assert_eq!(conn.transaction_state(), TransactionState::RolledBack);
}

#[test]
fn test_failed_transaction_calls_return_false() {
    let mut conn = connect(MockClient::new().failing_transactions());
    assert!(!conn.trans_begin());
    assert_eq!(conn.transaction_state(), TransactionState::Idle);
    assert!(!conn.trans_commit());
    assert!(!conn.trans_rollback());
    assert_eq!(conn.transaction_state(), TransactionState::Idle);
}

#[test]
fn test_reconnect_detects_quoting_again() {
    let mut conn = connect(MockClient::new().quoted());
    conn.reconnect().unwrap();
    assert_eq!(conn.client().closes, 1);
    assert_eq!(conn.client().connects.len(), 2);
    assert_eq!(
        conn.client()
            .executed
            .iter()
            .filter(|sql| sql.as_str() == QUOTED_IDENTIFIER_PROBE)
            .count(),
        2
    );
}

#[test]
fn test_close_is_idempotent() {
    let mut conn = connect(MockClient::new());
    conn.close();
    conn.close();
    assert_eq!(conn.client().closes, 1);
    assert!(!conn.is_connected());
}

#[test]
fn test_set_database_is_unsupported() {
    let mut conn = connect(MockClient::new());
    assert!(!conn.set_database("other"));
}

#[test]
fn test_query_with_binds_into_prepared_handle() {
    let statement = common::MockStatement::new(&[], Vec::new());
    let bindings = statement.bindings();
    let client = MockClient::new().respond_with("INSERT INTO", statement);
    let mut conn = connect(client);
    let frees_before = conn.client().frees.get();

    let ok = conn
        .query_with(
            "INSERT INTO users (name, age) VALUES (?, ?)",
            &[Value::from("ada"), Value::Int(36)],
        )
        .unwrap();
    assert!(ok);
    assert_eq!(
        conn.client().prepared,
        vec!["INSERT INTO users (name, age) VALUES (?, ?)".to_string()]
    );
    assert!(conn.client().statements().is_empty());
    assert_eq!(
        *bindings.borrow(),
        vec![vec![Value::Text("ada".into()), Value::Int(36)]]
    );
    assert_eq!(conn.client().frees.get(), frees_before + 1);
}

#[test]
fn test_failed_prepare_is_execution_error() {
    let client = MockClient::new().fail("bogus", vec![NativeError::new("42000", 156, "Incorrect syntax")]);
    let mut conn = connect(client);
    match conn.prepare("SELECT bogus ?") {
        Err(DatabaseError::Execution { message, info }) => {
            assert_eq!(message, "Unable to prepare statement.");
            assert_eq!(info.code, "42000/156");
        }
        other => panic!("expected execution error, got {other:?}"),
    }
}
