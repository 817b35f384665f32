#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use oxide_sqlsrv::Connection;
use oxide_sqlsrv_core::{
    ConnectionConfig, ConnectionParams, NativeClient, NativeError, NativeField, NativeStatement,
    ServerInfo, Value,
};

/// A statement handle over canned rows.
#[derive(Debug, Clone)]
pub struct MockStatement {
    fields: Vec<NativeField>,
    rows: Vec<Vec<Value>>,
    position: usize,
    affected: Option<u64>,
    execute_ok: bool,
    forward_only: bool,
    frees: Rc<Cell<usize>>,
    bindings: Rc<RefCell<Vec<Vec<Value>>>>,
}

impl MockStatement {
    pub fn new(columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        Self {
            fields: columns
                .iter()
                .map(|c| NativeField::new(*c, "nvarchar", Some(255)))
                .collect(),
            rows,
            position: 0,
            affected: None,
            execute_ok: true,
            forward_only: false,
            frees: Rc::new(Cell::new(0)),
            bindings: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn with_fields(mut self, fields: Vec<NativeField>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_affected(mut self, affected: u64) -> Self {
        self.affected = Some(affected);
        self
    }

    /// Refuses every `seek()`, like a forward-only cursor.
    pub fn forward_only(mut self) -> Self {
        self.forward_only = true;
        self
    }

    /// Shared counter of `free()` calls.
    pub fn frees(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.frees)
    }

    /// Shared log of parameter sets passed to `execute()`.
    pub fn bindings(&self) -> Rc<RefCell<Vec<Vec<Value>>>> {
        Rc::clone(&self.bindings)
    }
}

impl NativeStatement for MockStatement {
    fn field_metadata(&self) -> Vec<NativeField> {
        self.fields.clone()
    }

    fn fetch_row(&mut self) -> Option<Vec<Value>> {
        let row = self.rows.get(self.position).cloned()?;
        self.position += 1;
        Some(row)
    }

    fn seek(&mut self, row: usize) -> bool {
        if self.forward_only || row > self.rows.len() {
            return false;
        }
        self.position = row;
        true
    }

    fn rows_affected(&self) -> Option<u64> {
        self.affected
    }

    fn execute(&mut self, params: &[Value]) -> bool {
        self.bindings.borrow_mut().push(params.to_vec());
        self.position = 0;
        self.execute_ok
    }

    fn free(&mut self) {
        self.frees.set(self.frees.get() + 1);
    }
}

#[derive(Debug, Clone)]
enum Outcome {
    Rows(MockStatement),
    Fail(Vec<NativeError>),
}

/// A scripted client. Statements are matched by substring against the
/// scripts in the order they were added; unmatched statements succeed
/// with an empty result.
#[derive(Debug, Default)]
pub struct MockClient {
    scripts: Vec<(String, Outcome)>,
    last_errors: Vec<NativeError>,
    refusal: Option<Vec<NativeError>>,
    info: Option<ServerInfo>,
    fail_transactions: bool,
    pub executed: Vec<String>,
    pub prepared: Vec<String>,
    pub connects: Vec<(String, ConnectionParams)>,
    pub server_info_calls: usize,
    pub transactions: Vec<&'static str>,
    pub closes: usize,
    pub frees: Rc<Cell<usize>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports `QUOTED_IDENTIFIER ON` to the connect-time probe.
    pub fn quoted(self) -> Self {
        self.respond("@@OPTIONS", &["qi"], vec![vec![Value::Int(1)]])
    }

    pub fn respond(self, pattern: &str, columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        self.respond_with(pattern, MockStatement::new(columns, rows))
    }

    pub fn respond_with(mut self, pattern: &str, statement: MockStatement) -> Self {
        let statement = MockStatement {
            frees: Rc::clone(&self.frees),
            ..statement
        };
        self.scripts
            .push((pattern.to_string(), Outcome::Rows(statement)));
        self
    }

    pub fn fail(mut self, pattern: &str, errors: Vec<NativeError>) -> Self {
        self.scripts
            .push((pattern.to_string(), Outcome::Fail(errors)));
        self
    }

    pub fn refuse(mut self, errors: Vec<NativeError>) -> Self {
        self.refusal = Some(errors);
        self
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.info = Some(ServerInfo {
            version: version.to_string(),
            server_name: "mock".to_string(),
            current_database: "master".to_string(),
        });
        self
    }

    pub fn failing_transactions(mut self) -> Self {
        self.fail_transactions = true;
        self
    }

    /// Executed statements, skipping the connect-time probe.
    pub fn statements(&self) -> Vec<&str> {
        self.executed
            .iter()
            .map(String::as_str)
            .filter(|sql| !sql.contains("@@OPTIONS"))
            .collect()
    }

    fn run(&mut self, sql: &str) -> Option<MockStatement> {
        let outcome = self
            .scripts
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, outcome)| outcome.clone());

        match outcome {
            Some(Outcome::Fail(errors)) => {
                self.last_errors = errors;
                None
            }
            Some(Outcome::Rows(statement)) => {
                self.last_errors.clear();
                Some(statement)
            }
            None => {
                self.last_errors.clear();
                Some(MockStatement {
                    frees: Rc::clone(&self.frees),
                    ..MockStatement::new(&[], Vec::new())
                })
            }
        }
    }

    fn transaction(&mut self, step: &'static str) -> bool {
        self.transactions.push(step);
        !self.fail_transactions
    }
}

impl NativeClient for MockClient {
    type Statement = MockStatement;

    fn connect(&mut self, server: &str, params: &ConnectionParams) -> bool {
        self.connects.push((server.to_string(), params.clone()));
        match self.refusal {
            Some(ref errors) => {
                self.last_errors = errors.clone();
                false
            }
            None => true,
        }
    }

    fn query(&mut self, sql: &str) -> Option<MockStatement> {
        self.executed.push(sql.to_string());
        self.run(sql)
    }

    fn prepare(&mut self, sql: &str) -> Option<MockStatement> {
        self.prepared.push(sql.to_string());
        self.run(sql)
    }

    fn begin_transaction(&mut self) -> bool {
        self.transaction("begin")
    }

    fn commit(&mut self) -> bool {
        self.transaction("commit")
    }

    fn rollback(&mut self) -> bool {
        self.transaction("rollback")
    }

    fn server_info(&mut self) -> Option<ServerInfo> {
        self.server_info_calls += 1;
        self.info.clone()
    }

    fn errors(&self) -> Vec<NativeError> {
        self.last_errors.clone()
    }

    fn close(&mut self) {
        self.closes += 1;
    }
}

pub fn config() -> ConnectionConfig {
    ConnectionConfig::new("db.local")
        .with_credentials("app", "secret")
        .with_database("shop")
}

/// Reports `QUOTED_IDENTIFIER OFF` to the connect-time probe.
pub fn unquoted(client: MockClient) -> MockClient {
    client.respond("@@OPTIONS", &["qi"], vec![vec![Value::Int(0)]])
}

pub fn connect(client: MockClient) -> Connection<MockClient> {
    connect_with(config(), client)
}

pub fn connect_with(config: ConnectionConfig, client: MockClient) -> Connection<MockClient> {
    let mut conn = Connection::new(config, client);
    conn.initialize()
        .unwrap_or_else(|e| panic!("mock connection refused: {e}"));
    conn
}

pub fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}
