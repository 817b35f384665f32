//! SQL Server connection.
//!
//! Owns one native client handle and the per-connection state derived
//! from it: the quoting mode, the cached server version and database
//! list, the transaction state, and the rows affected by the last
//! statement.

use oxide_sqlsrv_core::{
    ConnectionConfig, DatabaseError, ErrorInfo, ErrorTranslator, Escaper, ForgeContext,
    NativeClient, NativeStatement, QuotingMode, Result, TransactionState, Transactional, Value,
};
use tracing::{debug, info, warn};

use crate::dialect::SqlsrvDialect;
use crate::prepared::PreparedQuery;
use crate::quoting::{mode_from_probe, QUOTED_IDENTIFIER_PROBE};
use crate::result::ResultSet;

/// Query returning the last identity value generated in this session.
pub const INSERT_ID_QUERY: &str = "SELECT SCOPE_IDENTITY() AS insertID";

/// Values cached per connection.
///
/// `version` is filled on first read. `db_names` is filled by the
/// first database listing, then appended to on create and pruned on
/// drop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataCache {
    /// Server version string.
    pub version: Option<String>,
    /// Database names on the server.
    pub db_names: Option<Vec<String>>,
}

impl DataCache {
    /// Records a newly created database if the list is loaded.
    pub fn push_database(&mut self, name: &str) {
        if let Some(ref mut names) = self.db_names {
            names.push(name.to_string());
        }
    }

    /// Forgets a dropped database (case-insensitive) if the list is
    /// loaded.
    pub fn remove_database(&mut self, name: &str) {
        if let Some(ref mut names) = self.db_names {
            names.retain(|n| !n.eq_ignore_ascii_case(name));
        }
    }
}

/// A connection to one SQL Server instance.
///
/// Not meant to be shared between callers; use one connection per
/// logical session.
#[derive(Debug)]
pub struct Connection<C: NativeClient> {
    config: ConnectionConfig,
    client: C,
    dialect: SqlsrvDialect,
    connected: bool,
    quoting: QuotingMode,
    cache: DataCache,
    trans_state: TransactionState,
    last_affected: Option<u64>,
}

impl<C: NativeClient> Connection<C> {
    /// Creates an unopened connection. Nothing is sent until
    /// [`Connection::initialize`] or the first query.
    #[must_use]
    pub fn new(config: ConnectionConfig, client: C) -> Self {
        Self {
            config,
            client,
            dialect: SqlsrvDialect::new(),
            connected: false,
            quoting: QuotingMode::Bracketed,
            cache: DataCache::default(),
            trans_state: TransactionState::default(),
            last_affected: None,
        }
    }

    /// The connection settings.
    #[must_use]
    pub const fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// The dialect used for SQL generation and error translation.
    #[must_use]
    pub const fn dialect(&self) -> &SqlsrvDialect {
        &self.dialect
    }

    /// The native client.
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// The native client, mutably.
    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    /// Whether a session is open.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    /// The identifier quoting mode chosen at connect time.
    ///
    /// Bracketed until the first connect has probed the session.
    #[must_use]
    pub const fn quoting_mode(&self) -> QuotingMode {
        self.quoting
    }

    /// An escaper for the current quoting mode.
    #[must_use]
    pub const fn escaper(&self) -> Escaper {
        Escaper::new(self.quoting)
    }

    /// Rendering context for DDL generation.
    #[must_use]
    pub fn forge_context(&self) -> ForgeContext {
        ForgeContext::new(self.escaper())
            .with_charset(self.config.charset.as_str())
            .with_collation(self.config.collation.as_str())
    }

    /// Opens the session, then returns an escaper for the probed mode.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::initialize`].
    pub fn session_escaper(&mut self) -> Result<Escaper> {
        self.initialize()?;
        Ok(self.escaper())
    }

    /// Opens the session, then returns the DDL rendering context.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::initialize`].
    pub fn session_context(&mut self) -> Result<ForgeContext> {
        self.initialize()?;
        Ok(self.forge_context())
    }

    /// Applies the configured table prefix.
    #[must_use]
    pub fn prefix_table(&self, table: &str) -> String {
        format!("{}{table}", self.config.db_prefix)
    }

    /// Per-connection cached values.
    #[must_use]
    pub const fn cache(&self) -> &DataCache {
        &self.cache
    }

    pub(crate) fn cache_mut(&mut self) -> &mut DataCache {
        &mut self.cache
    }

    /// Opens the session if it is not open yet.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Connection`] with the translated native
    /// error when the server refuses the connection.
    pub fn initialize(&mut self) -> Result<()> {
        if self.connected {
            return Ok(());
        }
        if self.connect() {
            Ok(())
        } else {
            let error = self.error();
            warn!(server = %self.config.server(), code = %error.code, "Connection failed");
            Err(DatabaseError::Connection(error))
        }
    }

    fn connect(&mut self) -> bool {
        let server = self.config.server();
        let params = self.config.connection_params();
        info!(
            server = %server,
            database = %params.database,
            integrated_auth = params.credentials.is_none(),
            charset = params.character_set.as_str(),
            "Connecting"
        );

        if !self.client.connect(&server, &params) {
            return false;
        }
        self.connected = true;
        self.detect_quoting();
        true
    }

    fn detect_quoting(&mut self) {
        let row = self
            .client
            .query(QUOTED_IDENTIFIER_PROBE)
            .and_then(|stmt| ResultSet::new(stmt).row_array(0).ok().flatten());
        self.quoting = mode_from_probe(row.as_ref());
        debug!(mode = ?self.quoting, "Selected identifier quoting");
    }

    /// Closes the session. Cached values survive; the quoting mode is
    /// decided again on the next connect.
    pub fn close(&mut self) {
        if self.connected {
            self.client.close();
            self.connected = false;
            info!(server = %self.config.server(), "Connection closed");
        }
    }

    /// Closes and opens the session again.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Connection`] when reopening fails.
    pub fn reconnect(&mut self) -> Result<()> {
        info!(server = %self.config.server(), "Reconnecting");
        self.close();
        self.initialize()
    }

    /// Switching databases on an open session is not supported.
    pub fn set_database(&mut self, database: &str) -> bool {
        warn!(database = %database, "Switching databases is not supported");
        false
    }

    /// The server version, read once and cached.
    pub fn version(&mut self) -> Option<String> {
        if let Some(ref version) = self.cache.version {
            return Some(version.clone());
        }
        if !self.connected {
            return None;
        }
        let version = self.client.server_info()?.version;
        self.cache.version = Some(version.clone());
        Some(version)
    }

    /// Runs `sql` and returns the raw statement handle.
    ///
    /// Connects first if needed. Failures come back as `None`; the
    /// details are available from [`Connection::error`].
    pub fn simple_query(&mut self, sql: &str) -> Option<C::Statement> {
        if let Err(err) = self.initialize() {
            warn!(sql = %sql, error = %err, "Query skipped, no connection");
            return None;
        }

        debug!(sql = %sql, "Executing SQL");
        match self.client.query(sql) {
            Some(stmt) => {
                self.last_affected = stmt.rows_affected();
                Some(stmt)
            }
            None => {
                let error = self.error();
                warn!(sql = %sql, code = %error.code, message = %error.message, "Query failed");
                self.last_affected = None;
                None
            }
        }
    }

    /// Runs `sql` and wraps the handle in a [`ResultSet`].
    pub fn query(&mut self, sql: &str) -> Option<ResultSet<C::Statement>> {
        self.simple_query(sql).map(ResultSet::new)
    }

    /// Runs a statement whose result is not needed and releases it.
    pub fn execute(&mut self, sql: &str) -> bool {
        self.query(sql).is_some()
    }

    /// Rows affected by the last statement.
    #[must_use]
    pub fn affected_rows(&self) -> u64 {
        self.last_affected.unwrap_or(0)
    }

    /// The last identity value generated in this session, `0` if none.
    pub fn insert_id(&mut self) -> i64 {
        self.query(INSERT_ID_QUERY)
            .and_then(|mut result| result.row_array(0).ok().flatten())
            .and_then(|row| row.int("insertID"))
            .unwrap_or(0)
    }

    /// The most recent backend error, or the no-error sentinel.
    #[must_use]
    pub fn error(&self) -> ErrorInfo {
        self.dialect.translate(&self.client.errors())
    }

    /// Prepares `sql` for repeated execution with `?` placeholders.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Connection`] if the session cannot be
    /// opened and [`DatabaseError::Execution`] if the server rejects
    /// the statement.
    pub fn prepare(&mut self, sql: &str) -> Result<PreparedQuery<C::Statement>> {
        self.initialize()?;
        debug!(sql = %sql, "Preparing SQL");
        match self.client.prepare(sql) {
            Some(stmt) => Ok(PreparedQuery::new(sql, stmt)),
            None => {
                let info = self.error();
                warn!(sql = %sql, code = %info.code, "Prepare failed");
                Err(DatabaseError::Execution {
                    message: String::from("Unable to prepare statement."),
                    info,
                })
            }
        }
    }

    /// Runs `sql` once with `params` bound through a prepared handle.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::prepare`].
    pub fn query_with(&mut self, sql: &str, params: &[Value]) -> Result<bool> {
        let mut prepared = self.prepare(sql)?;
        let ok = prepared.execute(params).is_some();
        prepared.close();
        Ok(ok)
    }
}

impl<C: NativeClient> Transactional for Connection<C> {
    fn trans_begin(&mut self) -> bool {
        if self.initialize().is_err() {
            return false;
        }
        let ok = self.client.begin_transaction();
        if ok {
            self.trans_state = TransactionState::Active;
            debug!("Transaction started");
        } else {
            warn!("Unable to start transaction");
        }
        ok
    }

    fn trans_commit(&mut self) -> bool {
        let ok = self.client.commit();
        if ok {
            self.trans_state = TransactionState::Committed;
            debug!("Transaction committed");
        } else {
            warn!(state = %self.trans_state, "Commit failed");
        }
        ok
    }

    fn trans_rollback(&mut self) -> bool {
        let ok = self.client.rollback();
        if ok {
            self.trans_state = TransactionState::RolledBack;
            debug!("Transaction rolled back");
        } else {
            warn!(state = %self.trans_state, "Rollback failed");
        }
        ok
    }

    fn transaction_state(&self) -> TransactionState {
        self.trans_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_tracks_created_and_dropped_databases() {
        let mut cache = DataCache::default();
        cache.push_database("ignored");
        assert_eq!(cache.db_names, None);

        cache.db_names = Some(vec!["master".into(), "Shop".into()]);
        cache.push_database("audit");
        cache.remove_database("shop");
        assert_eq!(
            cache.db_names,
            Some(vec!["master".to_string(), "audit".to_string()])
        );
    }
}
