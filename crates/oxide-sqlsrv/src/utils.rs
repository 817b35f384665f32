//! Database utilities.

use std::collections::BTreeMap;

use oxide_sqlsrv_core::{
    CatalogQuery, DatabaseError, MetadataSource, NativeClient, Result,
};
use tracing::{info, warn};

use crate::connection::Connection;

/// Lists every database on the server.
pub const LIST_DATABASES: &str = "SELECT name FROM master.sys.databases";

/// Rebuilds every index of one table. `{table}` is the escaped name.
pub const OPTIMIZE_TABLE: &str = "ALTER INDEX ALL ON {table} REBUILD";

/// Message returned by operations this backend cannot perform.
pub const UNSUPPORTED_FEATURE: &str =
    "Unsupported feature of the database platform you are using.";

/// Server-level helpers bound to one connection.
#[derive(Debug)]
pub struct Utils<'a, C: NativeClient> {
    conn: &'a mut Connection<C>,
}

impl<'a, C: NativeClient> Utils<'a, C> {
    /// Creates utilities for `conn`.
    pub fn new(conn: &'a mut Connection<C>) -> Self {
        Self { conn }
    }

    /// Database names, loaded once per connection.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::CatalogQuery`] when the listing fails.
    pub fn list_databases(&mut self) -> Result<Vec<String>> {
        if let Some(ref names) = self.conn.cache().db_names {
            return Ok(names.clone());
        }

        let mut result = self
            .conn
            .query(LIST_DATABASES)
            .ok_or(DatabaseError::CatalogQuery(CatalogQuery::ListDatabases))?;
        let names = result
            .result_array()?
            .iter()
            .map(|row| row.required_text("name"))
            .collect::<Result<Vec<_>>>()?;
        self.conn.cache_mut().db_names = Some(names.clone());
        Ok(names)
    }

    /// Whether a database exists, compared case-insensitively.
    ///
    /// # Errors
    ///
    /// Same as [`Utils::list_databases`].
    pub fn database_exists(&mut self, name: &str) -> Result<bool> {
        Ok(self
            .list_databases()?
            .iter()
            .any(|n| n.eq_ignore_ascii_case(name)))
    }

    /// Rebuilds the indexes of `table` (prefix applied).
    pub fn optimize_table(&mut self, table: &str) -> bool {
        let escaper = match self.conn.session_escaper() {
            Ok(escaper) => escaper,
            Err(err) => {
                warn!(table = %table, error = %err, "Optimize skipped, no connection");
                return false;
            }
        };
        let escaped = escaper.identifier(&self.conn.prefix_table(table));
        let ok = self.conn.execute(&OPTIMIZE_TABLE.replace("{table}", &escaped));
        if !ok {
            warn!(table = %table, "Optimize failed");
        }
        ok
    }

    /// Rebuilds the indexes of every table, keyed by table name.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::CatalogQuery`] when the table listing
    /// fails. Individual rebuild failures are reported in the map.
    pub fn optimize_database(&mut self) -> Result<BTreeMap<String, bool>> {
        let tables = self.conn.list_tables(false)?;
        let escaper = self.conn.session_escaper()?;
        let mut report = BTreeMap::new();
        for table in tables {
            let escaped = escaper.identifier(&table);
            let ok = self.conn.execute(&OPTIMIZE_TABLE.replace("{table}", &escaped));
            report.insert(table, ok);
        }
        info!(tables = report.len(), "Database optimized");
        Ok(report)
    }

    /// Backups are not available on this backend.
    ///
    /// # Errors
    ///
    /// Always returns [`DatabaseError::Unsupported`].
    pub fn backup(&mut self) -> Result<()> {
        warn!("Backup requested but not supported");
        Err(DatabaseError::Unsupported(UNSUPPORTED_FEATURE.into()))
    }
}
