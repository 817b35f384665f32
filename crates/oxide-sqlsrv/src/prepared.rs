//! Prepared statements.
//!
//! A statement is prepared once on the server and executed any number
//! of times with different parameters. Execution binds the parameters
//! into the prepared handle and runs that handle; the SQL text is never
//! re-sent.

use oxide_sqlsrv_core::{NativeStatement, Value};
use tracing::{debug, warn};

use crate::result::ResultSet;

/// A statement prepared on the server.
#[derive(Debug)]
pub struct PreparedQuery<S: NativeStatement> {
    sql: String,
    statement: Option<S>,
    executions: usize,
}

impl<S: NativeStatement> PreparedQuery<S> {
    pub(crate) fn new(sql: impl Into<String>, statement: S) -> Self {
        Self {
            sql: sql.into(),
            statement: Some(statement),
            executions: 0,
        }
    }

    /// The prepared SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// How many times the statement ran successfully.
    #[must_use]
    pub const fn executions(&self) -> usize {
        self.executions
    }

    /// Whether [`PreparedQuery::close`] has been called.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.statement.is_none()
    }

    /// Binds `params` and executes the prepared handle.
    ///
    /// The returned result borrows the handle; dropping it leaves the
    /// statement ready for the next execution. Returns `None` if the
    /// statement is closed or the server rejects the execution.
    pub fn execute(&mut self, params: &[Value]) -> Option<ResultSet<&mut S>> {
        let Some(statement) = self.statement.as_mut() else {
            warn!(sql = %self.sql, "Execute called on a closed statement");
            return None;
        };

        debug!(sql = %self.sql, params = params.len(), "Executing prepared SQL");
        if !statement.execute(params) {
            warn!(sql = %self.sql, "Prepared statement execution failed");
            return None;
        }
        self.executions += 1;
        Some(ResultSet::borrowed(statement))
    }

    /// Releases the prepared handle. Returns `false` if it was already
    /// released.
    pub fn close(&mut self) -> bool {
        match self.statement.take() {
            Some(mut statement) => {
                statement.free();
                debug!(sql = %self.sql, "Prepared statement closed");
                true
            }
            None => false,
        }
    }
}

impl<S: NativeStatement> Drop for PreparedQuery<S> {
    fn drop(&mut self) {
        self.close();
    }
}
