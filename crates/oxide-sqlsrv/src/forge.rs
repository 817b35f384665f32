//! Stateful DDL front end.
//!
//! [`Forge`] collects fields and keys across calls, renders them with a
//! [`DialectForge`] and runs the statements on a [`Connection`].
//!
//! Failures follow the connection's `debug` flag: with it set, an
//! unsupported operation or a rejected statement is returned as an
//! error; without it, the operation logs a warning and reports `false`.
//! Missing names and fields are always errors.

use std::mem;

use oxide_sqlsrv_core::{
    CreateTableOp, DatabaseError, DialectForge, FieldDefinition, FieldSpec, ForgeOperation,
    NativeClient, Result, TableAttributes,
};
use tracing::{debug, info, warn};

use crate::connection::Connection;
use crate::dialect::SqlsrvDialect;

/// Collects table definitions and runs DDL against one connection.
#[derive(Debug)]
pub struct Forge<'a, C: NativeClient, D: DialectForge = SqlsrvDialect> {
    conn: &'a mut Connection<C>,
    dialect: D,
    fields: Vec<FieldDefinition>,
    keys: Vec<Vec<String>>,
    primary_keys: Vec<String>,
}

impl<'a, C: NativeClient> Forge<'a, C> {
    /// Creates a forge using the SQL Server dialect.
    pub fn new(conn: &'a mut Connection<C>) -> Self {
        Self::with_dialect(conn, SqlsrvDialect::new())
    }
}

impl<'a, C: NativeClient, D: DialectForge> Forge<'a, C, D> {
    /// Creates a forge rendering with `dialect`.
    pub fn with_dialect(conn: &'a mut Connection<C>, dialect: D) -> Self {
        Self {
            conn,
            dialect,
            fields: Vec::new(),
            keys: Vec::new(),
            primary_keys: Vec::new(),
        }
    }

    /// The underlying connection.
    pub fn connection(&mut self) -> &mut Connection<C> {
        self.conn
    }

    /// Fields queued for the next table operation.
    #[must_use]
    pub fn pending_fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    /// Queues a field.
    ///
    /// The literal `"id"` adds the standard identity column and makes it
    /// the primary key. Any other literal must be a full column
    /// definition. A spec whose name is already queued replaces the
    /// earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::InvalidArgument`] for a bare literal
    /// with no column definition.
    pub fn add_field(&mut self, field: impl Into<FieldDefinition>) -> Result<&mut Self> {
        match field.into() {
            FieldDefinition::Literal(sql) if sql == "id" => {
                self.add_id_field();
            }
            FieldDefinition::Literal(sql) if !sql.contains(' ') => {
                return Err(DatabaseError::InvalidArgument(String::from(
                    "Field information is required for that operation.",
                )));
            }
            FieldDefinition::Literal(sql) => self.fields.push(FieldDefinition::Literal(sql)),
            FieldDefinition::Spec(spec) => self.push_spec(spec),
        }
        Ok(self)
    }

    /// Queues several fields in order.
    ///
    /// # Errors
    ///
    /// Same as [`Forge::add_field`]; fields before the failing one stay
    /// queued.
    pub fn add_fields<I, F>(&mut self, fields: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldDefinition>,
    {
        for field in fields {
            self.add_field(field)?;
        }
        Ok(self)
    }

    /// Queues `id INT(9) NOT NULL AUTO_INCREMENT` as the primary key.
    pub fn add_id_field(&mut self) -> &mut Self {
        self.push_spec(FieldSpec::id());
        self.add_primary_key(["id"])
    }

    /// Queues a key over `columns`; a primary key when `primary` is set.
    pub fn add_key<S: Into<String>>(
        &mut self,
        columns: impl IntoIterator<Item = S>,
        primary: bool,
    ) -> &mut Self {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            return self;
        }
        if primary {
            for column in columns {
                if !self.primary_keys.contains(&column) {
                    self.primary_keys.push(column);
                }
            }
        } else {
            self.keys.push(columns);
        }
        self
    }

    /// Queues primary key members.
    pub fn add_primary_key<S: Into<String>>(
        &mut self,
        columns: impl IntoIterator<Item = S>,
    ) -> &mut Self {
        self.add_key(columns, true)
    }

    fn push_spec(&mut self, spec: FieldSpec) {
        match self
            .fields
            .iter_mut()
            .find(|f| f.name() == Some(spec.name.as_str()))
        {
            Some(existing) => *existing = FieldDefinition::Spec(spec),
            None => self.fields.push(FieldDefinition::Spec(spec)),
        }
    }

    fn reset(&mut self) {
        self.fields.clear();
        self.keys.clear();
        self.primary_keys.clear();
    }

    /// Creates a table from the queued fields and keys.
    ///
    /// Queued state is cleared whether or not the statement succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::InvalidArgument`] for an empty name or
    /// no queued fields, and [`DatabaseError::Connection`] when the
    /// session cannot be opened. In debug mode a rejected statement
    /// returns [`DatabaseError::Execution`].
    pub fn create_table(
        &mut self,
        table: &str,
        if_not_exists: bool,
        attributes: TableAttributes,
    ) -> Result<bool> {
        let op = CreateTableOp {
            name: self.prefixed(table),
            if_not_exists,
            fields: mem::take(&mut self.fields),
            primary_keys: mem::take(&mut self.primary_keys),
            keys: mem::take(&mut self.keys),
            attributes,
        };
        require_table(table)?;
        self.run(
            &ForgeOperation::CreateTable(op),
            "Unable to create the specified table.",
        )
    }

    /// Drops a table. `cascade` is ignored by dialects without it.
    ///
    /// # Errors
    ///
    /// Same policy as [`Forge::create_table`].
    pub fn drop_table(&mut self, table: &str, if_exists: bool, cascade: bool) -> Result<bool> {
        self.reset();
        require_table(table)?;
        let op = ForgeOperation::DropTable {
            name: self.prefixed(table),
            if_exists,
            cascade,
        };
        self.run(&op, "Unable to drop the specified table.")
    }

    /// Adds `fields` to an existing table.
    ///
    /// # Errors
    ///
    /// Same policy as [`Forge::create_table`].
    pub fn add_column<I, F>(&mut self, table: &str, fields: I) -> Result<bool>
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldDefinition>,
    {
        self.reset();
        require_table(table)?;
        let op = ForgeOperation::AddColumn {
            table: self.prefixed(table),
            fields: fields.into_iter().map(Into::into).collect(),
        };
        self.run(&op, "Unable to add the specified columns.")
    }

    /// Modifies or renames existing columns.
    ///
    /// # Errors
    ///
    /// Same policy as [`Forge::create_table`].
    pub fn modify_column<I, F>(&mut self, table: &str, fields: I) -> Result<bool>
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldDefinition>,
    {
        self.reset();
        require_table(table)?;
        let op = ForgeOperation::ModifyColumn {
            table: self.prefixed(table),
            fields: fields.into_iter().map(Into::into).collect(),
        };
        self.run(&op, "Unable to modify the specified columns.")
    }

    /// Drops one column.
    ///
    /// # Errors
    ///
    /// Same policy as [`Forge::create_table`].
    pub fn drop_column(&mut self, table: &str, column: &str) -> Result<bool> {
        self.reset();
        require_table(table)?;
        let op = ForgeOperation::DropColumn {
            table: self.prefixed(table),
            column: column.to_string(),
        };
        self.run(&op, "Unable to drop the specified column.")
    }

    /// Creates a database and records it in the cached database list.
    ///
    /// # Errors
    ///
    /// In debug mode, [`DatabaseError::Unsupported`] when the dialect
    /// has no statement and [`DatabaseError::Execution`] when the
    /// server rejects it.
    pub fn create_database(&mut self, name: &str) -> Result<bool> {
        let op = ForgeOperation::CreateDatabase {
            name: name.to_string(),
        };
        let created = self.run(&op, "Unable to create the specified database.")?;
        if created {
            self.conn.cache_mut().push_database(name);
            info!(database = %name, "Database created");
        }
        Ok(created)
    }

    /// Drops a database and prunes it from the cached database list.
    ///
    /// # Errors
    ///
    /// Same policy as [`Forge::create_database`].
    pub fn drop_database(&mut self, name: &str) -> Result<bool> {
        let op = ForgeOperation::DropDatabase {
            name: name.to_string(),
        };
        let dropped = self.run(&op, "Unable to drop the specified database.")?;
        if dropped {
            self.conn.cache_mut().remove_database(name);
            info!(database = %name, "Database dropped");
        }
        Ok(dropped)
    }

    fn prefixed(&self, table: &str) -> String {
        self.conn.prefix_table(table)
    }

    fn run(&mut self, op: &ForgeOperation, failure: &str) -> Result<bool> {
        let debug_mode = self.conn.config().debug;
        let ctx = self.conn.session_context()?;

        let statements = match self.dialect.generate_sql(&ctx, op) {
            Ok(statements) => statements,
            Err(DatabaseError::Unsupported(message)) if !debug_mode => {
                warn!(dialect = self.dialect.name(), reason = %message, "Operation not supported");
                return Ok(false);
            }
            Err(err) => return Err(err),
        };

        for sql in &statements {
            debug!(dialect = self.dialect.name(), sql = %sql, "Running DDL");
            if !self.conn.execute(sql) {
                let info = self.conn.error();
                if debug_mode {
                    return Err(DatabaseError::Execution {
                        message: failure.to_string(),
                        info,
                    });
                }
                warn!(code = %info.code, message = %info.message, "{failure}");
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn require_table(table: &str) -> Result<()> {
    if table.trim().is_empty() {
        return Err(DatabaseError::InvalidArgument(String::from(
            "A table name is required for that operation.",
        )));
    }
    Ok(())
}
