//! Dialect-specific DDL generation.
//!
//! [`DialectForge`] turns a [`ForgeOperation`] into SQL text. The
//! default methods implement the generic behavior; a dialect overrides
//! the hooks where its syntax differs.

use crate::error::{DatabaseError, Result};
use crate::escape::Escaper;
use crate::schema::{
    ColumnDefinition, ColumnPosition, Constraint, CreateTableOp, DefaultValue, FieldDefinition,
    FieldSpec, TableAttributes,
};

/// Message used when a dialect has no statement for an operation.
pub const FEATURE_UNAVAILABLE: &str =
    "This feature is not available for the database you are using.";

/// Per-connection state the forge needs while rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForgeContext {
    /// Identifier escaping for the connection's quoting mode.
    pub escaper: Escaper,
    /// Configured character set, empty when unset.
    pub charset: String,
    /// Configured collation, empty when unset.
    pub collation: String,
}

impl ForgeContext {
    /// Creates a context without charset or collation.
    #[must_use]
    pub fn new(escaper: Escaper) -> Self {
        Self {
            escaper,
            ..Self::default()
        }
    }

    /// Sets the character set.
    #[must_use]
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    /// Sets the collation.
    #[must_use]
    pub fn with_collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = collation.into();
        self
    }
}

/// Which column alteration to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlterKind {
    /// Add new columns.
    Add,
    /// Modify (or rename) existing columns.
    Modify,
}

/// How a dialect treats the `unsigned` flag for a given type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsignedMapping {
    /// Emit an `UNSIGNED` keyword.
    Keyword,
    /// Substitute a wider signed type.
    Promote(&'static str),
    /// Ignore the flag.
    Drop,
}

/// A DDL operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ForgeOperation {
    /// `CREATE DATABASE`.
    CreateDatabase {
        /// Database name.
        name: String,
    },
    /// `DROP DATABASE`.
    DropDatabase {
        /// Database name.
        name: String,
    },
    /// `CREATE TABLE`.
    CreateTable(CreateTableOp),
    /// `DROP TABLE`.
    DropTable {
        /// Table name.
        name: String,
        /// Guard with an existence check.
        if_exists: bool,
        /// Drop dependent objects, where supported.
        cascade: bool,
    },
    /// `ALTER TABLE ... ADD`.
    AddColumn {
        /// Table name.
        table: String,
        /// Columns to add.
        fields: Vec<FieldDefinition>,
    },
    /// `ALTER TABLE ... MODIFY`/`CHANGE`.
    ModifyColumn {
        /// Table name.
        table: String,
        /// Columns to modify.
        fields: Vec<FieldDefinition>,
    },
    /// `ALTER TABLE ... DROP COLUMN`.
    DropColumn {
        /// Table name.
        table: String,
        /// Column to drop.
        column: String,
    },
}

/// Trait for dialect-specific DDL generation.
pub trait DialectForge {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Generates the statements for an operation, in execution order.
    fn generate_sql(&self, ctx: &ForgeContext, operation: &ForgeOperation) -> Result<Vec<String>> {
        match operation {
            ForgeOperation::CreateDatabase { name } => {
                require_name(name, "database")?;
                self.create_database_sql(ctx, name)
                    .map(|sql| vec![sql])
                    .ok_or_else(|| DatabaseError::Unsupported(FEATURE_UNAVAILABLE.into()))
            }
            ForgeOperation::DropDatabase { name } => {
                require_name(name, "database")?;
                self.drop_database_sql(ctx, name)
                    .map(|sql| vec![sql])
                    .ok_or_else(|| DatabaseError::Unsupported(FEATURE_UNAVAILABLE.into()))
            }
            ForgeOperation::CreateTable(op) => {
                require_name(&op.name, "table")?;
                require_fields(&op.fields)?;
                Ok(self.create_table(ctx, op))
            }
            ForgeOperation::DropTable {
                name,
                if_exists,
                cascade,
            } => {
                require_name(name, "table")?;
                Ok(vec![self.drop_table(ctx, name, *if_exists, *cascade)])
            }
            ForgeOperation::AddColumn { table, fields } => {
                require_name(table, "table")?;
                require_fields(fields)?;
                Ok(self.alter_table(ctx, AlterKind::Add, table, fields))
            }
            ForgeOperation::ModifyColumn { table, fields } => {
                require_name(table, "table")?;
                require_fields(fields)?;
                Ok(self.alter_table(ctx, AlterKind::Modify, table, fields))
            }
            ForgeOperation::DropColumn { table, column } => {
                require_name(table, "table")?;
                require_name(column, "column")?;
                Ok(vec![self.drop_column(ctx, table, column)])
            }
        }
    }

    /// `CREATE DATABASE` text, or `None` when unsupported.
    fn create_database_sql(&self, _ctx: &ForgeContext, name: &str) -> Option<String> {
        Some(format!("CREATE DATABASE {name}"))
    }

    /// `DROP DATABASE` text, or `None` when unsupported.
    fn drop_database_sql(&self, _ctx: &ForgeContext, name: &str) -> Option<String> {
        Some(format!("DROP DATABASE {name}"))
    }

    /// Statement head used for `CREATE TABLE` with an existence guard.
    fn create_table_if_prefix(&self, _escaped_table: &str) -> String {
        String::from("CREATE TABLE IF NOT EXISTS")
    }

    /// Statement head used for `DROP TABLE` with an existence guard.
    fn drop_table_if_prefix(&self, _escaped_table: &str) -> String {
        String::from("DROP TABLE IF EXISTS")
    }

    /// Trailing clause for cascading drops.
    fn drop_table_cascade(&self) -> &'static str {
        " CASCADE"
    }

    /// Whether secondary keys are rendered inside `CREATE TABLE`.
    fn creates_table_keys(&self) -> bool {
        false
    }

    /// Keyword for nullable columns; empty means "emit nothing".
    fn null_keyword(&self) -> &'static str {
        ""
    }

    /// Clause appended to auto-numbered integer columns.
    fn auto_increment_clause(&self) -> &'static str {
        " AUTO_INCREMENT"
    }

    /// How the `unsigned` flag applies to `data_type`.
    fn unsigned_mapping(&self, _data_type: &str) -> UnsignedMapping {
        UnsignedMapping::Keyword
    }

    /// Type mapping applied before any other normalization.
    fn attribute_type(&self, _field: &mut FieldSpec) {}

    /// Normalizes a caller spec into a renderable column.
    ///
    /// Inside `CREATE TABLE` an unspecified nullability becomes
    /// `NOT NULL`.
    fn process_field(
        &self,
        ctx: &ForgeContext,
        spec: &FieldSpec,
        create_table: bool,
    ) -> ColumnDefinition {
        let mut spec = spec.clone();
        self.attribute_type(&mut spec);

        let mut column = ColumnDefinition::new(spec.name.as_str(), spec.data_type.as_str());
        column.new_name = spec.new_name.clone().filter(|n| !n.is_empty());

        if spec.unsigned {
            match self.unsigned_mapping(&spec.data_type) {
                UnsignedMapping::Keyword => column.unsigned = true,
                UnsignedMapping::Promote(promoted) => column.data_type = promoted.to_string(),
                UnsignedMapping::Drop => {}
            }
        }

        let mut nullable = spec.null;
        match &spec.default {
            Some(DefaultValue::Null) => {
                if !self.null_keyword().is_empty() {
                    column.default = Some(self.null_keyword().to_string());
                }
                nullable = Some(true);
            }
            Some(value) => column.default = Some(render_default(ctx, value)),
            None => {}
        }
        column.nullable = match nullable {
            None if create_table => Some(false),
            other => other,
        };

        column.auto_increment =
            spec.auto_increment && column.data_type.to_ascii_lowercase().contains("int");
        column.unique = spec.unique;
        column.comment = spec
            .comment
            .as_deref()
            .filter(|c| !c.is_empty())
            .map(|c| ctx.escaper.string_literal(c));
        column.length = spec
            .constraint
            .as_ref()
            .and_then(|c| render_constraint(ctx, &spec.data_type, c));
        column.position = match (&spec.after, spec.first) {
            (Some(after), _) => Some(ColumnPosition::After(after.clone())),
            (None, true) => Some(ColumnPosition::First),
            (None, false) => None,
        };
        column
    }

    /// Renders the nullability clause of a column.
    fn null_clause(&self, column: &ColumnDefinition) -> String {
        match column.nullable {
            Some(true) if self.null_keyword().is_empty() => String::new(),
            Some(true) => format!(" {}", self.null_keyword()),
            Some(false) => String::from(" NOT NULL"),
            None => String::new(),
        }
    }

    /// Renders one column definition.
    fn process_column(&self, ctx: &ForgeContext, column: &ColumnDefinition) -> String {
        let mut sql = ctx.escaper.identifier(&column.name);
        if let Some(ref new_name) = column.new_name {
            sql.push(' ');
            sql.push_str(&ctx.escaper.identifier(new_name));
        }
        sql.push(' ');
        sql.push_str(&column.data_type);
        sql.push_str(&length_clause(column));
        if column.unsigned {
            sql.push_str(" UNSIGNED");
        }
        sql.push_str(&default_clause(column));
        sql.push_str(&self.null_clause(column));
        if column.auto_increment {
            sql.push_str(self.auto_increment_clause());
        }
        if column.unique {
            sql.push_str(" UNIQUE");
        }
        sql
    }

    /// Renders a field inside a `CREATE TABLE` body or an `ALTER`.
    fn render_field(&self, ctx: &ForgeContext, field: &FieldDefinition, create_table: bool) -> String {
        match field {
            FieldDefinition::Literal(sql) => sql.clone(),
            FieldDefinition::Spec(spec) => {
                self.process_column(ctx, &self.process_field(ctx, spec, create_table))
            }
        }
    }

    /// Generates the `CREATE TABLE` statement plus any separate index
    /// statements.
    fn create_table(&self, ctx: &ForgeContext, op: &CreateTableOp) -> Vec<String> {
        let table = ctx.escaper.identifier(&op.name);
        let head = if op.if_not_exists {
            self.create_table_if_prefix(&table)
        } else {
            String::from("CREATE TABLE")
        };

        let mut body = op
            .fields
            .iter()
            .map(|f| format!("\n\t{}", self.render_field(ctx, f, true)))
            .collect::<Vec<_>>()
            .join(",");
        body.push_str(&self.process_primary_keys(ctx, &op.name, &known_members(op, &op.primary_keys)));

        let key_groups: Vec<Vec<String>> = op
            .keys
            .iter()
            .map(|group| known_members(op, group))
            .filter(|group| !group.is_empty())
            .collect();
        let indexes = self.process_indexes(ctx, &op.name, &key_groups);
        if self.creates_table_keys() {
            body.push_str(&indexes.concat());
        }

        let mut statements = vec![format!(
            "{head} {table} ({body}\n){}",
            self.create_table_attributes(ctx, &op.attributes)
        )];
        if !self.creates_table_keys() {
            statements.extend(indexes);
        }
        statements
    }

    /// Renders the primary key constraint appended to the table body.
    fn process_primary_keys(&self, ctx: &ForgeContext, table: &str, members: &[String]) -> String {
        if members.is_empty() {
            return String::new();
        }
        format!(
            ",\n\tCONSTRAINT {} PRIMARY KEY({})",
            ctx.escaper.identifier(&format!("pk_{table}")),
            ctx.escaper.identifiers(members).join(", ")
        )
    }

    /// Renders secondary keys.
    ///
    /// Groups arrive already filtered to known columns and non-empty.
    /// The default emits one `CREATE INDEX` statement per group.
    fn process_indexes(&self, ctx: &ForgeContext, table: &str, groups: &[Vec<String>]) -> Vec<String> {
        groups
            .iter()
            .map(|group| {
                format!(
                    "CREATE INDEX {} ON {} ({})",
                    ctx.escaper.identifier(&format!("{table}_{}", group.join("_"))),
                    ctx.escaper.identifier(table),
                    ctx.escaper.identifiers(group).join(", ")
                )
            })
            .collect()
    }

    /// Renders trailing table attributes.
    fn create_table_attributes(&self, _ctx: &ForgeContext, attributes: &TableAttributes) -> String {
        attributes.iter().map(|(k, v)| format!(" {k} {v}")).collect()
    }

    /// Generates `DROP TABLE`.
    fn drop_table(&self, ctx: &ForgeContext, table: &str, if_exists: bool, cascade: bool) -> String {
        let escaped = ctx.escaper.identifier(table);
        let head = if if_exists {
            self.drop_table_if_prefix(&escaped)
        } else {
            String::from("DROP TABLE")
        };
        let mut sql = format!("{head} {escaped}");
        if cascade {
            sql.push_str(self.drop_table_cascade());
        }
        sql
    }

    /// Generates `ALTER TABLE` statements for added or modified columns.
    ///
    /// The default emits one statement per field.
    fn alter_table(
        &self,
        ctx: &ForgeContext,
        kind: AlterKind,
        table: &str,
        fields: &[FieldDefinition],
    ) -> Vec<String> {
        let verb = match kind {
            AlterKind::Add => "ADD",
            AlterKind::Modify => "CHANGE COLUMN",
        };
        let table = ctx.escaper.identifier(table);
        fields
            .iter()
            .map(|f| format!("ALTER TABLE {table} {verb} {}", self.render_field(ctx, f, false)))
            .collect()
    }

    /// Generates `ALTER TABLE ... DROP COLUMN`.
    fn drop_column(&self, ctx: &ForgeContext, table: &str, column: &str) -> String {
        format!(
            "ALTER TABLE {} DROP COLUMN {}",
            ctx.escaper.identifier(table),
            ctx.escaper.identifier(column)
        )
    }
}

/// Renders `(length)` or nothing.
#[must_use]
pub fn length_clause(column: &ColumnDefinition) -> String {
    column
        .length
        .as_ref()
        .map(|l| format!("({l})"))
        .unwrap_or_default()
}

/// Renders ` DEFAULT value` or nothing.
#[must_use]
pub fn default_clause(column: &ColumnDefinition) -> String {
    column
        .default
        .as_ref()
        .map(|d| format!(" DEFAULT {d}"))
        .unwrap_or_default()
}

/// Renders a non-null default as a SQL literal.
#[must_use]
pub fn render_default(ctx: &ForgeContext, value: &DefaultValue) -> String {
    match value {
        DefaultValue::Null => String::from("NULL"),
        DefaultValue::Boolean(b) => String::from(if *b { "1" } else { "0" }),
        DefaultValue::Integer(i) => i.to_string(),
        DefaultValue::Float(f) => f.to_string(),
        DefaultValue::String(s) => ctx.escaper.string_literal(s),
        DefaultValue::Expression { expression } => expression.clone(),
    }
}

/// Renders the parenthesized length contents; `ENUM`/`SET` members are
/// escaped. Empty constraints render nothing.
#[must_use]
pub fn render_constraint(ctx: &ForgeContext, data_type: &str, constraint: &Constraint) -> Option<String> {
    match constraint {
        Constraint::Length(0) => None,
        Constraint::Length(n) => Some(n.to_string()),
        Constraint::Raw(raw) if raw.is_empty() => None,
        Constraint::Raw(raw) => Some(raw.clone()),
        Constraint::Values(values) if values.is_empty() => None,
        Constraint::Values(values) => {
            let upper = data_type.to_ascii_uppercase();
            let rendered: Vec<String> = if upper == "ENUM" || upper == "SET" {
                values.iter().map(|v| ctx.escaper.string_literal(v)).collect()
            } else {
                values.clone()
            };
            Some(rendered.join(","))
        }
    }
}

/// Keeps only the members that name a structured field of `op`.
#[must_use]
pub fn known_members(op: &CreateTableOp, members: &[String]) -> Vec<String> {
    members
        .iter()
        .filter(|m| op.has_field(m))
        .cloned()
        .collect()
}

fn require_name(name: &str, what: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(DatabaseError::InvalidArgument(format!(
            "A {what} name is required for that operation."
        )));
    }
    Ok(())
}

fn require_fields(fields: &[FieldDefinition]) -> Result<()> {
    if fields.is_empty() {
        return Err(DatabaseError::InvalidArgument(String::from(
            "Field information is required.",
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escape::QuotingMode;

    struct Generic;

    impl DialectForge for Generic {
        fn name(&self) -> &'static str {
            "generic"
        }
    }

    fn ctx() -> ForgeContext {
        ForgeContext::new(Escaper::new(QuotingMode::Quoted))
    }

    #[test]
    fn test_generic_create_table() {
        let op = CreateTableOp::new("users")
            .field(FieldSpec::id())
            .field(FieldSpec::new("email", "VARCHAR").with_length(255).unique())
            .primary_key("id")
            .key(["email"]);
        let sql = Generic
            .generate_sql(&ctx(), &ForgeOperation::CreateTable(op))
            .unwrap();
        assert_eq!(
            sql,
            vec![
                "CREATE TABLE \"users\" (\n\t\"id\" INT(9) NOT NULL AUTO_INCREMENT,\n\t\"email\" VARCHAR(255) NOT NULL UNIQUE,\n\tCONSTRAINT \"pk_users\" PRIMARY KEY(\"id\")\n)".to_string(),
                "CREATE INDEX \"users_email\" ON \"users\" (\"email\")".to_string(),
            ]
        );
    }

    #[test]
    fn test_generic_unsigned_keyword() {
        let column = Generic.process_field(&ctx(), &FieldSpec::new("n", "INT").unsigned(), false);
        assert!(column.unsigned);
        assert_eq!(Generic.process_column(&ctx(), &column), "\"n\" INT UNSIGNED");
    }

    #[test]
    fn test_null_default_forces_nullable() {
        let spec = FieldSpec::new("note", "TEXT")
            .not_null()
            .with_default(DefaultValue::Null);
        let column = Generic.process_field(&ctx(), &spec, true);
        assert_eq!(column.nullable, Some(true));
        // An empty null keyword renders neither the default nor the clause.
        assert_eq!(Generic.process_column(&ctx(), &column), "\"note\" TEXT");
    }

    #[test]
    fn test_defaults_render_as_literals() {
        assert_eq!(render_default(&ctx(), &DefaultValue::Boolean(true)), "1");
        assert_eq!(render_default(&ctx(), &DefaultValue::Boolean(false)), "0");
        assert_eq!(render_default(&ctx(), &DefaultValue::Integer(-3)), "-3");
        assert_eq!(
            render_default(&ctx(), &DefaultValue::String("it's".into())),
            "'it''s'"
        );
        assert_eq!(
            render_default(&ctx(), &DefaultValue::expression("GETDATE()")),
            "GETDATE()"
        );
    }

    #[test]
    fn test_enum_values_are_escaped() {
        let values = Constraint::Values(vec!["a".into(), "b'c".into()]);
        assert_eq!(
            render_constraint(&ctx(), "enum", &values).as_deref(),
            Some("'a','b''c'")
        );
        assert_eq!(
            render_constraint(&ctx(), "DECIMAL", &Constraint::Values(vec!["10".into(), "2".into()]))
                .as_deref(),
            Some("10,2")
        );
        assert_eq!(render_constraint(&ctx(), "INT", &Constraint::Length(0)), None);
    }

    #[test]
    fn test_unset_nullability_outside_create_table() {
        let column = Generic.process_field(&ctx(), &FieldSpec::new("n", "INT"), false);
        assert_eq!(column.nullable, None);
        let column = Generic.process_field(&ctx(), &FieldSpec::new("n", "INT"), true);
        assert_eq!(column.nullable, Some(false));
    }

    #[test]
    fn test_auto_increment_requires_integer_type() {
        let spec = FieldSpec::new("code", "VARCHAR").auto_increment();
        assert!(!Generic.process_field(&ctx(), &spec, true).auto_increment);
        let spec = FieldSpec::new("n", "bigint").auto_increment();
        assert!(Generic.process_field(&ctx(), &spec, true).auto_increment);
    }

    #[test]
    fn test_generic_alter_and_drop() {
        let add = ForgeOperation::AddColumn {
            table: "t".into(),
            fields: vec![
                FieldSpec::new("a", "INT").into(),
                FieldDefinition::Literal("b TEXT".into()),
            ],
        };
        assert_eq!(
            Generic.generate_sql(&ctx(), &add).unwrap(),
            vec![
                "ALTER TABLE \"t\" ADD \"a\" INT".to_string(),
                "ALTER TABLE \"t\" ADD b TEXT".to_string(),
            ]
        );

        let drop = ForgeOperation::DropColumn {
            table: "t".into(),
            column: "a".into(),
        };
        assert_eq!(
            Generic.generate_sql(&ctx(), &drop).unwrap(),
            vec!["ALTER TABLE \"t\" DROP COLUMN \"a\"".to_string()]
        );

        let drop_table = ForgeOperation::DropTable {
            name: "t".into(),
            if_exists: true,
            cascade: true,
        };
        assert_eq!(
            Generic.generate_sql(&ctx(), &drop_table).unwrap(),
            vec!["DROP TABLE IF EXISTS \"t\" CASCADE".to_string()]
        );
    }

    #[test]
    fn test_missing_inputs_are_rejected() {
        let err = Generic
            .generate_sql(&ctx(), &ForgeOperation::CreateTable(CreateTableOp::new("t")))
            .unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidArgument(_)));

        let err = Generic
            .generate_sql(
                &ctx(),
                &ForgeOperation::DropTable {
                    name: " ".into(),
                    if_exists: false,
                    cascade: false,
                },
            )
            .unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidArgument(_)));
    }

    #[test]
    fn test_stale_key_members_are_dropped() {
        let op = CreateTableOp::new("t")
            .field(FieldSpec::new("a", "INT"))
            .primary_key("a")
            .primary_key("gone")
            .key(["gone"])
            .key(["a", "gone"]);
        let sql = Generic.create_table(&ctx(), &op);
        assert_eq!(sql.len(), 2);
        assert!(sql[0].ends_with("CONSTRAINT \"pk_t\" PRIMARY KEY(\"a\")\n)"));
        assert_eq!(sql[1], "CREATE INDEX \"t_a\" ON \"t\" (\"a\")");
    }
}
