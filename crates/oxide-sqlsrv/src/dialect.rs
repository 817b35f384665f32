//! SQL Server dialect.
//!
//! Pagination, DDL rendering and error translation for SQL Server. All
//! dialect string literals live in the constants below.

use oxide_sqlsrv_core::forge::{default_clause, length_clause};
use oxide_sqlsrv_core::{
    AlterKind, ColumnDefinition, ColumnPosition, DatabaseError, DialectForge, DialectPaginator,
    ErrorInfo, ErrorTranslator, FieldDefinition, FieldSpec, ForgeContext, NativeError, Result,
    TableAttributes, UnsignedMapping,
};

/// Unsigned integer types and the signed type wide enough to hold them.
pub const UNSIGNED_PROMOTIONS: &[(&str, &str)] = &[
    ("TINYINT", "SMALLINT"),
    ("SMALLINT", "INT"),
    ("INT", "BIGINT"),
    ("REAL", "FLOAT"),
];

/// A declared type rewritten before any other normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeAlias {
    /// Declared type, upper-case.
    pub from: &'static str,
    /// Replacement type.
    pub to: &'static str,
    /// Whether the alias forces the unsigned flag off.
    pub clears_unsigned: bool,
}

/// Type aliases, matched case-insensitively.
pub const TYPE_ALIASES: &[TypeAlias] = &[
    TypeAlias {
        from: "MEDIUMINT",
        to: "INTEGER",
        clears_unsigned: true,
    },
    TypeAlias {
        from: "INTEGER",
        to: "INT",
        clears_unsigned: false,
    },
];

/// Identity clause for auto-numbered integer columns.
pub const IDENTITY_CLAUSE: &str = " IDENTITY(1,1)";

/// `CREATE DATABASE` template.
pub const CREATE_DATABASE: &str = "CREATE DATABASE {name} COLLATE {collation}";

/// Guarded `CREATE TABLE` head; there is no native `IF NOT EXISTS`.
pub const CREATE_TABLE_IF: &str = "IF NOT EXISTS (SELECT * FROM sysobjects WHERE ID = object_id(N'{table}') AND OBJECTPROPERTY(id, N'IsUserTable') = 1)\nCREATE TABLE";

/// Guarded `DROP TABLE` head.
pub const DROP_TABLE_IF: &str = "IF EXISTS (SELECT * FROM sysobjects WHERE ID = object_id(N'{table}') AND OBJECTPROPERTY(id, N'IsUserTable') = 1)\nDROP TABLE";

/// Pagination error raised when no offset is configured.
pub const OFFSET_REQUIRED: &str = "offset required when limit is supplied";

/// SQL Server dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlsrvDialect;

impl SqlsrvDialect {
    /// Creates a new SQL Server dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Looks up the promoted type for an unsigned column.
    #[must_use]
    pub fn promoted_type(data_type: &str) -> Option<&'static str> {
        UNSIGNED_PROMOTIONS
            .iter()
            .find(|(from, _)| from.eq_ignore_ascii_case(data_type))
            .map(|(_, to)| *to)
    }

    fn guard(template: &str, escaped_table: &str) -> String {
        template.replace("{table}", &escaped_table.replace('\'', "''"))
    }
}

impl DialectPaginator for SqlsrvDialect {
    fn name(&self) -> &'static str {
        "sqlsrv"
    }

    fn limit_clause(&self, sql: &str, limit: u64, offset: Option<u64>) -> Result<String> {
        let offset =
            offset.ok_or_else(|| DatabaseError::Configuration(OFFSET_REQUIRED.to_string()))?;
        Ok(format!(
            "{} OFFSET {offset} ROWS FETCH NEXT {limit} ROWS ONLY",
            sql.trim_end()
        ))
    }
}

impl ErrorTranslator for SqlsrvDialect {
    fn translate(&self, errors: &[NativeError]) -> ErrorInfo {
        let mut info = ErrorInfo::none();
        let Some(first) = errors.first() else {
            return info;
        };

        match (&first.sqlstate, first.code) {
            (Some(state), Some(code)) => info.code = format!("{state}/{code}"),
            (Some(state), None) => info.code.clone_from(state),
            (None, Some(code)) => info.code = code.to_string(),
            (None, None) => {}
        }
        if let Some(ref message) = first.message {
            info.message.clone_from(message);
        }
        info
    }
}

impl DialectForge for SqlsrvDialect {
    fn name(&self) -> &'static str {
        "sqlsrv"
    }

    fn create_database_sql(&self, ctx: &ForgeContext, name: &str) -> Option<String> {
        Some(
            CREATE_DATABASE
                .replace("{name}", name)
                .replace("{collation}", &ctx.collation),
        )
    }

    fn create_table_if_prefix(&self, escaped_table: &str) -> String {
        Self::guard(CREATE_TABLE_IF, escaped_table)
    }

    fn drop_table_if_prefix(&self, escaped_table: &str) -> String {
        Self::guard(DROP_TABLE_IF, escaped_table)
    }

    fn drop_table_cascade(&self) -> &'static str {
        ""
    }

    fn creates_table_keys(&self) -> bool {
        true
    }

    fn null_keyword(&self) -> &'static str {
        "NULL"
    }

    fn auto_increment_clause(&self) -> &'static str {
        IDENTITY_CLAUSE
    }

    fn unsigned_mapping(&self, data_type: &str) -> UnsignedMapping {
        Self::promoted_type(data_type).map_or(UnsignedMapping::Drop, UnsignedMapping::Promote)
    }

    fn attribute_type(&self, field: &mut FieldSpec) {
        if field.constraint.is_some() && field.data_type.to_ascii_uppercase().contains("INT") {
            field.constraint = None;
        }

        if let Some(alias) = TYPE_ALIASES
            .iter()
            .find(|a| a.from.eq_ignore_ascii_case(&field.data_type))
        {
            field.data_type = alias.to.to_string();
            if alias.clears_unsigned {
                field.unsigned = false;
            }
        }
    }

    fn process_column(&self, ctx: &ForgeContext, column: &ColumnDefinition) -> String {
        let mut sql = ctx.escaper.identifier(&column.name);
        if let Some(ref new_name) = column.new_name {
            sql.push(' ');
            sql.push_str(&ctx.escaper.identifier(new_name));
        }
        sql.push(' ');
        sql.push_str(&column.data_type);
        sql.push_str(&length_clause(column));
        sql.push_str(&self.null_clause(column));
        sql.push_str(&default_clause(column));
        if column.auto_increment {
            sql.push_str(IDENTITY_CLAUSE);
        }
        if column.unique {
            sql.push_str(" UNIQUE");
        }
        if let Some(ref comment) = column.comment {
            sql.push_str(" COMMENT ");
            sql.push_str(comment);
        }
        match column.position {
            Some(ColumnPosition::After(ref after)) => {
                sql.push_str(" AFTER ");
                sql.push_str(&ctx.escaper.identifier(after));
            }
            Some(ColumnPosition::First) => sql.push_str(" FIRST"),
            None => {}
        }
        sql
    }

    fn process_indexes(&self, ctx: &ForgeContext, _table: &str, groups: &[Vec<String>]) -> Vec<String> {
        groups
            .iter()
            .map(|group| {
                format!(
                    ",\n\tKEY {} ({})",
                    ctx.escaper.identifier(&group.join("_")),
                    ctx.escaper.identifiers(group).join(", ")
                )
            })
            .collect()
    }

    fn create_table_attributes(&self, ctx: &ForgeContext, attributes: &TableAttributes) -> String {
        let mut sql: String = attributes
            .iter()
            .map(|(key, value)| format!(" {key} = {value}"))
            .collect();

        if !ctx.charset.is_empty() && !sql.contains("CHARACTER SET") && !sql.contains("CHARSET") {
            sql.push_str(" DEFAULT CHARACTER SET = ");
            sql.push_str(&ctx.charset);
        }
        if !ctx.collation.is_empty() && !sql.contains("COLLATE") {
            sql.push_str(" COLLATE = ");
            sql.push_str(&ctx.collation);
        }
        sql
    }

    fn alter_table(
        &self,
        ctx: &ForgeContext,
        kind: AlterKind,
        table: &str,
        fields: &[FieldDefinition],
    ) -> Vec<String> {
        let clauses: Vec<String> = fields
            .iter()
            .map(|field| match field {
                FieldDefinition::Literal(sql) => match kind {
                    AlterKind::Add => format!("\n\tADD {sql}"),
                    AlterKind::Modify => format!("\n\tMODIFY {sql}"),
                },
                FieldDefinition::Spec(spec) => {
                    let column = self.process_field(ctx, spec, false);
                    let verb = match kind {
                        AlterKind::Add => "ADD",
                        AlterKind::Modify if column.new_name.is_some() => "CHANGE",
                        AlterKind::Modify => "MODIFY",
                    };
                    format!("\n\t{verb} {}", self.process_column(ctx, &column))
                }
            })
            .collect();

        vec![format!(
            "ALTER TABLE {}{}",
            ctx.escaper.identifier(table),
            clauses.join(",")
        )]
    }
}
