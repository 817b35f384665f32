//! Catalog introspection.
//!
//! The query builders and row normalizers are pure functions so they
//! can be checked without a server. [`Connection`] ties them together
//! as a [`MetadataSource`].

use std::collections::HashSet;

use oxide_sqlsrv_core::{
    CatalogQuery, DatabaseError, Escaper, FieldMetadata, ForeignKeyDescriptor, IndexDescriptor,
    IndexKind, IndexMap, MetadataSource, NativeClient, Result, Row,
};
use tracing::debug;

use crate::connection::Connection;

const FIELD_DATA: &str = "SELECT c.TABLE_NAME, c.COLUMN_NAME, c.DATA_TYPE, c.COLUMN_DEFAULT, c.CHARACTER_MAXIMUM_LENGTH, c.NUMERIC_PRECISION,
    CASE WHEN pk.COLUMN_NAME IS NOT NULL THEN 1 ELSE 0 END AS KeyType
FROM INFORMATION_SCHEMA.COLUMNS c
LEFT JOIN (
    SELECT ku.TABLE_CATALOG, ku.TABLE_SCHEMA, ku.TABLE_NAME, ku.COLUMN_NAME
    FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS AS tc
    INNER JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE AS ku
        ON tc.CONSTRAINT_TYPE = 'PRIMARY KEY'
        AND tc.CONSTRAINT_NAME = ku.CONSTRAINT_NAME
) pk
ON c.TABLE_CATALOG = pk.TABLE_CATALOG
    AND c.TABLE_SCHEMA = pk.TABLE_SCHEMA
    AND c.TABLE_NAME = pk.TABLE_NAME
    AND c.COLUMN_NAME = pk.COLUMN_NAME
WHERE UPPER(c.TABLE_NAME) = {table}
ORDER BY c.ORDINAL_POSITION";

const INDEX_DATA: &str = "SELECT i.name AS index_name,
    CASE WHEN i.is_primary_key = 1 THEN 'PRIMARY'
        WHEN i.is_unique = 1 THEN 'UNIQUE'
        ELSE 'INDEX' END AS index_type,
    c.name AS column_name
FROM sys.indexes i
INNER JOIN sys.index_columns ic ON i.index_id = ic.index_id AND i.object_id = ic.object_id
INNER JOIN sys.columns c ON ic.column_id = c.column_id AND ic.object_id = c.object_id
WHERE OBJECT_NAME(i.object_id) = {table} AND ic.is_included_column = 0
ORDER BY i.index_id, ic.key_ordinal";

const FOREIGN_KEY_DATA: &str = "SELECT schema_name(fk_tab.schema_id) + '.' + fk_tab.name AS foreign_table,
    schema_name(pk_tab.schema_id) + '.' + pk_tab.name AS primary_table,
    fk.name AS fk_constraint_name,
    D.column_names
FROM sys.foreign_keys fk
INNER JOIN sys.tables fk_tab ON fk_tab.object_id = fk.parent_object_id
INNER JOIN sys.tables pk_tab ON pk_tab.object_id = fk.referenced_object_id
CROSS APPLY (
    SELECT col.[name] + ', '
    FROM sys.foreign_key_columns fk_c
    INNER JOIN sys.columns col ON fk_c.parent_object_id = col.object_id AND fk_c.parent_column_id = col.column_id
    WHERE fk_c.parent_object_id = fk_tab.object_id
        AND fk_c.constraint_object_id = fk.object_id
    FOR XML PATH ('')
) D (column_names)
WHERE fk_tab.name = {table}
ORDER BY fk.name";

/// Lists user tables, optionally those starting with `prefix`.
#[must_use]
pub fn list_tables_sql(escaper: &Escaper, prefix: Option<&str>) -> String {
    let name = escaper.identifier("name");
    let mut sql = format!(
        "SELECT DISTINCT {name} FROM {} WHERE {} = 'U'",
        escaper.identifier("sysobjects"),
        escaper.identifier("type")
    );
    if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
        sql.push_str(&format!(
            " AND {name} LIKE '{}%'{}",
            escaper.like_pattern(prefix),
            escaper.like_escape_clause()
        ));
    }
    sql.push_str(&format!(" ORDER BY {name}"));
    sql
}

/// Lists column names of `table`, matched case-insensitively.
#[must_use]
pub fn list_columns_sql(escaper: &Escaper, table: &str) -> String {
    format!(
        "SELECT COLUMN_NAME FROM INFORMATION_SCHEMA.COLUMNS WHERE UPPER(TABLE_NAME) = {}",
        escaper.string_literal(&table.to_uppercase())
    )
}

/// Column metadata joined with the primary key lookup.
#[must_use]
pub fn field_data_sql(escaper: &Escaper, table: &str) -> String {
    FIELD_DATA.replace("{table}", &escaper.string_literal(&table.to_uppercase()))
}

/// One row per (index, key column).
#[must_use]
pub fn index_data_sql(escaper: &Escaper, table: &str) -> String {
    INDEX_DATA.replace("{table}", &escaper.string_literal(table))
}

/// One row per foreign key constraint on `table`.
#[must_use]
pub fn foreign_key_data_sql(escaper: &Escaper, table: &str) -> String {
    FOREIGN_KEY_DATA.replace("{table}", &escaper.string_literal(table))
}

/// Maps `FIELD_DATA` rows onto [`FieldMetadata`].
///
/// # Errors
///
/// Returns [`DatabaseError::Conversion`] when a row lacks a column name
/// or type.
pub fn field_metadata_from_rows(rows: &[Row]) -> Result<Vec<FieldMetadata>> {
    rows.iter()
        .map(|row| {
            Ok(FieldMetadata {
                name: row.required_text("COLUMN_NAME")?,
                type_name: row.required_text("DATA_TYPE")?,
                max_length: FieldMetadata::resolve_max_length(
                    row.int("CHARACTER_MAXIMUM_LENGTH"),
                    row.int("NUMERIC_PRECISION"),
                ),
                default: row.text("COLUMN_DEFAULT"),
                primary_key: row.get("KeyType").is_some_and(|v| v.is_truthy()),
            })
        })
        .collect()
}

/// Folds (index, column) rows into one descriptor per index.
///
/// Primary keys are keyed as `PRIMARY`; other indexes keep their own
/// name. Members stay in the order the rows arrive.
///
/// # Errors
///
/// Returns [`DatabaseError::Conversion`] when a row lacks a name.
pub fn fold_index_rows(rows: &[Row]) -> Result<IndexMap> {
    let mut indexes = IndexMap::new();
    for row in rows {
        let kind = match row.text("index_type").as_deref() {
            Some("PRIMARY") => IndexKind::Primary,
            Some("UNIQUE") => IndexKind::Unique,
            _ => IndexKind::Index,
        };
        let name = match kind {
            IndexKind::Primary => String::from(IndexKind::Primary.as_str()),
            IndexKind::Unique | IndexKind::Index => row.required_text("index_name")?,
        };
        let column = row.required_text("column_name")?;

        indexes
            .entry(name.clone())
            .or_insert_with(|| IndexDescriptor {
                name,
                kind,
                fields: Vec::new(),
            })
            .fields
            .push(column);
    }
    Ok(indexes)
}

/// Maps foreign key rows onto descriptors, one per constraint.
///
/// # Errors
///
/// Returns [`DatabaseError::Conversion`] when a row lacks a column.
pub fn foreign_keys_from_rows(rows: &[Row]) -> Result<Vec<ForeignKeyDescriptor>> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    for row in rows {
        let constraint_name = row.required_text("fk_constraint_name")?;
        if !seen.insert(constraint_name.clone()) {
            continue;
        }
        keys.push(ForeignKeyDescriptor {
            constraint_name,
            referencing_table: row.required_text("foreign_table")?,
            referenced_table: row.required_text("primary_table")?,
        });
    }
    Ok(keys)
}

impl<C: NativeClient> Connection<C> {
    fn catalog_rows(&mut self, sql: &str, query: CatalogQuery) -> Result<Vec<Row>> {
        let mut result = self
            .query(sql)
            .ok_or(DatabaseError::CatalogQuery(query))?;
        let rows = result.result_array()?;
        debug!(query = query.message_key(), rows = rows.len(), "Catalog query");
        Ok(rows)
    }

    fn column_values(rows: &[Row], column: &str) -> Result<Vec<String>> {
        rows.iter().map(|row| row.required_text(column)).collect()
    }
}

impl<C: NativeClient> MetadataSource for Connection<C> {
    fn list_tables(&mut self, prefix_limit: bool) -> Result<Vec<String>> {
        let prefix = prefix_limit.then(|| self.config().db_prefix.clone());
        let sql = list_tables_sql(&self.session_escaper()?, prefix.as_deref());
        let rows = self.catalog_rows(&sql, CatalogQuery::ListTables)?;
        Self::column_values(&rows, "name")
    }

    fn list_columns(&mut self, table: &str) -> Result<Vec<String>> {
        let escaper = self.session_escaper()?;
        let sql = list_columns_sql(&escaper, &self.prefix_table(table));
        let rows = self.catalog_rows(&sql, CatalogQuery::ListColumns)?;
        Self::column_values(&rows, "COLUMN_NAME")
    }

    fn field_data(&mut self, table: &str) -> Result<Vec<FieldMetadata>> {
        let escaper = self.session_escaper()?;
        let sql = field_data_sql(&escaper, &self.prefix_table(table));
        let rows = self.catalog_rows(&sql, CatalogQuery::FieldData)?;
        field_metadata_from_rows(&rows)
    }

    fn index_data(&mut self, table: &str) -> Result<IndexMap> {
        let escaper = self.session_escaper()?;
        let sql = index_data_sql(&escaper, &self.prefix_table(table));
        let rows = self.catalog_rows(&sql, CatalogQuery::IndexData)?;
        fold_index_rows(&rows)
    }

    fn foreign_key_data(&mut self, table: &str) -> Result<Vec<ForeignKeyDescriptor>> {
        let escaper = self.session_escaper()?;
        let sql = foreign_key_data_sql(&escaper, &self.prefix_table(table));
        let rows = self.catalog_rows(&sql, CatalogQuery::ForeignKeyData)?;
        foreign_keys_from_rows(&rows)
    }
}
