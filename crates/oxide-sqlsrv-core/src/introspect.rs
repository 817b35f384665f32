//! Schema introspection.

use crate::error::Result;
use crate::metadata::{FieldMetadata, ForeignKeyDescriptor, IndexMap};

/// Catalog reflection for one connection.
///
/// Every call issues fresh catalog queries; a failed query surfaces as
/// [`DatabaseError::CatalogQuery`](crate::DatabaseError::CatalogQuery).
pub trait MetadataSource {
    /// Lists user tables, optionally restricted to the configured
    /// table prefix.
    fn list_tables(&mut self, prefix_limit: bool) -> Result<Vec<String>>;

    /// Lists the column names of `table`.
    fn list_columns(&mut self, table: &str) -> Result<Vec<String>>;

    /// Returns column metadata with the primary-key flag.
    fn field_data(&mut self, table: &str) -> Result<Vec<FieldMetadata>>;

    /// Returns indexes keyed by name.
    fn index_data(&mut self, table: &str) -> Result<IndexMap>;

    /// Returns one descriptor per foreign key constraint on `table`.
    fn foreign_key_data(&mut self, table: &str) -> Result<Vec<ForeignKeyDescriptor>>;

    /// Whether `table` exists (case-insensitive).
    fn table_exists(&mut self, table: &str) -> Result<bool> {
        Ok(self
            .list_tables(false)?
            .iter()
            .any(|t| t.eq_ignore_ascii_case(table)))
    }

    /// Whether `table` has a column named `field` (case-insensitive).
    fn field_exists(&mut self, field: &str, table: &str) -> Result<bool> {
        Ok(self
            .list_columns(table)?
            .iter()
            .any(|c| c.eq_ignore_ascii_case(field)))
    }
}
