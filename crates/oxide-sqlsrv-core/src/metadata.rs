//! Normalized schema metadata returned by introspection.
//!
//! Every record is built fresh per call. Nothing here is cached.

use std::collections::BTreeMap;
use std::fmt;

/// Column metadata for one table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMetadata {
    /// Column name.
    pub name: String,
    /// Native type name (e.g. `int`, `nvarchar`).
    pub type_name: String,
    /// Character length when positive, numeric precision otherwise.
    pub max_length: Option<i64>,
    /// Default expression as stored in the catalog.
    pub default: Option<String>,
    /// Whether the column belongs to the primary key.
    pub primary_key: bool,
}

impl FieldMetadata {
    /// Resolves the reported length: character length when positive,
    /// otherwise numeric precision.
    #[must_use]
    pub fn resolve_max_length(character_length: Option<i64>, numeric_precision: Option<i64>) -> Option<i64> {
        match character_length {
            Some(len) if len > 0 => Some(len),
            _ => numeric_precision,
        }
    }
}

/// Classification of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// The table's primary key.
    Primary,
    /// A unique index or constraint.
    Unique,
    /// Any other index.
    Index,
}

impl IndexKind {
    /// Returns the keyword for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "PRIMARY",
            Self::Unique => "UNIQUE",
            Self::Index => "INDEX",
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One index with its member columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDescriptor {
    /// Index name (`PRIMARY` for primary keys).
    pub name: String,
    /// Index classification.
    pub kind: IndexKind,
    /// Member columns in key order.
    pub fields: Vec<String>,
}

/// Indexes keyed by name.
pub type IndexMap = BTreeMap<String, IndexDescriptor>;

/// A foreign key constraint.
///
/// Composite keys are still a single descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyDescriptor {
    /// Constraint name.
    pub constraint_name: String,
    /// Schema-qualified referencing (child) table.
    pub referencing_table: String,
    /// Schema-qualified referenced (parent) table.
    pub referenced_table: String,
}

/// Column metadata of a result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultField {
    /// Column name.
    pub name: String,
    /// Native type name.
    pub type_name: String,
    /// Declared size, if any.
    pub max_length: Option<u64>,
}
