//! DDL input types.
//!
//! A [`FieldSpec`] is what callers describe; a [`ColumnDefinition`] is
//! what the forge produces from it after type and attribute
//! normalization, ready to be rendered by a dialect.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

/// A column as described by the caller.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FieldSpec {
    /// Column name.
    pub name: String,
    /// New name, for `CHANGE` style alterations.
    pub new_name: Option<String>,
    /// Declared type (`INT`, `VARCHAR`, ...).
    #[serde(rename = "type")]
    pub data_type: String,
    /// Length, precision or enumeration values.
    pub constraint: Option<Constraint>,
    /// Requests an unsigned integer.
    pub unsigned: bool,
    /// Default value. An explicit JSON `null` means `DEFAULT NULL`.
    #[serde(deserialize_with = "explicit_default")]
    pub default: Option<DefaultValue>,
    /// Nullability; `None` leaves the backend default in place.
    pub null: Option<bool>,
    /// Requests an auto-numbered column.
    pub auto_increment: bool,
    /// Adds a `UNIQUE` clause.
    pub unique: bool,
    /// Column comment.
    pub comment: Option<String>,
    /// Place the column after this one.
    pub after: Option<String>,
    /// Place the column first.
    pub first: bool,
}

impl FieldSpec {
    /// Creates a field with a name and type.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            ..Self::default()
        }
    }

    /// The `id INT(9) NOT NULL AUTO_INCREMENT` shortcut column.
    #[must_use]
    pub fn id() -> Self {
        Self::new("id", "INT")
            .with_constraint(Constraint::Length(9))
            .not_null()
            .auto_increment()
    }

    /// Sets the length or precision constraint.
    #[must_use]
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    /// Shortcut for a numeric length constraint.
    #[must_use]
    pub fn with_length(self, length: u64) -> Self {
        self.with_constraint(Constraint::Length(length))
    }

    /// Marks the column unsigned.
    #[must_use]
    pub const fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Makes the column nullable.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.null = Some(true);
        self
    }

    /// Makes the column `NOT NULL`.
    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.null = Some(false);
        self
    }

    /// Requests auto-numbering.
    #[must_use]
    pub const fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Adds a `UNIQUE` clause.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the column comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Renames the column on `MODIFY`.
    #[must_use]
    pub fn rename_to(mut self, new_name: impl Into<String>) -> Self {
        self.new_name = Some(new_name.into());
        self
    }

    /// Places the column after `column`.
    #[must_use]
    pub fn after(mut self, column: impl Into<String>) -> Self {
        self.after = Some(column.into());
        self
    }

    /// Places the column first.
    #[must_use]
    pub const fn first(mut self) -> Self {
        self.first = true;
        self
    }
}

fn explicit_default<'de, D>(deserializer: D) -> Result<Option<DefaultValue>, D::Error>
where
    D: Deserializer<'de>,
{
    DefaultValue::deserialize(deserializer).map(Some)
}

/// A field given either as a spec or as a pre-rendered fragment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldDefinition {
    /// Raw column SQL such as `"email VARCHAR(255) NOT NULL"`.
    Literal(String),
    /// A structured column description.
    Spec(FieldSpec),
}

impl FieldDefinition {
    /// The column name, for structured fields only.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Literal(_) => None,
            Self::Spec(spec) => Some(&spec.name),
        }
    }
}

impl From<FieldSpec> for FieldDefinition {
    fn from(spec: FieldSpec) -> Self {
        Self::Spec(spec)
    }
}

impl From<&str> for FieldDefinition {
    fn from(sql: &str) -> Self {
        Self::Literal(sql.to_string())
    }
}

impl From<String> for FieldDefinition {
    fn from(sql: String) -> Self {
        Self::Literal(sql)
    }
}

/// The `CONSTRAINT` attribute of a field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Constraint {
    /// `VARCHAR(50)`.
    Length(u64),
    /// Pre-rendered precision such as `"10,2"`.
    Raw(String),
    /// Enumeration members for `ENUM`/`SET`.
    Values(Vec<String>),
}

/// Default value for a column.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    /// `DEFAULT NULL`; forces the column nullable.
    Null,
    /// Rendered as `1` or `0`.
    Boolean(bool),
    /// Integer default.
    Integer(i64),
    /// Float default.
    Float(f64),
    /// Raw SQL expression, e.g. `GETDATE()`.
    Expression {
        /// The expression text, emitted verbatim.
        expression: String,
    },
    /// String default, emitted as an escaped literal.
    String(String),
}

impl DefaultValue {
    /// Builds a raw SQL expression default.
    #[must_use]
    pub fn expression(expression: impl Into<String>) -> Self {
        Self::Expression {
            expression: expression.into(),
        }
    }
}

/// Positional hint for added or modified columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnPosition {
    /// `AFTER <column>`.
    After(String),
    /// `FIRST`.
    First,
}

/// A normalized column, ready for rendering.
///
/// Produced per DDL call from a [`FieldSpec`] and discarded once the
/// statement is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    /// Column name.
    pub name: String,
    /// New name for `CHANGE`.
    pub new_name: Option<String>,
    /// Resolved type after aliasing and unsigned promotion.
    pub data_type: String,
    /// Contents of the parenthesized length, without the parentheses.
    pub length: Option<String>,
    /// Emit an `UNSIGNED` keyword.
    pub unsigned: bool,
    /// `Some(true)` for `NULL`, `Some(false)` for `NOT NULL`.
    pub nullable: Option<bool>,
    /// Rendered default literal.
    pub default: Option<String>,
    /// Attach the dialect's identity clause.
    pub auto_increment: bool,
    /// Emit `UNIQUE`.
    pub unique: bool,
    /// Escaped comment literal.
    pub comment: Option<String>,
    /// Positional hint.
    pub position: Option<ColumnPosition>,
}

impl ColumnDefinition {
    /// Creates a bare column with only a name and type.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            new_name: None,
            data_type: data_type.into(),
            length: None,
            unsigned: false,
            nullable: None,
            default: None,
            auto_increment: false,
            unique: false,
            comment: None,
            position: None,
        }
    }
}

/// Trailing `CREATE TABLE` attributes.
///
/// Keys compare case-insensitively and are emitted upper-cased.
/// Insertion order is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableAttributes {
    entries: Vec<(String, String)>,
}

impl TableAttributes {
    /// Creates an empty attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an attribute, replacing any existing key that matches
    /// case-insensitively.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts an attribute in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into().to_uppercase();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Looks up an attribute case-insensitively.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.to_uppercase();
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Upper-cased keys and their values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns true if no attribute is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'de> Deserialize<'de> for TableAttributes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct AttributesVisitor;

        impl<'de> Visitor<'de> for AttributesVisitor {
            type Value = TableAttributes;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of table attributes")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut attributes = TableAttributes::new();
                while let Some((key, value)) = map.next_entry::<String, String>()? {
                    attributes.insert(key, value);
                }
                Ok(attributes)
            }
        }

        deserializer.deserialize_map(AttributesVisitor)
    }
}

/// Everything needed to render one `CREATE TABLE`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CreateTableOp {
    /// Table name, already prefixed.
    pub name: String,
    /// Guard the statement with an existence check.
    pub if_not_exists: bool,
    /// Columns in declaration order.
    pub fields: Vec<FieldDefinition>,
    /// Primary key members.
    pub primary_keys: Vec<String>,
    /// Secondary key groups.
    pub keys: Vec<Vec<String>>,
    /// Trailing attributes.
    pub attributes: TableAttributes,
}

impl CreateTableOp {
    /// Creates an empty operation for `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, field: impl Into<FieldDefinition>) -> Self {
        self.fields.push(field.into());
        self
    }

    /// Adds a primary key member.
    #[must_use]
    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_keys.push(column.into());
        self
    }

    /// Adds a secondary key group.
    #[must_use]
    pub fn key<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.keys.push(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Guards the statement with an existence check.
    #[must_use]
    pub const fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    /// Sets the trailing attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: TableAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Whether a structured field with this name exists.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name() == Some(name))
    }
}
