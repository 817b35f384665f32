//! Error types shared by every dialect implementation.

use thiserror::Error;

/// The catalog lookup that failed during introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogQuery {
    /// Listing user tables.
    ListTables,
    /// Listing column names of a table.
    ListColumns,
    /// Reading column metadata.
    FieldData,
    /// Reading index metadata.
    IndexData,
    /// Reading foreign key metadata.
    ForeignKeyData,
    /// Listing databases on the server.
    ListDatabases,
}

impl CatalogQuery {
    /// Returns the message key used by host frameworks for translation.
    #[must_use]
    pub const fn message_key(self) -> &'static str {
        match self {
            Self::ListTables => "Database.failGetTableList",
            Self::ListColumns => "Database.failGetColumnList",
            Self::FieldData => "Database.failGetFieldData",
            Self::IndexData => "Database.failGetIndexData",
            Self::ForeignKeyData => "Database.failGetForeignKeyData",
            Self::ListDatabases => "Database.failGetDatabaseList",
        }
    }

    /// Returns a human-readable description of the failed lookup.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::ListTables => "unable to list tables",
            Self::ListColumns => "unable to list columns",
            Self::FieldData => "unable to get field data",
            Self::IndexData => "unable to get index data",
            Self::ForeignKeyData => "unable to get foreign key data",
            Self::ListDatabases => "unable to list databases",
        }
    }
}

/// A backend error as reported by the native client.
///
/// `code` is the SQLSTATE, optionally composed with the native error
/// number as `SQLSTATE/code`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    /// SQLSTATE or native code.
    pub code: String,
    /// Backend message, copied verbatim.
    pub message: String,
}

impl ErrorInfo {
    /// The SQLSTATE reported when nothing went wrong.
    pub const NO_ERROR_CODE: &'static str = "00000";

    /// Creates an error pair.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// The no-error sentinel: `{ code: "00000", message: "" }`.
    #[must_use]
    pub fn none() -> Self {
        Self::new(Self::NO_ERROR_CODE, "")
    }

    /// Returns true unless this is the no-error sentinel.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.code != Self::NO_ERROR_CODE || !self.message.is_empty()
    }
}

impl Default for ErrorInfo {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.message.is_empty() {
            write!(f, "[{}]", self.code)
        } else {
            write!(f, "[{}] {}", self.code, self.message)
        }
    }
}

/// Errors raised by dialect, forge and introspection operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The caller configured an operation the dialect cannot express.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The backend or dialect does not support the requested feature.
    #[error("unsupported feature: {0}")]
    Unsupported(String),

    /// A catalog query failed to execute.
    #[error("{}: {}", .0.message_key(), .0.description())]
    CatalogQuery(CatalogQuery),

    /// A required argument was missing or empty.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A statement failed while the connection runs in debug mode.
    #[error("{message} {info}")]
    Execution {
        /// What the caller was trying to do.
        message: String,
        /// The translated backend error.
        info: ErrorInfo,
    },

    /// Establishing the connection failed.
    #[error("unable to connect to the database {0}")]
    Connection(ErrorInfo),

    /// The result handle was already released.
    #[error("result handle has already been released")]
    ResultReleased,

    /// A row could not be mapped onto the requested type.
    #[error("conversion error: {0}")]
    Conversion(String),
}

/// Result type alias for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;

/// The first native error reported by a client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeError {
    /// Five character SQLSTATE, when reported.
    pub sqlstate: Option<String>,
    /// Backend-specific error number, when reported.
    pub code: Option<i64>,
    /// Backend message, when reported.
    pub message: Option<String>,
}

impl NativeError {
    /// Creates a fully populated native error.
    #[must_use]
    pub fn new(sqlstate: impl Into<String>, code: i64, message: impl Into<String>) -> Self {
        Self {
            sqlstate: Some(sqlstate.into()),
            code: Some(code),
            message: Some(message.into()),
        }
    }
}

/// Maps the native error collection onto a `{code, message}` pair.
pub trait ErrorTranslator {
    /// Translates the native errors; an empty slice yields [`ErrorInfo::none`].
    fn translate(&self, errors: &[NativeError]) -> ErrorInfo;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_info_sentinel() {
        let info = ErrorInfo::none();
        assert_eq!(info.code, "00000");
        assert_eq!(info.message, "");
        assert!(!info.is_error());
        assert_eq!(ErrorInfo::default(), info);
    }

    #[test]
    fn test_error_info_display() {
        let info = ErrorInfo::new("42000/207", "Invalid column name 'x'.");
        assert!(info.is_error());
        assert_eq!(info.to_string(), "[42000/207] Invalid column name 'x'.");
        assert_eq!(ErrorInfo::new("08001", "").to_string(), "[08001]");
    }

    #[test]
    fn test_catalog_query_message() {
        let err = DatabaseError::CatalogQuery(CatalogQuery::FieldData);
        assert_eq!(
            err.to_string(),
            "Database.failGetFieldData: unable to get field data"
        );
        assert_eq!(
            CatalogQuery::ForeignKeyData.message_key(),
            "Database.failGetForeignKeyData"
        );
    }
}
