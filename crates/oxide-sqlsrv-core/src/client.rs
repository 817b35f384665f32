//! The native client seam.
//!
//! Network I/O belongs to an external client library. This module
//! defines the narrow surface the dialect layer needs from it. All
//! calls are synchronous and blocking. Failures are reported as
//! `false`/`None`, and details come from [`NativeClient::errors`] only
//! when a caller asks for them.

use crate::error::NativeError;
use crate::value::Value;

/// Character set negotiated with the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// UTF-8 transfer encoding.
    Utf8,
    /// The client's native single-byte encoding.
    Char,
}

impl Encoding {
    /// Maps a configured charset name onto a transfer encoding.
    ///
    /// `utf-8` and `utf8` (any case) select [`Encoding::Utf8`];
    /// everything else falls back to the native encoding.
    #[must_use]
    pub fn from_charset(charset: &str) -> Self {
        let lower = charset.to_ascii_lowercase();
        if lower == "utf-8" || lower == "utf8" {
            Self::Utf8
        } else {
            Self::Char
        }
    }

    /// The token passed to the client library.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Char => "char",
        }
    }
}

/// SQL authentication credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login name (may be empty when only a password is set).
    pub uid: String,
    /// Password (may be empty when only a login is set).
    pub pwd: String,
}

/// Parameters handed to [`NativeClient::connect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    /// `None` selects integrated (trusted) authentication.
    pub credentials: Option<Credentials>,
    /// Initial database.
    pub database: String,
    /// Transfer encoding.
    pub character_set: Encoding,
    /// Whether the transport is encrypted.
    pub encrypt: bool,
    /// Ask the client to return date/time values as text.
    pub return_dates_as_strings: bool,
}

/// Server details reported after connecting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerInfo {
    /// Product version string, e.g. `16.00.1000`.
    pub version: String,
    /// Server instance name.
    pub server_name: String,
    /// Database the session is using.
    pub current_database: String,
}

/// Column metadata reported by a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeField {
    /// Column name.
    pub name: String,
    /// Native type name (e.g. `int`, `nvarchar`).
    pub type_name: String,
    /// Declared size, if the type has one.
    pub size: Option<u64>,
}

impl NativeField {
    /// Creates field metadata.
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, size: Option<u64>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            size,
        }
    }
}

/// A statement handle returned by the client.
pub trait NativeStatement {
    /// Column metadata, in field order.
    fn field_metadata(&self) -> Vec<NativeField>;

    /// Number of columns in the result.
    fn num_fields(&self) -> usize {
        self.field_metadata().len()
    }

    /// Fetches the next row's values in field order.
    fn fetch_row(&mut self) -> Option<Vec<Value>>;

    /// Repositions the cursor so the next fetch returns row `row`.
    fn seek(&mut self, row: usize) -> bool;

    /// Rows affected by the statement, when known.
    fn rows_affected(&self) -> Option<u64>;

    /// Binds `params` into a prepared handle and executes it.
    fn execute(&mut self, params: &[Value]) -> bool;

    /// Releases the handle. Called at most once by this crate.
    fn free(&mut self);
}

impl<S: NativeStatement + ?Sized> NativeStatement for &mut S {
    fn field_metadata(&self) -> Vec<NativeField> {
        (**self).field_metadata()
    }

    fn num_fields(&self) -> usize {
        (**self).num_fields()
    }

    fn fetch_row(&mut self) -> Option<Vec<Value>> {
        (**self).fetch_row()
    }

    fn seek(&mut self, row: usize) -> bool {
        (**self).seek(row)
    }

    fn rows_affected(&self) -> Option<u64> {
        (**self).rows_affected()
    }

    fn execute(&mut self, params: &[Value]) -> bool {
        (**self).execute(params)
    }

    fn free(&mut self) {
        (**self).free();
    }
}

/// A connection-level handle from the client library.
pub trait NativeClient {
    /// Statement handle type.
    type Statement: NativeStatement;

    /// Opens a session against `server`.
    fn connect(&mut self, server: &str, params: &ConnectionParams) -> bool;

    /// Executes `sql` directly.
    fn query(&mut self, sql: &str) -> Option<Self::Statement>;

    /// Prepares `sql` for repeated execution with `?` placeholders.
    fn prepare(&mut self, sql: &str) -> Option<Self::Statement>;

    /// Starts a transaction.
    fn begin_transaction(&mut self) -> bool;

    /// Commits the active transaction.
    fn commit(&mut self) -> bool;

    /// Rolls back the active transaction.
    fn rollback(&mut self) -> bool;

    /// Server details, if connected.
    fn server_info(&mut self) -> Option<ServerInfo>;

    /// Errors raised by the most recent call, oldest first.
    fn errors(&self) -> Vec<NativeError>;

    /// Closes the session.
    fn close(&mut self);
}
