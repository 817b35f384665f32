//! # oxide-sqlsrv-core
//!
//! Driver-agnostic building blocks for adapting a relational database
//! abstraction to one SQL dialect.
//!
//! This crate provides:
//! - Capability traits a dialect implements: [`DialectPaginator`],
//!   [`DialectForge`], [`MetadataSource`], [`ErrorTranslator`] and
//!   [`Transactional`]
//! - The native client seam ([`NativeClient`], [`NativeStatement`])
//!   that hides the wire library
//! - Normalized records for DDL input and catalog metadata
//! - Identifier escaping for quoted and bracketed modes
//!
//! ## Generating DDL
//!
//! [`DialectForge`] renders typed operations into SQL text. Its
//! default methods implement the generic forms:
//!
//! ```rust
//! use oxide_sqlsrv_core::{
//!     CreateTableOp, DialectForge, Escaper, FieldSpec, ForgeContext, ForgeOperation,
//!     QuotingMode,
//! };
//!
//! struct Generic;
//!
//! impl DialectForge for Generic {
//!     fn name(&self) -> &'static str {
//!         "generic"
//!     }
//! }
//!
//! let ctx = ForgeContext::new(Escaper::new(QuotingMode::Quoted));
//! let op = CreateTableOp::new("tags")
//!     .field(FieldSpec::new("label", "VARCHAR").with_length(32));
//! let sql = Generic.generate_sql(&ctx, &ForgeOperation::CreateTable(op)).unwrap();
//!
//! assert_eq!(sql, vec!["CREATE TABLE \"tags\" (\n\t\"label\" VARCHAR(32) NOT NULL\n)"]);
//! ```

pub mod client;
pub mod config;
pub mod dialect;
pub mod error;
pub mod escape;
pub mod forge;
pub mod introspect;
pub mod metadata;
pub mod schema;
pub mod transaction;
pub mod value;

pub use client::{
    ConnectionParams, Credentials, Encoding, NativeClient, NativeField, NativeStatement,
    ServerInfo,
};
pub use config::ConnectionConfig;
pub use dialect::DialectPaginator;
pub use error::{CatalogQuery, DatabaseError, ErrorInfo, ErrorTranslator, NativeError, Result};
pub use escape::{Escaper, QuotingMode};
pub use forge::{AlterKind, DialectForge, ForgeContext, ForgeOperation, UnsignedMapping};
pub use introspect::MetadataSource;
pub use metadata::{
    FieldMetadata, ForeignKeyDescriptor, IndexDescriptor, IndexKind, IndexMap, ResultField,
};
pub use schema::{
    ColumnDefinition, ColumnPosition, Constraint, CreateTableOp, DefaultValue, FieldDefinition,
    FieldSpec, TableAttributes,
};
pub use transaction::{TransactionState, Transactional};
pub use value::{FromRow, Row, Value};
