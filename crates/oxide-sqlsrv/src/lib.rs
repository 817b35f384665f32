//! # oxide-sqlsrv
//!
//! SQL Server dialect for `oxide-sqlsrv-core`.
//!
//! # How SQL Server differs from other dialects
//!
//! - **[Identifier quoting]**: double quotes only delimit identifiers
//!   while `QUOTED_IDENTIFIER` is on. The connection probes the session
//!   option after connecting and falls back to square brackets when it
//!   is off. See [`quoting`].
//! - **[Pagination]**: there is no `LIMIT`. Rows are paged with
//!   `OFFSET n ROWS FETCH NEXT m ROWS ONLY`, which requires an offset
//!   (and an `ORDER BY` on the server side).
//! - **[IDENTITY]**: auto-numbered columns use `IDENTITY(1,1)` rather
//!   than `AUTO_INCREMENT`, and integer types take no display width.
//! - **No unsigned integers**: unsigned columns are promoted to the
//!   next wider signed type (`INT` becomes `BIGINT`).
//! - **No `IF NOT EXISTS`**: existence guards are written as
//!   `IF NOT EXISTS (SELECT * FROM sysobjects ...)` prefixes.
//! - **Catalog**: metadata comes from `INFORMATION_SCHEMA` and the
//!   `sys.*` catalog views.
//!
//! [Identifier quoting]: https://learn.microsoft.com/en-us/sql/t-sql/statements/set-quoted-identifier-transact-sql
//! [Pagination]: https://learn.microsoft.com/en-us/sql/t-sql/queries/select-order-by-clause-transact-sql#using-offset-and-fetch-to-limit-the-rows-returned
//! [IDENTITY]: https://learn.microsoft.com/en-us/sql/t-sql/statements/create-table-transact-sql-identity-property
//!
//! ## Example
//!
//! ```rust
//! use oxide_sqlsrv::SqlsrvDialect;
//! use oxide_sqlsrv_core::DialectPaginator;
//!
//! let sql = SqlsrvDialect::new()
//!     .paginate("SELECT * FROM users ORDER BY id", Some(10), Some(20))
//!     .unwrap();
//! assert_eq!(
//!     sql,
//!     "SELECT * FROM users ORDER BY id OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"
//! );
//! ```

pub mod connection;
pub mod dialect;
pub mod forge;
pub mod introspect;
pub mod prepared;
pub mod quoting;
pub mod result;
pub mod utils;

pub use connection::{Connection, DataCache};
pub use dialect::SqlsrvDialect;
pub use forge::Forge;
pub use prepared::PreparedQuery;
pub use result::ResultSet;
pub use utils::Utils;
