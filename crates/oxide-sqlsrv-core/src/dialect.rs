//! Query pagination.

use crate::error::Result;

/// Appends dialect-specific pagination to an assembled query.
pub trait DialectPaginator {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Appends the limit clause for `limit` rows starting at `offset`.
    ///
    /// `offset: None` and `offset: Some(0)` are distinct; dialects
    /// without a limit-only form reject the former.
    fn limit_clause(&self, sql: &str, limit: u64, offset: Option<u64>) -> Result<String>;

    /// Paginates `sql` when a limit is configured and returns it
    /// unchanged otherwise.
    fn paginate(&self, sql: &str, limit: Option<u64>, offset: Option<u64>) -> Result<String> {
        match limit {
            Some(limit) => self.limit_clause(sql, limit, offset),
            None => Ok(sql.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LimitOffset;

    impl DialectPaginator for LimitOffset {
        fn name(&self) -> &'static str {
            "limit-offset"
        }

        fn limit_clause(&self, sql: &str, limit: u64, offset: Option<u64>) -> Result<String> {
            Ok(format!("{sql} LIMIT {limit} OFFSET {}", offset.unwrap_or(0)))
        }
    }

    #[test]
    fn test_paginate_without_limit_is_identity() {
        let sql = LimitOffset.paginate("SELECT 1", None, Some(4)).unwrap();
        assert_eq!(sql, "SELECT 1");
    }

    #[test]
    fn test_paginate_delegates_to_limit_clause() {
        let sql = LimitOffset.paginate("SELECT 1", Some(5), None).unwrap();
        assert_eq!(sql, "SELECT 1 LIMIT 5 OFFSET 0");
    }
}
