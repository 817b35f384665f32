//! Result set adapter over a native statement handle.

use oxide_sqlsrv_core::{DatabaseError, FromRow, NativeStatement, Result, ResultField, Row};
use tracing::debug;

/// A query result wrapping one native statement handle.
///
/// The handle is released by [`ResultSet::free_result`] or on drop,
/// whichever comes first. Every accessor fails with
/// [`DatabaseError::ResultReleased`] afterwards.
#[derive(Debug)]
pub struct ResultSet<S: NativeStatement> {
    handle: Option<S>,
    release_native: bool,
    fetched: usize,
    consumed: Vec<Row>,
    buffered: Option<Vec<Row>>,
}

impl<S: NativeStatement> ResultSet<S> {
    /// Wraps an owned statement; freeing the result frees the statement.
    #[must_use]
    pub fn new(handle: S) -> Self {
        Self {
            handle: Some(handle),
            release_native: true,
            fetched: 0,
            consumed: Vec::new(),
            buffered: None,
        }
    }

    /// Wraps a statement whose lifetime is managed elsewhere, such as a
    /// prepared statement that will be executed again.
    #[must_use]
    pub fn borrowed(handle: S) -> Self {
        Self {
            handle: Some(handle),
            release_native: false,
            fetched: 0,
            consumed: Vec::new(),
            buffered: None,
        }
    }

    fn handle(&self) -> Result<&S> {
        self.handle.as_ref().ok_or(DatabaseError::ResultReleased)
    }

    fn handle_mut(&mut self) -> Result<&mut S> {
        self.handle.as_mut().ok_or(DatabaseError::ResultReleased)
    }

    /// Number of columns.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::ResultReleased`] after
    /// [`ResultSet::free_result`].
    pub fn field_count(&self) -> Result<usize> {
        Ok(self.handle()?.num_fields())
    }

    /// Column names in field order.
    ///
    /// # Errors
    ///
    /// Same as [`ResultSet::field_count`].
    pub fn field_names(&self) -> Result<Vec<String>> {
        Ok(self
            .handle()?
            .field_metadata()
            .into_iter()
            .map(|f| f.name)
            .collect())
    }

    /// Column descriptors: name, native type and size.
    ///
    /// # Errors
    ///
    /// Same as [`ResultSet::field_count`].
    pub fn field_data(&self) -> Result<Vec<ResultField>> {
        Ok(self
            .handle()?
            .field_metadata()
            .into_iter()
            .map(|f| ResultField {
                name: f.name,
                type_name: f.type_name,
                max_length: f.size,
            })
            .collect())
    }

    /// Moves the cursor so the next fetch returns row `n`.
    ///
    /// Returns `Ok(false)` when the cursor cannot move there, as with a
    /// forward-only cursor.
    ///
    /// # Errors
    ///
    /// Same as [`ResultSet::field_count`].
    pub fn data_seek(&mut self, n: usize) -> Result<bool> {
        let moved = self.handle_mut()?.seek(n);
        if moved {
            self.fetched = n;
            self.consumed.truncate(n);
        }
        Ok(moved)
    }

    /// Fetches the next row keyed by column name.
    ///
    /// # Errors
    ///
    /// Same as [`ResultSet::field_count`].
    pub fn fetch_assoc(&mut self) -> Result<Option<Row>> {
        let row = self.next_row()?;
        if let Some(ref row) = row {
            if self.buffered.is_none() && self.consumed.len() == self.fetched - 1 {
                self.consumed.push(row.clone());
            }
        }
        Ok(row)
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        let handle = self.handle_mut()?;
        let columns: Vec<String> = handle.field_metadata().into_iter().map(|f| f.name).collect();
        let row = handle.fetch_row().map(|values| Row::new(columns, values));
        if row.is_some() {
            self.fetched += 1;
        }
        Ok(row)
    }

    /// Fetches the next row mapped onto `T`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::ResultReleased`] after
    /// [`ResultSet::free_result`], or the error of [`FromRow::from_row`]
    /// (typically [`DatabaseError::Conversion`]).
    pub fn fetch_object<T: FromRow>(&mut self) -> Result<Option<T>> {
        self.fetch_assoc()?.map(|row| T::from_row(&row)).transpose()
    }

    /// Every row of the result.
    ///
    /// Rows are read once and buffered, so repeated calls and
    /// [`ResultSet::row_array`] do not need a scrollable cursor. Rows
    /// already taken with [`ResultSet::fetch_assoc`] are kept in front
    /// when the cursor cannot rewind.
    ///
    /// # Errors
    ///
    /// Same as [`ResultSet::field_count`].
    pub fn result_array(&mut self) -> Result<Vec<Row>> {
        Ok(self.buffer()?.to_vec())
    }

    /// Row `n` of the result, or `None` past the end.
    ///
    /// # Errors
    ///
    /// Same as [`ResultSet::field_count`].
    pub fn row_array(&mut self, n: usize) -> Result<Option<Row>> {
        Ok(self.buffer()?.get(n).cloned())
    }

    /// Every row mapped onto `T`.
    ///
    /// # Errors
    ///
    /// Same as [`ResultSet::fetch_object`].
    pub fn result_object<T: FromRow>(&mut self) -> Result<Vec<T>> {
        self.buffer()?.iter().map(T::from_row).collect()
    }

    /// Row `n` mapped onto `T`.
    ///
    /// # Errors
    ///
    /// Same as [`ResultSet::fetch_object`].
    pub fn row_object<T: FromRow>(&mut self, n: usize) -> Result<Option<T>> {
        self.buffer()?.get(n).map(T::from_row).transpose()
    }

    /// Number of rows in the result.
    ///
    /// # Errors
    ///
    /// Same as [`ResultSet::field_count`].
    pub fn num_rows(&mut self) -> Result<usize> {
        Ok(self.buffer()?.len())
    }

    fn buffer(&mut self) -> Result<&[Row]> {
        self.handle()?;
        if self.buffered.is_none() {
            let mut rows = Vec::new();
            if self.fetched > 0 && !self.data_seek(0)? {
                debug!(kept = self.consumed.len(), "cursor cannot rewind, keeping fetched rows");
                rows = std::mem::take(&mut self.consumed);
            }
            while let Some(row) = self.next_row()? {
                rows.push(row);
            }
            self.consumed.clear();
            self.buffered = Some(rows);
        }
        Ok(self.buffered.as_deref().unwrap_or_default())
    }

    /// Rows affected by the statement, when known.
    ///
    /// # Errors
    ///
    /// Same as [`ResultSet::field_count`].
    pub fn affected_rows(&self) -> Result<Option<u64>> {
        Ok(self.handle()?.rows_affected())
    }

    /// Releases the statement handle. Safe to call more than once.
    pub fn free_result(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            if self.release_native {
                handle.free();
                debug!("released statement handle");
            }
        }
        self.consumed.clear();
        self.buffered = None;
    }

    /// Whether the handle has been released.
    #[must_use]
    pub const fn is_freed(&self) -> bool {
        self.handle.is_none()
    }
}

impl<S: NativeStatement> Drop for ResultSet<S> {
    fn drop(&mut self) {
        self.free_result();
    }
}
