use std::ffi::{CStr, CString};
use std::fmt::{self, Debug, Formatter};
use std::os::raw::c_char;
use std::ptr;
use std::sync::Arc;

use futures_core::future::BoxFuture;
use libsqlite3_sys::{
    sqlite3, sqlite3_changes, sqlite3_close, sqlite3_column_blob, sqlite3_column_bytes,
    sqlite3_column_count, sqlite3_column_double, sqlite3_column_int64, sqlite3_column_name,
    sqlite3_column_text, sqlite3_column_type, sqlite3_finalize, sqlite3_open_v2,
    sqlite3_prepare_v2, sqlite3_step, sqlite3_stmt, SQLITE_BLOB, SQLITE_DONE, SQLITE_FLOAT,
    SQLITE_INTEGER, SQLITE_NULL, SQLITE_OK, SQLITE_OPEN_CREATE, SQLITE_OPEN_MEMORY,
    SQLITE_OPEN_NOMUTEX, SQLITE_OPEN_READONLY, SQLITE_OPEN_READWRITE, SQLITE_ROW,
};

use crate::column::Column;
use crate::connection::{Connection, LogSettings};
use crate::error::Error;
use crate::logger::QueryLogger;
use crate::placeholders;
use crate::row::{ResultSet, Row};
use crate::sqlite::error::error_from_handle;
use crate::sqlite::{types, SqliteConnectOptions};
use crate::value::Value;

/// A connection to an embedded SQLite database.
pub struct SqliteConnection {
    handle: *mut sqlite3,
    open: bool,
    in_transaction: bool,
    log_settings: LogSettings,
}

// the handle is used from one task at a time, never concurrently
unsafe impl Send for SqliteConnection {}

impl Debug for SqliteConnection {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection").finish()
    }
}

impl SqliteConnection {
    fn establish(options: &SqliteConnectOptions) -> Result<Self, Error> {
        let mut flags = SQLITE_OPEN_NOMUTEX;

        flags |= if options.read_only {
            SQLITE_OPEN_READONLY
        } else if options.create_if_missing || options.in_memory {
            SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE
        } else {
            SQLITE_OPEN_READWRITE
        };

        if options.in_memory {
            flags |= SQLITE_OPEN_MEMORY;
        }

        let filename = CString::new(options.filename.to_string_lossy().into_owned())
            .map_err(|_| Error::Protocol("filename contains an interior NUL".into()))?;

        let mut handle: *mut sqlite3 = ptr::null_mut();

        // <https://www.sqlite.org/c3ref/open.html>
        let status = unsafe { sqlite3_open_v2(filename.as_ptr(), &mut handle, flags, ptr::null()) };

        if handle.is_null() {
            // the database could not even allocate memory for itself
            return Err(Error::Protocol("sqlite could not allocate a handle".into()));
        }

        if status != SQLITE_OK {
            let error = unsafe { error_from_handle(handle) };
            unsafe { sqlite3_close(handle) };
            return Err(error);
        }

        Ok(Self {
            handle,
            open: true,
            in_transaction: false,
            log_settings: options.log_settings.clone(),
        })
    }

    fn run_sync(&mut self, sql: &str, binds: &[Value]) -> Result<(Vec<ResultSet>, u64), Error> {
        if !self.open {
            return Err(Error::ConnectionClosed);
        }

        let sql = placeholders::expand(sql, binds, types::literal);
        let mut logger = QueryLogger::new(&sql, self.log_settings.clone());

        let c_sql = CString::new(sql.as_str())
            .map_err(|_| Error::Protocol("sql contains an interior NUL".into()))?;

        let mut result_sets = Vec::new();
        let mut rows_affected = 0_u64;

        // step through every statement in the string
        let mut tail: *const c_char = c_sql.as_ptr();
        let end = unsafe { c_sql.as_ptr().add(c_sql.as_bytes().len()) };

        while tail < end {
            let mut stmt: *mut sqlite3_stmt = ptr::null_mut();

            let status =
                unsafe { sqlite3_prepare_v2(self.handle, tail, -1, &mut stmt, &mut tail) };

            if status != SQLITE_OK {
                return Err(unsafe { error_from_handle(self.handle) });
            }

            // whitespace or a trailing comment prepares to a NULL statement
            if stmt.is_null() {
                continue;
            }

            match self.step_statement(stmt, &mut logger) {
                Ok(Some(result_set)) => result_sets.push(result_set),

                Ok(None) => {
                    let changed = unsafe { sqlite3_changes(self.handle) } as u64;
                    rows_affected += changed;
                    logger.increase_rows_affected(changed);
                }

                Err(error) => {
                    unsafe { sqlite3_finalize(stmt) };
                    return Err(error);
                }
            }

            unsafe { sqlite3_finalize(stmt) };
        }

        Ok((result_sets, rows_affected))
    }

    /// Steps one prepared statement to completion; statements that produce
    /// columns yield a result set, others yield `None`.
    fn step_statement(
        &mut self,
        stmt: *mut sqlite3_stmt,
        logger: &mut QueryLogger<'_>,
    ) -> Result<Option<ResultSet>, Error> {
        let column_count = unsafe { sqlite3_column_count(stmt) };

        let columns: Arc<Vec<Column>> = Arc::new(
            (0..column_count)
                .map(|i| {
                    let name = unsafe {
                        let ptr = sqlite3_column_name(stmt, i);
                        CStr::from_ptr(ptr).to_string_lossy().into_owned()
                    };

                    Column::new(name, 0)
                })
                .collect(),
        );

        let mut rows = Vec::new();

        loop {
            match unsafe { sqlite3_step(stmt) } {
                SQLITE_ROW => {
                    let values = (0..column_count)
                        .map(|i| self.read_column(stmt, i))
                        .collect();

                    rows.push(Row::new(Arc::clone(&columns), values));
                    logger.increment_rows_returned();
                }

                SQLITE_DONE => break,

                _ => return Err(unsafe { error_from_handle(self.handle) }),
            }
        }

        if column_count == 0 {
            return Ok(None);
        }

        Ok(Some(ResultSet { columns, rows }))
    }

    fn read_column(&self, stmt: *mut sqlite3_stmt, index: i32) -> Value {
        unsafe {
            match sqlite3_column_type(stmt, index) {
                SQLITE_INTEGER => Value::BigInt(sqlite3_column_int64(stmt, index)),
                SQLITE_FLOAT => Value::Double(sqlite3_column_double(stmt, index)),

                SQLITE_BLOB => {
                    let len = sqlite3_column_bytes(stmt, index) as usize;
                    let ptr = sqlite3_column_blob(stmt, index) as *const u8;

                    if ptr.is_null() {
                        Value::Bytes(Vec::new())
                    } else {
                        Value::Bytes(std::slice::from_raw_parts(ptr, len).to_vec())
                    }
                }

                SQLITE_NULL => Value::Null,

                // SQLITE_TEXT, or anything unexpected, reads as text
                _ => {
                    let len = sqlite3_column_bytes(stmt, index) as usize;
                    let ptr = sqlite3_column_text(stmt, index);

                    if ptr.is_null() {
                        Value::Null
                    } else {
                        let bytes = std::slice::from_raw_parts(ptr, len);
                        Value::Text(String::from_utf8_lossy(bytes).into_owned())
                    }
                }
            }
        }
    }

    fn close_handle(&mut self) {
        if self.open {
            self.open = false;
            unsafe { sqlite3_close(self.handle) };
        }
    }
}

impl Drop for SqliteConnection {
    fn drop(&mut self) {
        self.close_handle();
    }
}

impl Connection for SqliteConnection {
    type Options = SqliteConnectOptions;

    fn connect(options: &Self::Options) -> BoxFuture<'_, Result<Self, Error>> {
        Box::pin(async move { SqliteConnection::establish(options) })
    }

    fn query<'e>(
        &'e mut self,
        sql: &'e str,
        binds: &'e [Value],
    ) -> BoxFuture<'e, Result<Vec<Row>, Error>> {
        Box::pin(async move {
            let (result_sets, _) = self.run_sync(sql, binds)?;

            Ok(result_sets.into_iter().flat_map(|rs| rs.rows).collect())
        })
    }

    fn execute<'e>(
        &'e mut self,
        sql: &'e str,
        binds: &'e [Value],
    ) -> BoxFuture<'e, Result<u64, Error>> {
        Box::pin(async move {
            let (_, rows_affected) = self.run_sync(sql, binds)?;

            Ok(rows_affected)
        })
    }

    fn query_multi<'e>(
        &'e mut self,
        sql: &'e str,
        binds: &'e [Value],
    ) -> BoxFuture<'e, Result<Vec<ResultSet>, Error>> {
        Box::pin(async move {
            let (result_sets, _) = self.run_sync(sql, binds)?;

            Ok(result_sets)
        })
    }

    fn begin(&mut self) -> BoxFuture<'_, Result<(), Error>> {
        Box::pin(async move {
            self.run_sync("BEGIN", &[])?;
            self.in_transaction = true;
            Ok(())
        })
    }

    fn commit(&mut self) -> BoxFuture<'_, Result<(), Error>> {
        Box::pin(async move {
            self.run_sync("COMMIT", &[])?;
            self.in_transaction = false;
            Ok(())
        })
    }

    fn rollback(&mut self) -> BoxFuture<'_, Result<(), Error>> {
        Box::pin(async move {
            self.run_sync("ROLLBACK", &[])?;
            self.in_transaction = false;
            Ok(())
        })
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(mut self) -> BoxFuture<'static, Result<(), Error>> {
        Box::pin(async move {
            self.close_handle();
            Ok(())
        })
    }

    fn bulk_batch_limit(&self) -> usize {
        // SQLITE_MAX_VARIABLE_NUMBER's historical default
        32_766
    }
}
