use std::ffi::CStr;

use libsqlite3_sys::{sqlite3, sqlite3_errmsg, sqlite3_extended_errcode};

use crate::error::{Error, ServerError};

/// Builds a [`ServerError`] from the handle's extended result code and
/// message.
///
/// # Safety
///
/// `handle` must point to a live database connection.
pub(super) unsafe fn error_from_handle(handle: *mut sqlite3) -> Error {
    let code = sqlite3_extended_errcode(handle);

    let message = CStr::from_ptr(sqlite3_errmsg(handle))
        .to_string_lossy()
        .into_owned();

    Error::Server(ServerError {
        code: code.into(),
        message,
        state: None,
    })
}
