//! SQLite database binding.
//!
//! A thin wrapper over the bundled C library: enough surface to satisfy the
//! unified [`Connection`][crate::Connection] contract (and therefore the
//! pool), with engine errors mapped from extended result codes. SQLite
//! calls run in-process and do not block on I/O, so they execute inline on
//! the calling task.

mod connection;
mod error;
mod options;
mod types;

pub use connection::SqliteConnection;
pub use options::SqliteConnectOptions;

/// An alias for [`Pool`][crate::pool::Pool], specialized for SQLite.
pub type SqlitePool = crate::pool::Pool<SqliteConnection>;
