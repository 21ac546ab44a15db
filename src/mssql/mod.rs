//! Microsoft SQL Server database driver (TDS 7.4).

mod connection;
mod io;
mod options;
mod protocol;

pub use connection::{MssqlConnection, ProcParameter, ProcResult};
pub use options::MssqlConnectOptions;
pub use protocol::info::Info as MssqlInfoMessage;

/// An alias for [`Pool`][crate::pool::Pool], specialized for MSSQL.
pub type MssqlPool = crate::pool::Pool<MssqlConnection>;
