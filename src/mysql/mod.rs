//! MySQL / MariaDB database driver (client/server protocol v10).

mod connection;
mod io;
mod options;
mod protocol;
mod types;

pub use connection::MySqlConnection;
pub use options::MySqlConnectOptions;

/// An alias for [`Pool`][crate::pool::Pool], specialized for MySQL.
pub type MySqlPool = crate::pool::Pool<MySqlConnection>;
