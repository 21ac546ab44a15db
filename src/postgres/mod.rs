//! PostgreSQL database driver (frontend/backend protocol v3).

mod connection;
mod options;
mod protocol;
mod types;

pub use connection::PgConnection;
pub use options::PgConnectOptions;
pub use protocol::response::PgNotice;

/// An alias for [`Pool`][crate::pool::Pool], specialized for PostgreSQL.
pub type PgPool = crate::pool::Pool<PgConnection>;
