use futures_core::future::BoxFuture;
use futures_util::TryFutureExt;

use crate::error::Error;
use crate::row::{ResultSet, Row};
use crate::value::Value;

pub use crate::logger::LogSettings;

/// A single connection to a database engine.
///
/// Connections are pinned to one task and serve exactly one operation at a
/// time; requests and responses are strictly serial. They are created by
/// [`Connection::connect`], pass through the engine handshake into a ready
/// state, serve operations, and terminate on [`Connection::close`] or a
/// fatal I/O error.
pub trait Connection: Send + Sized + 'static {
    type Options: Clone + Send + Sync + 'static;

    /// Establishes a connection and drives the handshake to completion.
    fn connect(options: &Self::Options) -> BoxFuture<'_, Result<Self, Error>>;

    /// Runs SQL and returns every row of the response.
    fn query<'e>(
        &'e mut self,
        sql: &'e str,
        binds: &'e [Value],
    ) -> BoxFuture<'e, Result<Vec<Row>, Error>>;

    /// Runs SQL and returns the number of rows affected.
    fn execute<'e>(
        &'e mut self,
        sql: &'e str,
        binds: &'e [Value],
    ) -> BoxFuture<'e, Result<u64, Error>>;

    /// Runs SQL that may produce several result sets and returns them all,
    /// in order.
    fn query_multi<'e>(
        &'e mut self,
        sql: &'e str,
        binds: &'e [Value],
    ) -> BoxFuture<'e, Result<Vec<ResultSet>, Error>>;

    fn begin(&mut self) -> BoxFuture<'_, Result<(), Error>>;

    fn commit(&mut self) -> BoxFuture<'_, Result<(), Error>>;

    fn rollback(&mut self) -> BoxFuture<'_, Result<(), Error>>;

    /// Checks the connection is alive; used by the pool's keep-alive task.
    fn ping(&mut self) -> BoxFuture<'_, Result<(), Error>> {
        Box::pin(self.execute("SELECT 1", &[]).map_ok(|_| ()))
    }

    /// `false` once the connection has been closed, timed out, or hit a
    /// fatal protocol error. Pools evict connections that are not open.
    fn is_open(&self) -> bool;

    fn close(self) -> BoxFuture<'static, Result<(), Error>>;

    /// Upper bound on `batch_rows * columns` for one bulk-insert statement.
    fn bulk_batch_limit(&self) -> usize {
        60_000
    }

    /// Upper bound on the number of VALUES rows in one bulk-insert
    /// statement, where the engine caps it separately.
    fn bulk_row_limit(&self) -> usize {
        usize::MAX
    }
}
