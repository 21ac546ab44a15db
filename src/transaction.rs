use futures_core::future::BoxFuture;

use crate::connection::Connection;
use crate::error::Error;

/// Runs `work` inside a transaction: commits if it returns `Ok`, rolls back
/// if it returns `Err` (the rollback error, if any, is swallowed in favor of
/// the original one).
pub async fn with_transaction<C, F, R>(conn: &mut C, work: F) -> Result<R, Error>
where
    C: Connection,
    F: for<'c> FnOnce(&'c mut C) -> BoxFuture<'c, Result<R, Error>>,
{
    conn.begin().await?;

    match work(conn).await {
        Ok(value) => {
            conn.commit().await?;
            Ok(value)
        }

        Err(err) => {
            // the connection may be dead; the caller gets the original error
            let _ = conn.rollback().await;
            Err(err)
        }
    }
}
