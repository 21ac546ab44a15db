use std::fmt::{self, Debug, Formatter};
use std::time::Duration;

use futures_core::future::BoxFuture;

use crate::connection::{Connection, LogSettings};
use crate::error::Error;
use crate::mysql::protocol::text::{ComPing, ComQuit};
use crate::mysql::MySqlConnectOptions;
use crate::row::{ResultSet, Row};
use crate::value::Value;

mod establish;
mod executor;
mod stream;

use stream::MySqlStream;

/// A connection to a MySQL or MariaDB server.
pub struct MySqlConnection {
    pub(crate) stream: MySqlStream,

    pub(crate) in_transaction: bool,
    pub(crate) open: bool,

    pub(crate) query_timeout: Option<Duration>,
    pub(crate) log_settings: LogSettings,
}

impl Debug for MySqlConnection {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("MySqlConnection").finish()
    }
}

impl MySqlConnection {
    /// `true` while the connection is in an explicit transaction.
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    async fn do_close(mut self) -> Result<(), Error> {
        self.open = false;

        self.stream.reset_sequence();
        let _ = self.stream.send_packet(ComQuit).await;

        Ok(())
    }
}

impl Connection for MySqlConnection {
    type Options = MySqlConnectOptions;

    fn connect(options: &Self::Options) -> BoxFuture<'_, Result<Self, Error>> {
        Box::pin(MySqlConnection::establish(options))
    }

    fn query<'e>(
        &'e mut self,
        sql: &'e str,
        binds: &'e [Value],
    ) -> BoxFuture<'e, Result<Vec<Row>, Error>> {
        Box::pin(async move {
            let (result_sets, _) = self.run(sql, binds).await?;

            Ok(result_sets.into_iter().flat_map(|rs| rs.rows).collect())
        })
    }

    fn execute<'e>(
        &'e mut self,
        sql: &'e str,
        binds: &'e [Value],
    ) -> BoxFuture<'e, Result<u64, Error>> {
        Box::pin(async move {
            let (_, rows_affected) = self.run(sql, binds).await?;

            Ok(rows_affected)
        })
    }

    fn query_multi<'e>(
        &'e mut self,
        sql: &'e str,
        binds: &'e [Value],
    ) -> BoxFuture<'e, Result<Vec<ResultSet>, Error>> {
        Box::pin(async move {
            let (result_sets, _) = self.run(sql, binds).await?;

            Ok(result_sets)
        })
    }

    fn begin(&mut self) -> BoxFuture<'_, Result<(), Error>> {
        Box::pin(async move {
            self.run("BEGIN", &[]).await?;
            self.in_transaction = true;
            Ok(())
        })
    }

    fn commit(&mut self) -> BoxFuture<'_, Result<(), Error>> {
        Box::pin(async move {
            self.run("COMMIT", &[]).await?;
            Ok(())
        })
    }

    fn rollback(&mut self) -> BoxFuture<'_, Result<(), Error>> {
        Box::pin(async move {
            self.run("ROLLBACK", &[]).await?;
            Ok(())
        })
    }

    fn ping(&mut self) -> BoxFuture<'_, Result<(), Error>> {
        Box::pin(async move {
            if !self.open {
                return Err(Error::ConnectionClosed);
            }

            self.stream.reset_sequence();
            self.stream.send_packet(ComPing).await?;
            self.stream.recv_ok().await?;

            Ok(())
        })
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(self) -> BoxFuture<'static, Result<(), Error>> {
        Box::pin(self.do_close())
    }

    fn bulk_batch_limit(&self) -> usize {
        // one statement may carry at most 2^16 - 1 placeholders
        65_535
    }
}
