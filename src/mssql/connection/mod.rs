use std::fmt::{self, Debug, Formatter};
use std::time::Duration;

use futures_core::future::BoxFuture;

use crate::connection::{Connection, LogSettings};
use crate::error::Error;
use crate::mssql::{MssqlConnectOptions, MssqlInfoMessage};
use crate::row::{ResultSet, Row};
use crate::value::Value;

mod establish;
mod executor;
mod stream;
mod tls_prelogin;

use stream::MssqlStream;

/// A connection to a Microsoft SQL Server instance.
pub struct MssqlConnection {
    pub(crate) stream: MssqlStream,

    pub(crate) in_transaction: bool,
    pub(crate) open: bool,

    pub(crate) query_timeout: Option<Duration>,
    pub(crate) log_settings: LogSettings,

    pub(crate) on_info: Option<Box<dyn FnMut(&MssqlInfoMessage) + Send>>,
}

/// One parameter of a stored-procedure call. TDS RPC addresses parameters
/// by `@name`; `output` marks OUTPUT parameters, whose final values come
/// back in [`ProcResult::output_parameters`].
#[derive(Debug, Clone)]
pub struct ProcParameter {
    pub name: String,
    pub value: Value,
    pub output: bool,
}

/// Everything a stored-procedure invocation produced.
#[derive(Debug)]
pub struct ProcResult {
    pub result_sets: Vec<ResultSet>,
    pub output_parameters: Vec<(String, Value)>,
    pub return_status: Option<i32>,
    pub rows_affected: u64,
    pub info_messages: Vec<MssqlInfoMessage>,
}

impl Debug for MssqlConnection {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("MssqlConnection").finish()
    }
}

impl MssqlConnection {
    /// Registers a callback invoked synchronously for every INFO/PRINT
    /// message the server sends.
    pub fn on_info(&mut self, callback: impl FnMut(&MssqlInfoMessage) + Send + 'static) {
        self.on_info = Some(Box::new(callback));
    }

    /// `true` while the connection is inside an explicit transaction.
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// The transaction descriptor currently attached to batch headers;
    /// zero outside a transaction.
    pub fn transaction_descriptor(&self) -> u64 {
        self.stream.transaction_descriptor
    }

    async fn do_close(mut self) -> Result<(), Error> {
        self.open = false;

        // TDS has no goodbye message; dropping the socket is the protocol
        Ok(())
    }
}

impl Connection for MssqlConnection {
    type Options = MssqlConnectOptions;

    fn connect(options: &Self::Options) -> BoxFuture<'_, Result<Self, Error>> {
        Box::pin(MssqlConnection::establish(options))
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
            // the server answers with ENVCHANGE type 8 carrying the new
            // transaction descriptor
            self.run("BEGIN TRANSACTION", &[]).await?;
            Ok(())
        })
    }

    fn commit(&mut self) -> BoxFuture<'_, Result<(), Error>> {
        Box::pin(async move {
            self.run("COMMIT TRANSACTION", &[]).await?;
            Ok(())
        })
    }

    fn rollback(&mut self) -> BoxFuture<'_, Result<(), Error>> {
        Box::pin(async move {
            self.run("ROLLBACK TRANSACTION", &[]).await?;
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
        // sp_executesql accepts at most 2100 parameters
        2_100
    }

    fn bulk_row_limit(&self) -> usize {
        // INSERT … VALUES caps at 1000 row value expressions
        1_000
    }
}
