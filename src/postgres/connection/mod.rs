use std::fmt::{self, Debug, Formatter};
use std::time::Duration;

use futures_core::future::BoxFuture;

use crate::connection::{Connection, LogSettings};
use crate::error::Error;
use crate::postgres::protocol::response::PgNotice;
use crate::postgres::protocol::terminate::Terminate;
use crate::postgres::PgConnectOptions;
use crate::row::{ResultSet, Row};
use crate::value::Value;

mod establish;
mod executor;
mod sasl;
mod stream;

use stream::PgStream;

/// A connection to a PostgreSQL server.
pub struct PgConnection {
    pub(crate) stream: PgStream,

    // issued by BackendKeyData; needed to send a cancel request
    #[allow(dead_code)]
    pub(crate) process_id: u32,
    #[allow(dead_code)]
    pub(crate) secret_key: u32,

    pub(crate) in_transaction: bool,
    pub(crate) open: bool,

    pub(crate) query_timeout: Option<Duration>,
    pub(crate) log_settings: LogSettings,
}

impl Debug for PgConnection {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgConnection").finish()
    }
}

impl PgConnection {
    /// Registers a callback invoked synchronously for every server notice.
    pub fn on_notice(&mut self, callback: impl FnMut(&PgNotice) + Send + 'static) {
        self.stream.on_notice = Some(Box::new(callback));
    }

    /// `true` while the connection is in an explicit transaction block.
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// The server version as reported by ParameterStatus, in libpq's
    /// numeric form (e.g. 140002).
    pub fn server_version_num(&self) -> Option<u32> {
        self.stream.server_version_num
    }

    /// The backend parameters the server has reported so far.
    pub fn parameter_statuses(&self) -> &std::collections::BTreeMap<String, String> {
        &self.stream.parameter_statuses
    }

    async fn do_close(mut self) -> Result<(), Error> {
        self.open = false;

        // a failed goodbye is indistinguishable from a dropped link
        let _ = self.stream.send(Terminate).await;

        Ok(())
    }
}

impl Connection for PgConnection {
    type Options = PgConnectOptions;

    fn connect(options: &Self::Options) -> BoxFuture<'_, Result<Self, Error>> {
        Box::pin(PgConnection::establish(options))
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

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(self) -> BoxFuture<'static, Result<(), Error>> {
        Box::pin(self.do_close())
    }

    fn bulk_batch_limit(&self) -> usize {
        // sized against the $N parameter-number ceiling
        60_000
    }
}
