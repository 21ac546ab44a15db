use std::sync::Arc;

use crate::error::{Error, ServerError};
use crate::logger::QueryLogger;
use crate::mssql::connection::stream::Message;
use crate::mssql::connection::{MssqlConnection, ProcParameter, ProcResult};
use crate::mssql::protocol::packet::PacketType;
use crate::mssql::protocol::rpc::{ProcId, Procedure, RpcParam, RpcRequest};
use crate::mssql::protocol::sql_batch::SqlBatch;
use crate::mssql::MssqlInfoMessage;
use crate::placeholders;
use crate::row::{ResultSet, Row};
use crate::value::Value;

impl MssqlConnection {
    /// Runs SQL: a plain batch when there are no binds, `sp_executesql`
    /// over RPC when there are (after rewriting `?` to `@pN`).
    pub(crate) async fn run(
        &mut self,
        sql: &str,
        binds: &[Value],
    ) -> Result<(Vec<ResultSet>, u64), Error> {
        let outcome = if binds.is_empty() {
            self.run_batch(sql).await?
        } else {
            let sql = placeholders::question_marks_to_at_p(sql);
            let params = RpcRequest::execute_sql_params(&sql, binds);

            self.run_rpc(Procedure::Id(ProcId::SpExecuteSql), &params)
                .await?
        };

        Ok((outcome.result_sets, outcome.rows_affected))
    }

    async fn run_batch(&mut self, sql: &str) -> Result<ProcResult, Error> {
        if !self.open {
            return Err(Error::ConnectionClosed);
        }

        let logger = QueryLogger::new(sql, self.log_settings.clone());

        self.stream.write_message(
            PacketType::SqlBatch,
            SqlBatch {
                sql,
                transaction_descriptor: self.stream.transaction_descriptor,
            },
        );

        if let Err(err) = self.stream.flush().await {
            self.open = false;
            return Err(err);
        }

        self.drain_with_timeout(logger).await
    }

    async fn run_rpc(
        &mut self,
        procedure: Procedure<'_>,
        params: &[RpcParam<'_>],
    ) -> Result<ProcResult, Error> {
        if !self.open {
            return Err(Error::ConnectionClosed);
        }

        let logger = QueryLogger::new("rpc", self.log_settings.clone());

        self.stream.write_message(
            PacketType::Rpc,
            RpcRequest {
                transaction_descriptor: self.stream.transaction_descriptor,
                procedure,
                params,
            },
        );

        if let Err(err) = self.stream.flush().await {
            self.open = false;
            return Err(err);
        }

        self.drain_with_timeout(logger).await
    }

    /// Calls a stored procedure by name, collecting result sets, OUTPUT
    /// parameters, the return status, and info messages.
    pub async fn call_procedure(
        &mut self,
        name: &str,
        parameters: &[ProcParameter],
    ) -> Result<ProcResult, Error> {
        let params: Vec<RpcParam<'_>> = parameters
            .iter()
            .map(|p| RpcParam {
                name: &p.name,
                value: p.value.clone(),
                by_ref: p.output,
            })
            .collect();

        self.run_rpc(Procedure::Name(name), &params).await
    }

    async fn drain_with_timeout(&mut self, logger: QueryLogger<'_>) -> Result<ProcResult, Error> {
        let mut logger = logger;

        let result = match self.query_timeout {
            Some(deadline) => {
                match tokio::time::timeout(deadline, drain(self, &mut logger)).await {
                    Ok(result) => result,

                    Err(_) => {
                        // the token stream is mid-flight; this connection
                        // cannot be resynchronized
                        self.open = false;
                        return Err(Error::Timeout);
                    }
                }
            }

            None => drain(self, &mut logger).await,
        };

        match result {
            Err(err @ (Error::Io(_) | Error::Protocol(_))) => {
                self.open = false;
                Err(err)
            }

            other => other,
        }
    }
}

async fn drain(
    conn: &mut MssqlConnection,
    logger: &mut QueryLogger<'_>,
) -> Result<ProcResult, Error> {
    let mut result = ProcResult {
        result_sets: Vec::new(),
        output_parameters: Vec::new(),
        return_status: None,
        rows_affected: 0,
        info_messages: Vec::new(),
    };

    let mut rows: Vec<Row> = Vec::new();
    let mut has_result_set = false;
    let mut current_columns = Arc::new(Vec::new());

    // a server error does not end the response; the stream is drained to
    // its final DONE and the error raised afterwards
    let mut error: Option<ServerError> = None;

    loop {
        let message = conn.stream.recv_message().await?;

        match message {
            Message::ColMetaData => {
                // a new column set; flush rows gathered under the old one
                if has_result_set {
                    result.result_sets.push(ResultSet {
                        columns: Arc::clone(&current_columns),
                        rows: std::mem::take(&mut rows),
                    });
                }

                current_columns = Arc::clone(&conn.stream.columns);
                has_result_set = true;
            }

            Message::Row(row) => {
                logger.increment_rows_returned();
                rows.push(row);
            }

            Message::Done(done) | Message::DoneProc(done) | Message::DoneInProc(done) => {
                result.rows_affected += done.rows();
                logger.increase_rows_affected(done.rows());

                // any DONE flushes the accumulated rows
                if has_result_set {
                    result.result_sets.push(ResultSet {
                        columns: Arc::clone(&current_columns),
                        rows: std::mem::take(&mut rows),
                    });
                    has_result_set = false;
                }

                if done.is_final() {
                    break;
                }
            }

            Message::Error(token) => {
                if error.is_none() {
                    error = Some(token.into_server_error());
                }
            }

            Message::Info(info) => {
                log::debug!(
                    target: "unisql::mssql::info",
                    "{} (severity {})",
                    info.message,
                    info.class
                );

                conn.dispatch_info(&info);
                result.info_messages.push(info);
            }

            Message::ReturnStatus(status) => {
                result.return_status = Some(status);
            }

            Message::ReturnValue(name, value) => {
                result.output_parameters.push((name, value));
            }

            Message::EnvChange(env_change) => {
                // the stream already tracked the transaction descriptor
                log::trace!("mssql: envchange {:?}", env_change);
            }

            Message::LoginAck(_) | Message::Sspi(_) => {
                return Err(err_protocol!("unexpected login token during a query"));
            }
        }
    }

    conn.in_transaction = conn.stream.transaction_descriptor != 0;

    if let Some(error) = error {
        return Err(Error::Server(error));
    }

    Ok(result)
}

impl MssqlConnection {
    fn dispatch_info(&mut self, info: &MssqlInfoMessage) {
        if let Some(callback) = &mut self.on_info {
            callback(info);
        }
    }
}
