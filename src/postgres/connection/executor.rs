use std::sync::Arc;

use crate::column::Column;
use crate::error::{Error, ServerError};
use crate::logger::QueryLogger;
use crate::placeholders;
use crate::postgres::protocol::command_complete::CommandComplete;
use crate::postgres::protocol::data_row::DataRow;
use crate::postgres::protocol::query::Query;
use crate::postgres::protocol::ready_for_query::{ReadyForQuery, TransactionStatus};
use crate::postgres::protocol::response::PgNotice;
use crate::postgres::protocol::row_description::RowDescription;
use crate::postgres::protocol::MessageFormat;
use crate::postgres::{types, PgConnection};
use crate::row::{ResultSet, Row};
use crate::value::Value;

impl PgConnection {
    /// Runs one simple-protocol query and drains the response to
    /// `ReadyForQuery`, collecting one result set per SELECT-like command.
    pub(crate) async fn run(
        &mut self,
        sql: &str,
        binds: &[Value],
    ) -> Result<(Vec<ResultSet>, u64), Error> {
        if !self.open {
            return Err(Error::ConnectionClosed);
        }

        let sql = placeholders::expand(sql, binds, types::literal);
        let mut logger = QueryLogger::new(&sql, self.log_settings.clone());

        if let Err(err) = self.stream.send(Query(&sql)).await {
            self.open = false;
            return Err(err);
        }

        let result = match self.query_timeout {
            Some(deadline) => {
                match tokio::time::timeout(deadline, drain(self, &mut logger)).await {
                    Ok(result) => result,

                    Err(_) => {
                        // a half-read response cannot be resynchronized
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
    conn: &mut PgConnection,
    logger: &mut QueryLogger<'_>,
) -> Result<(Vec<ResultSet>, u64), Error> {
    let mut result_sets = Vec::new();
    let mut columns: Option<Arc<Vec<Column>>> = None;
    let mut rows: Vec<Row> = Vec::new();
    let mut rows_affected = 0_u64;

    // a server error does not end the response; it is captured here and
    // surfaced once the stream reaches ReadyForQuery
    let mut error: Option<ServerError> = None;

    loop {
        let message = conn.stream.recv().await?;

        match message.format {
            MessageFormat::RowDescription => {
                let description = RowDescription::get(message.contents)?;
                columns = Some(Arc::new(description.columns));
                rows = Vec::new();
            }

            MessageFormat::DataRow => {
                let data = DataRow::get(message.contents)?;

                let columns = columns
                    .as_ref()
                    .ok_or_else(|| err_protocol!("DataRow with no RowDescription"))?;

                if data.values.len() != columns.len() {
                    return Err(err_protocol!(
                        "DataRow has {} values for {} columns",
                        data.values.len(),
                        columns.len()
                    ));
                }

                let mut values = Vec::with_capacity(columns.len());
                for (column, raw) in columns.iter().zip(data.values.iter()) {
                    values.push(match raw {
                        Some(raw) => types::decode(column.type_id(), raw)?,
                        None => Value::Null,
                    });
                }

                rows.push(Row::new(Arc::clone(columns), values));
                logger.increment_rows_returned();
            }

            MessageFormat::CommandComplete => {
                let complete = CommandComplete::get(message.contents)?;

                let affected = complete.rows_affected();
                rows_affected += affected;
                logger.increase_rows_affected(affected);

                if let Some(columns) = columns.take() {
                    result_sets.push(ResultSet {
                        columns,
                        rows: std::mem::take(&mut rows),
                    });
                }
            }

            MessageFormat::EmptyQueryResponse => {}

            MessageFormat::ErrorResponse => {
                let notice = PgNotice::get(message.contents)?;

                if error.is_none() {
                    error = Some(notice.into_server_error());
                }
            }

            MessageFormat::ReadyForQuery => {
                conn.in_transaction = !matches!(
                    ReadyForQuery::get(message.contents)?.transaction_status,
                    TransactionStatus::Idle
                );

                break;
            }

            // acknowledgements from the extended protocol; harmless
            MessageFormat::ParseComplete
            | MessageFormat::BindComplete
            | MessageFormat::CloseComplete
            | MessageFormat::NoData
            | MessageFormat::PortalSuspended => {}

            other => {
                return Err(err_protocol!("unexpected message {:?} during query", other));
            }
        }
    }

    if let Some(error) = error {
        return Err(Error::Server(error));
    }

    Ok((result_sets, rows_affected))
}
