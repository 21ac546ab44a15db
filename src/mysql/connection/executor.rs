use std::sync::Arc;

use crate::error::{Error, ServerError};
use crate::logger::QueryLogger;
use crate::mysql::connection::MySqlConnection;
use crate::mysql::io::MySqlBufExt;
use crate::mysql::protocol::column_def::ColumnDefinition;
use crate::mysql::protocol::eof::EofPacket;
use crate::mysql::protocol::err::ErrPacket;
use crate::mysql::protocol::ok::OkPacket;
use crate::mysql::protocol::row::TextRow;
use crate::mysql::protocol::text::ComQuery;
use crate::mysql::protocol::{Capabilities, Status};
use crate::mysql::types;
use crate::placeholders;
use crate::row::{ResultSet, Row};
use crate::value::Value;

impl MySqlConnection {
    /// Runs one `COM_QUERY` and drains the response: the last OK/EOF
    /// without `SERVER_MORE_RESULTS_EXISTS` (or an ERR packet) terminates
    /// the stream.
    pub(crate) async fn run(
        &mut self,
        sql: &str,
        binds: &[Value],
    ) -> Result<(Vec<ResultSet>, u64), Error> {
        if !self.open {
            return Err(Error::ConnectionClosed);
        }

        let sql = placeholders::expand_at(sql, binds, types::literal);
        let mut logger = QueryLogger::new(&sql, self.log_settings.clone());

        self.stream.reset_sequence();
        self.stream.write_packet(ComQuery(&sql));

        if let Err(err) = self.stream.flush().await {
            self.open = false;
            return Err(err);
        }

        let result = match self.query_timeout {
            Some(deadline) => {
                match tokio::time::timeout(deadline, drain(self, &mut logger)).await {
                    Ok(result) => result,

                    Err(_) => {
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
    conn: &mut MySqlConnection,
    logger: &mut QueryLogger<'_>,
) -> Result<(Vec<ResultSet>, u64), Error> {
    let deprecate_eof = conn
        .stream
        .capabilities
        .contains(Capabilities::DEPRECATE_EOF);

    let mut result_sets = Vec::new();
    let mut rows_affected = 0_u64;
    let mut error: Option<ServerError> = None;

    'results: loop {
        let mut payload = conn.stream.recv_packet().await?;

        match payload.first().copied() {
            // a statement that produces no rows answers with OK directly
            Some(0x00) => {
                let ok = OkPacket::get(payload)?;

                rows_affected += ok.affected_rows;
                logger.increase_rows_affected(ok.affected_rows);
                conn.in_transaction = ok.status.contains(Status::SERVER_STATUS_IN_TRANS);

                if ok.status.contains(Status::SERVER_MORE_RESULTS_EXISTS) {
                    continue 'results;
                }

                break 'results;
            }

            // an ERR packet ends the whole response stream
            Some(0xff) => {
                error = Some(ErrPacket::get(payload)?.into_server_error());
                break 'results;
            }

            _ => {}
        }

        // result-set header: column count as a length-encoded integer
        let column_count = payload
            .get_uint_lenenc()?
            .ok_or_else(|| err_protocol!("NULL column count"))? as usize;

        let mut definitions = Vec::with_capacity(column_count);
        for _ in 0..column_count {
            definitions.push(ColumnDefinition::get(conn.stream.recv_packet().await?)?);
        }

        if !deprecate_eof {
            // old servers delimit the column definitions with an EOF packet
            EofPacket::get(conn.stream.recv_packet().await?)?;
        }

        let columns = Arc::new(
            definitions
                .iter()
                .map(ColumnDefinition::to_column)
                .collect::<Vec<_>>(),
        );

        let mut result_set = ResultSet::new(Arc::clone(&columns));

        loop {
            let payload = conn.stream.recv_packet().await?;

            match payload.first().copied() {
                // 0xFE in a body shorter than 9 bytes is a terminator, not
                // row data (a row beginning with a 8-byte length field is
                // always longer)
                Some(0xfe) if payload.len() < 9 => {
                    let status = if deprecate_eof {
                        let ok = OkPacket::get(payload)?;
                        conn.in_transaction = ok.status.contains(Status::SERVER_STATUS_IN_TRANS);
                        ok.status
                    } else {
                        EofPacket::get(payload)?.status
                    };

                    result_sets.push(result_set);

                    if status.contains(Status::SERVER_MORE_RESULTS_EXISTS) {
                        continue 'results;
                    }

                    break 'results;
                }

                Some(0xff) => {
                    error = Some(ErrPacket::get(payload)?.into_server_error());
                    result_sets.push(result_set);
                    break 'results;
                }

                _ => {
                    let data = TextRow::get(payload, column_count)?;

                    let mut values = Vec::with_capacity(column_count);
                    for (definition, raw) in definitions.iter().zip(data.values.iter()) {
                        values.push(match raw {
                            Some(raw) => types::decode(definition, raw)?,
                            None => Value::Null,
                        });
                    }

                    result_set.rows.push(Row::new(Arc::clone(&columns), values));
                    logger.increment_rows_returned();
                }
            }
        }
    }

    if let Some(error) = error {
        return Err(Error::Server(error));
    }

    Ok((result_sets, rows_affected))
}
