use crate::error::Error;
use crate::net::TlsMode;
use crate::postgres::connection::{sasl, stream::PgStream};
use crate::postgres::protocol::authentication::Authentication;
use crate::postgres::protocol::backend_key_data::BackendKeyData;
use crate::postgres::protocol::password::Password;
use crate::postgres::protocol::ready_for_query::{ReadyForQuery, TransactionStatus};
use crate::postgres::protocol::response::PgNotice;
use crate::postgres::protocol::ssl_request::SslRequest;
use crate::postgres::protocol::startup::Startup;
use crate::postgres::protocol::MessageFormat;
use crate::postgres::{PgConnectOptions, PgConnection};

// https://www.postgresql.org/docs/current/protocol-flow.html#id-1.10.5.7.3

impl PgConnection {
    pub(crate) async fn establish(options: &PgConnectOptions) -> Result<Self, Error> {
        tokio::time::timeout(options.connect_timeout, connect(options))
            .await
            .map_err(|_| Error::Timeout)?
    }
}

async fn connect(options: &PgConnectOptions) -> Result<PgConnection, Error> {
    log::debug!("postgres: connecting to {}:{}", options.host, options.port);

    let mut stream = PgStream::connect(options).await?;

    maybe_upgrade(&mut stream, options).await?;

    let mut params = vec![
        // iso-formatted dates and UTC stamps keep the text codec unambiguous
        ("DateStyle", "ISO, MDY"),
        ("client_encoding", "UTF8"),
        ("TimeZone", "UTC"),
    ];

    if let Some(ref application_name) = options.application_name {
        params.push(("application_name", application_name));
    }

    stream
        .send(Startup {
            username: &options.username,
            database: options.database.as_deref(),
            params: &params,
        })
        .await?;

    let mut process_id = 0;
    let mut secret_key = 0;
    let in_transaction;

    loop {
        let message = stream.recv().await?;

        match message.format {
            MessageFormat::Authentication => match Authentication::get(message.contents)? {
                Authentication::Ok => {
                    // no more information is required to continue
                }

                Authentication::CleartextPassword => {
                    stream
                        .send(Password::Cleartext(
                            options.password.as_deref().unwrap_or_default(),
                        ))
                        .await?;
                }

                Authentication::Md5Password(body) => {
                    stream
                        .send(Password::Md5 {
                            username: &options.username,
                            password: options.password.as_deref().unwrap_or_default(),
                            salt: body.salt,
                        })
                        .await?;
                }

                Authentication::Sasl(offer) => {
                    sasl::authenticate(&mut stream, options, offer).await?;
                }

                method => {
                    return Err(Error::AuthenticationFailed(format!(
                        "unsupported authentication method: {:?}",
                        method
                    )));
                }
            },

            MessageFormat::BackendKeyData => {
                let data = BackendKeyData::get(message.contents)?;

                process_id = data.process_id;
                secret_key = data.secret_key;
            }

            MessageFormat::ErrorResponse => {
                return Err(Error::AuthenticationFailed(
                    PgNotice::get(message.contents)?.message,
                ));
            }

            MessageFormat::ReadyForQuery => {
                in_transaction = !matches!(
                    ReadyForQuery::get(message.contents)?.transaction_status,
                    TransactionStatus::Idle
                );

                break;
            }

            other => {
                return Err(err_protocol!("establish: unexpected message {:?}", other));
            }
        }
    }

    Ok(PgConnection {
        stream,
        process_id,
        secret_key,
        in_transaction,
        open: true,
        query_timeout: options.query_timeout,
        log_settings: options.log_settings.clone(),
    })
}

async fn maybe_upgrade(stream: &mut PgStream, options: &PgConnectOptions) -> Result<(), Error> {
    if !options.tls.wanted() {
        return Ok(());
    }

    stream.send(SslRequest).await?;

    // the server answers the probe with a single untagged byte, before any
    // message framing begins
    match stream.recv_ssl_response().await? {
        b'S' => {
            stream.get_mut().upgrade(&options.host, false).await?;
        }

        b'N' => {
            if options.tls == TlsMode::Require {
                return Err(Error::tls("server does not support TLS"));
            }

            // tls=prefer: continue in cleartext
        }

        other => {
            return Err(err_protocol!(
                "unexpected SSLRequest response `\\x{:02x}`",
                other
            ));
        }
    }

    Ok(())
}
