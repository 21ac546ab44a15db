use crate::error::Error;
use crate::mysql::connection::stream::MySqlStream;
use crate::mysql::connection::MySqlConnection;
use crate::mysql::protocol::auth::{more_data, AuthSwitchRequest};
use crate::mysql::protocol::err::ErrPacket;
use crate::mysql::protocol::handshake::Handshake;
use crate::mysql::protocol::handshake_response::HandshakeResponse;
use crate::mysql::protocol::ok::OkPacket;
use crate::mysql::protocol::ssl_request::SslRequest;
use crate::mysql::protocol::Capabilities;
use crate::mysql::MySqlConnectOptions;
use crate::net::TlsMode;

// utf8mb4
const COLLATION: u8 = 0xff;

const MAX_PACKET_SIZE: u32 = 16_777_216;

impl MySqlConnection {
    pub(crate) async fn establish(options: &MySqlConnectOptions) -> Result<Self, Error> {
        tokio::time::timeout(options.connect_timeout, connect(options))
            .await
            .map_err(|_| Error::Timeout)?
    }
}

async fn connect(options: &MySqlConnectOptions) -> Result<MySqlConnection, Error> {
    log::debug!("mysql: connecting to {}:{}", options.host, options.port);

    let mut stream = MySqlStream::connect(options).await?;

    // the server speaks first
    let handshake = Handshake::get(stream.recv_packet().await?)?;

    let mut capabilities = Capabilities::LONG_PASSWORD
        | Capabilities::LONG_FLAG
        | Capabilities::PROTOCOL_41
        | Capabilities::TRANSACTIONS
        | Capabilities::SECURE_CONNECTION
        | Capabilities::MULTI_STATEMENTS
        | Capabilities::MULTI_RESULTS
        | Capabilities::PS_MULTI_RESULTS
        | Capabilities::PLUGIN_AUTH
        | Capabilities::CONNECT_ATTRS
        | Capabilities::DEPRECATE_EOF;

    if options.database.is_some() {
        capabilities |= Capabilities::CONNECT_WITH_DB;
    }

    // only advertise what the server also speaks
    capabilities &= handshake.server_capabilities;

    let server_does_tls = handshake.server_capabilities.contains(Capabilities::SSL);

    if options.tls.wanted() && server_does_tls {
        capabilities |= Capabilities::SSL;

        stream.write_packet(SslRequest {
            capabilities,
            max_packet_size: MAX_PACKET_SIZE,
            collation: COLLATION,
        });
        stream.flush().await?;

        stream.get_mut().upgrade(&options.host, false).await?;
    } else if options.tls == TlsMode::Require {
        return Err(Error::tls("server does not support TLS"));
    }

    let tls_active = stream.get_ref().is_tls();
    let password = options.password.as_deref().unwrap_or_default();

    let mut plugin = handshake.auth_plugin;
    let auth_response = plugin.scramble(password, &handshake.auth_plugin_data);

    stream.write_packet(HandshakeResponse {
        capabilities,
        max_packet_size: MAX_PACKET_SIZE,
        collation: COLLATION,
        username: &options.username,
        auth_response: &auth_response,
        database: options.database.as_deref(),
        auth_plugin_name: plugin.name(),
    });
    stream.flush().await?;

    // drive the authentication exchange to an OK (or a refusal)
    loop {
        let payload = stream.recv_packet().await?;

        match payload.first().copied() {
            Some(0x00) => {
                let _ok = OkPacket::get(payload)?;
                break;
            }

            Some(0xff) => {
                return Err(Error::AuthenticationFailed(
                    ErrPacket::get(payload)?.error_message,
                ));
            }

            // AuthSwitchRequest: redo the scramble with the requested plugin
            Some(0xfe) => {
                let switch = AuthSwitchRequest::get(payload)?;

                plugin = switch.plugin;
                let response = plugin.scramble(password, &switch.data);

                stream.write_packet(&response[..]);
                stream.flush().await?;
            }

            // AuthMoreData (caching_sha2_password)
            Some(0x01) => match payload.get(1).copied() {
                Some(more_data::FAST_AUTH_OK) => {
                    // the scramble hit the server's cache; OK follows
                }

                Some(more_data::FULL_AUTH_REQUIRED) => {
                    if !tls_active {
                        return Err(Error::Unsupported(String::from(
                            "caching_sha2_password RSA key exchange (full authentication \
                             requires TLS)",
                        )));
                    }

                    // over TLS the cleartext password is acceptable
                    let mut response = Vec::with_capacity(password.len() + 1);
                    response.extend_from_slice(password.as_bytes());
                    response.push(0);

                    stream.write_packet(&response[..]);
                    stream.flush().await?;
                }

                other => {
                    return Err(err_protocol!(
                        "unexpected AuthMoreData subtype {:?}",
                        other
                    ));
                }
            },

            other => {
                return Err(err_protocol!(
                    "unexpected packet 0x{:02x?} during authentication",
                    other
                ));
            }
        }
    }

    stream.capabilities = capabilities;

    Ok(MySqlConnection {
        stream,
        in_transaction: false,
        open: true,
        query_timeout: options.query_timeout,
        log_settings: options.log_settings.clone(),
    })
}
