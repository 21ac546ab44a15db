use rand::Rng;

use crate::error::Error;
use crate::mssql::connection::stream::{Message, MssqlStream};
use crate::mssql::connection::MssqlConnection;
use crate::mssql::protocol::env_change::EnvChange;
use crate::mssql::protocol::login::{Login7, TDS_VERSION_74};
use crate::mssql::protocol::ntlm;
use crate::mssql::protocol::packet::{PacketType, PACKET_SIZE};
use crate::mssql::protocol::pre_login::{Encrypt, PreLogin, Version};
use crate::mssql::MssqlConnectOptions;
use crate::net::{MaybeTlsStream, TlsMode};

enum ConnectResult {
    Stream(MssqlStream),
    Reroute(String, u16),
}

impl MssqlConnection {
    pub(crate) async fn establish(options: &MssqlConnectOptions) -> Result<Self, Error> {
        tokio::time::timeout(options.connect_timeout, connect_with_rerouting(options))
            .await
            .map_err(|_| Error::Timeout)?
    }
}

async fn connect_with_rerouting(options: &MssqlConnectOptions) -> Result<MssqlConnection, Error> {
    let mut options = options.clone();
    let stream;

    loop {
        log::debug!("mssql: connecting to {}:{}", options.host, options.port);

        match connect_once(&options).await? {
            ConnectResult::Stream(s) => {
                stream = s;
                break;
            }

            ConnectResult::Reroute(host, port) => {
                log::debug!("mssql: server rerouted us to {}:{}; reestablishing", host, port);
                options.host = host;
                options.port = port;
            }
        }
    }

    Ok(MssqlConnection {
        stream,
        in_transaction: false,
        open: true,
        query_timeout: options.query_timeout,
        log_settings: options.log_settings.clone(),
        on_info: None,
    })
}

async fn connect_once(options: &MssqlConnectOptions) -> Result<ConnectResult, Error> {
    let mut stream = MssqlStream::connect(options).await?;

    // Send PRELOGIN to set up the context for login. The server should
    // immediately respond with a PRELOGIN message of its own.

    let encryption = match options.tls {
        TlsMode::Disable => Encrypt::NotSupported,
        TlsMode::Prefer | TlsMode::Require => Encrypt::On,
    };

    stream
        .send_message(
            PacketType::PreLogin,
            PreLogin {
                version: Version::default(),
                encryption,
            },
        )
        .await?;

    let response = PreLogin::decode(stream.recv_logical_message().await?)?;

    match (options.tls, response.encryption) {
        (TlsMode::Disable, Encrypt::Required) => {
            return Err(Error::tls("server requires TLS"));
        }

        (TlsMode::Disable, _) | (TlsMode::Prefer, Encrypt::NotSupported) => {
            // continue in cleartext
        }

        (TlsMode::Require, Encrypt::NotSupported) => {
            return Err(Error::tls("server does not support TLS"));
        }

        _ => {
            // TLS records ride inside PRELOGIN packets until the handshake
            // completes
            if let Some(wrapper) = stream.get_mut().inner_mut() {
                wrapper.start_handshake();
            }

            stream
                .get_mut()
                .upgrade(&options.host, options.trust_server_certificate)
                .await?;

            if let MaybeTlsStream::Tls(tls) = stream.get_mut() {
                tls.get_mut().0.handshake_complete();
            }
        }
    }

    // LOGIN7 defines the authentication rules for use between client and
    // server

    let negotiate;
    let sspi = if options.domain.is_some() {
        negotiate = ntlm::negotiate_message();
        Some(&negotiate[..])
    } else {
        None
    };

    stream.write_message(
        PacketType::Tds7Login,
        Login7 {
            version: TDS_VERSION_74,
            packet_size: PACKET_SIZE as u32,
            client_program_version: 0,
            client_pid: std::process::id(),
            hostname: &options.hostname,
            username: &options.username,
            password: options.password.as_deref().unwrap_or_default(),
            app_name: &options.app_name,
            server_name: "",
            client_interface_name: "",
            language: "",
            database: &options.database,
            client_id: [0; 6],
            read_only_intent: options.read_only,
            sspi,
        },
    );
    stream.flush().await?;

    loop {
        match stream.recv_message().await? {
            Message::LoginAck(_) => {
                // the login was accepted; drain to <Done>
            }

            Message::Sspi(challenge) => {
                // NTLM: answer the server challenge with AUTHENTICATE in an
                // SSPI-typed packet
                let domain = options.domain.as_deref().unwrap_or_default();
                let password = options.password.as_deref().unwrap_or_default();

                let challenge = ntlm::Challenge::decode(challenge)?;

                let key = ntlm::ntlmv2_hash(&options.username, domain, password);

                let mut client_challenge = [0_u8; 8];
                rand::thread_rng().fill(&mut client_challenge[..]);

                let response = ntlm::compute_response(
                    &key,
                    &challenge.server_challenge,
                    &client_challenge,
                    &challenge.target_info,
                    chrono::Utc::now(),
                );

                let authenticate = ntlm::authenticate_message(
                    &options.username,
                    domain,
                    &options.hostname,
                    &response,
                );

                stream
                    .send_message(PacketType::Sspi, &authenticate[..])
                    .await?;
            }

            Message::EnvChange(EnvChange::Routing { host, port }) => {
                return Ok(ConnectResult::Reroute(host, port));
            }

            Message::Error(error) => {
                return Err(Error::AuthenticationFailed(error.message));
            }

            Message::Done(_) => {
                return Ok(ConnectResult::Stream(stream));
            }

            // ENVCHANGE, INFO, FEATUREEXTACK, ... are informational here
            _ => {}
        }
    }
}
