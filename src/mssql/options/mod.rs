use std::time::Duration;

use crate::connection::LogSettings;
use crate::net::TlsMode;

mod connection_string;
mod parse;

/// Options for connecting to Microsoft SQL Server.
///
/// Built either with the builder methods, from a `mssql://` URL, or from an
/// ADO.NET-style connection string via
/// [`MssqlConnectOptions::from_connection_string`].
#[derive(Debug, Clone)]
pub struct MssqlConnectOptions {
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) username: String,
    pub(crate) password: Option<String>,
    pub(crate) database: String,

    /// NTLMv2 domain; set to authenticate with integrated security.
    pub(crate) domain: Option<String>,

    pub(crate) tls: TlsMode,
    pub(crate) trust_server_certificate: bool,

    /// ApplicationIntent=ReadOnly; sets LOGIN7 TypeFlags bit 0x20.
    pub(crate) read_only: bool,

    pub(crate) hostname: String,
    pub(crate) app_name: String,

    pub(crate) connect_timeout: Duration,
    pub(crate) query_timeout: Option<Duration>,
    pub(crate) log_settings: LogSettings,
}

impl Default for MssqlConnectOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl MssqlConnectOptions {
    pub fn new() -> Self {
        Self {
            host: String::from("localhost"),
            port: 1433,
            username: String::from("sa"),
            password: None,
            database: String::from("master"),
            domain: None,
            tls: TlsMode::Prefer,
            trust_server_certificate: false,
            read_only: false,
            hostname: String::new(),
            app_name: String::new(),
            connect_timeout: Duration::from_secs(30),
            query_timeout: None,
            log_settings: Default::default(),
        }
    }

    pub fn host(mut self, host: &str) -> Self {
        self.host = host.to_owned();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn username(mut self, username: &str) -> Self {
        self.username = username.to_owned();
        self
    }

    pub fn password(mut self, password: &str) -> Self {
        self.password = Some(password.to_owned());
        self
    }

    pub fn database(mut self, database: &str) -> Self {
        self.database = database.to_owned();
        self
    }

    /// Authenticate through NTLMv2 as `domain\username`.
    pub fn domain(mut self, domain: &str) -> Self {
        self.domain = Some(domain.to_owned());
        self
    }

    pub fn tls(mut self, tls: TlsMode) -> Self {
        self.tls = tls;
        self
    }

    /// Skip certificate verification during the TLS handshake.
    pub fn trust_server_certificate(mut self, trust: bool) -> Self {
        self.trust_server_certificate = trust;
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// The client host name reported in LOGIN7 (and used as the NTLM
    /// workstation name).
    pub fn hostname(mut self, hostname: &str) -> Self {
        self.hostname = hostname.to_owned();
        self
    }

    pub fn app_name(mut self, app_name: &str) -> Self {
        self.app_name = app_name.to_owned();
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    pub fn log_statements(mut self, level: log::LevelFilter) -> Self {
        self.log_settings.log_statements(level);
        self
    }
}
