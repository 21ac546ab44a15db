use std::str::FromStr;

use percent_encoding::percent_decode_str;
use url::Url;

use crate::error::Error;
use crate::mysql::MySqlConnectOptions;

impl FromStr for MySqlConnectOptions {
    type Err = Error;

    /// Parse a connection string into a set of connection options.
    ///
    /// ```text
    /// mysql://[username[:password]@]host[:port][/database][?ssl-mode=prefer]
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url: Url = s.parse().map_err(Error::config)?;
        let mut options = Self::new();

        if let Some(host) = url.host_str() {
            options = options.host(host);
        }

        if let Some(port) = url.port() {
            options = options.port(port);
        }

        let username = url.username();
        if !username.is_empty() {
            options = options.username(
                &percent_decode_str(username)
                    .decode_utf8()
                    .map_err(Error::config)?,
            );
        }

        if let Some(password) = url.password() {
            options = options.password(
                &percent_decode_str(password)
                    .decode_utf8()
                    .map_err(Error::config)?,
            );
        }

        let path = url.path().trim_start_matches('/');
        if !path.is_empty() {
            options = options.database(path);
        }

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "ssl-mode" | "sslmode" | "tls" => {
                    options = options.tls(value.parse()?);
                }

                "connect_timeout" => {
                    let secs = value.parse().map_err(Error::config)?;
                    options = options.connect_timeout(std::time::Duration::from_secs(secs));
                }

                "query_timeout" => {
                    let secs = value.parse().map_err(Error::config)?;
                    options = options.query_timeout(std::time::Duration::from_secs(secs));
                }

                _ => {}
            }
        }

        Ok(options)
    }
}

#[test]
fn it_parses_a_connection_url() {
    let options: MySqlConnectOptions = "mysql://root:secret@db:3307/app?ssl-mode=disable"
        .parse()
        .unwrap();

    assert_eq!(options.host, "db");
    assert_eq!(options.port, 3307);
    assert_eq!(options.username, "root");
    assert_eq!(options.password.as_deref(), Some("secret"));
    assert_eq!(options.database.as_deref(), Some("app"));
    assert_eq!(options.tls, crate::net::TlsMode::Disable);
}
