use std::str::FromStr;

use percent_encoding::percent_decode_str;
use url::Url;

use crate::error::Error;
use crate::mssql::MssqlConnectOptions;

impl FromStr for MssqlConnectOptions {
    type Err = Error;

    /// Parse a connection string into a set of connection options.
    ///
    /// ```text
    /// mssql://[username[:password]@]host[:port][/database][?encrypt=require&domain=CORP]
    /// ```
    ///
    /// ADO.NET-style strings go through
    /// [`MssqlConnectOptions::from_connection_string`] instead.
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
                "encrypt" | "tls" => {
                    options = options.tls(value.parse()?);
                }

                "trust_server_certificate" => {
                    options = options.trust_server_certificate(value == "true" || value == "1");
                }

                "read_only" => {
                    options = options.read_only(value == "true" || value == "1");
                }

                "domain" => {
                    options = options.domain(&value);
                }

                "app_name" => {
                    options = options.app_name(&value);
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
    let options: MssqlConnectOptions =
        "mssql://sa:Pass%40word@db:14330/northwind?encrypt=require&read_only=true"
            .parse()
            .unwrap();

    assert_eq!(options.host, "db");
    assert_eq!(options.port, 14330);
    assert_eq!(options.username, "sa");
    assert_eq!(options.password.as_deref(), Some("Pass@word"));
    assert_eq!(options.database, "northwind");
    assert_eq!(options.tls, crate::net::TlsMode::Require);
    assert!(options.read_only);
}
