use crate::error::Error;
use crate::mssql::MssqlConnectOptions;
use crate::net::TlsMode;

impl MssqlConnectOptions {
    /// Parse an ADO.NET-style connection string:
    ///
    /// ```text
    /// Server=db.example.com,1433;Database=app;User Id=sa;Password=secret;Encrypt=true
    /// ```
    ///
    /// Recognized keys (case-insensitive): `Server` / `Data Source`,
    /// `Database` / `Initial Catalog`, `User Id` / `UID`, `Password` /
    /// `PWD`, `Domain`, `Encrypt`, `TrustServerCertificate`,
    /// `Connect Timeout`, `Application Intent`.
    pub fn from_connection_string(s: &str) -> Result<Self, Error> {
        let mut options = Self::new();

        for pair in s.split(';') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }

            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| Error::Protocol(format!("expected key=value, found {:?}", pair)))?;

            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            match key.as_str() {
                "server" | "data source" | "address" | "addr" => {
                    // a `host,port` value splits on the comma
                    let server = value.strip_prefix("tcp:").unwrap_or(value);

                    match server.split_once(',') {
                        Some((host, port)) => {
                            options = options.host(host).port(
                                port.trim()
                                    .parse()
                                    .map_err(|_| config_err(&key, value))?,
                            );
                        }

                        None => {
                            options = options.host(server);
                        }
                    }
                }

                "database" | "initial catalog" => {
                    options = options.database(value);
                }

                "user id" | "uid" | "user" => {
                    options = options.username(value);
                }

                "password" | "pwd" => {
                    options = options.password(value);
                }

                "domain" => {
                    options = options.domain(value);
                }

                "encrypt" => {
                    options = options.tls(match value.to_ascii_lowercase().as_str() {
                        "true" | "yes" | "mandatory" => TlsMode::Require,
                        "false" | "no" => TlsMode::Disable,
                        "optional" => TlsMode::Prefer,

                        _ => return Err(config_err(&key, value)),
                    });
                }

                "trustservercertificate" | "trust server certificate" => {
                    options = options
                        .trust_server_certificate(parse_bool(value).ok_or_else(|| config_err(&key, value))?);
                }

                "connect timeout" | "connection timeout" => {
                    let secs: u64 = value.parse().map_err(|_| config_err(&key, value))?;
                    options = options.connect_timeout(std::time::Duration::from_secs(secs));
                }

                "application intent" | "applicationintent" => {
                    options = options.read_only(value.eq_ignore_ascii_case("readonly"));
                }

                "application name" => {
                    options = options.app_name(value);
                }

                _ => {
                    return Err(Error::Protocol(format!(
                        "`{}` is not a recognized connection string key",
                        key
                    )));
                }
            }
        }

        Ok(options)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn config_err(key: &str, value: &str) -> Error {
    Error::Protocol(format!("invalid value {:?} for key `{}`", value, key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_lexes_a_full_connection_string() {
        let options = MssqlConnectOptions::from_connection_string(
            "Server=db.example.com,1434;Initial Catalog=app;User Id=admin;\
             Password=p=ss;Encrypt=optional;TrustServerCertificate=true;\
             Connect Timeout=10;Application Intent=ReadOnly",
        )
        .unwrap();

        assert_eq!(options.host, "db.example.com");
        assert_eq!(options.port, 1434);
        assert_eq!(options.database, "app");
        assert_eq!(options.username, "admin");
        assert_eq!(options.password.as_deref(), Some("p=ss"));
        assert_eq!(options.tls, TlsMode::Prefer);
        assert!(options.trust_server_certificate);
        assert_eq!(options.connect_timeout.as_secs(), 10);
        assert!(options.read_only);
    }

    #[test]
    fn server_without_port_keeps_the_default() {
        let options =
            MssqlConnectOptions::from_connection_string("Data Source=localhost;UID=sa;PWD=x")
                .unwrap();

        assert_eq!(options.host, "localhost");
        assert_eq!(options.port, 1433);
    }

    #[test]
    fn encrypt_mandatory_requires_tls() {
        let options =
            MssqlConnectOptions::from_connection_string("Server=h;Encrypt=mandatory").unwrap();

        assert_eq!(options.tls, TlsMode::Require);
    }

    #[test]
    fn domain_enables_ntlm() {
        let options =
            MssqlConnectOptions::from_connection_string("Server=h;Domain=CORP;User Id=alice")
                .unwrap();

        assert_eq!(options.domain.as_deref(), Some("CORP"));
    }
}
