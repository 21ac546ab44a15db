use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

use bytes::{Buf, Bytes};
use tokio::net::TcpStream;

use crate::error::Error;
use crate::io::BufStream;
use crate::net::MaybeTlsStream;
use crate::postgres::protocol::parameter_status::ParameterStatus;
use crate::postgres::protocol::response::PgNotice;
use crate::postgres::protocol::{Message, MessageFormat};
use crate::postgres::PgConnectOptions;

// the stream is a separate type from the connection so that the handshake
// can work on it before a valid [PgConnection] exists

pub(crate) struct PgStream {
    inner: BufStream<MaybeTlsStream<TcpStream>>,

    pub(crate) parameter_statuses: BTreeMap<String, String>,

    pub(crate) server_version_num: Option<u32>,

    /// Invoked synchronously for every `NoticeResponse`.
    pub(crate) on_notice: Option<Box<dyn FnMut(&PgNotice) + Send>>,
}

impl PgStream {
    pub(super) async fn connect(options: &PgConnectOptions) -> Result<Self, Error> {
        let stream = TcpStream::connect((&*options.host, options.port)).await?;

        Ok(Self {
            inner: BufStream::new(MaybeTlsStream::Raw(stream)),
            parameter_statuses: BTreeMap::new(),
            server_version_num: None,
            on_notice: None,
        })
    }

    pub(crate) async fn send<T: crate::io::Encode>(&mut self, message: T) -> Result<(), Error> {
        self.write(message);
        self.flush().await
    }

    /// Reads the single untagged byte answering an `SSLRequest`.
    pub(super) async fn recv_ssl_response(&mut self) -> Result<u8, Error> {
        let byte = self.inner.read(1).await?;
        Ok(byte[0])
    }

    pub(crate) async fn recv_unchecked(&mut self) -> Result<Message, Error> {
        // each backend message starts with a 1-byte tag and a self-inclusive
        // 4-byte big-endian length
        let mut header: Bytes = self.inner.read(5).await?;

        let format = MessageFormat::try_from_u8(header.get_u8())?;
        let size = header.get_u32() as usize;

        if size < 4 {
            return Err(err_protocol!("backend message length {} is too small", size));
        }

        let contents = self.inner.read(size - 4).await?;

        Ok(Message { format, contents })
    }

    /// Gets the next message, transparently consuming the asynchronous
    /// ones: parameter-status updates are recorded, notices are dispatched
    /// to the registered callback and the log.
    pub(crate) async fn recv(&mut self) -> Result<Message, Error> {
        loop {
            let message = self.recv_unchecked().await?;

            match message.format {
                MessageFormat::ParameterStatus => {
                    let ParameterStatus { name, value } = ParameterStatus::get(message.contents)?;

                    if name == "server_version" {
                        self.server_version_num = parse_server_version(&value);
                    }
                    self.parameter_statuses.insert(name, value);

                    continue;
                }

                MessageFormat::NoticeResponse => {
                    let notice = PgNotice::get(message.contents)?;

                    log::debug!(
                        target: "unisql::postgres::notice",
                        "{}: {}",
                        notice.severity,
                        notice.message
                    );

                    if let Some(callback) = &mut self.on_notice {
                        callback(&notice);
                    }

                    continue;
                }

                _ => {}
            }

            return Ok(message);
        }
    }
}

impl Deref for PgStream {
    type Target = BufStream<MaybeTlsStream<TcpStream>>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for PgStream {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

// reference:
// https://github.com/postgres/postgres/blob/master/src/interfaces/libpq/fe-exec.c
fn parse_server_version(s: &str) -> Option<u32> {
    let numeric: String = s
        .chars()
        .take_while(|ch| ch.is_ascii_digit() || *ch == '.')
        .collect();

    let mut parts = numeric.split('.').filter_map(|p| p.parse::<u32>().ok());

    let version_num = match (parts.next(), parts.next(), parts.next()) {
        (Some(major), Some(minor), Some(rev)) => (100 * major + minor) * 100 + rev,
        (Some(major), Some(minor), None) if major >= 10 => 100 * 100 * major + minor,
        (Some(major), Some(minor), None) => (100 * major + minor) * 100,
        (Some(major), None, None) => 100 * 100 * major,
        _ => return None,
    };

    Some(version_num)
}

#[cfg(test)]
mod tests {
    use super::parse_server_version;

    #[test]
    fn test_parse_server_version_num() {
        // old style
        assert_eq!(parse_server_version("9.6.1"), Some(90601));
        // new style
        assert_eq!(parse_server_version("10.1"), Some(100001));
        // new style with a suffix
        assert_eq!(parse_server_version("14.2 (Debian 14.2-1)"), Some(140002));
        // unknown
        assert_eq!(parse_server_version("unknown"), None);
    }
}
