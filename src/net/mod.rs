mod tls;

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio_rustls::client::TlsStream;

use crate::error::Error;

pub use tls::TlsMode;

/// A transport that may be upgraded to TLS after the fact.
///
/// All three network protocols begin in cleartext and negotiate encryption
/// inside their own handshakes, so the connection starts `Raw` and flips to
/// `Tls` mid-stream.
pub enum MaybeTlsStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    Raw(S),
    Tls(TlsStream<S>),
    Upgrading,
}

impl<S> MaybeTlsStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }

    pub async fn upgrade(
        &mut self,
        host: &str,
        accept_invalid_certs: bool,
    ) -> Result<(), Error> {
        let connector = tls::configure_tls_connector(accept_invalid_certs)?;

        let stream = match std::mem::replace(self, MaybeTlsStream::Upgrading) {
            MaybeTlsStream::Raw(stream) => stream,

            MaybeTlsStream::Tls(_) => {
                // already a TLS connection; nothing to do
                return Ok(());
            }

            MaybeTlsStream::Upgrading => {
                // a previous upgrade failed and we hold no transport
                return Err(Error::Io(io::ErrorKind::ConnectionAborted.into()));
            }
        };

        let host = rustls::pki_types::ServerName::try_from(host.to_owned())
            .map_err(|err| Error::tls(err))?;

        *self = MaybeTlsStream::Tls(
            connector
                .connect(host, stream)
                .await
                .map_err(|err| Error::tls(err))?,
        );

        Ok(())
    }

    /// The inner transport, regardless of whether TLS sits on top of it.
    pub fn inner_mut(&mut self) -> Option<&mut S> {
        match self {
            MaybeTlsStream::Raw(s) => Some(s),
            MaybeTlsStream::Tls(s) => Some(s.get_mut().0),
            MaybeTlsStream::Upgrading => None,
        }
    }
}

macro_rules! poll_on_stream {
    ($stream:ident, $cx:ident, $fn_name:ident $(, $arg:ident)*) => {
        match &mut *$stream {
            MaybeTlsStream::Raw(s) => Pin::new(s).$fn_name($cx $(, $arg)*),
            MaybeTlsStream::Tls(s) => Pin::new(s).$fn_name($cx $(, $arg)*),

            MaybeTlsStream::Upgrading => {
                Poll::Ready(Err(io::ErrorKind::ConnectionAborted.into()))
            }
        }
    };
}

impl<S> AsyncRead for MaybeTlsStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        poll_on_stream!(this, cx, poll_read, buf)
    }
}

impl<S> AsyncWrite for MaybeTlsStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        poll_on_stream!(this, cx, poll_write, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        poll_on_stream!(this, cx, poll_flush)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        poll_on_stream!(this, cx, poll_shutdown)
    }
}
