use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::mssql::protocol::packet::{PacketType, Status, HEADER_SIZE};

/// During the TLS handshake (and only then), TLS records travel inside TDS
/// PRELOGIN packets. This wrapper frames outbound handshake bytes and
/// strips the framing from inbound ones; once the handshake completes it
/// turns into a transparent pass-through.
pub(crate) struct TlsPreloginWrapper<S> {
    inner: S,

    pending_handshake: bool,

    header_buf: [u8; HEADER_SIZE],
    header_pos: usize,
    read_remaining: usize,

    wr_buf: Vec<u8>,
    wr_pos: usize,
}

impl<S> TlsPreloginWrapper<S> {
    pub(crate) fn new(inner: S) -> Self {
        Self {
            inner,
            pending_handshake: false,
            header_buf: [0; HEADER_SIZE],
            header_pos: 0,
            read_remaining: 0,
            wr_buf: Vec::new(),
            wr_pos: 0,
        }
    }

    /// Turns the framing on; called just before the TLS handshake starts.
    pub(crate) fn start_handshake(&mut self) {
        self.pending_handshake = true;
        self.wr_buf = header_placeholder();
    }

    /// Turns the framing off; the one-shot observer flipped once the
    /// handshake future resolves.
    pub(crate) fn handshake_complete(&mut self) {
        self.pending_handshake = false;
        self.wr_buf = Vec::new();
        self.wr_pos = 0;
    }
}

fn header_placeholder() -> Vec<u8> {
    vec![0; HEADER_SIZE]
}

impl<S: AsyncRead + Unpin> AsyncRead for TlsPreloginWrapper<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        if !this.pending_handshake {
            return Pin::new(&mut this.inner).poll_read(cx, buf);
        }

        // between packets: consume the next 8-byte TDS header
        while this.read_remaining == 0 {
            while this.header_pos < HEADER_SIZE {
                let mut header = ReadBuf::new(&mut this.header_buf[this.header_pos..]);
                ready!(Pin::new(&mut this.inner).poll_read(cx, &mut header))?;

                let n = header.filled().len();
                if n == 0 {
                    return Poll::Ready(Err(io::ErrorKind::UnexpectedEof.into()));
                }

                this.header_pos += n;
            }

            let length = u16::from_be_bytes([this.header_buf[2], this.header_buf[3]]) as usize;

            if length <= HEADER_SIZE {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "TDS packet length is too small",
                )));
            }

            this.header_pos = 0;
            this.read_remaining = length - HEADER_SIZE;
        }

        // hand over payload bytes, but never past the packet boundary
        let max = this.read_remaining.min(buf.remaining());
        let mut limited = buf.take(max);

        ready!(Pin::new(&mut this.inner).poll_read(cx, &mut limited))?;

        let n = limited.filled().len();

        // `limited` filled (and initialized) a prefix of `buf`'s unfilled
        // region; reflect that in `buf`
        unsafe { buf.assume_init(n) };
        buf.advance(n);

        this.read_remaining -= n;

        Poll::Ready(Ok(()))
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for TlsPreloginWrapper<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();

        if !this.pending_handshake {
            return Pin::new(&mut this.inner).poll_write(cx, buf);
        }

        this.wr_buf.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        if !this.pending_handshake {
            return Pin::new(&mut this.inner).poll_flush(cx);
        }

        if this.wr_buf.len() > HEADER_SIZE {
            // patch the header now that the payload size is known
            let len = this.wr_buf.len() as u16;
            this.wr_buf[0] = PacketType::PreLogin as u8;
            this.wr_buf[1] = Status::END_OF_MESSAGE.bits();
            this.wr_buf[2..4].copy_from_slice(&len.to_be_bytes());
            this.wr_buf[4..8].copy_from_slice(&[0, 0, 1, 0]);

            while this.wr_pos < this.wr_buf.len() {
                let n =
                    ready!(Pin::new(&mut this.inner).poll_write(cx, &this.wr_buf[this.wr_pos..]))?;

                if n == 0 {
                    return Poll::Ready(Err(io::ErrorKind::WriteZero.into()));
                }

                this.wr_pos += n;
            }

            this.wr_buf = header_placeholder();
            this.wr_pos = 0;
        }

        Pin::new(&mut this.inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn it_frames_writes_and_unwraps_reads_during_handshake() {
        let (client, mut server) = tokio::io::duplex(4096);

        let mut wrapper = TlsPreloginWrapper::new(client);
        wrapper.start_handshake();

        wrapper.write_all(b"\x16\x03\x01hello").await.unwrap();
        wrapper.flush().await.unwrap();

        // the peer sees a PRELOGIN packet around the TLS record
        let mut framed = [0_u8; 16];
        server.read_exact(&mut framed).await.unwrap();

        assert_eq!(framed[0], 0x12);
        assert_eq!(framed[1], 0x01);
        assert_eq!(u16::from_be_bytes([framed[2], framed[3]]), 16);
        assert_eq!(&framed[8..], b"\x16\x03\x01hello");

        // and a framed answer comes back unwrapped, across two reads
        let mut answer = vec![0x12, 0x01, 0, 12, 0, 0, 1, 0];
        answer.extend_from_slice(b"\x16\x03\x03!");
        server.write_all(&answer).await.unwrap();

        let mut unwrapped = [0_u8; 4];
        wrapper.read_exact(&mut unwrapped).await.unwrap();
        assert_eq!(&unwrapped, b"\x16\x03\x03!");
    }

    #[tokio::test]
    async fn pass_through_after_completion() {
        let (client, mut server) = tokio::io::duplex(64);

        let mut wrapper = TlsPreloginWrapper::new(client);
        wrapper.start_handshake();
        wrapper.handshake_complete();

        wrapper.write_all(b"raw").await.unwrap();
        wrapper.flush().await.unwrap();

        let mut raw = [0_u8; 3];
        server.read_exact(&mut raw).await.unwrap();
        assert_eq!(&raw, b"raw");
    }
}
