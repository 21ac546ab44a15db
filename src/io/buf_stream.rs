use std::io;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::Error;
use crate::io::Encode;

/// A buffered duplex stream.
///
/// Writes with [`BufStream::write`] land in the write buffer and hit the
/// socket only on [`BufStream::flush`]; reads accumulate in the read buffer
/// until the requested count is available.
pub struct BufStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub(crate) stream: S,

    pub(crate) wbuf: Vec<u8>,

    rbuf: BytesMut,
}

impl<S> BufStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            wbuf: Vec::with_capacity(512),
            rbuf: BytesMut::with_capacity(4096),
        }
    }

    pub fn write<T: Encode>(&mut self, value: T) {
        value.encode(&mut self.wbuf);
    }

    pub async fn flush(&mut self) -> Result<(), Error> {
        if !self.wbuf.is_empty() {
            self.stream.write_all(&self.wbuf).await?;
            self.wbuf.clear();
        }

        self.stream.flush().await?;

        Ok(())
    }

    /// Reads exactly `cnt` bytes, waiting on the socket as needed.
    pub async fn read(&mut self, cnt: usize) -> Result<Bytes, Error> {
        while self.rbuf.len() < cnt {
            let n = self.stream.read_buf(&mut self.rbuf).await?;

            if n == 0 {
                return Err(io::Error::from(io::ErrorKind::ConnectionReset).into());
            }
        }

        Ok(self.rbuf.split_to(cnt).freeze())
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }
}
