use std::ops::{Deref, DerefMut};

use bytes::{Buf, Bytes, BytesMut};
use tokio::net::TcpStream;

use crate::error::Error;
use crate::io::{BufStream, Encode};
use crate::mysql::protocol::err::ErrPacket;
use crate::mysql::protocol::ok::OkPacket;
use crate::mysql::protocol::Capabilities;
use crate::mysql::MySqlConnectOptions;

const MAX_PAYLOAD: usize = 0xff_ff_ff;

pub(crate) struct MySqlStream {
    inner: BufStream<crate::net::MaybeTlsStream<TcpStream>>,

    pub(crate) capabilities: Capabilities,

    // increments per packet within one request-response turn; the client
    // resets it at the start of each new turn
    pub(crate) sequence_id: u8,
}

impl MySqlStream {
    pub(super) async fn connect(options: &MySqlConnectOptions) -> Result<Self, Error> {
        let stream = TcpStream::connect((&*options.host, options.port)).await?;

        Ok(Self {
            inner: BufStream::new(crate::net::MaybeTlsStream::Raw(stream)),
            capabilities: Capabilities::empty(),
            sequence_id: 0,
        })
    }

    /// Begins a new request-response turn.
    pub(crate) fn reset_sequence(&mut self) {
        self.sequence_id = 0;
    }

    /// Frames and buffers one command packet; splits payloads at the
    /// 16 MiB - 1 boundary with continuation packets.
    pub(crate) fn write_packet<T: Encode>(&mut self, payload: T) {
        let mut encoded = Vec::with_capacity(64);
        payload.encode(&mut encoded);

        let mut chunks = encoded.chunks(MAX_PAYLOAD);
        loop {
            // a payload of exactly n*0xFFFFFF is terminated by an empty packet
            let chunk = chunks.next().unwrap_or(&[]);

            self.inner.wbuf.extend_from_slice(&(chunk.len() as u32).to_le_bytes()[..3]);
            self.inner.wbuf.push(self.sequence_id);
            self.inner.wbuf.extend_from_slice(chunk);

            self.sequence_id = self.sequence_id.wrapping_add(1);

            if chunk.len() < MAX_PAYLOAD {
                break;
            }
        }
    }

    pub(crate) async fn send_packet<T: Encode>(&mut self, payload: T) -> Result<(), Error> {
        self.write_packet(payload);
        self.flush().await
    }

    /// Reads one logical packet, concatenating `0xFFFFFF`-sized
    /// continuations until a short packet terminates them.
    pub(crate) async fn recv_packet(&mut self) -> Result<Bytes, Error> {
        let mut accumulated: Option<BytesMut> = None;

        loop {
            let mut header = self.inner.read(4).await?;
            let len = header.get_uint_le(3) as usize;
            let sequence_id = header.get_u8();

            self.sequence_id = sequence_id.wrapping_add(1);

            let payload = self.inner.read(len).await?;

            match &mut accumulated {
                None if len < MAX_PAYLOAD => return Ok(payload),

                None => {
                    let mut buf = BytesMut::with_capacity(len * 2);
                    buf.extend_from_slice(&payload);
                    accumulated = Some(buf);
                }

                Some(buf) => {
                    buf.extend_from_slice(&payload);

                    if len < MAX_PAYLOAD {
                        return Ok(accumulated.take().unwrap().freeze());
                    }
                }
            }
        }
    }

    /// Reads a packet that must be OK (or ERR, which is raised).
    pub(crate) async fn recv_ok(&mut self) -> Result<OkPacket, Error> {
        let payload = self.recv_packet().await?;

        match payload.first() {
            Some(0xff) => Err(Error::Server(
                ErrPacket::get(payload)?.into_server_error(),
            )),

            _ => OkPacket::get(payload),
        }
    }
}

impl Deref for MySqlStream {
    type Target = BufStream<crate::net::MaybeTlsStream<TcpStream>>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for MySqlStream {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}
