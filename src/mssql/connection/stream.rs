use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tokio::net::TcpStream;

use crate::column::Column;
use crate::error::Error;
use crate::io::{BufStream, Encode};
use crate::mssql::connection::tls_prelogin::TlsPreloginWrapper;
use crate::mssql::protocol::col_meta_data::{ColMetaData, ColumnData};
use crate::mssql::protocol::done::Done;
use crate::mssql::protocol::env_change::EnvChange;
use crate::mssql::protocol::error::Error as ErrorToken;
use crate::mssql::protocol::feature_ext_ack::FeatureExtAck;
use crate::mssql::protocol::info::Info;
use crate::mssql::protocol::login_ack::LoginAck;
use crate::mssql::protocol::message::MessageType;
use crate::mssql::protocol::order::Order;
use crate::mssql::protocol::packet::{PacketHeader, PacketType, Status, HEADER_SIZE, PACKET_SIZE};
use crate::mssql::protocol::return_status::ReturnStatus;
use crate::mssql::protocol::return_value::ReturnValue;
use crate::mssql::protocol::row::Row as ProtocolRow;
use crate::mssql::protocol::{col_info::ColInfo, tab_name::TabName};
use crate::mssql::MssqlConnectOptions;
use crate::net::MaybeTlsStream;
use crate::row::Row;

/// One decoded token from the response stream.
#[derive(Debug)]
pub(crate) enum Message {
    Info(Info),
    Error(ErrorToken),
    LoginAck(LoginAck),
    EnvChange(EnvChange),
    Done(Done),
    DoneInProc(Done),
    DoneProc(Done),
    Row(Row),
    ReturnStatus(i32),
    ReturnValue(String, crate::value::Value),
    /// A new column set begins; accumulated rows belong to the previous
    /// result set.
    ColMetaData,
    Sspi(Bytes),
}

pub(crate) struct MssqlStream {
    inner: BufStream<MaybeTlsStream<TlsPreloginWrapper<TcpStream>>>,

    // the current logical message from the server, tokens not yet consumed
    response: Bytes,

    // most recent column metadata, needed to decode <Row>
    pub(crate) column_data: Vec<ColumnData>,
    pub(crate) columns: Arc<Vec<Column>>,

    // associates requests with the explicit transaction; fed by ENVCHANGE
    pub(crate) transaction_descriptor: u64,

    packet_id: u8,
}

impl MssqlStream {
    pub(super) async fn connect(options: &MssqlConnectOptions) -> Result<Self, Error> {
        let socket = TcpStream::connect((&*options.host, options.port)).await?;

        Ok(Self {
            inner: BufStream::new(MaybeTlsStream::Raw(TlsPreloginWrapper::new(socket))),
            response: Bytes::new(),
            column_data: Vec::new(),
            columns: Arc::new(Vec::new()),
            transaction_descriptor: 0,
            packet_id: 1,
        })
    }

    /// Frames and buffers one request message, splitting it into packets of
    /// at most [`PACKET_SIZE`] bytes. The EOM status bit marks the last.
    pub(crate) fn write_message<T: Encode>(&mut self, ty: PacketType, payload: T) {
        let mut encoded = Vec::with_capacity(512);
        payload.encode(&mut encoded);

        let mut chunks = encoded.chunks(PACKET_SIZE - HEADER_SIZE).peekable();

        loop {
            let chunk = chunks.next().unwrap_or(&[]);
            let last = chunks.peek().is_none();

            self.inner.write(PacketHeader {
                r#type: ty,
                status: if last {
                    Status::END_OF_MESSAGE
                } else {
                    Status::empty()
                },
                length: (chunk.len() + HEADER_SIZE) as u16,
                server_process_id: 0,
                packet_id: self.packet_id,
            });

            self.inner.write(chunk);

            // the packet id wraps 1 -> 255 -> 1
            self.packet_id = if self.packet_id == 255 {
                1
            } else {
                self.packet_id + 1
            };

            if last {
                break;
            }
        }
    }

    pub(crate) async fn send_message<T: Encode>(
        &mut self,
        ty: PacketType,
        payload: T,
    ) -> Result<(), Error> {
        self.write_message(ty, payload);
        self.flush().await
    }

    /// Receives one complete logical message: the concatenated payloads of
    /// packets up to (and including) the one flagged EOM.
    pub(crate) async fn recv_logical_message(&mut self) -> Result<Bytes, Error> {
        let mut payload = BytesMut::new();

        loop {
            let header = PacketHeader::get(self.inner.read(HEADER_SIZE).await?)?;
            let chunk = self
                .inner
                .read(header.length as usize - HEADER_SIZE)
                .await?;

            payload.extend_from_slice(&chunk);

            if header.status.contains(Status::END_OF_MESSAGE) {
                return Ok(payload.freeze());
            }
        }
    }

    /// Yields the next token of the response, pulling the next logical
    /// message off the wire when the current one is exhausted.
    pub(crate) async fn recv_message(&mut self) -> Result<Message, Error> {
        loop {
            while !self.response.is_empty() {
                let buf = &mut self.response;
                let ty = MessageType::get(buf)?;

                let message = match ty {
                    MessageType::EnvChange => {
                        let env_change = EnvChange::get(buf)?;

                        match env_change {
                            EnvChange::BeginTransaction(descriptor) => {
                                self.transaction_descriptor = descriptor;
                            }

                            EnvChange::CommitTransaction | EnvChange::RollbackTransaction => {
                                self.transaction_descriptor = 0;
                            }

                            _ => {}
                        }

                        Message::EnvChange(env_change)
                    }

                    MessageType::Info => Message::Info(Info::get(buf)?),
                    MessageType::Error => Message::Error(ErrorToken::get(buf)?),
                    MessageType::LoginAck => Message::LoginAck(LoginAck::get(buf)?),

                    MessageType::ReturnStatus => {
                        Message::ReturnStatus(ReturnStatus::get(buf)?.value)
                    }

                    MessageType::ReturnValue => {
                        let rv = ReturnValue::get(buf)?;
                        Message::ReturnValue(rv.param_name, rv.value)
                    }

                    MessageType::Done => Message::Done(Done::get(buf)?),
                    MessageType::DoneInProc => Message::DoneInProc(Done::get(buf)?),
                    MessageType::DoneProc => Message::DoneProc(Done::get(buf)?),

                    MessageType::Row => {
                        let row = ProtocolRow::get(buf, false, &self.column_data)?;
                        Message::Row(Row::new(Arc::clone(&self.columns), row.values))
                    }

                    MessageType::NbcRow => {
                        let row = ProtocolRow::get(buf, true, &self.column_data)?;
                        Message::Row(Row::new(Arc::clone(&self.columns), row.values))
                    }

                    MessageType::ColMetaData => {
                        ColMetaData::get(buf, &mut self.column_data)?;

                        self.columns = Arc::new(
                            self.column_data
                                .iter()
                                .map(ColumnData::to_column)
                                .collect::<Vec<_>>(),
                        );

                        Message::ColMetaData
                    }

                    MessageType::Sspi => {
                        let len = bytes::Buf::get_u16_le(buf);
                        Message::Sspi(buf.split_to(len as usize))
                    }

                    // decoded to keep the stream in sync; nothing to act on
                    MessageType::Order => {
                        Order::get(buf)?;
                        continue;
                    }

                    MessageType::FeatureExtAck => {
                        FeatureExtAck::get(buf)?;
                        continue;
                    }

                    MessageType::ColInfo => {
                        ColInfo::get(buf)?;
                        continue;
                    }

                    MessageType::TabName => {
                        TabName::get(buf)?;
                        continue;
                    }
                };

                return Ok(message);
            }

            self.response = self.recv_logical_message().await?;
        }
    }
}

impl Deref for MssqlStream {
    type Target = BufStream<MaybeTlsStream<TlsPreloginWrapper<TcpStream>>>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for MssqlStream {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}
