use bitflags::bitflags;
use bytes::{Buf, Bytes};

use crate::error::Error;
use crate::io::Encode;

/// Negotiated packet size; outgoing messages are split at this boundary.
pub(crate) const PACKET_SIZE: usize = 4096;

pub(crate) const HEADER_SIZE: usize = 8;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum PacketType {
    SqlBatch = 0x01,
    Rpc = 0x03,
    TabularResult = 0x04,
    Attention = 0x06,
    BulkLoad = 0x07,
    TransactionManagerRequest = 0x0e,
    Tds7Login = 0x10,
    Sspi = 0x11,
    PreLogin = 0x12,
}

impl PacketType {
    pub(crate) fn get(value: u8) -> Result<Self, Error> {
        Ok(match value {
            0x01 => PacketType::SqlBatch,
            0x03 => PacketType::Rpc,
            0x04 => PacketType::TabularResult,
            0x06 => PacketType::Attention,
            0x07 => PacketType::BulkLoad,
            0x0e => PacketType::TransactionManagerRequest,
            0x10 => PacketType::Tds7Login,
            0x11 => PacketType::Sspi,
            0x12 => PacketType::PreLogin,

            ty => {
                return Err(err_protocol!("unknown packet type 0x{:02x}", ty));
            }
        })
    }
}

bitflags! {
    pub(crate) struct Status: u8 {
        /// This packet is the last of the message.
        const END_OF_MESSAGE = 0x01;

        const IGNORE_EVENT = 0x02;
        const RESET_CONNECTION = 0x08;
        const RESET_CONNECTION_SKIP_TRAN = 0x10;
    }
}

/// The 8-byte header framing every TDS packet. Only the length field is
/// big-endian.
#[derive(Debug)]
pub(crate) struct PacketHeader {
    pub(crate) r#type: PacketType,
    pub(crate) status: Status,
    pub(crate) length: u16,
    pub(crate) server_process_id: u16,
    pub(crate) packet_id: u8,
}

impl PacketHeader {
    pub(crate) fn get(mut buf: Bytes) -> Result<Self, Error> {
        let r#type = PacketType::get(buf.get_u8())?;
        let status = Status::from_bits_truncate(buf.get_u8());
        let length = buf.get_u16();

        if (length as usize) <= HEADER_SIZE {
            return Err(err_protocol!("packet length {} is too small", length));
        }

        Ok(Self {
            r#type,
            status,
            length,
            server_process_id: buf.get_u16(),
            packet_id: buf.get_u8(),
        })
    }
}

impl Encode for PacketHeader {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.push(self.r#type as u8);
        buf.push(self.status.bits());
        buf.extend_from_slice(&self.length.to_be_bytes());
        buf.extend_from_slice(&self.server_process_id.to_be_bytes());
        buf.push(self.packet_id);

        // window, unused
        buf.push(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips() {
        let mut buf = Vec::new();
        PacketHeader {
            r#type: PacketType::SqlBatch,
            status: Status::END_OF_MESSAGE,
            length: 0x1020,
            server_process_id: 0,
            packet_id: 3,
        }
        .encode(&mut buf);

        assert_eq!(buf, [0x01, 0x01, 0x10, 0x20, 0, 0, 3, 0]);

        let header = PacketHeader::get(Bytes::from(buf)).unwrap();
        assert_eq!(header.r#type, PacketType::SqlBatch);
        assert_eq!(header.length, 0x1020);
        assert!(header.status.contains(Status::END_OF_MESSAGE));
    }

    #[test]
    fn undersized_length_is_rejected() {
        let buf = Bytes::from_static(&[0x04, 0x01, 0x00, 0x08, 0, 0, 1, 0]);

        assert!(PacketHeader::get(buf).is_err());
    }
}
