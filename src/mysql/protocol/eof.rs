use bytes::{Buf, Bytes};

use crate::error::Error;
use crate::mysql::protocol::Status;

/// EOF packet: tag `0xFE` with a body shorter than 9 bytes. Retired by
/// `DEPRECATE_EOF` in favor of terminating OK packets.
///
/// <https://dev.mysql.com/doc/dev/mysql-server/8.0.12/page_protocol_basic_eof_packet.html>
#[allow(dead_code)]
#[derive(Debug)]
pub(crate) struct EofPacket {
    pub(crate) warnings: u16,
    pub(crate) status: Status,
}

impl EofPacket {
    pub(crate) fn get(mut buf: Bytes) -> Result<Self, Error> {
        let header = buf.get_u8();
        if header != 0xfe {
            return Err(err_protocol!(
                "expected 0xFE for an EOF packet; received 0x{:02x}",
                header
            ));
        }

        Ok(Self {
            warnings: buf.get_u16_le(),
            status: Status::from_bits_truncate(buf.get_u16_le()),
        })
    }
}
