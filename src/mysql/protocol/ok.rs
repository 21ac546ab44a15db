use bytes::{Buf, Bytes};

use crate::error::Error;
use crate::mysql::io::MySqlBufExt;
use crate::mysql::protocol::Status;

/// OK packet: tag `0x00`, or `0xFE` with a body of at least 7 bytes when
/// `DEPRECATE_EOF` was negotiated (where it also terminates result sets).
///
/// <https://dev.mysql.com/doc/dev/mysql-server/8.0.12/page_protocol_basic_ok_packet.html>
#[allow(dead_code)]
#[derive(Debug)]
pub(crate) struct OkPacket {
    pub(crate) affected_rows: u64,
    pub(crate) last_insert_id: u64,
    pub(crate) status: Status,
    pub(crate) warnings: u16,
}

impl OkPacket {
    pub(crate) fn get(mut buf: Bytes) -> Result<Self, Error> {
        let header = buf.get_u8();
        if header != 0 && header != 0xfe {
            return Err(err_protocol!(
                "expected 0x00 or 0xFE for an OK packet; received 0x{:02x}",
                header
            ));
        }

        let affected_rows = buf.get_uint_lenenc()?.unwrap_or(0);
        let last_insert_id = buf.get_uint_lenenc()?.unwrap_or(0);
        let status = Status::from_bits_truncate(buf.get_u16_le());
        let warnings = buf.get_u16_le();

        Ok(Self {
            affected_rows,
            last_insert_id,
            status,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OK_HANDSHAKE: &[u8] = b"\x00\x00\x00\x02@\x00\x00";

    #[test]
    fn it_decodes_ok_handshake() {
        let p = OkPacket::get(Bytes::from_static(OK_HANDSHAKE)).unwrap();

        assert_eq!(p.affected_rows, 0);
        assert_eq!(p.last_insert_id, 0);
        assert_eq!(p.warnings, 0);
        assert!(p.status.contains(Status::SERVER_STATUS_AUTOCOMMIT));
        assert!(p.status.contains(Status::SERVER_SESSION_STATE_CHANGED));
    }
}
