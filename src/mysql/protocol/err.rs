use bytes::{Buf, Bytes};

use crate::error::{Error, ServerError};
use crate::io::BufExt;

/// ERR packet: tag `0xFF`, error code, optional `#`-marked SQL-state, and
/// the message as the rest of the packet.
///
/// <https://dev.mysql.com/doc/dev/mysql-server/8.0.12/page_protocol_basic_err_packet.html>
#[derive(Debug)]
pub(crate) struct ErrPacket {
    pub(crate) error_code: u16,
    pub(crate) sql_state: Option<String>,
    pub(crate) error_message: String,
}

impl ErrPacket {
    pub(crate) fn get(mut buf: Bytes) -> Result<Self, Error> {
        let header = buf.get_u8();
        if header != 0xff {
            return Err(err_protocol!(
                "expected 0xFF for an ERR packet; received 0x{:02x}",
                header
            ));
        }

        let error_code = buf.get_u16_le();

        // before the handshake completes, ERR packets carry no SQL-state
        let sql_state = if buf.first() == Some(&b'#') {
            buf.advance(1);
            Some(buf.get_str(5)?)
        } else {
            None
        };

        let error_message = buf.get_str(buf.len())?;

        Ok(Self {
            error_code,
            sql_state,
            error_message,
        })
    }

    pub(crate) fn into_server_error(self) -> ServerError {
        ServerError {
            code: self.error_code.into(),
            message: self.error_message,
            state: self.sql_state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ERR_HANDSHAKE_UNKNOWN_DB: &[u8] = b"\xff\x19\x04#42000Unknown database 'unknown'";

    #[test]
    fn it_decodes_err_packet() {
        let p = ErrPacket::get(Bytes::from_static(ERR_HANDSHAKE_UNKNOWN_DB)).unwrap();

        assert_eq!(p.error_code, 1049);
        assert_eq!(p.sql_state.as_deref(), Some("42000"));
        assert_eq!(p.error_message, "Unknown database 'unknown'");
    }
}
