use bytes::{Buf, Bytes};

use crate::error::Error;
use crate::io::BufExt;

/// Reads for MySQL's length-encoded wire primitives.
///
/// A length-encoded integer uses its first byte to select a width:
/// `0xFB` = NULL, `0xFC` = 2 bytes, `0xFD` = 3 bytes, `0xFE` = 8 bytes;
/// anything below `0xFB` is the value itself.
pub(crate) trait MySqlBufExt {
    fn get_uint_lenenc(&mut self) -> Result<Option<u64>, Error>;

    fn get_str_lenenc(&mut self) -> Result<Option<String>, Error>;

    fn get_bytes_lenenc(&mut self) -> Result<Option<Bytes>, Error>;
}

impl MySqlBufExt for Bytes {
    fn get_uint_lenenc(&mut self) -> Result<Option<u64>, Error> {
        if self.is_empty() {
            return Err(err_protocol!("unexpected end of packet"));
        }

        Ok(match self.get_u8() {
            0xfb => None,
            0xfc => Some(u64::from(self.get_u16_le())),
            0xfd => Some(self.get_uint_le(3)),
            0xfe => Some(self.get_u64_le()),

            value => Some(u64::from(value)),
        })
    }

    fn get_str_lenenc(&mut self) -> Result<Option<String>, Error> {
        match self.get_uint_lenenc()? {
            Some(len) => Ok(Some(self.get_str(len as usize)?)),
            None => Ok(None),
        }
    }

    fn get_bytes_lenenc(&mut self) -> Result<Option<Bytes>, Error> {
        match self.get_uint_lenenc()? {
            Some(len) => Ok(Some(self.get_bytes(len as usize)?)),
            None => Ok(None),
        }
    }
}

/// Writes for the same primitives.
pub(crate) trait MySqlBufMutExt {
    fn put_uint_lenenc(&mut self, v: u64);

    fn put_bytes_lenenc(&mut self, v: &[u8]);
}

impl MySqlBufMutExt for Vec<u8> {
    fn put_uint_lenenc(&mut self, v: u64) {
        if v < 0xfb {
            self.push(v as u8);
        } else if v <= u16::MAX as u64 {
            self.push(0xfc);
            self.extend_from_slice(&(v as u16).to_le_bytes());
        } else if v <= 0xff_ff_ff {
            self.push(0xfd);
            self.extend_from_slice(&(v as u32).to_le_bytes()[..3]);
        } else {
            self.push(0xfe);
            self.extend_from_slice(&v.to_le_bytes());
        }
    }

    fn put_bytes_lenenc(&mut self, v: &[u8]) {
        self.put_uint_lenenc(v.len() as u64);
        self.extend_from_slice(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_reads_lenenc_ints() {
        let mut buf = Bytes::from_static(&[0x0a, 0xfb, 0xfc, 0x34, 0x12, 0xfd, 1, 0, 1]);

        assert_eq!(buf.get_uint_lenenc().unwrap(), Some(10));
        assert_eq!(buf.get_uint_lenenc().unwrap(), None);
        assert_eq!(buf.get_uint_lenenc().unwrap(), Some(0x1234));
        assert_eq!(buf.get_uint_lenenc().unwrap(), Some(0x10001));
    }

    #[test]
    fn lenenc_round_trips() {
        for v in [0_u64, 0xfa, 0xfb, 0xffff, 0x10000, 0xff_ff_ff, 0x1_00_00_00, u64::MAX] {
            let mut buf = Vec::new();
            buf.put_uint_lenenc(v);

            let mut bytes = Bytes::from(buf);
            assert_eq!(bytes.get_uint_lenenc().unwrap(), Some(v));
        }
    }
}
