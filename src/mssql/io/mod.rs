use bytes::{Buf, Bytes};

use crate::error::Error;
use crate::io::{BufExt, BufMutExt};

/// Reads for the TDS string/byte encodings: `B_VARCHAR`/`US_VARCHAR` are
/// UTF-16LE strings with a 1-byte / 2-byte *character*-count prefix;
/// `B_VARBYTE` is bytes with a 1-byte length prefix.
pub(crate) trait MssqlBufExt {
    fn get_b_varchar(&mut self) -> Result<String, Error>;

    fn get_us_varchar(&mut self) -> Result<String, Error>;

    fn get_b_varbyte(&mut self) -> Result<Bytes, Error>;
}

impl MssqlBufExt for Bytes {
    fn get_b_varchar(&mut self) -> Result<String, Error> {
        let len = self.get_u8();
        self.get_utf16_str(len as usize)
    }

    fn get_us_varchar(&mut self) -> Result<String, Error> {
        let len = self.get_u16_le();
        self.get_utf16_str(len as usize)
    }

    fn get_b_varbyte(&mut self) -> Result<Bytes, Error> {
        let len = self.get_u8();
        self.get_bytes(len as usize)
    }
}

pub(crate) trait MssqlBufMutExt {
    fn put_b_varchar(&mut self, s: &str);

    fn put_us_varchar(&mut self, s: &str);
}

impl MssqlBufMutExt for Vec<u8> {
    fn put_b_varchar(&mut self, s: &str) {
        self.push(s.encode_utf16().count() as u8);
        self.put_utf16_str(s);
    }

    fn put_us_varchar(&mut self, s: &str) {
        self.extend_from_slice(&(s.encode_utf16().count() as u16).to_le_bytes());
        self.put_utf16_str(s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn b_varchar_round_trips() {
        let mut buf = Vec::new();
        buf.put_b_varchar("master");

        let mut bytes = Bytes::from(buf);
        assert_eq!(bytes.get_b_varchar().unwrap(), "master");
        assert!(bytes.is_empty());
    }

    #[test]
    fn us_varchar_counts_characters_not_bytes() {
        let mut buf = Vec::new();
        buf.put_us_varchar("日本語");

        assert_eq!(buf[0], 3);
        assert_eq!(buf.len(), 2 + 6);
    }
}
