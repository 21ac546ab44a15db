use bytes::{Buf, Bytes};
use memchr::memchr;

use crate::error::Error;

/// Reads shared by all three wire protocols, layered on [`bytes::Buf`].
pub trait BufExt {
    /// A length-checked version of `Bytes::split_to`.
    fn get_bytes(&mut self, n: usize) -> Result<Bytes, Error>;

    /// `n` bytes of UTF-8.
    fn get_str(&mut self, n: usize) -> Result<String, Error>;

    /// A nul-terminated UTF-8 string; consumes the terminator.
    fn get_str_nul(&mut self) -> Result<String, Error>;

    /// `n` UTF-16LE code units decoded into a `String`.
    fn get_utf16_str(&mut self, n: usize) -> Result<String, Error>;
}

impl BufExt for Bytes {
    fn get_bytes(&mut self, n: usize) -> Result<Bytes, Error> {
        if self.len() < n {
            return Err(err_protocol!(
                "unexpected end of frame: wanted {} bytes, have {}",
                n,
                self.len()
            ));
        }

        Ok(self.split_to(n))
    }

    fn get_str(&mut self, n: usize) -> Result<String, Error> {
        let bytes = self.get_bytes(n)?;

        String::from_utf8(bytes.to_vec()).map_err(|_| err_protocol!("string is not valid UTF-8"))
    }

    fn get_str_nul(&mut self) -> Result<String, Error> {
        let nul = memchr(b'\0', self).ok_or_else(|| err_protocol!("expected NUL in byte stream"))?;

        let s = self.get_str(nul)?;
        self.advance(1);

        Ok(s)
    }

    fn get_utf16_str(&mut self, n: usize) -> Result<String, Error> {
        let raw = self.get_bytes(n * 2)?;
        let units: Vec<u16> = raw
            .chunks_exact(2)
            .map(|ch| u16::from_le_bytes([ch[0], ch[1]]))
            .collect();

        String::from_utf16(&units).map_err(|_| err_protocol!("string is not valid UTF-16"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_reads_nul_terminated_strings() {
        let mut buf = Bytes::from_static(b"hello\0tail");

        assert_eq!(buf.get_str_nul().unwrap(), "hello");
        assert_eq!(&buf[..], b"tail");
    }

    #[test]
    fn it_reads_utf16() {
        let mut buf = Bytes::from_static(b"S\0Q\0L\0");

        assert_eq!(buf.get_utf16_str(3).unwrap(), "SQL");
    }

    #[test]
    fn short_reads_are_protocol_errors() {
        let mut buf = Bytes::from_static(b"ab");

        assert!(matches!(buf.get_bytes(3), Err(Error::Protocol(_))));
    }
}
