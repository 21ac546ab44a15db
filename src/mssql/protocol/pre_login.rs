use bytes::{Buf, Bytes};

use crate::error::Error;
use crate::io::Encode;

/// The encryption stance exchanged during PRELOGIN.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum Encrypt {
    /// Encryption only for the login sequence.
    Off = 0x00,

    /// Encryption for the whole session.
    On = 0x01,

    /// This party cannot do TLS at all.
    NotSupported = 0x02,

    /// This party refuses to proceed without TLS.
    Required = 0x03,
}

impl Encrypt {
    fn get(value: u8) -> Result<Self, Error> {
        Ok(match value {
            0x00 => Encrypt::Off,
            0x01 => Encrypt::On,
            0x02 => Encrypt::NotSupported,
            0x03 => Encrypt::Required,

            v => {
                return Err(err_protocol!("unknown PRELOGIN encryption value {}", v));
            }
        })
    }
}

#[derive(Debug, Copy, Clone, Default)]
pub(crate) struct Version {
    pub(crate) major: u8,
    pub(crate) minor: u8,
    pub(crate) build: u16,
    pub(crate) sub_build: u16,
}

// option tokens of the PRELOGIN option table
const TOKEN_VERSION: u8 = 0x00;
const TOKEN_ENCRYPTION: u8 = 0x01;
const TOKEN_INSTOPT: u8 = 0x02;
const TOKEN_THREAD_ID: u8 = 0x03;
const TOKEN_MARS: u8 = 0x04;
const TOKEN_TERMINATOR: u8 = 0xff;

/// The PRELOGIN message: a table of (token, offset, length) entries
/// followed by the option payloads.
///
/// <https://docs.microsoft.com/en-us/openspecs/windows_protocols/ms-tds/60f56408-0188-4cd5-8b90-25c6f2423868>
#[derive(Debug)]
pub(crate) struct PreLogin {
    pub(crate) version: Version,
    pub(crate) encryption: Encrypt,
}

impl PreLogin {
    pub(crate) fn decode(mut buf: Bytes) -> Result<Self, Error> {
        let full = buf.clone();

        let mut version = None;
        let mut encryption = None;

        loop {
            let token = buf.get_u8();
            if token == TOKEN_TERMINATOR {
                break;
            }

            let offset = buf.get_u16() as usize;
            let len = buf.get_u16() as usize;

            if offset + len > full.len() {
                return Err(err_protocol!("PRELOGIN option slice is out of bounds"));
            }

            let mut data = full.slice(offset..offset + len);

            match token {
                TOKEN_VERSION if len >= 6 => {
                    version = Some(Version {
                        major: data.get_u8(),
                        minor: data.get_u8(),
                        build: data.get_u16(),
                        sub_build: data.get_u16(),
                    });
                }

                TOKEN_ENCRYPTION if len >= 1 => {
                    encryption = Some(Encrypt::get(data.get_u8())?);
                }

                // INSTOPT, THREADID, MARS, ... carry nothing we act on
                _ => {}
            }
        }

        match (version, encryption) {
            (Some(version), Some(encryption)) => Ok(Self {
                version,
                encryption,
            }),

            _ => Err(err_protocol!(
                "PRELOGIN response is missing VERSION or ENCRYPTION"
            )),
        }
    }
}

impl Encode for PreLogin {
    fn encode(&self, buf: &mut Vec<u8>) {
        // five entries plus the terminator
        let table_len = 5 * 5 + 1;
        let mut offset = table_len as u16;

        let mut put_entry = |buf: &mut Vec<u8>, token: u8, len: u16| {
            buf.push(token);
            buf.extend_from_slice(&offset.to_be_bytes());
            buf.extend_from_slice(&len.to_be_bytes());
            offset += len;
        };

        put_entry(buf, TOKEN_VERSION, 6);
        put_entry(buf, TOKEN_ENCRYPTION, 1);
        put_entry(buf, TOKEN_INSTOPT, 1);
        put_entry(buf, TOKEN_THREAD_ID, 4);
        put_entry(buf, TOKEN_MARS, 1);

        buf.push(TOKEN_TERMINATOR);

        // VERSION
        buf.push(self.version.major);
        buf.push(self.version.minor);
        buf.extend_from_slice(&self.version.build.to_be_bytes());
        buf.extend_from_slice(&self.version.sub_build.to_be_bytes());

        // ENCRYPTION
        buf.push(self.encryption as u8);

        // INSTOPT (default instance)
        buf.push(0);

        // THREADID
        buf.extend_from_slice(&[0; 4]);

        // MARS off
        buf.push(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_decode() {
        let mut buf = Vec::new();
        PreLogin {
            version: Version {
                major: 9,
                minor: 0,
                build: 0,
                sub_build: 0,
            },
            encryption: Encrypt::On,
        }
        .encode(&mut buf);

        let decoded = PreLogin::decode(Bytes::from(buf)).unwrap();

        assert_eq!(decoded.version.major, 9);
        assert_eq!(decoded.encryption, Encrypt::On);
    }

    #[test]
    fn it_decodes_a_server_response() {
        // VERSION 15.0.4223, ENCRYPTION = NOT_SUPPORTED
        #[rustfmt::skip]
        let buf = Bytes::from_static(&[
            0x00, 0x00, 0x0b, 0x00, 0x06,
            0x01, 0x00, 0x11, 0x00, 0x01,
            0xff,
            0x0f, 0x00, 0x10, 0x7f, 0x00, 0x00,
            0x02,
        ]);

        let decoded = PreLogin::decode(buf).unwrap();

        assert_eq!(decoded.version.major, 15);
        assert_eq!(decoded.version.build, 0x107f);
        assert_eq!(decoded.encryption, Encrypt::NotSupported);
    }
}
