use crate::io::{BufMutExt, Encode};

/// The first client message of a SASL exchange: mechanism name plus the
/// `client-first-message`.
pub(crate) struct SaslInitialResponse<'a> {
    pub(crate) mechanism: &'a str,
    pub(crate) data: &'a str,
}

impl Encode for SaslInitialResponse<'_> {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.push(b'p');
        let start = buf.len();
        buf.extend_from_slice(&[0; 4]);

        buf.put_str_nul(self.mechanism);
        buf.extend_from_slice(&(self.data.len() as u32).to_be_bytes());
        buf.extend_from_slice(self.data.as_bytes());

        let len = (buf.len() - start) as u32;
        buf[start..start + 4].copy_from_slice(&len.to_be_bytes());
    }
}

/// A continuation message of an in-progress SASL exchange.
pub(crate) struct SaslResponse<'a>(pub(crate) &'a str);

impl Encode for SaslResponse<'_> {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.push(b'p');
        buf.extend_from_slice(&((4 + self.0.len()) as u32).to_be_bytes());
        buf.extend_from_slice(self.0.as_bytes());
    }
}

#[test]
fn it_encodes_sasl_initial_response() {
    let mut buf = Vec::new();
    SaslInitialResponse {
        mechanism: "SCRAM-SHA-256",
        data: "n,,n=,r=abc",
    }
    .encode(&mut buf);

    assert_eq!(buf[0], b'p');
    assert_eq!(&buf[1..5], &((buf.len() - 1) as u32).to_be_bytes());
    assert!(buf[5..].starts_with(b"SCRAM-SHA-256\0"));
    assert_eq!(&buf[19..23], &11_u32.to_be_bytes());
    assert!(buf.ends_with(b"n,,n=,r=abc"));
}
