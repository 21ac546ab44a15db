use crate::io::Encode;

/// Asks the server whether it is willing to do TLS on this connection. The
/// answer is a single untagged byte: `'S'` or `'N'`.
pub(crate) struct SslRequest;

impl SslRequest {
    pub(crate) const CODE: u32 = 80877103;
}

impl Encode for SslRequest {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&8_u32.to_be_bytes());
        buf.extend_from_slice(&Self::CODE.to_be_bytes());
    }
}

#[test]
fn it_encodes_ssl_request() {
    let mut buf = Vec::new();
    SslRequest.encode(&mut buf);

    assert_eq!(buf, [0, 0, 0, 8, 0x04, 0xd2, 0x16, 0x2f]);
}
