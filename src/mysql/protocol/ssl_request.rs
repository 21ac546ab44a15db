use crate::io::Encode;
use crate::mysql::protocol::Capabilities;

// sent in place of the handshake response; the TLS handshake follows
// immediately and the real response travels encrypted
pub(crate) struct SslRequest {
    pub(crate) capabilities: Capabilities,
    pub(crate) max_packet_size: u32,
    pub(crate) collation: u8,
}

impl Encode for SslRequest {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&(self.capabilities.bits() as u32).to_le_bytes());
        buf.extend_from_slice(&self.max_packet_size.to_le_bytes());
        buf.push(self.collation);

        // reserved : string<23>
        buf.extend_from_slice(&[0; 23]);
    }
}

#[test]
fn it_is_32_bytes() {
    let mut buf = Vec::new();
    SslRequest {
        capabilities: Capabilities::PROTOCOL_41 | Capabilities::SSL,
        max_packet_size: 16_777_216,
        collation: 0xff,
    }
    .encode(&mut buf);

    assert_eq!(buf.len(), 32);
    assert_ne!(buf[1] & 0x02, 0); // PROTOCOL_41 (0x0200)
    assert_ne!(buf[1] & 0x08, 0); // SSL (0x0800)
}
