use crate::io::{BufMutExt, Encode};
use crate::mysql::io::MySqlBufMutExt;
use crate::mysql::protocol::Capabilities;

/// `HandshakeResponse41`, answering the server greeting.
///
/// <https://dev.mysql.com/doc/dev/mysql-server/8.0.12/page_protocol_connection_phase_packets_protocol_handshake_response.html>
pub(crate) struct HandshakeResponse<'a> {
    pub(crate) capabilities: Capabilities,
    pub(crate) max_packet_size: u32,
    pub(crate) collation: u8,
    pub(crate) username: &'a str,
    pub(crate) auth_response: &'a [u8],
    pub(crate) database: Option<&'a str>,
    pub(crate) auth_plugin_name: &'a str,
}

impl Encode for HandshakeResponse<'_> {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&(self.capabilities.bits() as u32).to_le_bytes());
        buf.extend_from_slice(&self.max_packet_size.to_le_bytes());
        buf.push(self.collation);

        // reserved : string<23>
        buf.extend_from_slice(&[0; 23]);

        buf.put_str_nul(self.username);

        buf.put_bytes_lenenc(self.auth_response);

        if self.capabilities.contains(Capabilities::CONNECT_WITH_DB) {
            buf.put_str_nul(self.database.unwrap_or_default());
        }

        if self.capabilities.contains(Capabilities::PLUGIN_AUTH) {
            buf.put_str_nul(self.auth_plugin_name);
        }

        if self.capabilities.contains(Capabilities::CONNECT_ATTRS) {
            // no connect attributes
            buf.put_uint_lenenc(0);
        }
    }
}

#[test]
fn it_encodes_handshake_response() {
    let mut buf = Vec::new();
    HandshakeResponse {
        capabilities: Capabilities::PROTOCOL_41
            | Capabilities::PLUGIN_AUTH
            | Capabilities::CONNECT_WITH_DB
            | Capabilities::CONNECT_ATTRS,
        max_packet_size: 16_777_216,
        collation: 0xff,
        username: "root",
        auth_response: &[0xAA; 20],
        database: Some("app"),
        auth_plugin_name: "mysql_native_password",
    }
    .encode(&mut buf);

    // caps(4) + max packet(4) + collation(1) + reserved(23)
    assert_eq!(&buf[32..37], b"root\0");
    assert_eq!(buf[37], 20);
    assert_eq!(&buf[58..62], b"app\0");
    assert!(buf[62..].starts_with(b"mysql_native_password\0"));
    assert_eq!(*buf.last().unwrap(), 0); // empty connect-attrs
}
