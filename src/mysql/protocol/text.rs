use crate::io::Encode;

/// `COM_QUERY`: run SQL in the text protocol.
pub(crate) struct ComQuery<'a>(pub(crate) &'a str);

impl Encode for ComQuery<'_> {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.push(0x03);
        buf.extend_from_slice(self.0.as_bytes());
    }
}

/// `COM_PING`: liveness check; the server answers with OK.
pub(crate) struct ComPing;

impl Encode for ComPing {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.push(0x0e);
    }
}

/// `COM_QUIT`: orderly shutdown; the server closes the connection.
pub(crate) struct ComQuit;

impl Encode for ComQuit {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.push(0x01);
    }
}
