/// Serialization of an outgoing protocol message into the write buffer.
pub trait Encode {
    fn encode(&self, buf: &mut Vec<u8>);
}

impl Encode for &'_ [u8] {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self);
    }
}
