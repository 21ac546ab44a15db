use crate::io::{BufMutExt, Encode};

/// A simple-protocol query: the SQL runs to completion and the response is
/// terminated by `ReadyForQuery`.
pub(crate) struct Query<'a>(pub(crate) &'a str);

impl Encode for Query<'_> {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.push(b'Q');
        buf.extend_from_slice(&((4 + self.0.len() + 1) as u32).to_be_bytes());
        buf.put_str_nul(self.0);
    }
}

#[test]
fn it_encodes_query() {
    let mut buf = Vec::new();
    Query("SELECT 1").encode(&mut buf);

    assert_eq!(buf, b"Q\0\0\0\x0dSELECT 1\0");
}
