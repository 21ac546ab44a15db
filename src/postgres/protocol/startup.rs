use crate::io::{BufMutExt, Encode};

// protocol version 3.0: (3 << 16) | 0
const PROTOCOL_VERSION: u32 = 196608;

/// The first message sent after the (optional) SSL negotiation. Startup
/// messages carry no tag byte.
pub(crate) struct Startup<'a> {
    pub(crate) username: &'a str,
    pub(crate) database: Option<&'a str>,
    pub(crate) params: &'a [(&'a str, &'a str)],
}

impl Encode for Startup<'_> {
    fn encode(&self, buf: &mut Vec<u8>) {
        let start = buf.len();
        buf.extend_from_slice(&[0; 4]);

        buf.extend_from_slice(&PROTOCOL_VERSION.to_be_bytes());

        buf.put_str_nul("user");
        buf.put_str_nul(self.username);

        if let Some(database) = self.database {
            buf.put_str_nul("database");
            buf.put_str_nul(database);
        }

        for (name, value) in self.params {
            buf.put_str_nul(name);
            buf.put_str_nul(value);
        }

        // terminator for the parameter list
        buf.push(0);

        let len = (buf.len() - start) as u32;
        buf[start..start + 4].copy_from_slice(&len.to_be_bytes());
    }
}

#[test]
fn it_encodes_startup() {
    let mut buf = Vec::new();
    Startup {
        username: "postgres",
        database: Some("app"),
        params: &[("application_name", "unisql")],
    }
    .encode(&mut buf);

    assert_eq!(&buf[..4], &(buf.len() as u32).to_be_bytes());
    assert_eq!(&buf[4..8], &196608_u32.to_be_bytes());
    assert!(buf.ends_with(b"unisql\0\0"));
}
