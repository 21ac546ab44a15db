use md5::{Digest, Md5};

use crate::io::{BufMutExt, Encode};

/// A `PasswordMessage` answering a cleartext or MD5 authentication request.
pub(crate) enum Password<'a> {
    Cleartext(&'a str),

    Md5 {
        password: &'a str,
        username: &'a str,
        salt: [u8; 4],
    },
}

impl Encode for Password<'_> {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.push(b'p');
        let start = buf.len();
        buf.extend_from_slice(&[0; 4]);

        match self {
            Password::Cleartext(password) => {
                buf.put_str_nul(password);
            }

            Password::Md5 {
                password,
                username,
                salt,
            } => {
                // concat('md5', md5(concat(md5(concat(password, username)), random-salt)))
                let mut hasher = Md5::new();
                hasher.update(password);
                hasher.update(username);
                let inner = hex::encode(hasher.finalize());

                let mut hasher = Md5::new();
                hasher.update(inner);
                hasher.update(salt);

                buf.extend_from_slice(b"md5");
                buf.extend_from_slice(hex::encode(hasher.finalize()).as_bytes());
                buf.push(0);
            }
        }

        let len = (buf.len() - start) as u32;
        buf[start..start + 4].copy_from_slice(&len.to_be_bytes());
    }
}

#[test]
fn it_encodes_md5_password() {
    let mut buf = Vec::new();
    Password::Md5 {
        password: "password",
        username: "postgres",
        salt: [147, 24, 57, 152],
    }
    .encode(&mut buf);

    assert_eq!(buf[0], b'p');
    assert_eq!(&buf[1..5], &((buf.len() - 1) as u32).to_be_bytes());

    // "md5" + 32 hex digits + NUL
    let body = &buf[5..];
    assert_eq!(body.len(), 36);
    assert!(body.starts_with(b"md5"));
    assert_eq!(body[35], 0);
    assert!(body[3..35].iter().all(u8::is_ascii_hexdigit));
}
