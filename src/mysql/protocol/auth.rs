use std::str::FromStr;

use bytes::Bytes;
use memchr::memchr;
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::error::Error;
use crate::io::BufExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AuthPlugin {
    MySqlNativePassword,
    CachingSha2Password,
}

impl AuthPlugin {
    pub(crate) fn name(self) -> &'static str {
        match self {
            AuthPlugin::MySqlNativePassword => "mysql_native_password",
            AuthPlugin::CachingSha2Password => "caching_sha2_password",
        }
    }

    /// The scrambled password sent in the handshake response (or after an
    /// auth-switch). Empty passwords scramble to an empty response.
    pub(crate) fn scramble(self, password: &str, nonce: &[u8]) -> Vec<u8> {
        if password.is_empty() {
            return Vec::new();
        }

        match self {
            AuthPlugin::MySqlNativePassword => {
                // the nonce is (optionally) NUL-terminated
                let end = memchr(b'\0', nonce).unwrap_or(nonce.len());

                scramble_sha1(password, &nonce[..end]).to_vec()
            }

            AuthPlugin::CachingSha2Password => {
                let end = memchr(b'\0', nonce).unwrap_or(nonce.len());

                scramble_sha256(password, &nonce[..end]).to_vec()
            }
        }
    }
}

impl FromStr for AuthPlugin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mysql_native_password" | "" => Ok(AuthPlugin::MySqlNativePassword),
            "caching_sha2_password" => Ok(AuthPlugin::CachingSha2Password),

            _ => Err(Error::AuthenticationFailed(format!(
                "server requires unsupported authentication plugin: {}",
                s
            ))),
        }
    }
}

// SHA1(password) ^ SHA1(nonce + SHA1(SHA1(password)))
// https://mariadb.com/kb/en/connection/#mysql_native_password-plugin
fn scramble_sha1(password: &str, nonce: &[u8]) -> [u8; 20] {
    let mut pw_hash: [u8; 20] = Sha1::digest(password.as_bytes()).into();
    let pw_hash_hash = Sha1::digest(pw_hash);

    let mut ctx = Sha1::new();
    ctx.update(nonce);
    ctx.update(pw_hash_hash);

    xor_eq(&mut pw_hash, &ctx.finalize());
    pw_hash
}

// SHA256(password) ^ SHA256(SHA256(SHA256(password)) + nonce)
// https://dev.mysql.com/doc/dev/mysql-server/8.0.12/page_caching_sha2_authentication_exchanges.html
fn scramble_sha256(password: &str, nonce: &[u8]) -> [u8; 32] {
    let mut pw_hash: [u8; 32] = Sha256::digest(password.as_bytes()).into();
    let pw_hash_hash = Sha256::digest(Sha256::digest(password.as_bytes()));

    let mut ctx = Sha256::new();
    ctx.update(pw_hash_hash);
    ctx.update(nonce);

    xor_eq(&mut pw_hash, &ctx.finalize());
    pw_hash
}

fn xor_eq(lhs: &mut [u8], rhs: &[u8]) {
    for (l, r) in lhs.iter_mut().zip(rhs.iter()) {
        *l ^= r;
    }
}

/// `AuthSwitchRequest` (tag `0xFE`): the server picked a different plugin
/// mid-handshake and supplies a fresh nonce.
#[derive(Debug)]
pub(crate) struct AuthSwitchRequest {
    pub(crate) plugin: AuthPlugin,
    pub(crate) data: Bytes,
}

impl AuthSwitchRequest {
    pub(crate) fn get(mut buf: Bytes) -> Result<Self, Error> {
        let header = buf.get_bytes(1)?;
        debug_assert_eq!(header[0], 0xfe);

        let plugin = buf.get_str_nul()?.parse()?;

        Ok(Self { plugin, data: buf })
    }
}

/// Subtypes of the `AuthMoreData` (`0x01`) packet used by
/// `caching_sha2_password`.
pub(crate) mod more_data {
    /// The scramble matched the server's cache; an OK packet follows.
    pub(crate) const FAST_AUTH_OK: u8 = 0x03;

    /// Full authentication is required: the cleartext password over TLS, or
    /// an RSA exchange over plaintext.
    pub(crate) const FULL_AUTH_REQUIRED: u8 = 0x04;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_scramble_shape() {
        let nonce = b"U14Oph9\"<H5nt6L\\j\"dS";
        let a = scramble_sha1("secret", nonce);
        let b = scramble_sha1("secret", nonce);
        let c = scramble_sha1("secret", b"another-nonce-012345");

        // deterministic in (password, nonce), 20 bytes, nonce-sensitive
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn sha256_scramble_shape() {
        let nonce = b"tL\x03s\x0f[4\rl4. 14aB0c\x06g";
        let a = scramble_sha256("secret", nonce);

        assert_eq!(a.len(), 32);
        assert_ne!(a, scramble_sha256("secret2", nonce));
    }

    #[test]
    fn empty_password_scrambles_to_empty() {
        assert!(AuthPlugin::CachingSha2Password.scramble("", b"x").is_empty());
    }
}
