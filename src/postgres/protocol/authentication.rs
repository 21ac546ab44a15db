use bytes::{Buf, Bytes};

use crate::error::Error;
use crate::io::BufExt;

/// The body of an `Authentication` (`'R'`) message.
#[derive(Debug)]
pub(crate) enum Authentication {
    /// The exchange is completed.
    Ok,

    /// The frontend must send the password in clear-text form.
    CleartextPassword,

    /// The frontend must send `md5(md5(password‖username), salt)`.
    Md5Password(AuthenticationMd5Password),

    /// The server offers a list of SASL mechanisms.
    Sasl(AuthenticationSasl),

    /// A `server-first-message` of an in-progress SASL exchange.
    SaslContinue(AuthenticationSaslContinue),

    /// The `server-final-message`, carrying the server signature.
    SaslFinal(AuthenticationSaslFinal),
}

impl Authentication {
    pub(crate) fn get(mut buf: Bytes) -> Result<Self, Error> {
        Ok(match buf.get_u32() {
            0 => Authentication::Ok,
            3 => Authentication::CleartextPassword,

            5 => {
                let mut salt = [0_u8; 4];
                salt.copy_from_slice(&buf.get_bytes(4)?);

                Authentication::Md5Password(AuthenticationMd5Password { salt })
            }

            10 => {
                let mut mechanisms = Vec::new();
                while !buf.is_empty() && buf[0] != 0 {
                    mechanisms.push(buf.get_str_nul()?);
                }

                Authentication::Sasl(AuthenticationSasl { mechanisms })
            }

            11 => Authentication::SaslContinue(AuthenticationSaslContinue::get(buf)?),

            12 => Authentication::SaslFinal(AuthenticationSaslFinal::get(buf)?),

            ty => {
                return Err(err_protocol!(
                    "unsupported authentication method: {}",
                    ty
                ));
            }
        })
    }
}

#[derive(Debug)]
pub(crate) struct AuthenticationMd5Password {
    pub(crate) salt: [u8; 4],
}

#[derive(Debug)]
pub(crate) struct AuthenticationSasl {
    pub(crate) mechanisms: Vec<String>,
}

#[derive(Debug)]
pub(crate) struct AuthenticationSaslContinue {
    /// The verbatim `server-first-message`; part of the signed AuthMessage.
    pub(crate) message: String,
    /// Combined client + server nonce.
    pub(crate) nonce: String,
    pub(crate) salt: Vec<u8>,
    pub(crate) iterations: u32,
}

impl AuthenticationSaslContinue {
    fn get(buf: Bytes) -> Result<Self, Error> {
        let message = String::from_utf8(buf.to_vec())
            .map_err(|_| err_protocol!("server-first-message is not valid UTF-8"))?;

        let mut nonce = None;
        let mut salt = None;
        let mut iterations = None;

        for attr in message.split(',') {
            match attr.split_once('=') {
                Some(("r", value)) => nonce = Some(value.to_owned()),

                Some(("s", value)) => {
                    salt = Some(
                        base64::decode(value)
                            .map_err(|_| err_protocol!("SCRAM salt is not valid base64"))?,
                    );
                }

                Some(("i", value)) => {
                    iterations = Some(
                        value
                            .parse()
                            .map_err(|_| err_protocol!("SCRAM iteration count is not a number"))?,
                    );
                }

                _ => {}
            }
        }

        match (nonce, salt, iterations) {
            (Some(nonce), Some(salt), Some(iterations)) => Ok(Self {
                message,
                nonce,
                salt,
                iterations,
            }),

            _ => Err(err_protocol!(
                "server-first-message is missing a required attribute"
            )),
        }
    }
}

#[derive(Debug)]
pub(crate) struct AuthenticationSaslFinal {
    pub(crate) verifier: Vec<u8>,
}

impl AuthenticationSaslFinal {
    fn get(buf: Bytes) -> Result<Self, Error> {
        let message = String::from_utf8(buf.to_vec())
            .map_err(|_| err_protocol!("server-final-message is not valid UTF-8"))?;

        for attr in message.split(',') {
            if let Some(("v", value)) = attr.split_once('=') {
                let verifier = base64::decode(value)
                    .map_err(|_| err_protocol!("server signature is not valid base64"))?;

                return Ok(Self { verifier });
            }
        }

        Err(err_protocol!("server-final-message carries no verifier"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_decodes_sasl_continue() {
        let buf = Bytes::from_static(b"\x00\x00\x00\x0br=abc123,s=c2FsdA==,i=4096");

        match Authentication::get(buf).unwrap() {
            Authentication::SaslContinue(body) => {
                assert_eq!(body.nonce, "abc123");
                assert_eq!(body.salt, b"salt");
                assert_eq!(body.iterations, 4096);
            }

            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn it_decodes_sasl_mechanisms() {
        let buf = Bytes::from_static(b"\x00\x00\x00\x0aSCRAM-SHA-256\0SCRAM-SHA-256-PLUS\0\0");

        match Authentication::get(buf).unwrap() {
            Authentication::Sasl(body) => {
                assert_eq!(
                    body.mechanisms,
                    vec!["SCRAM-SHA-256", "SCRAM-SHA-256-PLUS"]
                );
            }

            other => panic!("unexpected: {:?}", other),
        }
    }
}
