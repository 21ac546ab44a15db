use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::error::Error;
use crate::postgres::connection::stream::PgStream;
use crate::postgres::protocol::authentication::{Authentication, AuthenticationSasl};
use crate::postgres::protocol::sasl::{SaslInitialResponse, SaslResponse};
use crate::postgres::protocol::{MessageFormat, response::PgNotice};
use crate::postgres::PgConnectOptions;

const MECHANISM: &str = "SCRAM-SHA-256";

const GS2_HEADER: &str = "n,,";

// base64("n,,")
const CHANNEL_BINDING: &str = "c=biws";

/// Drives a SCRAM-SHA-256 exchange to completion (RFC 7677), verifying the
/// server signature before reporting success.
pub(super) async fn authenticate(
    stream: &mut PgStream,
    options: &PgConnectOptions,
    offer: AuthenticationSasl,
) -> Result<(), Error> {
    if !offer.mechanisms.iter().any(|m| m == MECHANISM) {
        return Err(Error::AuthenticationFailed(format!(
            "server offers no supported SASL mechanism (offered: {:?})",
            offer.mechanisms
        )));
    }

    let password = options.password.as_deref().unwrap_or_default();

    let client_nonce = nonce();
    let client_first_bare = format!("n={},r={}", options.username, client_nonce);

    stream
        .send(SaslInitialResponse {
            mechanism: MECHANISM,
            data: &format!("{}{}", GS2_HEADER, client_first_bare),
        })
        .await?;

    let cont = match next_auth(stream).await? {
        Authentication::SaslContinue(cont) => cont,

        other => {
            return Err(err_protocol!(
                "expected SASLContinue but received {:?}",
                other
            ));
        }
    };

    // the combined nonce must extend ours
    if !cont.nonce.starts_with(&client_nonce) {
        return Err(Error::AuthenticationFailed(String::from(
            "SCRAM server nonce does not extend the client nonce",
        )));
    }

    let client_final_without_proof = format!("{},r={}", CHANNEL_BINDING, cont.nonce);

    // AuthMessage := client-first-message-bare + "," +
    //               server-first-message + "," +
    //               client-final-message-without-proof
    let auth_message = format!(
        "{},{},{}",
        client_first_bare, cont.message, client_final_without_proof
    );

    let salted_password = hi(password, &cont.salt, cont.iterations);
    let proof = client_proof(&salted_password, &auth_message);

    stream
        .send(SaslResponse(&format!(
            "{},p={}",
            client_final_without_proof,
            base64::encode(proof)
        )))
        .await?;

    let verifier = match next_auth(stream).await? {
        Authentication::SaslFinal(body) => body.verifier,

        other => {
            return Err(err_protocol!("expected SASLFinal but received {:?}", other));
        }
    };

    // a wrong (or absent) signature means we are not talking to a server
    // that knows the password; refuse the session
    if verifier != server_signature(&salted_password, &auth_message) {
        return Err(Error::AuthenticationFailed(String::from(
            "SCRAM server signature does not match",
        )));
    }

    Ok(())
}

async fn next_auth(stream: &mut PgStream) -> Result<Authentication, Error> {
    let message = stream.recv().await?;

    match message.format {
        MessageFormat::Authentication => Authentication::get(message.contents),

        MessageFormat::ErrorResponse => Err(Error::AuthenticationFailed(
            PgNotice::get(message.contents)?.message,
        )),

        other => Err(err_protocol!(
            "expected Authentication but received {:?}",
            other
        )),
    }
}

// Nonce is a sequence of random printable ASCII, excluding ','
fn nonce() -> String {
    let mut rng = rand::thread_rng();

    (0..24)
        .map(|_| {
            let mut ch = rng.gen_range(0x21..0x7f_u8);
            while ch == b',' {
                ch = rng.gen_range(0x21..0x7f_u8);
            }
            ch as char
        })
        .collect()
}

/// SaltedPassword := Hi(password, salt, i) — PBKDF2 with HMAC-SHA-256.
fn hi(password: &str, salt: &[u8], iterations: u32) -> [u8; 32] {
    let mut mac = Hmac::<Sha256>::new_from_slice(password.as_bytes())
        .expect("HMAC can take a key of any size");
    mac.update(salt);
    mac.update(&1_u32.to_be_bytes());

    let mut u: [u8; 32] = mac.finalize().into_bytes().into();
    let mut result = u;

    for _ in 1..iterations {
        let mut mac = Hmac::<Sha256>::new_from_slice(password.as_bytes())
            .expect("HMAC can take a key of any size");
        mac.update(&u);
        u = mac.finalize().into_bytes().into();

        for (r, u) in result.iter_mut().zip(u.iter()) {
            *r ^= u;
        }
    }

    result
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC can take a key of any size");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

/// ClientProof := ClientKey XOR HMAC(H(ClientKey), AuthMessage)
fn client_proof(salted_password: &[u8; 32], auth_message: &str) -> [u8; 32] {
    let client_key = hmac_sha256(salted_password, b"Client Key");
    let stored_key = Sha256::digest(client_key);

    let mut proof = client_key;
    let signature = hmac_sha256(&stored_key, auth_message.as_bytes());

    for (p, s) in proof.iter_mut().zip(signature.iter()) {
        *p ^= s;
    }

    proof
}

/// ServerSignature := HMAC(HMAC(SaltedPassword, "Server Key"), AuthMessage)
fn server_signature(salted_password: &[u8; 32], auth_message: &str) -> [u8; 32] {
    let server_key = hmac_sha256(salted_password, b"Server Key");
    hmac_sha256(&server_key, auth_message.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    // the SCRAM-SHA-256 example exchange from RFC 7677 §3
    const PASSWORD: &str = "pencil";
    const SALT_B64: &str = "W22ZaJ0SNY7soEsUEjb6gQ==";
    const ITERATIONS: u32 = 4096;
    const AUTH_MESSAGE: &str = "n=user,r=rOprNGfwEbeRWgbNEkqO,\
         r=rOprNGfwEbeRWgbNEkqO%hvYDpWUa2RaTCAfuxFIlj)hNlF$k0,s=W22ZaJ0SNY7soEsUEjb6gQ==,i=4096,\
         c=biws,r=rOprNGfwEbeRWgbNEkqO%hvYDpWUa2RaTCAfuxFIlj)hNlF$k0";

    #[test]
    fn it_computes_the_rfc_7677_client_proof() {
        let salt = base64::decode(SALT_B64).unwrap();
        let salted = hi(PASSWORD, &salt, ITERATIONS);

        assert_eq!(
            base64::encode(client_proof(&salted, AUTH_MESSAGE)),
            "dHzbZapWIk4jUhN+Ute9ytag9zjfMHgsqmmiz7AndVQ="
        );
    }

    #[test]
    fn it_computes_the_rfc_7677_server_signature() {
        let salt = base64::decode(SALT_B64).unwrap();
        let salted = hi(PASSWORD, &salt, ITERATIONS);

        assert_eq!(
            base64::encode(server_signature(&salted, AUTH_MESSAGE)),
            "6rriTRBi23WpRR/wtup+mMhUZUn/dB5nLTJRsjl95G4="
        );
    }
}
