//! NTLMv2 challenge-response authentication (MS-NLMP), carried inside the
//! LOGIN7 SSPI field and the SSPI packet type.

use bytes::{Buf, Bytes};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use md4::{Digest, Md4};
use md5::Md5;

use crate::error::Error;

const SIGNATURE: &[u8; 8] = b"NTLMSSP\0";

const MESSAGE_TYPE_NEGOTIATE: u32 = 1;
const MESSAGE_TYPE_CHALLENGE: u32 = 2;
const MESSAGE_TYPE_AUTHENTICATE: u32 = 3;

// UNICODE | REQUEST_TARGET | SIGN | NTLM | ALWAYS_SIGN | EXTENDED_SECURITY
// | TARGET_INFO | VERSION | 128 | 56
const NEGOTIATE_FLAGS: u32 = 0x62088235;

// seconds between 1601-01-01 and 1970-01-01
const FILETIME_UNIX_EPOCH: i64 = 11_644_473_600;

/// NTHash = MD4(UTF16LE(password))
pub(crate) fn nt_hash(password: &str) -> [u8; 16] {
    Md4::digest(utf16le(password)).into()
}

/// NTLMv2Key = HMAC-MD5(NTHash, UTF16LE(UPPERCASE(username) ‖ domain)).
///
/// Only the username is uppercased; the domain keeps its case.
pub(crate) fn ntlmv2_hash(username: &str, domain: &str, password: &str) -> [u8; 16] {
    let identity = format!("{}{}", username.to_uppercase(), domain);

    hmac_md5(&nt_hash(password), &utf16le(&identity))
}

/// The NEGOTIATE message (type 1) placed in the LOGIN7 `sspiData` field.
pub(crate) fn negotiate_message() -> Vec<u8> {
    let mut buf = Vec::with_capacity(32);

    buf.extend_from_slice(SIGNATURE);
    buf.extend_from_slice(&MESSAGE_TYPE_NEGOTIATE.to_le_bytes());
    buf.extend_from_slice(&NEGOTIATE_FLAGS.to_le_bytes());

    // empty domain and workstation security buffers
    put_security_buffer(&mut buf, 32, 0);
    put_security_buffer(&mut buf, 32, 0);

    buf
}

/// The server's CHALLENGE message (type 2), as delivered in the SSPI token.
#[derive(Debug)]
pub(crate) struct Challenge {
    pub(crate) server_challenge: [u8; 8],
    pub(crate) target_info: Vec<u8>,
}

impl Challenge {
    pub(crate) fn decode(mut buf: Bytes) -> Result<Self, Error> {
        let full = buf.clone();

        if buf.len() < 48 || !buf.starts_with(SIGNATURE) {
            return Err(err_protocol!("malformed NTLM CHALLENGE message"));
        }
        buf.advance(8);

        if buf.get_u32_le() != MESSAGE_TYPE_CHALLENGE {
            return Err(err_protocol!("expected NTLM message type 2"));
        }

        // TargetNameFields
        let (_, _) = get_security_buffer(&mut buf);

        let _flags = buf.get_u32_le();

        let mut server_challenge = [0_u8; 8];
        server_challenge.copy_from_slice(&buf[..8]);
        buf.advance(8);

        // Reserved
        buf.advance(8);

        // TargetInfoFields
        let (target_len, target_offset) = get_security_buffer(&mut buf);

        if target_offset + target_len > full.len() {
            return Err(err_protocol!("NTLM target-info is out of bounds"));
        }

        Ok(Self {
            server_challenge,
            target_info: full[target_offset..target_offset + target_len].to_vec(),
        })
    }
}

/// The NTLMv2 response blob plus the proof over it.
pub(crate) struct Ntlmv2Response {
    pub(crate) nt_response: Vec<u8>,
    pub(crate) lm_response: Vec<u8>,
}

pub(crate) fn compute_response(
    key: &[u8; 16],
    server_challenge: &[u8; 8],
    client_challenge: &[u8; 8],
    target_info: &[u8],
    now: DateTime<Utc>,
) -> Ntlmv2Response {
    // blob: signature ‖ reserved ‖ FILETIME ‖ client challenge ‖ reserved
    //       ‖ server target-info ‖ MsvAvEOL
    let mut blob = Vec::with_capacity(32 + target_info.len());
    blob.extend_from_slice(&[0x01, 0x01, 0x00, 0x00]);
    blob.extend_from_slice(&[0; 4]);
    blob.extend_from_slice(&filetime(now).to_le_bytes());
    blob.extend_from_slice(client_challenge);
    blob.extend_from_slice(&[0; 4]);
    blob.extend_from_slice(target_info);
    blob.extend_from_slice(&[0; 4]);

    let mut challenge_and_blob = Vec::with_capacity(8 + blob.len());
    challenge_and_blob.extend_from_slice(server_challenge);
    challenge_and_blob.extend_from_slice(&blob);

    let nt_proof = hmac_md5(key, &challenge_and_blob);

    let mut nt_response = Vec::with_capacity(16 + blob.len());
    nt_response.extend_from_slice(&nt_proof);
    nt_response.extend_from_slice(&blob);

    let mut challenges = Vec::with_capacity(16);
    challenges.extend_from_slice(server_challenge);
    challenges.extend_from_slice(client_challenge);

    let mut lm_response = Vec::with_capacity(24);
    lm_response.extend_from_slice(&hmac_md5(key, &challenges));
    lm_response.extend_from_slice(client_challenge);

    Ntlmv2Response {
        nt_response,
        lm_response,
    }
}

/// The AUTHENTICATE message (type 3), sent in a TDS SSPI packet.
pub(crate) fn authenticate_message(
    username: &str,
    domain: &str,
    workstation: &str,
    response: &Ntlmv2Response,
) -> Vec<u8> {
    // LM, NT, domain, user, workstation, session key
    const HEADER_LEN: usize = 8 + 4 + 6 * 8 + 4;

    let domain_data = utf16le(domain);
    let user_data = utf16le(username);
    let workstation_data = utf16le(workstation);

    let mut buf = Vec::with_capacity(HEADER_LEN + 256);

    buf.extend_from_slice(SIGNATURE);
    buf.extend_from_slice(&MESSAGE_TYPE_AUTHENTICATE.to_le_bytes());

    let mut offset = HEADER_LEN;
    let mut put_field = |buf: &mut Vec<u8>, len: usize| {
        put_security_buffer(buf, offset as u32, len as u32);
        offset += len;
    };

    put_field(&mut buf, response.lm_response.len());
    put_field(&mut buf, response.nt_response.len());
    put_field(&mut buf, domain_data.len());
    put_field(&mut buf, user_data.len());
    put_field(&mut buf, workstation_data.len());

    // no session key
    put_field(&mut buf, 0);

    buf.extend_from_slice(&NEGOTIATE_FLAGS.to_le_bytes());

    buf.extend_from_slice(&response.lm_response);
    buf.extend_from_slice(&response.nt_response);
    buf.extend_from_slice(&domain_data);
    buf.extend_from_slice(&user_data);
    buf.extend_from_slice(&workstation_data);

    buf
}

fn put_security_buffer(buf: &mut Vec<u8>, offset: u32, len: u32) {
    buf.extend_from_slice(&(len as u16).to_le_bytes());
    buf.extend_from_slice(&(len as u16).to_le_bytes());
    buf.extend_from_slice(&offset.to_le_bytes());
}

fn get_security_buffer(buf: &mut Bytes) -> (usize, usize) {
    let len = buf.get_u16_le() as usize;
    let _max_len = buf.get_u16_le();
    let offset = buf.get_u32_le() as usize;

    (len, offset)
}

fn utf16le(s: &str) -> Vec<u8> {
    s.encode_utf16()
        .flat_map(|unit| unit.to_le_bytes())
        .collect()
}

fn hmac_md5(key: &[u8], data: &[u8]) -> [u8; 16] {
    let mut mac = Hmac::<Md5>::new_from_slice(key).expect("HMAC can take a key of any size");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

fn filetime(now: DateTime<Utc>) -> u64 {
    ((now.timestamp() + FILETIME_UNIX_EPOCH) as u64) * 10_000_000
        + u64::from(now.timestamp_subsec_nanos() / 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_primitive_vectors() {
        // MD4 (RFC 1320) and MD5 (RFC 1321) appendix vectors, plus the
        // HMAC-MD5 case 1 of RFC 2202; NTLMv2 depends on all three
        assert_eq!(
            hex::encode(Md4::digest(b"")),
            "31d6cfe0d16ae931b73c59d7e0c089c0"
        );
        assert_eq!(
            hex::encode(Md4::digest(b"a")),
            "bde52cb31de33e46245e05fbdbd6fb24"
        );
        assert_eq!(
            hex::encode(md5::Md5::digest(b"")),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
        assert_eq!(
            hex::encode(md5::Md5::digest(b"abc")),
            "900150983cd24fb0d6963f7d28e17f72"
        );
        assert_eq!(
            hex::encode(hmac_md5(&[0x0b; 16], b"Hi There")),
            "9294727a3638bb1c13f48ef8158bfc9d"
        );
    }

    #[test]
    fn nt_hash_vector() {
        assert_eq!(
            hex::encode(nt_hash("Password")),
            "a4f49c406510bdcab6824ee7c30fd852"
        );
    }

    #[test]
    fn ntlmv2_hash_vector() {
        // MS-NLMP 4.2.4: User/Domain/Password
        assert_eq!(
            hex::encode(ntlmv2_hash("User", "Domain", "Password")),
            "0c868a403bfd7a93a3001ef22ef02e3f"
        );
    }

    #[test]
    fn nt_proof_covers_challenge_and_blob() {
        let key = ntlmv2_hash("User", "Domain", "Password");
        let server_challenge = [1, 2, 3, 4, 5, 6, 7, 8];
        let client_challenge = [0xaa; 8];
        let target_info = [2, 0, 4, 0, b'S', 0, b'Q', 0];

        let response = compute_response(
            &key,
            &server_challenge,
            &client_challenge,
            &target_info,
            Utc::now(),
        );

        // NTProofStr = HMAC-MD5(key, serverChallenge ‖ blob)
        let blob = &response.nt_response[16..];
        let mut input = server_challenge.to_vec();
        input.extend_from_slice(blob);

        assert_eq!(&response.nt_response[..16], &hmac_md5(&key, &input));

        // LM = HMAC-MD5(key, serverChallenge ‖ clientChallenge) ‖ clientChallenge
        assert_eq!(&response.lm_response[16..], &client_challenge);

        // the blob embeds the client challenge and the target info
        assert_eq!(&blob[16..24], &client_challenge);
        assert!(blob.windows(target_info.len()).any(|w| w == target_info));
    }

    #[test]
    fn negotiate_message_shape() {
        let msg = negotiate_message();

        assert_eq!(msg.len(), 32);
        assert_eq!(&msg[..8], b"NTLMSSP\0");
        assert_eq!(&msg[8..12], &1_u32.to_le_bytes());
        assert_eq!(&msg[12..16], &0x62088235_u32.to_le_bytes());
    }

    #[test]
    fn authenticate_message_offsets_are_consistent() {
        let key = ntlmv2_hash("User", "Domain", "Password");
        let response = compute_response(&key, &[0; 8], &[1; 8], &[], Utc::now());

        let msg = authenticate_message("User", "Domain", "ws", &response);

        // flags sit right after the six security buffers
        assert_eq!(&msg[60..64], &0x62088235_u32.to_le_bytes());

        // LM response begins at the end of the fixed header
        let lm_offset = u32::from_le_bytes([msg[16], msg[17], msg[18], msg[19]]) as usize;
        assert_eq!(lm_offset, 64);
        assert_eq!(&msg[lm_offset..lm_offset + 24], &response.lm_response[..]);
    }
}
