use crate::io::{BufMutExt, Encode};

// TDS 7.4
pub(crate) const TDS_VERSION_74: u32 = 0x74_00_00_04;

// OptionFlags2: integrated security (SSPI) is in use
const OPTION_FLAGS_2_INTEGRATED_SECURITY: u8 = 0x80;

// TypeFlags: ApplicationIntent=ReadOnly
const TYPE_FLAGS_READ_ONLY_INTENT: u8 = 0x20;

/// The LOGIN7 message.
///
/// <https://docs.microsoft.com/en-us/openspecs/windows_protocols/ms-tds/773a62b6-ee89-4c02-9e5e-344882630aac>
#[derive(Debug)]
pub(crate) struct Login7<'a> {
    pub(crate) version: u32,
    pub(crate) packet_size: u32,
    pub(crate) client_program_version: u32,
    pub(crate) client_pid: u32,
    pub(crate) hostname: &'a str,
    pub(crate) username: &'a str,
    pub(crate) password: &'a str,
    pub(crate) app_name: &'a str,
    pub(crate) server_name: &'a str,
    pub(crate) client_interface_name: &'a str,
    pub(crate) language: &'a str,
    pub(crate) database: &'a str,
    pub(crate) client_id: [u8; 6],
    pub(crate) read_only_intent: bool,

    /// An NTLM NEGOTIATE blob; its presence selects integrated security and
    /// blanks the username/password fields.
    pub(crate) sspi: Option<&'a [u8]>,
}

impl Encode for Login7<'_> {
    fn encode(&self, buf: &mut Vec<u8>) {
        // the fixed portion of LOGIN7 is 94 bytes; variable data follows
        const FIXED_LEN: u16 = 94;

        let start = buf.len();

        // Length, patched at the end
        buf.extend_from_slice(&[0; 4]);

        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.extend_from_slice(&self.packet_size.to_le_bytes());
        buf.extend_from_slice(&self.client_program_version.to_le_bytes());
        buf.extend_from_slice(&self.client_pid.to_le_bytes());

        // ConnectionID
        buf.extend_from_slice(&[0; 4]);

        // OptionFlags1
        buf.push(0);

        // OptionFlags2
        buf.push(if self.sspi.is_some() {
            OPTION_FLAGS_2_INTEGRATED_SECURITY
        } else {
            0
        });

        // TypeFlags
        buf.push(if self.read_only_intent {
            TYPE_FLAGS_READ_ONLY_INTENT
        } else {
            0
        });

        // OptionFlags3
        buf.push(0);

        // ClientTimeZone, ClientLCID
        buf.extend_from_slice(&[0; 4]);
        buf.extend_from_slice(&[0; 4]);

        let (username, password) = if self.sspi.is_some() {
            // integrated security authenticates through the SSPI blob
            ("", "")
        } else {
            (self.username, self.password)
        };

        // the offset/length table; offsets are bytes from the start of the
        // LOGIN7 structure, lengths are in characters
        fn put_str(
            buf: &mut Vec<u8>,
            data: &mut Vec<u8>,
            offset: &mut u16,
            s: &str,
            scramble: bool,
        ) {
            let chars = s.encode_utf16().count() as u16;

            buf.extend_from_slice(&offset.to_le_bytes());
            buf.extend_from_slice(&chars.to_le_bytes());

            let begin = data.len();
            data.put_utf16_str(s);

            if scramble {
                scramble_password(&mut data[begin..]);
            }

            *offset += chars * 2;
        }

        let mut offset = FIXED_LEN;
        let mut data = Vec::with_capacity(256);

        put_str(buf, &mut data, &mut offset, self.hostname, false);
        put_str(buf, &mut data, &mut offset, username, false);
        put_str(buf, &mut data, &mut offset, password, true);
        put_str(buf, &mut data, &mut offset, self.app_name, false);
        put_str(buf, &mut data, &mut offset, self.server_name, false);

        // Unused / Extension
        buf.extend_from_slice(&offset.to_le_bytes());
        buf.extend_from_slice(&0_u16.to_le_bytes());

        put_str(buf, &mut data, &mut offset, self.client_interface_name, false);
        put_str(buf, &mut data, &mut offset, self.language, false);
        put_str(buf, &mut data, &mut offset, self.database, false);

        buf.extend_from_slice(&self.client_id);

        // SSPI; the length here is in bytes
        let sspi = self.sspi.unwrap_or_default();
        buf.extend_from_slice(&offset.to_le_bytes());
        buf.extend_from_slice(&(sspi.len() as u16).to_le_bytes());
        data.extend_from_slice(sspi);
        offset += sspi.len() as u16;

        // AtchDBFile, ChangePassword
        buf.extend_from_slice(&offset.to_le_bytes());
        buf.extend_from_slice(&0_u16.to_le_bytes());
        buf.extend_from_slice(&offset.to_le_bytes());
        buf.extend_from_slice(&0_u16.to_le_bytes());

        // SSPILong (only used when the blob exceeds 64K)
        buf.extend_from_slice(&[0; 4]);

        buf.extend_from_slice(&data);

        let len = (buf.len() - start) as u32;
        buf[start..start + 4].copy_from_slice(&len.to_le_bytes());
    }
}

/// The LOGIN7 password obfuscation: for each UTF-16LE byte, swap the
/// nibbles, then XOR with 0xA5.
fn scramble_password(bytes: &mut [u8]) {
    for b in bytes {
        *b = ((*b << 4) | (*b >> 4)) ^ 0xa5;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_scrambles_the_password() {
        // 'a' = 0x61 0x00 -> swap: 0x16 0x00 -> xor: 0xb3 0xa5
        let mut bytes = vec![0x61, 0x00];
        scramble_password(&mut bytes);

        assert_eq!(bytes, [0xb3, 0xa5]);
    }

    #[test]
    fn fixed_portion_is_94_bytes() {
        let mut buf = Vec::new();
        Login7 {
            version: TDS_VERSION_74,
            packet_size: 4096,
            client_program_version: 0,
            client_pid: 0,
            hostname: "",
            username: "",
            password: "",
            app_name: "",
            server_name: "",
            client_interface_name: "",
            language: "",
            database: "",
            client_id: [0; 6],
            read_only_intent: false,
            sspi: None,
        }
        .encode(&mut buf);

        assert_eq!(buf.len(), 94);
        assert_eq!(&buf[..4], &94_u32.to_le_bytes());
        // TDS version
        assert_eq!(&buf[4..8], &[0x04, 0x00, 0x00, 0x74]);
    }

    #[test]
    fn read_only_intent_sets_type_flag_0x20() {
        let mut buf = Vec::new();
        Login7 {
            version: TDS_VERSION_74,
            packet_size: 4096,
            client_program_version: 0,
            client_pid: 0,
            hostname: "",
            username: "sa",
            password: "",
            app_name: "",
            server_name: "",
            client_interface_name: "",
            language: "",
            database: "",
            client_id: [0; 6],
            read_only_intent: true,
            sspi: None,
        }
        .encode(&mut buf);

        // OptionFlags1 at 24, OptionFlags2 at 25, TypeFlags at 26
        assert_eq!(buf[26], 0x20);
    }
}
