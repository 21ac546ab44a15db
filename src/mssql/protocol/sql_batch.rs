use crate::io::{BufMutExt, Encode};

pub(crate) const HEADER_TRANSACTION_DESCRIPTOR: u16 = 0x00_02;

/// A SQL batch: the ALL_HEADERS block carrying the current transaction
/// descriptor, followed by the SQL text in UTF-16LE.
#[derive(Debug)]
pub(crate) struct SqlBatch<'a> {
    pub(crate) sql: &'a str,

    /// Zero outside an explicit transaction; assigned by the server through
    /// ENVCHANGE type 8 and revoked by types 9/10.
    pub(crate) transaction_descriptor: u64,
}

impl Encode for SqlBatch<'_> {
    fn encode(&self, buf: &mut Vec<u8>) {
        write_all_headers(buf, self.transaction_descriptor);

        // SQLText
        buf.put_utf16_str(self.sql);
    }
}

/// The ALL_HEADERS block required on SQL batch and RPC messages. Always 22
/// bytes: one Transaction Descriptor header, even when no transaction is
/// active.
pub(crate) fn write_all_headers(buf: &mut Vec<u8>, transaction_descriptor: u64) {
    // TotalLength
    buf.extend_from_slice(&(4_u32 + 18).to_le_bytes());

    // [Header] Transaction Descriptor
    buf.extend_from_slice(&18_u32.to_le_bytes()); // 4 + 2 + 8 + 4
    buf.extend_from_slice(&HEADER_TRANSACTION_DESCRIPTOR.to_le_bytes());

    // [TransactionDescriptor] associates the request with the transaction
    // the server started for us
    buf.extend_from_slice(&transaction_descriptor.to_le_bytes());

    // [OutstandingRequestCount] always 1 without MARS
    buf.extend_from_slice(&1_u32.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_header_block_is_22_bytes_and_carries_the_descriptor() {
        let mut buf = Vec::new();
        SqlBatch {
            sql: "SELECT 42 AS answer",
            transaction_descriptor: 0x0807060504030201,
        }
        .encode(&mut buf);

        // TotalLength = 22, HeaderLength = 18, HeaderType = 2
        assert_eq!(&buf[0..4], &22_u32.to_le_bytes());
        assert_eq!(&buf[4..8], &18_u32.to_le_bytes());
        assert_eq!(&buf[8..10], &2_u16.to_le_bytes());

        // the descriptor received from ENVCHANGE type 8, little-endian
        assert_eq!(&buf[10..18], &[1, 2, 3, 4, 5, 6, 7, 8]);

        // OutstandingRequestCount = 1, then the UTF-16 SQL text
        assert_eq!(&buf[18..22], &1_u32.to_le_bytes());
        assert_eq!(&buf[22..24], &[b'S', 0]);
    }

    #[test]
    fn no_transaction_still_writes_the_full_block() {
        let mut buf = Vec::new();
        SqlBatch {
            sql: "",
            transaction_descriptor: 0,
        }
        .encode(&mut buf);

        assert_eq!(buf.len(), 22);
        assert_eq!(&buf[10..18], &[0; 8]);
    }
}
