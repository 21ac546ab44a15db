use bytes::{Buf, Bytes};

use crate::error::Error;
use crate::mssql::io::MssqlBufExt;

/// `ENVCHANGE` (0xE3): server environment changes. Types 8/9/10 carry the
/// transaction descriptor that must accompany every SQL batch header.
#[derive(Debug)]
#[allow(dead_code)]
pub(crate) enum EnvChange {
    Database(String),
    Language(String),
    CharacterSet(String),
    PacketSize(String),
    UnicodeDataSortingLocalId(String),
    UnicodeDataSortingComparisonFlags(String),
    SqlCollation(Bytes),

    // TDS 7.2+
    BeginTransaction(u64),
    CommitTransaction,
    RollbackTransaction,

    // TDS 7.4+
    Routing { host: String, port: u16 },

    // recognized but unacted-upon types
    Other(u8),
}

impl EnvChange {
    pub(crate) fn get(buf: &mut Bytes) -> Result<Self, Error> {
        let len = buf.get_u16_le();
        let mut data = buf.split_to(len as usize);
        let ty = data.get_u8();

        Ok(match ty {
            1 => EnvChange::Database(data.get_b_varchar()?),
            2 => EnvChange::Language(data.get_b_varchar()?),
            3 => EnvChange::CharacterSet(data.get_b_varchar()?),
            4 => EnvChange::PacketSize(data.get_b_varchar()?),
            5 => EnvChange::UnicodeDataSortingLocalId(data.get_b_varchar()?),
            6 => EnvChange::UnicodeDataSortingComparisonFlags(data.get_b_varchar()?),
            7 => EnvChange::SqlCollation(data.get_b_varbyte()?),

            8 => {
                // new value: the 8-byte descriptor; old value: empty
                let new = data.get_b_varbyte()?;
                if new.len() != 8 {
                    return Err(err_protocol!(
                        "BeginTransaction descriptor has length {}",
                        new.len()
                    ));
                }

                EnvChange::BeginTransaction(u64::from_le_bytes(new[..].try_into().unwrap()))
            }

            9 => EnvChange::CommitTransaction,
            10 => EnvChange::RollbackTransaction,

            20 => {
                // routing value: u16 length, protocol 0 (TCP), port, host
                let _value_len = data.get_u16_le();
                let protocol = data.get_u8();
                if protocol != 0 {
                    return Err(err_protocol!("unknown routing protocol {}", protocol));
                }

                let port = data.get_u16_le();
                let host = data.get_us_varchar()?;

                EnvChange::Routing { host, port }
            }

            // remaining data (old/new values) is discarded with `data`
            ty => EnvChange::Other(ty),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_decodes_begin_transaction() {
        // type 8, new = 8-byte descriptor, old = empty
        #[rustfmt::skip]
        let mut buf = Bytes::from_static(&[
            11, 0,
            8,
            8, 1, 2, 3, 4, 5, 6, 7, 8,
            0,
        ]);

        match EnvChange::get(&mut buf).unwrap() {
            EnvChange::BeginTransaction(descriptor) => {
                assert_eq!(descriptor, 0x0807060504030201);
            }

            other => panic!("unexpected: {:?}", other),
        }

        assert!(buf.is_empty());
    }

    #[test]
    fn it_decodes_commit() {
        // type 9, new = empty, old = descriptor
        #[rustfmt::skip]
        let mut buf = Bytes::from_static(&[
            11, 0,
            9,
            0,
            8, 1, 2, 3, 4, 5, 6, 7, 8,
        ]);

        assert!(matches!(
            EnvChange::get(&mut buf).unwrap(),
            EnvChange::CommitTransaction
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn unknown_types_are_skipped_not_fatal() {
        // type 13 (database mirroring partner), arbitrary body
        let mut buf = Bytes::from_static(&[4, 0, 13, 1, 2, 3, 0xaa]);

        assert!(matches!(
            EnvChange::get(&mut buf).unwrap(),
            EnvChange::Other(13)
        ));

        // the trailing byte belongs to the next token
        assert_eq!(&buf[..], &[0xaa]);
    }
}
